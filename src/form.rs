use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::categories;
use crate::entry::EntryDraft;
use crate::models::{NewTransaction, Transaction, TransactionType};
use crate::tui::{centered_rect, AMOUNT_NEG_STYLE, AMOUNT_POS_STYLE, CURSOR, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE};

const MAX_SUGGESTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Name,
    Particular,
    Amount,
    Description,
    Type,
}

const FIELDS: [Field; 6] = [
    Field::Date,
    Field::Name,
    Field::Particular,
    Field::Amount,
    Field::Description,
    Field::Type,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Date => "Date",
            Field::Name => "Name",
            Field::Particular => "Particular",
            Field::Amount => "Amount",
            Field::Description => "Description",
            Field::Type => "Type",
        }
    }
}

pub enum FormAction {
    Continue,
    Cancel,
    Create(NewTransaction),
    Update(Transaction),
    Delete(String),
}

/// Add/edit overlay. Name and particular offer completions from the ledger.
pub struct EntryForm {
    draft: EntryDraft,
    editing: Option<Transaction>,
    focus: Field,
    names: Vec<String>,
    categories: Vec<String>,
    suggestion: usize,
    confirm_delete: bool,
    error: Option<String>,
}

impl EntryForm {
    pub fn new(today: NaiveDate, names: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            draft: EntryDraft::new(today),
            editing: None,
            focus: Field::Date,
            names,
            categories,
            suggestion: 0,
            confirm_delete: false,
            error: None,
        }
    }

    pub fn edit(txn: &Transaction, names: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            draft: EntryDraft::from_transaction(txn),
            editing: Some(txn.clone()),
            focus: Field::Name,
            names,
            categories,
            suggestion: 0,
            confirm_delete: false,
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    fn value_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Date => Some(&mut self.draft.date),
            Field::Name => Some(&mut self.draft.name),
            Field::Particular => Some(&mut self.draft.particular),
            Field::Amount => Some(&mut self.draft.amount),
            Field::Description => Some(&mut self.draft.description),
            Field::Type => None,
        }
    }

    fn value(&self, field: Field) -> String {
        match field {
            Field::Date => self.draft.date.clone(),
            Field::Name => self.draft.name.clone(),
            Field::Particular => self.draft.particular.clone(),
            Field::Amount => self.draft.amount.clone(),
            Field::Description => self.draft.description.clone(),
            Field::Type => self.draft.kind.as_str().to_string(),
        }
    }

    /// Completions for the focused field; empty once the text is an exact choice.
    fn suggestions(&self) -> Vec<&String> {
        let (choices, query) = match self.focus {
            Field::Name => (&self.names, &self.draft.name),
            Field::Particular => (&self.categories, &self.draft.particular),
            _ => return Vec::new(),
        };
        if query.trim().is_empty() || choices.iter().any(|c| c.eq_ignore_ascii_case(query.trim())) {
            return Vec::new();
        }
        categories::search(choices, query)
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    fn move_focus(&mut self, forward: bool) {
        let idx = FIELDS.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1) % FIELDS.len()
        } else {
            (idx + FIELDS.len() - 1) % FIELDS.len()
        };
        self.focus = FIELDS[next];
        self.suggestion = 0;
    }

    fn accept_suggestion(&mut self) -> bool {
        let Some(choice) = self.suggestions().get(self.suggestion).map(|s| s.to_string()) else {
            return false;
        };
        match self.focus {
            Field::Name => self.draft.name = choice,
            Field::Particular => self.draft.select_category(&choice),
            _ => return false,
        }
        self.move_focus(true);
        true
    }

    fn submit(&mut self) -> FormAction {
        if let Some(particular) = categories::resolve(&self.draft.particular, &self.categories) {
            self.draft.select_category(&particular);
        }
        match self.draft.validate() {
            Ok(new) => match &self.editing {
                Some(original) => FormAction::Update(Transaction::from_new(original.id.clone(), new)),
                None => FormAction::Create(new),
            },
            Err(e) => {
                self.error = Some(e.to_string());
                FormAction::Continue
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormAction {
        if self.confirm_delete {
            self.confirm_delete = false;
            return match (code, &self.editing) {
                (KeyCode::Char('y') | KeyCode::Char('Y'), Some(t)) => FormAction::Delete(t.id.clone()),
                _ => FormAction::Continue,
            };
        }
        self.error = None;

        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab => self.move_focus(true),
            KeyCode::BackTab => self.move_focus(false),
            KeyCode::Up => {
                if self.suggestion > 0 {
                    self.suggestion -= 1;
                } else if self.suggestions().is_empty() {
                    self.move_focus(false);
                }
            }
            KeyCode::Down => {
                let count = self.suggestions().len();
                if count > 0 {
                    if self.suggestion + 1 < count {
                        self.suggestion += 1;
                    }
                } else {
                    self.move_focus(true);
                }
            }
            KeyCode::Enter => {
                if !self.accept_suggestion() {
                    return self.submit();
                }
            }
            KeyCode::Delete if self.is_edit() => self.confirm_delete = true,
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if self.focus == Field::Type => {
                self.draft.kind = self.draft.kind.toggle();
            }
            KeyCode::Char(c) => {
                if let Some(value) = self.value_mut() {
                    value.push(c);
                }
                self.suggestion = 0;
            }
            KeyCode::Backspace => {
                if let Some(value) = self.value_mut() {
                    value.pop();
                }
                self.suggestion = 0;
            }
            _ => {}
        }
        FormAction::Continue
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let suggestions = self.suggestions();
        let height = FIELDS.len() as u16 + suggestions.len() as u16 + 6;
        let popup = centered_rect(area, 70, height);
        frame.render_widget(Clear, popup);

        let title = if self.is_edit() { " Edit Entry " } else { " New Entry " };
        let block = Block::default()
            .title(title)
            .title_style(HEADER_STYLE)
            .borders(Borders::ALL);

        let mut lines = vec![Line::from("")];
        for field in FIELDS {
            let focused = field == self.focus;
            let marker = if focused { ">" } else { " " };
            let label_style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut spans = vec![Span::styled(format!(" {marker} {:<12}", field.label()), label_style)];
            if field == Field::Type {
                let style = match self.draft.kind {
                    TransactionType::Income => AMOUNT_POS_STYLE,
                    TransactionType::Expense => AMOUNT_NEG_STYLE,
                };
                spans.push(Span::styled(format!("< {} >", self.value(field)), style));
            } else {
                let cursor = if focused { CURSOR } else { "" };
                spans.push(Span::raw(format!("{}{cursor}", self.value(field))));
            }
            lines.push(Line::from(spans));

            if focused && !suggestions.is_empty() {
                for (i, s) in suggestions.iter().enumerate() {
                    let style = if i == self.suggestion {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        FOOTER_STYLE
                    };
                    lines.push(Line::from(Span::styled(format!("                 {s}"), style)));
                }
            }
        }
        lines.push(Line::from(""));
        if let Some(err) = &self.error {
            lines.push(Line::from(Span::styled(format!(" {err}"), STATUS_STYLE)));
        } else if self.confirm_delete {
            lines.push(Line::from(Span::styled(
                " Delete this entry? y=yes  any other key=cancel",
                STATUS_STYLE,
            )));
        } else {
            let hint = if self.is_edit() {
                " Tab=next  Enter=save  Del=delete  Esc=cancel"
            } else {
                " Tab=next  Enter=save  Esc=cancel"
            };
            lines.push(Line::from(Span::styled(hint, FOOTER_STYLE)));
        }

        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}
