use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::entry::parse_date;
use crate::filter::{cycle_option, FilterState};
use crate::fmt::money;
use crate::models::{Transaction, TransactionType};
use crate::stats::{totals, Totals};
use crate::tui::{self, CURSOR, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE, STATUS_STYLE};

const PAGE_SIZE: usize = 20;

enum BrowseMode {
    Normal,
    Search(String),
    DateRange(String),
    GotoDate(String),
    ConfirmDelete(String),
}

pub enum StatementAction {
    Continue,
    Close,
    /// Filter criteria changed; the caller should `reload` with the full ledger.
    FilterChanged,
    Edit(String),
    Delete(String),
    Export,
}

/// Filterable, paged view of the ledger (newest first).
pub struct StatementBrowser {
    rows: Vec<Transaction>,
    totals: Totals,
    filter: FilterState,
    names: Vec<String>,
    categories: Vec<String>,
    today: NaiveDate,
    offset: usize,
    visible_count: usize,
    selected: usize,
    mode: BrowseMode,
    status_message: Option<String>,
    table_state: TableState,
}

impl StatementBrowser {
    pub fn new(filter: FilterState, today: NaiveDate) -> Self {
        Self {
            rows: Vec::new(),
            totals: Totals::default(),
            filter,
            names: Vec::new(),
            categories: Vec::new(),
            today,
            offset: 0,
            visible_count: PAGE_SIZE,
            selected: 0,
            mode: BrowseMode::Normal,
            status_message: None,
            table_state: TableState::default(),
        }
    }

    /// Re-apply the filter to `all`, keeping the scroll position where possible.
    pub fn reload(&mut self, all: &[Transaction], names: Vec<String>, categories: Vec<String>) {
        self.rows = self.filter.apply(all);
        self.totals = totals(&self.rows);
        self.names = names;
        self.categories = categories;
        if self.offset >= self.rows.len() {
            self.offset = self.rows.len().saturating_sub(PAGE_SIZE);
        }
        let on_page = self.rows.len().saturating_sub(self.offset);
        if self.selected >= on_page {
            self.selected = on_page.saturating_sub(1);
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Adopt a filter changed elsewhere. Scrolling restarts at the top when
    /// it differs; call `reload` afterwards to re-apply it.
    pub fn set_filter(&mut self, filter: FilterState) {
        if filter != self.filter {
            self.filter = filter;
            self.offset = 0;
            self.selected = 0;
        }
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.rows.get(self.offset + self.selected)
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    /// True while a prompt or confirmation owns the keyboard.
    pub fn is_capturing(&self) -> bool {
        !matches!(self.mode, BrowseMode::Normal)
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let narrow = area.width < 110;

        let [title_area, table_area, status_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" Statement  ({})", self.filter.describe())).style(HEADER_STYLE),
            title_area,
        );

        // Date, Name, Particular, [Description], Type, Amount
        let fixed_cols: u16 = 10 + 24 + 20 + 8 + 14;
        let desc_width = table_area.width.saturating_sub(fixed_cols + 5) as usize;
        let desc_width = desc_width.max(10);

        let header_overhead = 2u16;
        let available_height = table_area.height.saturating_sub(header_overhead) as usize;
        let mut rendered_rows = Vec::new();
        let mut total_height = 0usize;
        let mut vis = 0usize;

        for t in self.rows.iter().skip(self.offset) {
            let description = t.description.as_deref().unwrap_or("");
            let (wrapped_desc, line_count) = if narrow {
                (String::new(), 1)
            } else {
                tui::wrap_text(description, desc_width)
            };
            let h = line_count as usize;
            if total_height + h > available_height && vis > 0 {
                break;
            }

            let mut cells = vec![
                Cell::from(t.date.to_string()),
                Cell::from(t.name.clone()),
                Cell::from(t.particular.clone()),
            ];
            if !narrow {
                cells.push(Cell::from(wrapped_desc));
            }
            cells.push(Cell::from(t.kind.as_str()));
            cells.push(Cell::from(Line::from(tui::money_span(t.amount, t.kind)).right_aligned()));

            rendered_rows.push(Row::new(cells).height(line_count));
            total_height += h;
            vis += 1;
        }
        self.visible_count = vis.max(1);

        let mut widths = vec![
            Constraint::Length(10),
            Constraint::Length(24),
            Constraint::Length(20),
        ];
        let mut headers = vec!["Date", "Name", "Particular"];
        if !narrow {
            widths.push(Constraint::Fill(1));
            headers.push("Description");
        }
        widths.push(Constraint::Length(8));
        widths.push(Constraint::Length(14));
        headers.push("Type");
        headers.push("Amount");

        if rendered_rows.is_empty() {
            frame.render_widget(
                Paragraph::new(" No transactions match the current filters.").style(FOOTER_STYLE),
                table_area,
            );
        } else {
            self.table_state.select(Some(self.selected));
            let table = Table::new(rendered_rows, widths)
                .header(Row::new(headers).style(HEADER_STYLE).bottom_margin(1))
                .column_spacing(1)
                .row_highlight_style(SELECTED_STYLE);
            frame.render_stateful_widget(table, table_area, &mut self.table_state);
        }

        let end_row = (self.offset + self.visible_count).min(self.rows.len());
        let first_row = if self.rows.is_empty() { 0 } else { self.offset + 1 };
        let mut status = vec![Span::styled(
            format!(
                " Rows {first_row}-{end_row} of {} | In {} | Out {} | Net {}",
                self.rows.len(),
                money(self.totals.income),
                money(self.totals.expense),
                money(self.totals.balance),
            ),
            FOOTER_STYLE,
        )];
        if let Some(msg) = &self.status_message {
            status.push(Span::styled(format!(" | {msg}"), STATUS_STYLE));
        }
        frame.render_widget(Paragraph::new(Line::from(status)), status_area);

        let keys_widget = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                " \u{2191}/\u{2193}:select  \u{2190}/\u{2192}:page  t:type  c:category  n:name  p:period  d:dates  /:search  x:clear  e:edit  D:delete  E:export  g:goto",
            )
            .style(FOOTER_STYLE),
            BrowseMode::Search(input) => Paragraph::new(format!(" Search: {input}{CURSOR}")),
            BrowseMode::DateRange(input) => Paragraph::new(format!(
                " Date range (YYYY-MM-DD YYYY-MM-DD, either side may be '-'): {input}{CURSOR}"
            )),
            BrowseMode::GotoDate(input) => {
                Paragraph::new(format!(" Jump to date (YYYY-MM-DD): {input}{CURSOR}"))
            }
            BrowseMode::ConfirmDelete(_) => {
                Paragraph::new(" Delete this transaction? y=yes  any other key=cancel").style(STATUS_STYLE)
            }
        };
        frame.render_widget(keys_widget, keys_area);
    }

    pub fn handle_key_event(&mut self, code: KeyCode) -> StatementAction {
        self.status_message = None;

        match &self.mode {
            BrowseMode::Normal => self.handle_normal_key(code),
            BrowseMode::ConfirmDelete(id) => {
                let id = id.clone();
                self.mode = BrowseMode::Normal;
                if code == KeyCode::Char('y') || code == KeyCode::Char('Y') {
                    StatementAction::Delete(id)
                } else {
                    self.status_message = Some("Delete cancelled".to_string());
                    StatementAction::Continue
                }
            }
            BrowseMode::Search(_) | BrowseMode::DateRange(_) | BrowseMode::GotoDate(_) => match code {
                KeyCode::Esc => {
                    self.mode = BrowseMode::Normal;
                    StatementAction::Continue
                }
                KeyCode::Enter => self.submit_input(),
                KeyCode::Backspace => {
                    self.input_backspace();
                    StatementAction::Continue
                }
                KeyCode::Char(c) => {
                    self.input_push(c);
                    StatementAction::Continue
                }
                _ => StatementAction::Continue,
            },
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> StatementAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return StatementAction::Close,
            KeyCode::Down => {
                let on_page = self.visible_count.min(self.rows.len().saturating_sub(self.offset));
                if self.selected + 1 < on_page {
                    self.selected += 1;
                } else if self.offset + self.visible_count < self.rows.len() {
                    self.offset += 1;
                }
            }
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                } else if self.offset > 0 {
                    self.offset -= 1;
                }
            }
            KeyCode::Right | KeyCode::PageDown => {
                self.scroll_down();
                self.selected = 0;
            }
            KeyCode::Left | KeyCode::PageUp => {
                self.scroll_up();
                self.selected = 0;
            }
            KeyCode::Home => {
                self.offset = 0;
                self.selected = 0;
            }
            KeyCode::End => {
                self.scroll_to_end();
                self.selected = 0;
            }
            KeyCode::Char('t') => {
                self.filter.kind = match self.filter.kind {
                    None => Some(TransactionType::Income),
                    Some(TransactionType::Income) => Some(TransactionType::Expense),
                    Some(TransactionType::Expense) => None,
                };
                return self.filter_changed();
            }
            KeyCode::Char('c') => {
                self.filter.category = cycle_option(&self.filter.category, &self.categories);
                return self.filter_changed();
            }
            KeyCode::Char('n') => {
                self.filter.name = cycle_option(&self.filter.name, &self.names);
                return self.filter_changed();
            }
            KeyCode::Char('p') => {
                let next = self.filter.period.next();
                self.filter.set_period(next, self.today);
                return self.filter_changed();
            }
            KeyCode::Char('x') => {
                self.filter.reset();
                return self.filter_changed();
            }
            KeyCode::Char('/') => self.mode = BrowseMode::Search(self.filter.search.clone()),
            KeyCode::Char('d') => self.mode = BrowseMode::DateRange(String::new()),
            KeyCode::Char('g') => self.mode = BrowseMode::GotoDate(String::new()),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(t) = self.selected_transaction() {
                    return StatementAction::Edit(t.id.clone());
                }
            }
            KeyCode::Char('D') | KeyCode::Delete => {
                if let Some(t) = self.selected_transaction() {
                    self.mode = BrowseMode::ConfirmDelete(t.id.clone());
                }
            }
            KeyCode::Char('E') => return StatementAction::Export,
            _ => {}
        }
        StatementAction::Continue
    }

    fn filter_changed(&mut self) -> StatementAction {
        self.offset = 0;
        self.selected = 0;
        StatementAction::FilterChanged
    }

    fn scroll_down(&mut self) {
        let new_offset = self.offset + self.visible_count;
        if new_offset < self.rows.len() {
            self.offset = new_offset;
        }
    }

    fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(self.visible_count);
    }

    fn scroll_to_end(&mut self) {
        self.offset = self.rows.len().saturating_sub(PAGE_SIZE);
    }

    fn input_push(&mut self, c: char) {
        match &mut self.mode {
            BrowseMode::Search(s) | BrowseMode::DateRange(s) | BrowseMode::GotoDate(s) => s.push(c),
            _ => {}
        }
    }

    fn input_backspace(&mut self) {
        match &mut self.mode {
            BrowseMode::Search(s) | BrowseMode::DateRange(s) | BrowseMode::GotoDate(s) => {
                s.pop();
            }
            _ => {}
        }
    }

    fn submit_input(&mut self) -> StatementAction {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        match mode {
            BrowseMode::Search(input) => {
                self.filter.search = input.trim().to_string();
                self.filter_changed()
            }
            BrowseMode::DateRange(input) => match parse_range(&input) {
                Ok((start, end)) => {
                    self.filter.set_range(start, end);
                    self.filter_changed()
                }
                Err(msg) => {
                    self.status_message = Some(msg);
                    StatementAction::Continue
                }
            },
            BrowseMode::GotoDate(input) => {
                match parse_date(&input) {
                    // Rows are newest first: land on the first row on or before the date.
                    Ok(target) => match self.rows.iter().position(|t| t.date <= target) {
                        Some(idx) => {
                            self.offset = idx;
                            self.selected = 0;
                        }
                        None => {
                            self.status_message = Some(format!("No transactions on or before {target}"));
                        }
                    },
                    Err(e) => self.status_message = Some(e.to_string()),
                }
                StatementAction::Continue
            }
            _ => StatementAction::Continue,
        }
    }
}

/// "2024-01-01 2024-03-31", "2024-01-01 -", "- 2024-03-31" or "" (clears).
pub fn parse_range(input: &str) -> std::result::Result<(Option<NaiveDate>, Option<NaiveDate>), String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let side = |s: Option<&&str>| -> std::result::Result<Option<NaiveDate>, String> {
        match s {
            None => Ok(None),
            Some(&"-") => Ok(None),
            Some(raw) => parse_date(raw).map(Some).map_err(|e| e.to_string()),
        }
    };
    if parts.len() > 2 {
        return Err("Enter at most two dates".to_string());
    }
    let start = side(parts.first())?;
    let end = side(parts.get(1))?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(format!("{s} is after {e}"));
        }
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Period;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    fn make_rows(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| Transaction {
                id: format!("t{}", i + 1),
                name: if i % 2 == 0 { "Aman Enterprises" } else { "Office Rent" }.to_string(),
                particular: if i % 2 == 0 { "CARRY IN" } else { "Rent" }.to_string(),
                description: Some(format!("Entry {}", i + 1)),
                amount: 100.0,
                kind: if i % 2 == 0 { TransactionType::Income } else { TransactionType::Expense },
                category: String::new(),
                date: NaiveDate::from_ymd_opt(2025, 1, 28 - (i % 28) as u32).unwrap(),
            })
            .collect()
    }

    fn browser(n: usize) -> StatementBrowser {
        let mut b = StatementBrowser::new(FilterState::default(), today());
        let rows = make_rows(n);
        b.reload(&rows, vec!["Aman Enterprises".into(), "Office Rent".into()], vec!["CARRY IN".into(), "Rent".into()]);
        b
    }

    #[test]
    fn test_scroll_down_and_up() {
        let mut b = browser(50);
        b.scroll_down();
        assert_eq!(b.offset, PAGE_SIZE);
        b.scroll_up();
        assert_eq!(b.offset, 0);
        b.scroll_up();
        assert_eq!(b.offset, 0);
    }

    #[test]
    fn test_scroll_to_end() {
        let mut b = browser(50);
        b.scroll_to_end();
        assert_eq!(b.offset, 50 - PAGE_SIZE);
        let mut small = browser(5);
        small.scroll_to_end();
        assert_eq!(small.offset, 0);
    }

    #[test]
    fn test_selected_row_up_down() {
        let mut b = browser(50);
        b.handle_key_event(KeyCode::Down);
        b.handle_key_event(KeyCode::Down);
        assert_eq!(b.selected, 2);
        b.handle_key_event(KeyCode::Up);
        assert_eq!(b.selected, 1);
        b.handle_key_event(KeyCode::Up);
        b.handle_key_event(KeyCode::Up);
        assert_eq!(b.selected, 0);
    }

    #[test]
    fn test_q_closes() {
        let mut b = browser(5);
        assert!(matches!(b.handle_key_event(KeyCode::Char('q')), StatementAction::Close));
    }

    #[test]
    fn test_type_filter_cycles_and_reloads() {
        let mut b = browser(10);
        let all = make_rows(10);
        assert!(matches!(b.handle_key_event(KeyCode::Char('t')), StatementAction::FilterChanged));
        b.reload(&all, vec![], vec![]);
        assert_eq!(b.filter().kind, Some(TransactionType::Income));
        assert!(b.rows().iter().all(|t| t.kind == TransactionType::Income));
        assert_eq!(b.rows().len(), 5);

        b.handle_key_event(KeyCode::Char('t'));
        assert_eq!(b.filter().kind, Some(TransactionType::Expense));
        b.handle_key_event(KeyCode::Char('t'));
        assert_eq!(b.filter().kind, None);
    }

    #[test]
    fn test_category_and_name_cycle() {
        let mut b = browser(4);
        b.handle_key_event(KeyCode::Char('c'));
        assert_eq!(b.filter().category.as_deref(), Some("CARRY IN"));
        b.handle_key_event(KeyCode::Char('c'));
        assert_eq!(b.filter().category.as_deref(), Some("Rent"));
        b.handle_key_event(KeyCode::Char('c'));
        assert_eq!(b.filter().category, None);

        b.handle_key_event(KeyCode::Char('n'));
        assert_eq!(b.filter().name.as_deref(), Some("Aman Enterprises"));
    }

    #[test]
    fn test_period_key_sets_dates() {
        let mut b = browser(4);
        b.handle_key_event(KeyCode::Char('p'));
        assert_eq!(b.filter().period, Period::ThisMonth);
        assert_eq!(b.filter().start, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(b.filter().end, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_search_input() {
        let mut b = browser(10);
        b.handle_key_event(KeyCode::Char('/'));
        for c in "entry 1".chars() {
            b.handle_key_event(KeyCode::Char(c));
        }
        assert!(matches!(b.handle_key_event(KeyCode::Enter), StatementAction::FilterChanged));
        assert_eq!(b.filter().search, "entry 1");
        b.reload(&make_rows(10), vec![], vec![]);
        // "Entry 1" and "Entry 10"
        assert_eq!(b.rows().len(), 2);
    }

    #[test]
    fn test_date_range_input() {
        let mut b = browser(10);
        b.handle_key_event(KeyCode::Char('d'));
        for c in "2025-01-20 2025-01-25".chars() {
            b.handle_key_event(KeyCode::Char(c));
        }
        b.handle_key_event(KeyCode::Enter);
        assert_eq!(b.filter().period, Period::Custom);
        b.reload(&make_rows(10), vec![], vec![]);
        assert!(b.rows().iter().all(|t| t.date.to_string().as_str() >= "2025-01-20"));
        assert_eq!(b.rows().len(), 6);
    }

    #[test]
    fn test_bad_date_range_keeps_filter() {
        let mut b = browser(3);
        b.handle_key_event(KeyCode::Char('d'));
        for c in "2025-02-01 2025-01-01".chars() {
            b.handle_key_event(KeyCode::Char(c));
        }
        assert!(matches!(b.handle_key_event(KeyCode::Enter), StatementAction::Continue));
        assert_eq!(b.filter(), &FilterState::default());
        assert!(b.status_message.as_ref().unwrap().contains("after"));
    }

    #[test]
    fn test_reset_filters() {
        let mut b = browser(3);
        b.handle_key_event(KeyCode::Char('t'));
        b.handle_key_event(KeyCode::Char('x'));
        assert!(!b.filter().is_active());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut b = browser(3);
        b.handle_key_event(KeyCode::Char('D'));
        assert!(matches!(b.mode, BrowseMode::ConfirmDelete(_)));
        assert!(matches!(b.handle_key_event(KeyCode::Char('n')), StatementAction::Continue));

        b.handle_key_event(KeyCode::Char('D'));
        match b.handle_key_event(KeyCode::Char('y')) {
            StatementAction::Delete(id) => assert_eq!(id, "t1"),
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn test_edit_and_export_actions() {
        let mut b = browser(3);
        b.handle_key_event(KeyCode::Down);
        match b.handle_key_event(KeyCode::Char('e')) {
            StatementAction::Edit(id) => assert_eq!(id, "t2"),
            _ => panic!("expected edit"),
        }
        assert!(matches!(b.handle_key_event(KeyCode::Char('E')), StatementAction::Export));
    }

    #[test]
    fn test_goto_date() {
        let mut b = browser(20);
        b.mode = BrowseMode::GotoDate("2025-01-20".to_string());
        b.submit_input();
        assert_eq!(b.offset, 8);

        b.mode = BrowseMode::GotoDate("2024-01-01".to_string());
        b.submit_input();
        assert!(b.status_message.as_ref().unwrap().contains("2024-01-01"));
    }

    #[test]
    fn test_reload_clamps_selection() {
        let mut b = browser(10);
        b.selected = 9;
        b.reload(&make_rows(3), vec![], vec![]);
        assert_eq!(b.selected, 2);
        b.reload(&[], vec![], vec![]);
        assert_eq!(b.selected, 0);
        assert!(b.selected_transaction().is_none());
    }

    #[test]
    fn test_parse_range() {
        let (s, e) = parse_range("2024-01-01 -").unwrap();
        assert_eq!(s, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(e, None);
        assert_eq!(parse_range("").unwrap(), (None, None));
        assert!(parse_range("a b c").is_err());
        assert!(parse_range("2024-13-01").is_err());
    }
}
