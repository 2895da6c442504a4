use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::fmt::{money, month_name, short_month};
use crate::models::{Transaction, TransactionType};
use crate::reports::{self, quarter_of, Report, ReportKind};
use crate::statement::parse_range;
use crate::tui::{balance_span, money_span, CURSOR, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE};

const KINDS: [&str; 6] = ["Monthly", "Quarterly", "Annual", "Customer", "Category", "Custom"];

const MONTHLY: usize = 0;
const QUARTERLY: usize = 1;
const ANNUAL: usize = 2;
const CUSTOMER: usize = 3;
const CATEGORY: usize = 4;
const CUSTOM: usize = 5;

const HEADER_ROW_STYLE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);

pub enum ReportAction {
    Continue,
    Close,
    /// Write the current report to PDF.
    ExportPdf,
}

/// Report builder screen: pick a kind and its parameters, see the result.
pub struct ReportPanel {
    txns: Vec<Transaction>,
    today: NaiveDate,
    years: Vec<i32>,
    kind: usize,
    year: i32,
    month: u32,
    quarter: u32,
    customers: Vec<String>,
    customer: usize,
    categories: Vec<String>,
    category: usize,
    range: Option<(NaiveDate, NaiveDate)>,
    range_input: Option<String>,
    report: Option<Report>,
    offset: usize,
    visible_count: usize,
    status_message: Option<String>,
}

impl ReportPanel {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            txns: Vec::new(),
            today,
            years: vec![today.year()],
            kind: MONTHLY,
            year: today.year(),
            month: today.month(),
            quarter: quarter_of(today),
            customers: Vec::new(),
            customer: 0,
            categories: Vec::new(),
            category: 0,
            range: None,
            range_input: None,
            report: None,
            offset: 0,
            visible_count: 10,
            status_message: None,
        }
    }

    /// Take a fresh copy of the ledger and rebuild the current report.
    pub fn reload(&mut self, txns: &[Transaction]) {
        self.txns = txns.to_vec();
        self.years = reports::years(txns, self.today);
        self.customers = reports::customers(txns);
        self.categories = reports::categories(txns);
        self.customer = self.customer.min(self.customers.len().saturating_sub(1));
        self.category = self.category.min(self.categories.len().saturating_sub(1));
        self.rebuild();
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn is_capturing(&self) -> bool {
        self.range_input.is_some()
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    /// The report kind for the current selection, or `None` when a
    /// parameter is missing (no customers yet, no custom range entered).
    pub fn current_kind(&self) -> Option<ReportKind> {
        match self.kind {
            MONTHLY => Some(ReportKind::Monthly { year: self.year, month: self.month }),
            QUARTERLY => Some(ReportKind::Quarterly { year: self.year, quarter: self.quarter }),
            ANNUAL => Some(ReportKind::Annual { year: self.year }),
            CUSTOMER => self.customers.get(self.customer).cloned().map(ReportKind::Customer),
            CATEGORY => self.categories.get(self.category).cloned().map(ReportKind::Category),
            _ => self.range.map(|(from, to)| ReportKind::Custom { from, to }),
        }
    }

    fn rebuild(&mut self) {
        self.offset = 0;
        self.report = match self.current_kind() {
            Some(kind) => match reports::build(&self.txns, kind) {
                Ok(r) => Some(r),
                Err(e) => {
                    self.status_message = Some(e.to_string());
                    None
                }
            },
            None => None,
        };
    }

    fn parameter_label(&self) -> String {
        match self.kind {
            MONTHLY => format!("{} {}", month_name(self.month), self.year),
            QUARTERLY => format!("Q{} {}", self.quarter, self.year),
            ANNUAL => self.year.to_string(),
            CUSTOMER => self
                .customers
                .get(self.customer)
                .cloned()
                .unwrap_or_else(|| "(no customers)".to_string()),
            CATEGORY => self
                .categories
                .get(self.category)
                .cloned()
                .unwrap_or_else(|| "(no categories)".to_string()),
            _ => match self.range {
                Some((from, to)) => format!("{from} to {to}"),
                None => "press d to enter a date range".to_string(),
            },
        }
    }

    fn step_parameter(&mut self, delta: i32) {
        match self.kind {
            MONTHLY => {
                let mut m = self.month as i32 + delta;
                let mut y = self.year;
                if m < 1 {
                    m = 12;
                    y -= 1;
                } else if m > 12 {
                    m = 1;
                    y += 1;
                }
                self.month = m as u32;
                self.year = y;
            }
            QUARTERLY => {
                let mut q = self.quarter as i32 + delta;
                let mut y = self.year;
                if q < 1 {
                    q = 4;
                    y -= 1;
                } else if q > 4 {
                    q = 1;
                    y += 1;
                }
                self.quarter = q as u32;
                self.year = y;
            }
            ANNUAL => self.year += delta,
            CUSTOMER => self.customer = step_index(self.customer, self.customers.len(), delta),
            CATEGORY => self.category = step_index(self.category, self.categories.len(), delta),
            _ => return,
        }
        self.rebuild();
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let [kinds_area, param_area, summary_area, table_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let mut kind_spans = vec![Span::raw(" ")];
        for (i, label) in KINDS.iter().enumerate() {
            let style = if i == self.kind {
                HEADER_STYLE.add_modifier(Modifier::REVERSED)
            } else {
                FOOTER_STYLE
            };
            kind_spans.push(Span::styled(format!(" {label} "), style));
            kind_spans.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(kind_spans)), kinds_area);

        let param = match &self.range_input {
            Some(input) => format!(" Range (YYYY-MM-DD YYYY-MM-DD): {input}{CURSOR}"),
            None => format!(" \u{25c2} {} \u{25b8}", self.parameter_label()),
        };
        frame.render_widget(
            Paragraph::new(param).style(Style::default().add_modifier(Modifier::BOLD)),
            param_area,
        );

        let Some(report) = &self.report else {
            frame.render_widget(Paragraph::new(" No report selected."), summary_area);
            self.draw_keys(frame, keys_area);
            return;
        };

        let summary = vec![
            Line::from(Span::styled(
                format!(" {}  \u{00b7}  {}  \u{00b7}  {} records", report.title, report.period, report.rows.len()),
                HEADER_STYLE,
            )),
            Line::from(vec![
                Span::raw(" Cash In "),
                money_span(report.totals.income, TransactionType::Income),
                Span::raw("   Cash Out "),
                money_span(report.totals.expense, TransactionType::Expense),
                Span::raw("   Net "),
                balance_span(report.totals.balance),
            ]),
        ];
        frame.render_widget(Paragraph::new(summary), summary_area);

        let [ledger_area, flow_area] =
            Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).areas(table_area);

        let visible = ledger_area.height.saturating_sub(2) as usize;
        self.visible_count = visible.max(1);
        let rows: Vec<Row> = report
            .rows
            .iter()
            .skip(self.offset)
            .take(visible)
            .map(|t| {
                let (cash_in, cash_out) = match t.kind {
                    TransactionType::Income => (money(t.amount), "-".to_string()),
                    TransactionType::Expense => ("-".to_string(), money(t.amount)),
                };
                Row::new(vec![
                    Cell::from(t.date.to_string()),
                    Cell::from(t.name.clone()),
                    Cell::from(t.particular.clone()),
                    Cell::from(cash_in),
                    Cell::from(cash_out),
                ])
            })
            .collect();
        let ledger = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Fill(2),
                Constraint::Fill(1),
                Constraint::Length(14),
                Constraint::Length(14),
            ],
        )
        .header(
            Row::new(vec!["Date", "Entity Name", "Category", "Cash In", "Cash Out"])
                .style(HEADER_ROW_STYLE)
                .bottom_margin(1),
        )
        .column_spacing(2);
        frame.render_widget(ledger, ledger_area);

        let flow: Vec<Row> = report
            .cashflow
            .iter()
            .map(|m| {
                Row::new(vec![
                    Cell::from(short_month(&m.month)),
                    Cell::from(money(m.net)),
                    Cell::from(money(m.running_balance)),
                ])
            })
            .collect();
        let flow = Table::new(
            flow,
            [Constraint::Length(9), Constraint::Fill(1), Constraint::Fill(1)],
        )
        .header(
            Row::new(vec!["Month", "Net", "Running"])
                .style(HEADER_ROW_STYLE)
                .bottom_margin(1),
        )
        .column_spacing(2);
        frame.render_widget(flow, flow_area);

        self.draw_keys(frame, keys_area);
    }

    fn draw_keys(&self, frame: &mut Frame, area: Rect) {
        let widget = if let Some(msg) = &self.status_message {
            Paragraph::new(format!(" {msg}")).style(STATUS_STYLE)
        } else if self.range_input.is_some() {
            Paragraph::new(" Enter=apply  Esc=cancel").style(FOOTER_STYLE)
        } else {
            Paragraph::new(
                " \u{2190}/\u{2192}=kind  \u{2191}/\u{2193}=period  [/]=year  d=range  PgUp/PgDn=scroll  P=PDF  q=back",
            )
            .style(FOOTER_STYLE)
        };
        frame.render_widget(widget, area);
    }

    pub fn handle_key(&mut self, code: KeyCode) -> ReportAction {
        self.status_message = None;

        if let Some(input) = &mut self.range_input {
            match code {
                KeyCode::Esc => self.range_input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                KeyCode::Enter => {
                    let input = input.clone();
                    self.range_input = None;
                    self.apply_range(&input);
                }
                _ => {}
            }
            return ReportAction::Continue;
        }

        let rows = self.report.as_ref().map_or(0, |r| r.rows.len());
        let max = rows.saturating_sub(self.visible_count);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ReportAction::Close,
            KeyCode::Left => {
                self.kind = (self.kind + KINDS.len() - 1) % KINDS.len();
                self.rebuild();
            }
            KeyCode::Right => {
                self.kind = (self.kind + 1) % KINDS.len();
                self.rebuild();
            }
            KeyCode::Up => self.step_parameter(-1),
            KeyCode::Down => self.step_parameter(1),
            // Jump between years that have entries
            KeyCode::Char('[') if self.kind <= ANNUAL => {
                if let Some(y) = self.years.iter().copied().find(|y| *y < self.year) {
                    self.year = y;
                    self.rebuild();
                }
            }
            KeyCode::Char(']') if self.kind <= ANNUAL => {
                if let Some(y) = self.years.iter().rev().copied().find(|y| *y > self.year) {
                    self.year = y;
                    self.rebuild();
                }
            }
            KeyCode::Char('d') => {
                self.kind = CUSTOM;
                self.range_input = Some(String::new());
            }
            KeyCode::PageUp => self.offset = self.offset.saturating_sub(self.visible_count),
            KeyCode::PageDown => self.offset = (self.offset + self.visible_count).min(max),
            KeyCode::Char('P') => {
                if self.report.is_some() {
                    return ReportAction::ExportPdf;
                }
                self.status_message = Some("Nothing to export".to_string());
            }
            _ => {}
        }
        ReportAction::Continue
    }

    fn apply_range(&mut self, input: &str) {
        match parse_range(input) {
            Ok((Some(from), Some(to))) if from <= to => {
                self.range = Some((from, to));
                self.rebuild();
            }
            Ok((Some(_), Some(_))) => self.status_message = Some("Start date is after end date".to_string()),
            Ok(_) => self.status_message = Some("Enter both a start and an end date".to_string()),
            Err(msg) => self.status_message = Some(msg),
        }
    }
}

fn step_index(current: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    (current as i64 + delta as i64).rem_euclid(len as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(id: &str, name: &str, particular: &str, date: NaiveDate) -> Transaction {
        Transaction {
            id: id.to_string(),
            name: name.to_string(),
            particular: particular.to_string(),
            description: None,
            amount: 100.0,
            kind: TransactionType::Income,
            category: particular.to_string(),
            date,
        }
    }

    fn panel() -> ReportPanel {
        let mut p = ReportPanel::new(d(2024, 5, 10));
        p.reload(&[
            txn("1", "Aman Enterprises", "Client Payment", d(2024, 5, 2)),
            txn("2", "Global Solutions", "Rent", d(2024, 4, 20)),
            txn("3", "Aman Enterprises", "Client Payment", d(2023, 12, 1)),
        ]);
        p
    }

    fn ids(p: &ReportPanel) -> Vec<String> {
        p.report().unwrap().rows.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_starts_on_current_month() {
        let p = panel();
        assert_eq!(p.current_kind(), Some(ReportKind::Monthly { year: 2024, month: 5 }));
        assert_eq!(ids(&p), vec!["1"]);
    }

    #[test]
    fn test_month_steps_across_year() {
        let mut p = panel();
        for _ in 0..5 {
            p.handle_key(KeyCode::Up);
        }
        assert_eq!(p.current_kind(), Some(ReportKind::Monthly { year: 2023, month: 12 }));
        assert_eq!(ids(&p), vec!["3"]);
    }

    #[test]
    fn test_kind_cycle_and_quarter() {
        let mut p = panel();
        p.handle_key(KeyCode::Right);
        assert_eq!(p.current_kind(), Some(ReportKind::Quarterly { year: 2024, quarter: 2 }));
        assert_eq!(ids(&p), vec!["1", "2"]);
        p.handle_key(KeyCode::Right);
        p.handle_key(KeyCode::Char('['));
        assert_eq!(p.current_kind(), Some(ReportKind::Annual { year: 2023 }));
        p.handle_key(KeyCode::Left);
        p.handle_key(KeyCode::Left);
        p.handle_key(KeyCode::Left);
        assert_eq!(p.current_kind(), None);
    }

    #[test]
    fn test_year_keys_skip_to_years_with_data() {
        let mut p = panel();
        p.handle_key(KeyCode::Char(']'));
        assert_eq!(p.current_kind(), Some(ReportKind::Monthly { year: 2024, month: 5 }));
        p.handle_key(KeyCode::Char('['));
        p.handle_key(KeyCode::Char('['));
        assert_eq!(p.current_kind(), Some(ReportKind::Monthly { year: 2023, month: 5 }));
    }

    #[test]
    fn test_customer_and_category_lists() {
        let mut p = panel();
        for _ in 0..3 {
            p.handle_key(KeyCode::Right);
        }
        assert_eq!(p.current_kind(), Some(ReportKind::Customer("Aman Enterprises".to_string())));
        assert_eq!(ids(&p), vec!["1", "3"]);
        p.handle_key(KeyCode::Down);
        assert_eq!(p.current_kind(), Some(ReportKind::Customer("Global Solutions".to_string())));
        p.handle_key(KeyCode::Down);
        assert_eq!(p.current_kind(), Some(ReportKind::Customer("Aman Enterprises".to_string())));

        p.handle_key(KeyCode::Right);
        p.handle_key(KeyCode::Up);
        assert_eq!(p.current_kind(), Some(ReportKind::Category("Rent".to_string())));
    }

    #[test]
    fn test_custom_range_input() {
        let mut p = panel();
        p.handle_key(KeyCode::Char('d'));
        assert!(p.is_capturing());
        for c in "2024-04-01 2024-05-31".chars() {
            p.handle_key(KeyCode::Char(c));
        }
        p.handle_key(KeyCode::Enter);
        assert!(!p.is_capturing());
        assert_eq!(ids(&p), vec!["1", "2"]);
        assert_eq!(p.report().unwrap().period, "Range: 2024-04-01 to 2024-05-31");
    }

    #[test]
    fn test_reversed_range_rejected() {
        let mut p = panel();
        p.handle_key(KeyCode::Char('d'));
        for c in "2024-05-31 2024-04-01".chars() {
            p.handle_key(KeyCode::Char(c));
        }
        p.handle_key(KeyCode::Enter);
        assert!(p.report().is_none());
        assert!(p.status_message.is_some());
    }

    #[test]
    fn test_export_and_close() {
        let mut p = panel();
        assert!(matches!(p.handle_key(KeyCode::Char('P')), ReportAction::ExportPdf));
        assert!(matches!(p.handle_key(KeyCode::Esc), ReportAction::Close));
    }

    #[test]
    fn test_empty_ledger_has_no_customer_report() {
        let mut p = ReportPanel::new(d(2024, 5, 10));
        p.reload(&[]);
        p.handle_key(KeyCode::Right);
        p.handle_key(KeyCode::Right);
        p.handle_key(KeyCode::Right);
        assert!(p.report().is_none());
        assert!(matches!(p.handle_key(KeyCode::Char('P')), ReportAction::Continue));
    }
}
