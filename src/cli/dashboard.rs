use std::path::PathBuf;

use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};
use zeroize::Zeroizing;

use crate::auth;
use crate::cli::dev_console::{ConnectionInfo, DevAction, DevConsole};
use crate::cli::report_view::{ReportAction, ReportPanel};
use crate::cli::user_manager::{UserAction, UserManager};
use crate::cli::{connect_backend, export, today};
use crate::db::open_data_dir;
use crate::error::Result;
use crate::filter::{cycle_option, FilterState, Period};
use crate::fmt::{compact, number, short_month};
use crate::form::{EntryForm, FormAction};
use crate::ledger::LedgerStore;
use crate::logging::log_path;
use crate::models::{Transaction, TransactionType, User};
use crate::settings::{self, load_settings, remote_credentials, Settings};
use crate::statement::{StatementAction, StatementBrowser};
use crate::stats::DashboardStats;
use crate::tui::{
    balance_span, centered_rect, mask, money_span, run_screen, Screen, ScreenAction, BRAND_STYLE,
    CURSOR, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE,
};
use crate::views::View;

const TREND_MONTHS: usize = 6;
const RECENT_ROWS: usize = 8;

struct LoginForm {
    username: String,
    password: Zeroizing<String>,
    on_password: bool,
    error: Option<String>,
}

impl LoginForm {
    fn new() -> Self {
        Self {
            username: String::new(),
            password: Zeroizing::new(String::new()),
            on_password: false,
            error: None,
        }
    }
}

/// The interactive application: login, then the five tabbed screens with
/// the entry form as an overlay.
pub struct App {
    store: LedgerStore,
    settings: Settings,
    data_dir: PathBuf,
    today: NaiveDate,
    user: Option<User>,
    login: LoginForm,
    view: View,
    filter: FilterState,
    recent: usize,
    statement: StatementBrowser,
    reports: ReportPanel,
    users: Option<UserManager>,
    console: DevConsole,
    form: Option<EntryForm>,
    status_message: Option<String>,
}

impl App {
    pub fn new(store: LedgerStore, settings: Settings, data_dir: PathBuf, today: NaiveDate) -> Self {
        let mut app = Self {
            store,
            settings,
            data_dir,
            today,
            user: None,
            login: LoginForm::new(),
            view: View::Dashboard,
            filter: FilterState::default(),
            recent: 0,
            statement: StatementBrowser::new(FilterState::default(), today),
            reports: ReportPanel::new(today),
            users: None,
            console: DevConsole::new(ConnectionInfo::default()),
            form: None,
            status_message: None,
        };
        app.sync();
        app
    }

    /// Push the current ledger into every screen after a change.
    fn sync(&mut self) {
        let all = self.store.transactions();
        // Home, History and the CSV export share one filter
        self.statement.set_filter(self.filter.clone());
        self.statement
            .reload(all, self.store.names(), self.store.category_choices());
        self.reports.reload(all);
        let recent = self.recent_rows().len();
        self.recent = self.recent.min(recent.saturating_sub(1));
        let info = self.connection_info();
        self.console.update(info);
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            connected: self.store.is_connected(),
            backend: self.store.backend_description(),
            credentials: remote_credentials(&self.settings),
            last_error: self.store.last_error().map(str::to_string),
            cached: self.store.transactions().len(),
            log_path: log_path(&self.data_dir),
        }
    }

    fn recent_rows(&self) -> Vec<Transaction> {
        let mut rows = self.filter.apply(self.store.transactions());
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(RECENT_ROWS);
        rows
    }

    fn role_views(&self) -> &'static [View] {
        match &self.user {
            Some(u) => View::available(u.role),
            None => &[],
        }
    }

    fn set_view(&mut self, view: View) {
        let Some(user) = &self.user else {
            return;
        };
        if !view.is_allowed(user.role) {
            self.status_message = Some(format!("{} is for administrators only", view.label()));
            return;
        }
        if view == View::Admin && self.users.is_none() {
            self.users = Some(UserManager::new(self.store.conn(), user));
        }
        self.view = view;
    }

    fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            log::info!("user '{}' logged out", user.username);
        }
        self.login = LoginForm::new();
        self.form = None;
        self.users = None;
        self.view = View::Dashboard;
        self.status_message = None;
        self.filter.reset();
        self.sync();
    }

    fn refresh(&mut self) {
        if !self.store.has_backend() {
            self.status_message = Some("No remote configured; showing local data".to_string());
            return;
        }
        self.status_message = Some(if self.store.refresh() {
            format!("Synced {} transactions", number(self.store.transactions().len()))
        } else {
            format!(
                "Offline: {}",
                self.store.last_error().unwrap_or("remote unavailable")
            )
        });
        self.sync();
    }

    fn reconnect(&mut self) {
        match connect_backend(&self.settings) {
            Ok(backend) => {
                self.store.set_backend(backend);
                if self.store.has_backend() {
                    self.refresh();
                    let msg = self.status_message.clone().unwrap_or_default();
                    self.console.set_status(msg);
                } else {
                    self.sync();
                    self.console.set_status("Remote not configured; using the local cache".to_string());
                }
            }
            Err(e) => {
                self.store.set_backend(None);
                self.sync();
                self.console.set_status(e.to_string());
            }
        }
    }

    fn open_new_form(&mut self) {
        self.form = Some(EntryForm::new(
            self.today,
            self.store.names(),
            self.store.category_choices(),
        ));
    }

    fn open_edit_form(&mut self, id: &str) {
        match self.store.get(id) {
            Some(t) => {
                self.form = Some(EntryForm::edit(t, self.store.names(), self.store.category_choices()));
            }
            None => self.status_message = Some(format!("Transaction {id} no longer exists")),
        }
    }

    fn delete(&mut self, id: &str) -> String {
        match self.store.delete(id) {
            Ok(t) => format!("Deleted {} ({})", t.name, t.date),
            Err(e) => format!("Error: {e}"),
        }
    }

    // -----------------------------------------------------------------------
    // Key handling
    // -----------------------------------------------------------------------

    fn handle_login_key(&mut self, code: KeyCode) -> ScreenAction {
        let login = &mut self.login;
        match code {
            KeyCode::Esc => return ScreenAction::Quit,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                login.on_password = !login.on_password;
            }
            KeyCode::Backspace => {
                if login.on_password {
                    login.password.pop();
                } else {
                    login.username.pop();
                }
            }
            KeyCode::Char(c) => {
                if login.on_password {
                    login.password.push(c);
                } else {
                    login.username.push(c);
                }
            }
            KeyCode::Enter if !login.on_password => login.on_password = true,
            KeyCode::Enter => match auth::authenticate(self.store.conn(), &login.username, &login.password) {
                Ok(user) => {
                    self.status_message = Some(format!("Welcome, {}", user.name));
                    self.user = Some(user);
                    self.login = LoginForm::new();
                    self.view = View::Dashboard;
                }
                Err(e) => {
                    login.password = Zeroizing::new(String::new());
                    login.error = Some(e.to_string());
                }
            },
            _ => {}
        }
        ScreenAction::Continue
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        let Some(form) = &mut self.form else {
            return;
        };
        let msg = match form.handle_key(code) {
            FormAction::Continue => return,
            FormAction::Cancel => None,
            FormAction::Create(new) => Some(match self.store.add(new) {
                Ok(t) => format!("Added {} {}", t.kind, t.name),
                Err(e) => format!("Error: {e}"),
            }),
            FormAction::Update(txn) => Some(match self.store.update(txn) {
                Ok(()) => "Transaction updated".to_string(),
                Err(e) => format!("Error: {e}"),
            }),
            FormAction::Delete(id) => Some(self.delete(&id)),
        };
        self.form = None;
        if let Some(msg) = msg {
            if self.store.has_backend() && !self.store.is_connected() {
                self.status_message = Some(format!("{msg} (saved locally, offline)"));
            } else {
                self.status_message = Some(msg);
            }
        }
        self.sync();
    }

    fn view_is_capturing(&self) -> bool {
        match self.view {
            View::Dashboard => false,
            View::Statement => self.statement.is_capturing(),
            View::Reports => self.reports.is_capturing(),
            View::Admin => self.users.as_ref().is_some_and(UserManager::is_capturing),
            View::DevConsole => self.console.is_capturing(),
        }
    }

    /// Keys that work on every screen. Returns true when consumed.
    fn handle_global_key(&mut self, code: KeyCode) -> bool {
        let Some(role) = self.user.as_ref().map(|u| u.role) else {
            return false;
        };
        match code {
            KeyCode::Tab => self.set_view(self.view.next(role)),
            KeyCode::BackTab => self.set_view(self.view.prev(role)),
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                match View::from_index(idx, role) {
                    Some(view) => self.set_view(view),
                    None => self.status_message = Some("That screen is for administrators only".to_string()),
                }
            }
            // Admin uses 'a' for users; Dev uses 'r' for reconnect.
            KeyCode::Char('a') if self.view != View::Admin => self.open_new_form(),
            KeyCode::Char('r') if self.view != View::DevConsole => self.refresh(),
            KeyCode::Char('L') => self.logout(),
            _ => return false,
        }
        true
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) -> ScreenAction {
        let recent = self.recent_rows();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Quit,
            KeyCode::Up => self.recent = self.recent.saturating_sub(1),
            KeyCode::Down => {
                if !recent.is_empty() {
                    self.recent = (self.recent + 1).min(recent.len() - 1);
                }
            }
            KeyCode::Enter => {
                if let Some(t) = recent.get(self.recent) {
                    let id = t.id.clone();
                    self.open_edit_form(&id);
                }
            }
            KeyCode::Char('p') => {
                let next = self.filter.period.next();
                self.filter.set_period(next, self.today);
                self.filter_changed();
            }
            KeyCode::Char('t') => {
                self.filter.kind = match self.filter.kind {
                    None => Some(TransactionType::Income),
                    Some(TransactionType::Income) => Some(TransactionType::Expense),
                    Some(TransactionType::Expense) => None,
                };
                self.filter_changed();
            }
            KeyCode::Char('c') => {
                let choices = self.store.particulars();
                self.filter.category = cycle_option(&self.filter.category, &choices);
                self.filter_changed();
            }
            KeyCode::Char('x') => {
                self.filter.reset();
                self.filter_changed();
            }
            _ => {}
        }
        ScreenAction::Continue
    }

    fn filter_changed(&mut self) {
        self.recent = 0;
        self.sync();
    }

    fn handle_statement_key(&mut self, code: KeyCode) {
        match self.statement.handle_key_event(code) {
            StatementAction::Continue => {}
            StatementAction::Close => self.view = View::Dashboard,
            StatementAction::FilterChanged => {
                self.filter = self.statement.filter().clone();
                self.recent = 0;
                self.sync();
            }
            StatementAction::Edit(id) => self.open_edit_form(&id),
            StatementAction::Delete(id) => {
                let msg = self.delete(&id);
                self.sync();
                self.statement.set_status(msg);
            }
            StatementAction::Export => {
                let msg = match export::save_csv(
                    self.statement.rows(),
                    &self.data_dir,
                    &self.settings.company_name,
                    self.today,
                    None,
                ) {
                    Ok(Some(path)) => format!("Wrote {}", path.display()),
                    Ok(None) => "No transactions to export.".to_string(),
                    Err(e) => format!("Export failed: {e}"),
                };
                self.statement.set_status(msg);
            }
        }
    }

    fn handle_reports_key(&mut self, code: KeyCode) {
        match self.reports.handle_key(code) {
            ReportAction::Continue => {}
            ReportAction::Close => self.view = View::Dashboard,
            ReportAction::ExportPdf => {
                let Some(report) = self.reports.report() else {
                    return;
                };
                let msg = match export::save_report_pdf(
                    report,
                    &self.settings.company_name,
                    &self.data_dir,
                    None,
                ) {
                    Ok(path) => format!("Wrote {}", path.display()),
                    Err(e) => format!("Export failed: {e}"),
                };
                self.reports.set_status(msg);
            }
        }
    }

    fn handle_admin_key(&mut self, code: KeyCode) {
        let Some(users) = &mut self.users else {
            self.view = View::Dashboard;
            return;
        };
        if let UserAction::Close = users.handle_key(code, self.store.conn()) {
            self.view = View::Dashboard;
        }
    }

    fn handle_console_key(&mut self, code: KeyCode) {
        match self.console.handle_key(code) {
            DevAction::Continue => {}
            DevAction::Close => self.view = View::Dashboard,
            DevAction::Reconnect => self.reconnect(),
            DevAction::Save { url, key } => match settings::save_credentials(&url, &key) {
                Ok(()) => {
                    self.settings = load_settings();
                    self.reconnect();
                }
                Err(e) => self.console.set_status(e.to_string()),
            },
            DevAction::Clear => match settings::clear_credentials() {
                Ok(()) => {
                    self.settings = load_settings();
                    self.reconnect();
                }
                Err(e) => self.console.set_status(e.to_string()),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_login(&self, frame: &mut Frame) {
        let area = centered_rect(frame.area(), 48, 11);
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(format!(" {} ", self.settings.company_name), BRAND_STYLE));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let field = |label: &str, value: String, focused: bool| {
            let cursor = if focused { CURSOR } else { "" };
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!(" {label:<10}"), style),
                Span::raw(format!("{value}{cursor}")),
            ])
        };
        let login = &self.login;
        let mut lines = vec![
            Line::from(Span::styled(" Sign in", HEADER_STYLE)),
            Line::from(""),
            field("Username", login.username.clone(), !login.on_password),
            field("Password", mask(&login.password), login.on_password),
            Line::from(""),
        ];
        if let Some(err) = &login.error {
            lines.push(Line::from(Span::styled(format!(" {err}"), STATUS_STYLE)));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Tab=switch  Enter=sign in  Esc=quit",
            FOOTER_STYLE,
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_header(&self, frame: &mut Frame, brand_area: Rect, nav_area: Rect) {
        let Some(user) = &self.user else {
            return;
        };
        let conn = if self.store.is_connected() {
            Span::styled("\u{25cf} Online", Style::default().fg(Color::Green))
        } else {
            Span::styled("\u{25cb} Offline", Style::default().fg(Color::Red))
        };
        let brand = Line::from(vec![
            Span::styled(format!(" {} ", self.settings.company_name), BRAND_STYLE),
            Span::raw(format!("  {} ({})  ", user.name, user.role)),
            conn,
        ]);
        frame.render_widget(Paragraph::new(brand), brand_area);

        let views = self.role_views();
        let titles: Vec<String> = views
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{} {}", i + 1, v.label()))
            .collect();
        let selected = views.iter().position(|v| *v == self.view).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .style(FOOTER_STYLE)
            .highlight_style(HEADER_STYLE.add_modifier(Modifier::REVERSED))
            .divider(" ");
        frame.render_widget(tabs, nav_area);
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect) {
        let stats = DashboardStats::compute(self.store.transactions(), &self.filter);

        let [top_area, sep, recent_area, hints_area] = Layout::vertical([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let [stats_area, chart_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(top_area);

        let stats_lines = vec![
            Line::from(Span::styled(" Overview", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(vec![
                Span::raw(" Total Cash In    "),
                money_span(stats.totals.income, TransactionType::Income),
            ]),
            Line::from(vec![
                Span::raw(" Total Cash Out   "),
                money_span(stats.totals.expense, TransactionType::Expense),
            ]),
            Line::from(vec![Span::raw(" Net Balance      "), balance_span(stats.totals.balance)]),
            Line::from(format!(" Entries          {}", number(stats.count))),
            Line::from(""),
            Line::from(Span::styled(
                if self.filter.is_active() {
                    format!(" {}  (x=reset)", self.filter.describe())
                } else {
                    format!(" {}", self.filter.describe())
                },
                FOOTER_STYLE,
            )),
        ];
        frame.render_widget(Paragraph::new(stats_lines), stats_area);

        self.draw_trend(frame, chart_area, &stats);

        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep,
        );

        let mut lines = vec![Line::from(Span::styled(
            " Recent Entries",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        let recent = self.recent_rows();
        if recent.is_empty() {
            lines.push(Line::from(Span::styled(" No transactions match.", FOOTER_STYLE)));
        }
        for (i, t) in recent.iter().enumerate() {
            let marker = if i == self.recent { ">" } else { " " };
            let style = if i == self.recent {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} {}  {:<24} {:<18} ", t.date, truncate(&t.name, 24), truncate(&t.particular, 18)), style),
                money_span(t.amount, t.kind),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), recent_area);

        self.draw_hints(
            frame,
            hints_area,
            " a=add  Enter=edit  p=period  t=type  c=category  x=reset  r=refresh  Tab=next  L=logout  q=quit",
        );
    }

    fn draw_trend(&self, frame: &mut Frame, area: Rect, stats: &DashboardStats) {
        let months: Vec<_> = stats
            .monthly
            .iter()
            .skip(stats.monthly.len().saturating_sub(TREND_MONTHS))
            .collect();
        if months.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(" No data for the trend yet.", FOOTER_STYLE)),
                area,
            );
            return;
        }

        let max_val = months
            .iter()
            .map(|m| m.income.max(m.expense))
            .fold(0.0_f64, f64::max);
        let (top_tick, mid_tick) = y_axis_ticks(max_val);
        let top_label = compact(top_tick);
        let mid_label = compact(mid_tick);
        let label_width = top_label.chars().count().max(mid_label.chars().count()) as u16 + 1;

        let [y_axis_area, bar_area] =
            Layout::horizontal([Constraint::Length(label_width), Constraint::Fill(1)]).areas(area);

        let inner_height = bar_area.height.saturating_sub(2);
        let mid_row = inner_height / 2;
        let mut y_lines = vec![Line::from("")];
        for row in 0..inner_height {
            let label = if row == 0 {
                top_label.as_str()
            } else if row == mid_row {
                mid_label.as_str()
            } else {
                ""
            };
            y_lines.push(Line::from(Span::styled(
                format!("{label:>width$}", width = label_width as usize),
                FOOTER_STYLE,
            )));
        }
        frame.render_widget(Paragraph::new(y_lines), y_axis_area);

        let income_style = Style::default().fg(Color::Rgb(80, 220, 100));
        let expense_style = Style::default().fg(Color::Red);
        let groups: Vec<BarGroup> = months
            .iter()
            .map(|m| {
                let bars = vec![
                    Bar::default().value(m.income.round() as u64).text_value(String::new()).style(income_style),
                    Bar::default().value(m.expense.round() as u64).text_value(String::new()).style(expense_style),
                ];
                BarGroup::default()
                    .label(Line::from(short_month(&m.month)))
                    .bars(&bars)
            })
            .collect();

        let block = Block::default()
            .title("Monthly Trend (all time)")
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .borders(Borders::NONE);
        let mut chart = BarChart::default()
            .block(block)
            .bar_width(2)
            .bar_gap(0)
            .group_gap(2)
            .max(top_tick.round() as u64);
        for group in &groups {
            chart = chart.data(group.clone());
        }
        frame.render_widget(chart, bar_area);
    }

    fn draw_hints(&self, frame: &mut Frame, area: Rect, hints: &str) {
        if let Some(msg) = &self.status_message {
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(STATUS_STYLE), area);
        } else {
            frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), area);
        }
    }
}

impl Screen for App {
    fn draw(&mut self, frame: &mut Frame) {
        if self.user.is_none() {
            self.draw_login(frame);
            return;
        }

        let area = frame.area();
        let [brand_area, nav_area, sep_area, body_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        self.draw_header(frame, brand_area, nav_area);
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        match self.view {
            View::Dashboard => self.draw_dashboard(frame, body_area),
            View::Statement => self.statement.draw(frame, body_area),
            View::Reports => self.reports.draw(frame, body_area),
            View::Admin => {
                if let Some(users) = &self.users {
                    users.draw(frame, body_area);
                }
            }
            View::DevConsole => self.console.draw(frame, body_area),
        }

        if let Some(form) = &self.form {
            form.draw(frame, body_area);
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        if self.user.is_none() {
            return self.handle_login_key(code);
        }
        if self.form.is_some() {
            self.handle_form_key(code);
            return ScreenAction::Continue;
        }

        if !self.view_is_capturing() {
            self.status_message = None;
            if self.handle_global_key(code) {
                return ScreenAction::Continue;
            }
        }

        match self.view {
            View::Dashboard => return self.handle_dashboard_key(code),
            View::Statement => self.handle_statement_key(code),
            View::Reports => self.handle_reports_key(code),
            View::Admin => self.handle_admin_key(code),
            View::DevConsole => self.handle_console_key(code),
        }
        ScreenAction::Continue
    }
}

/// Pick round y-axis tick values (top and mid) for the largest bar.
fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    // 1k, 2.5k, 5k, 10k, ... in rupees
    let steps = [
        1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0,
        1000000.0, 2500000.0, 5000000.0, 10000000.0,
    ];
    let top = steps.iter().copied().find(|&s| s >= max_val).unwrap_or(max_val);
    (top, top / 2.0)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('\u{2026}');
        out
    }
}

/// Launch the interactive app against the configured data directory.
pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let conn = open_data_dir(&data_dir)?;
    let backend = match connect_backend(&settings) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("remote backend unavailable: {e}");
            None
        }
    };
    let today = today();
    let mut store = LedgerStore::open(conn, backend, today)?;
    if store.has_backend() {
        store.refresh();
    }
    let mut app = App::new(store, settings, data_dir, today);
    run_screen(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db, DEFAULT_PASSWORD};
    use ratatui::{backend::TestBackend, Terminal};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn app(dir: &tempfile::TempDir) -> App {
        let conn = get_connection(&dir.path().join("cashbook.db")).unwrap();
        init_db(&conn).unwrap();
        let today = d(2024, 5, 10);
        let store = LedgerStore::open(conn, None, today).unwrap();
        let settings = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            company_name: "SR INFOTECH".to_string(),
            remote_url: String::new(),
            remote_key: String::new(),
        };
        App::new(store, settings, dir.path().to_path_buf(), today)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    fn login(app: &mut App, username: &str, password: &str) {
        type_text(app, username);
        app.handle_key(KeyCode::Tab);
        type_text(app, password);
        app.handle_key(KeyCode::Enter);
    }

    fn render(app: &mut App) {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
    }

    #[test]
    fn test_wrong_password_stays_on_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", "nope");
        assert!(a.user.is_none());
        assert_eq!(a.login.error.as_deref(), Some("Check credentials and try again."));
        assert!(a.login.password.is_empty());
        render(&mut a);
    }

    #[test]
    fn test_esc_on_login_quits() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        assert!(matches!(a.handle_key(KeyCode::Esc), ScreenAction::Quit));
    }

    #[test]
    fn test_admin_reaches_all_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        assert!(a.user.is_some());
        for (key, view) in [
            ('2', View::Statement),
            ('3', View::Reports),
            ('4', View::Admin),
            ('5', View::DevConsole),
            ('1', View::Dashboard),
        ] {
            a.handle_key(KeyCode::Char(key));
            assert_eq!(a.view, view);
            render(&mut a);
        }
        a.handle_key(KeyCode::BackTab);
        assert_eq!(a.view, View::DevConsole);
    }

    #[test]
    fn test_staff_cannot_open_admin_screens() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "staff", DEFAULT_PASSWORD);
        a.handle_key(KeyCode::Char('4'));
        assert_eq!(a.view, View::Dashboard);
        assert!(a.status_message.is_some());
        a.handle_key(KeyCode::BackTab);
        assert_eq!(a.view, View::Reports);
        a.handle_key(KeyCode::Tab);
        assert_eq!(a.view, View::Dashboard);
    }

    #[test]
    fn test_add_entry_through_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "staff", DEFAULT_PASSWORD);
        let before = a.store.transactions().len();

        a.handle_key(KeyCode::Char('a'));
        assert!(a.form.is_some());
        render(&mut a);
        // Date is prefilled; move to name.
        a.handle_key(KeyCode::Tab);
        type_text(&mut a, "Metro Traders");
        a.handle_key(KeyCode::Tab);
        type_text(&mut a, "Inventory");
        a.handle_key(KeyCode::Tab);
        type_text(&mut a, "2500");
        a.handle_key(KeyCode::Enter);

        assert!(a.form.is_none());
        assert_eq!(a.store.transactions().len(), before + 1);
        let added = &a.store.transactions()[0];
        assert_eq!(added.name, "Metro Traders");
        assert_eq!(added.amount, 2500.0);
        assert_eq!(a.statement.rows().len(), before + 1);
    }

    #[test]
    fn test_dashboard_filter_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        a.handle_key(KeyCode::Char('t'));
        assert_eq!(a.filter.kind, Some(TransactionType::Income));
        assert!(a.recent_rows().iter().all(|t| t.kind == TransactionType::Income));
        a.handle_key(KeyCode::Char('p'));
        assert_eq!(a.filter.period, Period::ThisMonth);
        a.handle_key(KeyCode::Char('x'));
        assert!(!a.filter.is_active());
        render(&mut a);
    }

    #[test]
    fn test_home_and_history_share_one_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        let incomes = a
            .store
            .transactions()
            .iter()
            .filter(|t| t.kind == TransactionType::Income)
            .count();

        a.handle_key(KeyCode::Char('t'));
        assert_eq!(a.statement.filter(), &a.filter);
        assert_eq!(a.statement.rows().len(), incomes);
        assert!(a.statement.rows().iter().all(|t| t.kind == TransactionType::Income));

        // A change made on History flows back to Home.
        a.handle_key(KeyCode::Char('2'));
        a.handle_key(KeyCode::Char('t'));
        assert_eq!(a.filter.kind, Some(TransactionType::Expense));
        assert!(a.recent_rows().iter().all(|t| t.kind == TransactionType::Expense));

        a.handle_key(KeyCode::Char('L'));
        assert!(!a.filter.is_active());
        assert!(!a.statement.filter().is_active());
    }

    #[test]
    fn test_statement_delete_updates_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        a.handle_key(KeyCode::Char('2'));
        let before = a.store.transactions().len();
        a.handle_key(KeyCode::Char('D'));
        assert!(a.view_is_capturing());
        a.handle_key(KeyCode::Char('y'));
        assert_eq!(a.store.transactions().len(), before - 1);
        assert_eq!(a.statement.rows().len(), before - 1);
    }

    #[test]
    fn test_refresh_without_remote_reports_local_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        a.handle_key(KeyCode::Char('r'));
        assert!(a.status_message.as_ref().unwrap().contains("No remote"));
    }

    #[test]
    fn test_logout_returns_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        a.handle_key(KeyCode::Char('4'));
        a.handle_key(KeyCode::Char('L'));
        assert!(a.user.is_none());
        assert!(a.users.is_none());
        assert_eq!(a.view, View::Dashboard);
    }

    #[test]
    fn test_q_quits_from_dashboard_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(&dir);
        login(&mut a, "admin", DEFAULT_PASSWORD);
        a.handle_key(KeyCode::Char('3'));
        assert!(matches!(a.handle_key(KeyCode::Char('q')), ScreenAction::Continue));
        assert_eq!(a.view, View::Dashboard);
        assert!(matches!(a.handle_key(KeyCode::Char('q')), ScreenAction::Quit));
    }

    #[test]
    fn test_y_axis_ticks() {
        assert_eq!(y_axis_ticks(800.0), (1000.0, 500.0));
        assert_eq!(y_axis_ticks(60000.0), (100000.0, 50000.0));
        assert_eq!(y_axis_ticks(0.0), (1000.0, 500.0));
    }
}
