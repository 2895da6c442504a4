use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::remote::SCHEMA_SQL;
use crate::settings::{CredentialSource, RemoteCredentials};
use crate::tui::{CURSOR, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE};

const LABEL_STYLE: Style = Style::new().fg(Color::DarkGray);
const SQL_STYLE: Style = Style::new().fg(Color::Cyan);

/// Snapshot of the remote connection, refreshed by the app after each change.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    pub connected: bool,
    pub backend: Option<String>,
    pub credentials: Option<RemoteCredentials>,
    pub last_error: Option<String>,
    pub cached: usize,
    pub log_path: PathBuf,
}

pub enum DevAction {
    Continue,
    Close,
    Save { url: String, key: String },
    Clear,
    Reconnect,
}

enum Mode {
    View,
    Edit { url: String, key: String, on_key: bool },
    ConfirmClear,
}

/// Remote connection diagnostics plus the SQL needed to create the tables.
pub struct DevConsole {
    info: ConnectionInfo,
    mode: Mode,
    schema_offset: usize,
    status_message: Option<String>,
}

impl DevConsole {
    pub fn new(info: ConnectionInfo) -> Self {
        Self {
            info,
            mode: Mode::View,
            schema_offset: 0,
            status_message: None,
        }
    }

    pub fn update(&mut self, info: ConnectionInfo) {
        self.info = info;
    }

    pub fn is_capturing(&self) -> bool {
        !matches!(self.mode, Mode::View)
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let [status_area, schema_area, keys_area] = Layout::vertical([
            Constraint::Length(9),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let info = &self.info;
        let state = if info.connected {
            Span::styled("Online", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::styled("Offline", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        };
        let (source, url, key) = match &info.credentials {
            Some(c) => (
                match c.source {
                    CredentialSource::Environment => "environment",
                    CredentialSource::SettingsFile => "settings file",
                },
                c.url.clone(),
                c.masked_key(),
            ),
            None => ("not configured", "-".to_string(), "-".to_string()),
        };
        let row = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("   {label:<14}"), LABEL_STYLE),
                Span::raw(value),
            ])
        };
        let mut lines = vec![
            Line::from(Span::styled(" Connection", HEADER_STYLE)),
            Line::from(vec![Span::styled(format!("   {:<14}", "Status"), LABEL_STYLE), state]),
            row("Backend", info.backend.clone().unwrap_or_else(|| "local cache only".to_string())),
            row("Credentials", source.to_string()),
        ];

        match &self.mode {
            Mode::Edit { url: u, key: k, on_key } => {
                let (uc, kc) = if *on_key { ("", CURSOR) } else { (CURSOR, "") };
                lines.push(row("URL", format!("{u}{uc}")));
                lines.push(row("Key", format!("{k}{kc}")));
            }
            _ => {
                lines.push(row("URL", url));
                lines.push(row("Key", key));
            }
        }
        lines.push(row("Last error", info.last_error.clone().unwrap_or_else(|| "-".to_string())));
        lines.push(row("Cached rows", info.cached.to_string()));
        lines.push(row("Log file", info.log_path.display().to_string()));
        frame.render_widget(Paragraph::new(lines), status_area);

        let mut schema = vec![Line::from(Span::styled(" Backend schema", HEADER_STYLE))];
        schema.extend(
            SCHEMA_SQL
                .lines()
                .skip(self.schema_offset)
                .map(|l| Line::from(Span::styled(format!("   {l}"), SQL_STYLE))),
        );
        frame.render_widget(Paragraph::new(schema), schema_area);

        let keys = match (&self.status_message, &self.mode) {
            (Some(msg), _) => Paragraph::new(format!(" {msg}")).style(STATUS_STYLE),
            (None, Mode::View) => Paragraph::new(
                " s=set credentials  c=clear  r=reconnect  \u{2191}/\u{2193}=scroll schema  q=back",
            )
            .style(FOOTER_STYLE),
            (None, Mode::Edit { .. }) => {
                Paragraph::new(" Tab=switch field  Enter=save  Esc=cancel").style(FOOTER_STYLE)
            }
            (None, Mode::ConfirmClear) => {
                Paragraph::new(" Clear saved credentials? y=yes  n=no").style(STATUS_STYLE)
            }
        };
        frame.render_widget(keys, keys_area);
    }

    pub fn handle_key(&mut self, code: KeyCode) -> DevAction {
        self.status_message = None;

        match &mut self.mode {
            Mode::View => match code {
                KeyCode::Char('q') | KeyCode::Esc => return DevAction::Close,
                KeyCode::Char('s') => {
                    let (url, key) = match &self.info.credentials {
                        Some(c) if c.source == CredentialSource::SettingsFile => {
                            (c.url.clone(), c.key.clone())
                        }
                        _ => (String::new(), String::new()),
                    };
                    self.mode = Mode::Edit { url, key, on_key: false };
                }
                KeyCode::Char('c') => self.mode = Mode::ConfirmClear,
                KeyCode::Char('r') => return DevAction::Reconnect,
                KeyCode::Up => self.schema_offset = self.schema_offset.saturating_sub(1),
                KeyCode::Down => {
                    let max = SCHEMA_SQL.lines().count().saturating_sub(1);
                    self.schema_offset = (self.schema_offset + 1).min(max);
                }
                _ => {}
            },
            Mode::Edit { url, key, on_key } => match code {
                KeyCode::Esc => self.mode = Mode::View,
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => *on_key = !*on_key,
                KeyCode::Backspace => {
                    if *on_key {
                        key.pop();
                    } else {
                        url.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if *on_key {
                        key.push(c);
                    } else {
                        url.push(c);
                    }
                }
                KeyCode::Enter => {
                    let action = DevAction::Save {
                        url: url.trim().to_string(),
                        key: key.trim().to_string(),
                    };
                    self.mode = Mode::View;
                    return action;
                }
                _ => {}
            },
            Mode::ConfirmClear => {
                self.mode = Mode::View;
                if code == KeyCode::Char('y') {
                    return DevAction::Clear;
                }
            }
        }
        DevAction::Continue
    }
}
