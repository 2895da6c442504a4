use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use rusqlite::Connection;
use zeroize::Zeroizing;

use crate::auth;
use crate::models::{User, UserRole};
use crate::tui::{mask, CURSOR, FOOTER_STYLE, STATUS_STYLE};

const ROLES: [UserRole; 2] = [UserRole::Staff, UserRole::Admin];

// Field order in the add form
const USERNAME_IDX: usize = 0;
const NAME_IDX: usize = 1;
const PASSWORD_IDX: usize = 2;
const ROLE_IDX: usize = 3;
const FIELD_COUNT: usize = 4;

pub enum UserAction {
    Continue,
    Close,
}

enum Mode {
    List,
    Add(UserForm),
    ConfirmRemove,
}

struct UserForm {
    username: String,
    name: String,
    password: Zeroizing<String>,
    role: usize,
    focused: usize,
}

impl UserForm {
    fn new() -> Self {
        Self {
            username: String::new(),
            name: String::new(),
            password: Zeroizing::new(String::new()),
            role: 0,
            focused: 0,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            USERNAME_IDX => Some(&mut self.username),
            NAME_IDX => Some(&mut self.name),
            PASSWORD_IDX => Some(&mut *self.password),
            _ => None,
        }
    }
}

/// Admin screen: list users, add one, remove one.
pub struct UserManager {
    users: Vec<User>,
    current_user_id: String,
    selection: usize,
    mode: Mode,
    status_message: Option<String>,
}

impl UserManager {
    pub fn new(conn: &Connection, current_user: &User) -> Self {
        let mut manager = Self {
            users: Vec::new(),
            current_user_id: current_user.id.clone(),
            selection: 0,
            mode: Mode::List,
            status_message: None,
        };
        manager.reload(conn);
        manager
    }

    fn reload(&mut self, conn: &Connection) {
        match auth::list_users(conn) {
            Ok(users) => self.users = users,
            Err(e) => self.set_status(format!("Could not load users: {e}")),
        }
        self.selection = self.selection.min(self.users.len().saturating_sub(1));
    }

    pub fn is_capturing(&self) -> bool {
        !matches!(self.mode, Mode::List)
    }

    fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let [content_area, hints_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(" Users", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(Span::styled(
                format!("   {:<16} {:<24} {}", "Username", "Name", "Role"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            )),
        ];
        for (i, user) in self.users.iter().enumerate() {
            let marker = if i == self.selection { " > " } else { "   " };
            let style = if i == self.selection {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let you = if user.id == self.current_user_id { "  (you)" } else { "" };
            lines.push(Line::from(Span::styled(
                format!("{marker}{:<16} {:<24} {}{you}", user.username, user.name, user.role),
                style,
            )));
        }

        match &self.mode {
            Mode::ConfirmRemove => {
                if let Some(user) = self.users.get(self.selection) {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        format!("   Remove '{}'? (y/n)", user.username),
                        STATUS_STYLE,
                    )));
                }
            }
            Mode::Add(form) => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    " Add User",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                let values = [
                    ("Username", form.username.clone()),
                    ("Name", form.name.clone()),
                    ("Password", mask(&form.password)),
                ];
                for (i, (label, value)) in values.iter().enumerate() {
                    let focused = i == form.focused;
                    let cursor = if focused { CURSOR } else { "" };
                    let label_style = if focused {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    lines.push(Line::from(vec![
                        Span::styled(format!("   {label:<12} "), label_style),
                        Span::raw(format!("{value}{cursor}")),
                    ]));
                }
                let focused = form.focused == ROLE_IDX;
                let arrows = if focused { ("< ", " >") } else { ("  ", "  ") };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("   {:<12} ", "Role"),
                        if focused {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        },
                    ),
                    Span::styled(
                        format!("{}{}{}", arrows.0, ROLES[form.role], arrows.1),
                        Style::default().fg(Color::Cyan),
                    ),
                ]));
            }
            Mode::List => {}
        }

        frame.render_widget(Paragraph::new(lines), content_area);

        let hints = match &self.mode {
            Mode::List => " a=add  d=remove  Esc=back",
            Mode::Add(_) => " Tab=next field  \u{2190}/\u{2192}=role  Enter=save  Esc=cancel",
            Mode::ConfirmRemove => " y=confirm  n=cancel",
        };
        if let Some(msg) = &self.status_message {
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(STATUS_STYLE), hints_area);
        } else {
            frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, conn: &Connection) -> UserAction {
        self.status_message = None;
        match &self.mode {
            Mode::List => self.handle_list_key(code),
            Mode::Add(_) => {
                self.handle_form_key(code, conn);
                UserAction::Continue
            }
            Mode::ConfirmRemove => {
                self.handle_remove_key(code, conn);
                UserAction::Continue
            }
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> UserAction {
        match code {
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                if !self.users.is_empty() {
                    self.selection = (self.selection + 1).min(self.users.len() - 1);
                }
            }
            KeyCode::Char('a') => self.mode = Mode::Add(UserForm::new()),
            KeyCode::Char('d') => {
                if let Some(user) = self.users.get(self.selection) {
                    if user.id == self.current_user_id {
                        self.set_status("You cannot remove your own account".to_string());
                    } else {
                        self.mode = Mode::ConfirmRemove;
                    }
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return UserAction::Close,
            _ => {}
        }
        UserAction::Continue
    }

    fn handle_form_key(&mut self, code: KeyCode, conn: &Connection) {
        let Mode::Add(form) = &mut self.mode else {
            return;
        };
        match code {
            KeyCode::Esc => self.mode = Mode::List,
            KeyCode::Tab | KeyCode::Down => form.focused = (form.focused + 1) % FIELD_COUNT,
            KeyCode::BackTab | KeyCode::Up => {
                form.focused = (form.focused + FIELD_COUNT - 1) % FIELD_COUNT;
            }
            KeyCode::Left | KeyCode::Right if form.focused == ROLE_IDX => {
                form.role = (form.role + 1) % ROLES.len();
            }
            KeyCode::Char(c) => {
                if let Some(value) = form.text_mut() {
                    value.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(value) = form.text_mut() {
                    value.pop();
                }
            }
            KeyCode::Enter => {
                let result = auth::add_user(conn, &form.username, &form.name, ROLES[form.role], &form.password);
                match result {
                    Ok(user) => {
                        self.mode = Mode::List;
                        self.reload(conn);
                        if let Some(idx) = self.users.iter().position(|u| u.id == user.id) {
                            self.selection = idx;
                        }
                        self.set_status(format!("Added {} ({})", user.username, user.role));
                    }
                    Err(e) => self.set_status(e.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_remove_key(&mut self, code: KeyCode, conn: &Connection) {
        match code {
            KeyCode::Char('y') => {
                self.mode = Mode::List;
                let Some(user) = self.users.get(self.selection) else {
                    return;
                };
                let id = user.id.clone();
                match auth::remove_user(conn, &id) {
                    Ok(removed) => {
                        self.reload(conn);
                        self.set_status(format!("Removed {}", removed.username));
                    }
                    Err(e) => self.set_status(e.to_string()),
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::List,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn setup() -> (tempfile::TempDir, Connection, User) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        let admin = auth::authenticate(&conn, "admin", crate::db::DEFAULT_PASSWORD).unwrap();
        (dir, conn, admin)
    }

    fn type_text(m: &mut UserManager, conn: &Connection, text: &str) {
        for c in text.chars() {
            m.handle_key(KeyCode::Char(c), conn);
        }
    }

    #[test]
    fn test_lists_seeded_users() {
        let (_dir, conn, admin) = setup();
        let m = UserManager::new(&conn, &admin);
        assert_eq!(m.users.len(), 2);
    }

    #[test]
    fn test_add_user_through_form() {
        let (_dir, conn, admin) = setup();
        let mut m = UserManager::new(&conn, &admin);
        m.handle_key(KeyCode::Char('a'), &conn);
        assert!(m.is_capturing());
        type_text(&mut m, &conn, "ravi");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "Ravi Kumar");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "s3cret");
        m.handle_key(KeyCode::Tab, &conn);
        m.handle_key(KeyCode::Right, &conn);
        m.handle_key(KeyCode::Enter, &conn);

        assert!(!m.is_capturing());
        assert_eq!(m.users.len(), 3);
        let ravi = auth::authenticate(&conn, "ravi", "s3cret").unwrap();
        assert_eq!(ravi.role, UserRole::Admin);
        assert_eq!(m.users[m.selection].username, "ravi");
    }

    #[test]
    fn test_add_with_missing_fields_stays_in_form() {
        let (_dir, conn, admin) = setup();
        let mut m = UserManager::new(&conn, &admin);
        m.handle_key(KeyCode::Char('a'), &conn);
        m.handle_key(KeyCode::Enter, &conn);
        assert!(m.is_capturing());
        assert!(m.status_message.is_some());
    }

    #[test]
    fn test_cannot_remove_self() {
        let (_dir, conn, admin) = setup();
        let mut m = UserManager::new(&conn, &admin);
        // Users are ordered admin role first.
        assert_eq!(m.users[0].username, "admin");
        m.handle_key(KeyCode::Char('d'), &conn);
        assert!(!m.is_capturing());
        assert!(m.status_message.as_ref().unwrap().contains("own account"));
    }

    #[test]
    fn test_remove_with_confirmation() {
        let (_dir, conn, admin) = setup();
        let mut m = UserManager::new(&conn, &admin);
        m.handle_key(KeyCode::Down, &conn);
        m.handle_key(KeyCode::Char('d'), &conn);
        m.handle_key(KeyCode::Char('n'), &conn);
        assert_eq!(m.users.len(), 2);

        m.handle_key(KeyCode::Char('d'), &conn);
        m.handle_key(KeyCode::Char('y'), &conn);
        assert_eq!(m.users.len(), 1);
        assert!(auth::authenticate(&conn, "staff", crate::db::DEFAULT_PASSWORD).is_err());
    }

    #[test]
    fn test_esc_closes() {
        let (_dir, conn, admin) = setup();
        let mut m = UserManager::new(&conn, &admin);
        assert!(matches!(m.handle_key(KeyCode::Esc, &conn), UserAction::Close));
    }
}
