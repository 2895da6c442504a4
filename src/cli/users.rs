use std::io::BufRead;

use comfy_table::{Cell, Table};
use rusqlite::Connection;
use zeroize::Zeroizing;

use crate::auth;
use crate::db::open_data_dir;
use crate::error::{CashbookError, Result};
use crate::models::{User, UserRole};
use crate::settings::load_settings;

/// How the acting administrator proves who they are.
pub struct AdminAuth {
    pub username: String,
    /// Read passwords from stdin (one per line) instead of the terminal.
    pub password_stdin: bool,
}

struct PasswordSource {
    stdin: bool,
    lines: Vec<Zeroizing<String>>,
}

impl PasswordSource {
    fn new(stdin: bool) -> Result<Self> {
        let mut lines = Vec::new();
        if stdin {
            for line in std::io::stdin().lock().lines() {
                lines.push(Zeroizing::new(line?));
            }
            lines.reverse();
        }
        Ok(Self { stdin, lines })
    }

    fn next(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        if self.stdin {
            return self
                .lines
                .pop()
                .map(|l| Zeroizing::new(l.trim_end_matches('\r').to_string()))
                .ok_or_else(|| CashbookError::Other(format!("missing password on stdin ({prompt})")));
        }
        Ok(Zeroizing::new(rpassword::prompt_password(prompt)?))
    }
}

fn login_admin(conn: &Connection, admin: &AdminAuth, passwords: &mut PasswordSource) -> Result<User> {
    let password = passwords.next(&format!("Password for {}: ", admin.username))?;
    let user = auth::authenticate(conn, &admin.username, &password)?;
    auth::require_admin(&user)?;
    Ok(user)
}

fn open() -> Result<Connection> {
    let settings = load_settings();
    open_data_dir(std::path::Path::new(&settings.data_dir))
}

pub fn list(admin: &AdminAuth) -> Result<()> {
    let conn = open()?;
    let mut passwords = PasswordSource::new(admin.password_stdin)?;
    login_admin(&conn, admin, &mut passwords)?;

    let mut table = Table::new();
    table.set_header(vec!["Username", "Name", "Role", "ID"]);
    for u in auth::list_users(&conn)? {
        table.add_row(vec![
            Cell::new(&u.username),
            Cell::new(&u.name),
            Cell::new(u.role),
            Cell::new(&u.id),
        ]);
    }
    println!("Users\n{table}");
    Ok(())
}

pub fn add(admin: &AdminAuth, username: &str, name: &str, role: UserRole) -> Result<()> {
    let conn = open()?;
    let mut passwords = PasswordSource::new(admin.password_stdin)?;
    login_admin(&conn, admin, &mut passwords)?;

    let password = passwords.next(&format!("New password for {username}: "))?;
    if !admin.password_stdin {
        let confirm = passwords.next("Confirm password: ")?;
        if *confirm != *password {
            return Err(CashbookError::InvalidEntry("passwords do not match".to_string()));
        }
    }
    let user = auth::add_user(&conn, username, name, role, &password)?;
    println!("Added user {} ({})", user.username, user.role);
    Ok(())
}

pub fn remove(admin: &AdminAuth, target: &str) -> Result<()> {
    let conn = open()?;
    let mut passwords = PasswordSource::new(admin.password_stdin)?;
    let acting = login_admin(&conn, admin, &mut passwords)?;
    if acting.username == target || acting.id == target {
        return Err(CashbookError::PermissionDenied(
            "you cannot remove your own account".to_string(),
        ));
    }
    let removed = auth::remove_user(&conn, target)?;
    println!("Removed user {}", removed.username);
    Ok(())
}
