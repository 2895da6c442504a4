use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::error::{CashbookError, Result};
use crate::models::{User, UserRole};

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted SHA-256, stored as `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let salt = hex::encode(salt);
    let hash = digest(&salt, password);
    format!("{salt}${hash}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<(User, String)> {
    let role: String = row.get(3)?;
    let role = role.parse::<UserRole>().unwrap_or(UserRole::Staff);
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            name: row.get(2)?,
            role,
        },
        row.get(4)?,
    ))
}

/// Look up a user by username and check the password. Unknown usernames and
/// wrong passwords produce the same error.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<User> {
    let found = conn
        .query_row(
            "SELECT id, username, name, role, password_hash FROM users WHERE username = ?1",
            [username.trim()],
            row_to_user,
        )
        .optional()?;
    match found {
        Some((user, hash)) if verify_password(password, &hash) => {
            log::info!("user '{}' logged in", user.username);
            Ok(user)
        }
        _ => {
            log::warn!("failed login for '{}'", username.trim());
            Err(CashbookError::AuthFailed)
        }
    }
}

pub fn require_admin(user: &User) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(CashbookError::PermissionDenied(format!(
            "'{}' is not an administrator",
            user.username
        )))
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, name, role, password_hash FROM users ORDER BY role, username",
    )?;
    let rows = stmt.query_map([], row_to_user)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(row?.0);
    }
    Ok(users)
}

pub fn add_user(
    conn: &Connection,
    username: &str,
    name: &str,
    role: UserRole,
    password: &str,
) -> Result<User> {
    let username = username.trim();
    let name = name.trim();
    if username.is_empty() || name.is_empty() {
        return Err(CashbookError::InvalidEntry(
            "username and name are required".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(CashbookError::InvalidEntry("password is required".to_string()));
    }
    let exists: i64 = conn.query_row(
        "SELECT count(*) FROM users WHERE username = ?1",
        [username],
        |r| r.get(0),
    )?;
    if exists > 0 {
        return Err(CashbookError::InvalidEntry(format!(
            "username '{username}' is already taken"
        )));
    }
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        name: name.to_string(),
        role,
    };
    conn.execute(
        "INSERT INTO users (id, username, name, role, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![user.id, user.username, user.name, role.as_str(), hash_password(password)],
    )?;
    log::info!("added user '{}' ({})", user.username, role);
    Ok(user)
}

/// Remove a user by id or username. The last administrator cannot be removed.
pub fn remove_user(conn: &Connection, id_or_username: &str) -> Result<User> {
    let found = conn
        .query_row(
            "SELECT id, username, name, role, password_hash FROM users WHERE id = ?1 OR username = ?1",
            [id_or_username],
            row_to_user,
        )
        .optional()?;
    let (user, _) = found.ok_or_else(|| {
        CashbookError::InvalidEntry(format!("no user matches '{id_or_username}'"))
    })?;
    if user.is_admin() {
        let admins: i64 = conn.query_row(
            "SELECT count(*) FROM users WHERE role = 'admin'",
            [],
            |r| r.get(0),
        )?;
        if admins <= 1 {
            return Err(CashbookError::PermissionDenied(
                "cannot remove the last administrator".to_string(),
            ));
        }
    }
    conn.execute("DELETE FROM users WHERE id = ?1", [&user.id])?;
    log::info!("removed user '{}'", user.username);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db, DEFAULT_PASSWORD};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("secret");
        let b = hash_password("secret");
        assert_ne!(a, b);
        assert!(verify_password("secret", &a));
        assert!(verify_password("secret", &b));
        assert!(!verify_password("Secret", &a));
        assert!(!verify_password("secret", "no-separator"));
    }

    #[test]
    fn test_login_with_seeded_accounts() {
        let (_dir, conn) = test_db();
        let admin = authenticate(&conn, "admin", DEFAULT_PASSWORD).unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.name, "SR Admin");
        let staff = authenticate(&conn, " staff ", DEFAULT_PASSWORD).unwrap();
        assert_eq!(staff.role, UserRole::Staff);
    }

    #[test]
    fn test_login_failure_message() {
        let (_dir, conn) = test_db();
        let err = authenticate(&conn, "admin", "wrong").unwrap_err();
        assert_eq!(err.to_string(), "Check credentials and try again.");
        assert!(matches!(
            authenticate(&conn, "nobody", DEFAULT_PASSWORD),
            Err(CashbookError::AuthFailed)
        ));
    }

    #[test]
    fn test_add_and_remove_user() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "priya", "Priya Gupta", UserRole::Staff, "pw").unwrap();
        assert_eq!(list_users(&conn).unwrap().len(), 3);
        assert!(authenticate(&conn, "priya", "pw").is_ok());

        assert!(add_user(&conn, "priya", "Again", UserRole::Staff, "pw").is_err());

        let removed = remove_user(&conn, &user.id).unwrap();
        assert_eq!(removed.username, "priya");
        assert_eq!(list_users(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_cannot_remove_last_admin() {
        let (_dir, conn) = test_db();
        let err = remove_user(&conn, "admin").unwrap_err();
        assert!(matches!(err, CashbookError::PermissionDenied(_)));

        add_user(&conn, "owner", "Owner", UserRole::Admin, "pw").unwrap();
        assert!(remove_user(&conn, "admin").is_ok());
    }

    #[test]
    fn test_require_admin() {
        let (_dir, conn) = test_db();
        let staff = authenticate(&conn, "staff", DEFAULT_PASSWORD).unwrap();
        assert!(require_admin(&staff).is_err());
        let admin = authenticate(&conn, "admin", DEFAULT_PASSWORD).unwrap();
        assert!(require_admin(&admin).is_ok());
    }
}
