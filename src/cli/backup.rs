use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::backup::Backup;
use rusqlite::Connection;

use crate::db::{get_connection, get_kv};
use crate::error::{CashbookError, Result};
use crate::fmt::{format_bytes, number};
use crate::ledger::CACHE_KEY;
use crate::models::Transaction;
use crate::settings::{db_path, get_data_dir};

const PAGES_PER_STEP: std::ffi::c_int = 64;

/// `<data_dir>/backups/cashbook-YYYYMMDD-HHMMSS.db`
pub fn default_backup_path(data_dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    data_dir.join("backups").join(format!("cashbook-{stamp}.db"))
}

/// Copy the live database to `dest` (or the default location) and return
/// the written path with the number of cached entries it holds.
pub fn backup_to(data_dir: &Path, dest: Option<PathBuf>) -> Result<(PathBuf, usize)> {
    let source = db_path(data_dir);
    if !source.exists() {
        return Err(CashbookError::Other(format!(
            "no database at {} (run `cashbook init` first)",
            source.display()
        )));
    }
    let dest = dest.unwrap_or_else(|| default_backup_path(data_dir));
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = get_connection(&source)?;
    let mut copy = Connection::open(&dest)?;
    {
        let backup = Backup::new(&conn, &mut copy)?;
        backup.run_to_completion(PAGES_PER_STEP, Duration::from_millis(5), None)?;
    }

    let entries = match get_kv(&copy, CACHE_KEY)? {
        Some(raw) => serde_json::from_str::<Vec<Transaction>>(&raw)?.len(),
        None => 0,
    };
    log::info!("backed up {} to {}", source.display(), dest.display());
    Ok((dest, entries))
}

pub fn run(output: Option<String>) -> Result<()> {
    let (path, entries) = backup_to(&get_data_dir(), output.map(PathBuf::from))?;
    let size = std::fs::metadata(&path)?.len();
    println!("Backup saved to {}", path.display());
    println!("Size: {}  Entries: {}", format_bytes(size), number(entries));
    Ok(())
}
