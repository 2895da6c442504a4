use colored::Colorize;

use crate::cli::open_store;
use crate::error::Result;
use crate::fmt::{format_bytes, money, number};
use crate::logging::log_path;
use crate::settings::{db_path, load_settings, remote_credentials, CredentialSource};
use crate::stats::totals;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db = db_path(&data_dir);

    println!("Company:    {}", settings.company_name);
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db.display());
    println!("Log file:   {}", log_path(&data_dir).display());

    match remote_credentials(&settings) {
        Some(creds) => {
            let source = match creds.source {
                CredentialSource::Environment => "environment",
                CredentialSource::SettingsFile => "settings file",
            };
            println!("Remote:     {} ({source})", creds.url);
        }
        None => println!("Remote:     {}", "not configured (local cache only)".dimmed()),
    }

    if !db.exists() {
        println!();
        println!("Database not found. Run `cashbook init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db)?.len();
    println!("DB size:    {}", format_bytes(size));

    let store = open_store(&settings, false)?;
    let users: i64 = store.conn().query_row("SELECT count(*) FROM users", [], |r| r.get(0))?;
    let t = totals(store.transactions());

    println!();
    println!("Transactions:  {}", number(store.transactions().len()));
    println!("Users:         {users}");
    println!("Cash in:       {}", money(t.income).green());
    println!("Cash out:      {}", money(t.expense).red());
    println!("Balance:       {}", money(t.balance).bold());
    Ok(())
}
