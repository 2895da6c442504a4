pub mod backup;
pub mod categories;
pub mod dashboard;
pub mod dev_console;
pub mod entries;
pub mod export;
pub mod init;
pub mod remote;
pub mod report;
pub mod report_view;
pub mod status;
pub mod summary;
pub mod user_manager;
pub mod users;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::db::open_data_dir;
use crate::error::{CashbookError, Result};
use crate::filter::{FilterState, Period};
use crate::ledger::LedgerStore;
use crate::models::{TransactionType, UserRole};
use crate::remote::{Backend, RestBackend};
use crate::settings::{remote_credentials, Settings};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Build the remote client when credentials are configured.
pub fn connect_backend(settings: &Settings) -> Result<Option<Box<dyn Backend>>> {
    match remote_credentials(settings) {
        Some(creds) => Ok(Some(Box::new(RestBackend::new(&creds)?))),
        None => Ok(None),
    }
}

/// Open the ledger for a one-shot command. With `sync`, pull from the remote
/// first; a failed pull only warns and the local cache is used.
pub fn open_store(settings: &Settings, sync: bool) -> Result<LedgerStore> {
    let data_dir = PathBuf::from(&settings.data_dir);
    let conn = open_data_dir(&data_dir)?;
    let backend = match connect_backend(settings) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{} {e}", "Offline:".yellow().bold());
            None
        }
    };
    let mut store = LedgerStore::open(conn, backend, today())?;
    if sync && store.has_backend() && !store.refresh() {
        eprintln!(
            "{} {} (using local cache)",
            "Offline:".yellow().bold(),
            store.last_error().unwrap_or("remote unavailable")
        );
    }
    Ok(store)
}

#[derive(Parser)]
#[command(
    name = "cashbook",
    version,
    about = "Income and expense ledger for small businesses, with reports and statement export."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up cashbook: choose a data directory and initialize the database.
    Init {
        /// Path for cashbook data (default: ~/Documents/cashbook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Start with an empty ledger instead of sample entries
        #[arg(long = "no-sample")]
        no_sample: bool,
        /// Company name shown on statements
        #[arg(long)]
        company: Option<String>,
    },
    /// Show the data directory, remote connection and ledger counts.
    Status,
    /// Record an income or expense entry.
    Add {
        /// Counterparty, e.g. 'Aman Enterprises'
        #[arg(long)]
        name: String,
        /// Category label, e.g. 'Rent' or 'CARRY IN'
        #[arg(long)]
        particular: String,
        /// Amount in rupees, e.g. 15000 or 15,000.50
        #[arg(long)]
        amount: String,
        /// income or expense (default: the category's preset, else expense)
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Free-text note
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of an existing entry.
    Edit {
        /// Transaction id or unique prefix (shown in `cashbook list`)
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        particular: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        #[arg(long)]
        date: Option<String>,
        /// New note; pass an empty string to clear it
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an entry.
    Delete {
        /// Transaction id or unique prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List entries (the statement), newest first.
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Show at most N rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Totals and the monthly trend.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List categories with their default type and usage.
    Categories,
    /// Build a period, customer, category or custom-range report.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
        /// Also write the report as a branded PDF
        #[arg(long, global = true)]
        pdf: bool,
        /// PDF output path (default: <data_dir>/exports/<COMPANY>_Financial_Statement_<period>.pdf)
        #[arg(long, global = true)]
        output: Option<String>,
    },
    /// Export the statement as CSV.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output path (default: <data_dir>/exports/<COMPANY>_Statement_<date>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Pull the ledger from the remote backend into the local cache.
    Sync,
    /// Configure the remote backend credentials.
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
    /// Manage users (requires an administrator).
    Users {
        #[command(subcommand)]
        command: UsersCommands,
        /// Administrator username
        #[arg(long, global = true, default_value = "admin")]
        admin: String,
        /// Read passwords from stdin, one per line, instead of prompting
        #[arg(long = "password-stdin", global = true)]
        password_stdin: bool,
    },
    /// Print the SQL that creates the remote tables.
    Schema,
    /// Back up the local database.
    Backup {
        /// Output path (default: <data_dir>/backups/cashbook-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Generate shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// One calendar month.
    Monthly {
        #[arg(long)]
        year: Option<i32>,
        /// Month number 1-12
        #[arg(long)]
        month: Option<u32>,
    },
    /// One quarter (Q1 = Jan-Mar).
    Quarterly {
        #[arg(long)]
        year: Option<i32>,
        /// Quarter number 1-4
        #[arg(long)]
        quarter: Option<u32>,
    },
    /// One calendar year.
    Annual {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Every entry for one counterparty.
    Customer {
        name: String,
    },
    /// Every entry for one category.
    Category {
        name: String,
    },
    /// An inclusive date range.
    Custom {
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from: NaiveDate,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to: NaiveDate,
    },
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Save the backend URL and API key to the settings file.
    Set {
        #[arg(long)]
        url: String,
        #[arg(long)]
        key: String,
    },
    /// Remove saved credentials.
    Clear,
    /// Show the active credentials (key masked) and test the connection.
    Show,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users.
    List,
    /// Add a user. The new password is prompted for (or read from stdin).
    Add {
        username: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// admin or staff
        #[arg(long, default_value = "staff")]
        role: UserRole,
    },
    /// Remove a user by username or id.
    Remove {
        user: String,
    },
}

/// Statement filters shared by `list`, `summary` and `export`.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// all, this-month, last-month, this-quarter, this-year
    #[arg(long)]
    pub period: Option<Period>,
    /// Start date: YYYY-MM-DD (overrides --period)
    #[arg(long = "from")]
    pub from: Option<NaiveDate>,
    /// End date: YYYY-MM-DD (overrides --period)
    #[arg(long = "to")]
    pub to: Option<NaiveDate>,
    /// Exact category (particular)
    #[arg(long)]
    pub category: Option<String>,
    /// income or expense
    #[arg(long = "type")]
    pub kind: Option<TransactionType>,
    /// Exact counterparty name
    #[arg(long)]
    pub name: Option<String>,
    /// Case-insensitive text in name, category or description
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self, today: NaiveDate) -> Result<FilterState> {
        let mut filter = FilterState::default().with_period(self.period.unwrap_or_default(), today);
        if self.from.is_some() || self.to.is_some() {
            if let (Some(from), Some(to)) = (self.from, self.to) {
                if from > to {
                    return Err(CashbookError::InvalidEntry(format!(
                        "--from {from} is after --to {to}"
                    )));
                }
            }
            filter.set_range(self.from, self.to);
        }
        filter.kind = self.kind;
        filter.category = self.category.clone();
        filter.name = self.name.clone();
        filter.search = self.search.clone().unwrap_or_default();
        Ok(filter)
    }
}
