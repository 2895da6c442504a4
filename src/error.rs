use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashbookError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("The remote 'transactions' table does not exist. Run `cashbook schema` and apply the SQL in your backend's SQL editor.")]
    MissingTable,

    #[error("Schema mismatch: the remote 'transactions' table has no 'date' column. Re-run the SQL from `cashbook schema`.")]
    SchemaMismatch,

    #[error("Remote rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Remote backend is not configured. Run `cashbook remote set --url <URL> --key <KEY>`.")]
    NotConfigured,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Check credentials and try again.")]
    AuthFailed,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CashbookError>;
