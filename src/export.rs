use std::path::{Path, PathBuf};

use crate::error::{CashbookError, Result};
use crate::fmt::plain;
use crate::models::Transaction;
use crate::reports::slug;

pub const CSV_HEADERS: [&str; 6] = ["Date", "Name", "Particular", "Category", "Type", "Amount"];

/// Render the statement as CSV. Returns `None` for an empty list.
pub fn statement_csv(txns: &[Transaction]) -> Result<Option<String>> {
    if txns.is_empty() {
        return Ok(None);
    }
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_writer(Vec::new());
    wtr.write_record(CSV_HEADERS)?;
    for t in txns {
        let date = t.date.to_string();
        let amount = plain(t.amount);
        wtr.write_record([
            date.as_str(),
            t.name.as_str(),
            t.particular.as_str(),
            t.category.as_str(),
            t.kind.as_str(),
            amount.as_str(),
        ])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| CashbookError::Other(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| CashbookError::Other(e.to_string()))
}

pub fn default_csv_name(company: &str, today: chrono::NaiveDate) -> String {
    let company = slug(company).to_uppercase();
    let company = if company.is_empty() { "CASHBOOK".to_string() } else { company };
    format!("{company}_Statement_{today}.csv")
}

/// Write the statement to `path`. Nothing is written for an empty list.
pub fn write_statement(txns: &[Transaction], path: &Path) -> Result<Option<PathBuf>> {
    let Some(content) = statement_csv(txns)? else {
        log::info!("statement export skipped: no transactions");
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    log::info!("wrote {} rows to {}", txns.len(), path.display());
    Ok(Some(path.to_path_buf()))
}
