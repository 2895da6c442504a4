use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::cli::{open_store, today, FilterArgs};
use crate::error::Result;
use crate::export::{default_csv_name, write_statement};
use crate::models::Transaction;
use crate::reports::Report;
use crate::settings::load_settings;

pub fn exports_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("exports")
}

/// Write the statement CSV to `output` or the default export path.
/// Returns `None` when there was nothing to write.
pub fn save_csv(
    rows: &[Transaction],
    data_dir: &Path,
    company: &str,
    today: NaiveDate,
    output: Option<PathBuf>,
) -> Result<Option<PathBuf>> {
    let path = output.unwrap_or_else(|| exports_dir(data_dir).join(default_csv_name(company, today)));
    write_statement(rows, &path)
}

/// Render the report as a branded PDF and write it.
pub fn save_report_pdf(
    report: &Report,
    company: &str,
    data_dir: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    #[cfg(not(feature = "pdf"))]
    {
        let _ = (report, company, data_dir, output);
        Err(crate::error::CashbookError::Pdf(
            "PDF export requires the 'pdf' feature; build with `cargo build --features pdf`".into(),
        ))
    }

    #[cfg(feature = "pdf")]
    {
        let bytes = crate::pdf::render_report(report, company)?;
        let path = output.unwrap_or_else(|| {
            exports_dir(data_dir).join(crate::pdf::default_pdf_name(company, &report.period))
        });
        write_pdf(&bytes, &path)?;
        Ok(path)
    }
}

#[cfg(feature = "pdf")]
fn write_pdf(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

pub fn run(filters: &FilterArgs, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings, true)?;
    let today = today();
    let filter = filters.to_filter(today)?;
    let rows = filter.apply(store.transactions());

    let data_dir = PathBuf::from(&settings.data_dir);
    match save_csv(&rows, &data_dir, &settings.company_name, today, output.map(PathBuf::from))? {
        Some(path) => println!("Wrote {} ({} rows)", path.display(), rows.len()),
        None => println!("No transactions to export."),
    }
    Ok(())
}
