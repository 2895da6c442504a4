use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::export::save_report_pdf;
use crate::cli::{open_store, today, ReportCommands};
use crate::error::Result;
use crate::fmt::money;
use crate::models::TransactionType;
use crate::reports::{self, quarter_of, Report, ReportKind};
use crate::settings::load_settings;

/// Fill in missing year/month/quarter from `today`.
pub fn kind_from(cmd: ReportCommands, today: NaiveDate) -> ReportKind {
    match cmd {
        ReportCommands::Monthly { year, month } => ReportKind::Monthly {
            year: year.unwrap_or(today.year()),
            month: month.unwrap_or(today.month()),
        },
        ReportCommands::Quarterly { year, quarter } => ReportKind::Quarterly {
            year: year.unwrap_or(today.year()),
            quarter: quarter.unwrap_or(quarter_of(today)),
        },
        ReportCommands::Annual { year } => ReportKind::Annual {
            year: year.unwrap_or(today.year()),
        },
        ReportCommands::Customer { name } => ReportKind::Customer(name),
        ReportCommands::Category { name } => ReportKind::Category(name),
        ReportCommands::Custom { from, to } => ReportKind::Custom { from, to },
    }
}

pub fn run(cmd: ReportCommands, pdf: bool, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings, true)?;
    let report = reports::build(store.transactions(), kind_from(cmd, today()))?;

    println!("{}", format_report(&report, &settings.company_name));

    if pdf || output.is_some() {
        let data_dir = PathBuf::from(&settings.data_dir);
        let path = save_report_pdf(&report, &settings.company_name, &data_dir, output.map(PathBuf::from))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

pub fn format_report(report: &Report, company: &str) -> String {
    let mut out = format!(
        "{}\n{} | {} | {} total records\n",
        company.bold(),
        report.title,
        report.period,
        report.rows.len()
    );

    let mut summary = Table::new();
    summary.set_header(vec!["Total Cash In", "Total Cash Out", "Net Balance"]);
    let net = if report.totals.balance >= 0.0 {
        money(report.totals.balance).green().bold().to_string()
    } else {
        money(report.totals.balance).red().bold().to_string()
    };
    summary.add_row(vec![
        Cell::new(money(report.totals.income)),
        Cell::new(money(report.totals.expense)),
        Cell::new(net),
    ]);
    out.push_str(&format!("\nSummary Overview\n{summary}"));

    if report.rows.is_empty() {
        out.push_str("\n\nNo transactions in this period.");
        return out;
    }

    let mut ledger = Table::new();
    ledger.set_header(vec!["Date", "Entity Name", "Category", "Cash In", "Cash Out"]);
    for t in &report.rows {
        let (cash_in, cash_out) = match t.kind {
            TransactionType::Income => (money(t.amount).green().to_string(), "-".to_string()),
            TransactionType::Expense => ("-".to_string(), money(t.amount).red().to_string()),
        };
        ledger.add_row(vec![
            Cell::new(t.date),
            Cell::new(&t.name),
            Cell::new(&t.particular),
            Cell::new(cash_in),
            Cell::new(cash_out),
        ]);
    }
    out.push_str(&format!("\n\nLedger\n{ledger}"));

    let mut flow = Table::new();
    flow.set_header(vec!["Month", "Inflows", "Outflows", "Net", "Running"]);
    for m in &report.cashflow {
        let net = if m.net >= 0.0 {
            money(m.net).green().to_string()
        } else {
            money(m.net).red().to_string()
        };
        flow.add_row(vec![
            Cell::new(&m.month),
            Cell::new(money(m.inflows)),
            Cell::new(money(m.outflows)),
            Cell::new(net),
            Cell::new(money(m.running_balance)),
        ]);
    }
    out.push_str(&format!("\n\nCash Flow\n{flow}"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transaction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_kind_defaults_from_today() {
        let today = d(2024, 8, 15);
        assert_eq!(
            kind_from(ReportCommands::Monthly { year: None, month: None }, today),
            ReportKind::Monthly { year: 2024, month: 8 }
        );
        assert_eq!(
            kind_from(ReportCommands::Quarterly { year: Some(2023), quarter: None }, today),
            ReportKind::Quarterly { year: 2023, quarter: 3 }
        );
        assert_eq!(
            kind_from(ReportCommands::Annual { year: None }, today),
            ReportKind::Annual { year: 2024 }
        );
    }

    #[test]
    fn test_format_report_sections() {
        colored::control::set_override(false);
        let rows = vec![Transaction {
            id: "1".to_string(),
            name: "Aman Enterprises".to_string(),
            particular: "Client Payment".to_string(),
            description: None,
            amount: 8000.0,
            kind: TransactionType::Income,
            category: "Client Payment".to_string(),
            date: d(2024, 4, 2),
        }];
        let report = reports::build(&rows, ReportKind::Quarterly { year: 2024, quarter: 2 }).unwrap();
        let text = format_report(&report, "SR INFOTECH");
        assert!(text.contains("Financial Intelligence Portal | Q2 2024 | 1 total records"));
        assert!(text.contains("Summary Overview"));
        assert!(text.contains("Aman Enterprises"));
        assert!(text.contains("Cash Flow"));
    }

    #[test]
    fn test_format_empty_report() {
        colored::control::set_override(false);
        let report = reports::build(&[], ReportKind::Annual { year: 2020 }).unwrap();
        let text = format_report(&report, "SR INFOTECH");
        assert!(text.contains("No transactions in this period."));
        assert!(!text.contains("Ledger"));
    }
}
