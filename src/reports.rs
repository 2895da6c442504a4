use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::error::{CashbookError, Result};
use crate::filter::end_of_month;
use crate::fmt::month_name;
use crate::models::Transaction;
use crate::stats::{self, CashflowMonth, Totals};

const DEFAULT_TITLE: &str = "Financial Intelligence Portal";

#[derive(Debug, Clone, PartialEq)]
pub enum ReportKind {
    Monthly { year: i32, month: u32 },
    Quarterly { year: i32, quarter: u32 },
    Annual { year: i32 },
    Customer(String),
    Category(String),
    Custom { from: NaiveDate, to: NaiveDate },
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Customer(_) => "Customer Specific Ledger",
            ReportKind::Category(_) => "Category Distribution Report",
            _ => DEFAULT_TITLE,
        }
    }

    pub fn period_label(&self) -> String {
        match self {
            ReportKind::Monthly { year, month } => format!("{} {year}", month_name(*month)),
            ReportKind::Quarterly { year, quarter } => format!("Q{quarter} {year}"),
            ReportKind::Annual { year } => format!("Annual Report {year}"),
            ReportKind::Customer(name) => format!("Customer: {name}"),
            ReportKind::Category(name) => format!("Category: {name}"),
            ReportKind::Custom { from, to } => format!("Range: {from} to {to}"),
        }
    }

    /// Inclusive date bounds for the period-based kinds.
    fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            ReportKind::Monthly { year, month } => {
                let start = NaiveDate::from_ymd_opt(*year, *month, 1)?;
                Some((start, end_of_month(start)?))
            }
            ReportKind::Quarterly { year, quarter } => {
                let start = NaiveDate::from_ymd_opt(*year, quarter.checked_sub(1)? * 3 + 1, 1)?;
                let last = NaiveDate::from_ymd_opt(*year, quarter * 3, 1)?;
                Some((start, end_of_month(last)?))
            }
            ReportKind::Annual { year } => Some((
                NaiveDate::from_ymd_opt(*year, 1, 1)?,
                NaiveDate::from_ymd_opt(*year, 12, 31)?,
            )),
            ReportKind::Custom { from, to } => Some((*from, *to)),
            ReportKind::Customer(_) | ReportKind::Category(_) => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ReportKind::Monthly { month, .. } if !(1..=12).contains(month) => Err(
                CashbookError::InvalidEntry(format!("month must be 1-12, got {month}")),
            ),
            ReportKind::Quarterly { quarter, .. } if !(1..=4).contains(quarter) => Err(
                CashbookError::InvalidEntry(format!("quarter must be 1-4, got {quarter}")),
            ),
            ReportKind::Custom { from, to } if from > to => Err(CashbookError::InvalidEntry(
                format!("--from {from} is after --to {to}"),
            )),
            ReportKind::Customer(n) | ReportKind::Category(n) if n.trim().is_empty() => Err(
                CashbookError::InvalidEntry("a name is required".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn includes(&self, t: &Transaction) -> bool {
        match self {
            ReportKind::Customer(name) => &t.name == name,
            ReportKind::Category(name) => &t.particular == name,
            _ => self
                .bounds()
                .is_some_and(|(start, end)| t.date >= start && t.date <= end),
        }
    }
}

pub fn slug(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub period: String,
    /// Newest first.
    pub rows: Vec<Transaction>,
    pub totals: Totals,
    pub cashflow: Vec<CashflowMonth>,
}

pub fn build(txns: &[Transaction], kind: ReportKind) -> Result<Report> {
    kind.validate()?;
    let mut rows: Vec<Transaction> = txns.iter().filter(|t| kind.includes(t)).cloned().collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    let totals = stats::totals(&rows);
    let cashflow = stats::cashflow(&rows);
    Ok(Report {
        title: kind.title().to_string(),
        period: kind.period_label(),
        kind,
        rows,
        totals,
        cashflow,
    })
}

/// Years with data plus the current year, newest first.
pub fn years(txns: &[Transaction], today: NaiveDate) -> Vec<i32> {
    let mut set: BTreeSet<i32> = txns.iter().map(|t| t.date.year()).collect();
    set.insert(today.year());
    set.into_iter().rev().collect()
}

pub fn customers(txns: &[Transaction]) -> Vec<String> {
    let set: BTreeSet<&str> = txns.iter().map(|t| t.name.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

pub fn categories(txns: &[Transaction]) -> Vec<String> {
    let set: BTreeSet<&str> = txns.iter().map(|t| t.particular.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}
