use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};

use crate::error::CashbookError;
use crate::models::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    All,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    Custom,
}

impl Period {
    pub const NAMED: [Period; 5] = [
        Period::All,
        Period::ThisMonth,
        Period::LastMonth,
        Period::ThisQuarter,
        Period::ThisYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Period::All => "All time",
            Period::ThisMonth => "This month",
            Period::LastMonth => "Last month",
            Period::ThisQuarter => "This quarter",
            Period::ThisYear => "This year",
            Period::Custom => "Custom range",
        }
    }

    /// Inclusive date bounds relative to `today`. `None` for All and Custom.
    pub fn range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let month_start = |d: NaiveDate| NaiveDate::from_ymd_opt(d.year(), d.month(), 1);
        match self {
            Period::All | Period::Custom => None,
            Period::ThisMonth => {
                let start = month_start(today)?;
                Some((start, end_of_month(start)?))
            }
            Period::LastMonth => {
                let start = month_start(today)?.checked_sub_months(Months::new(1))?;
                Some((start, end_of_month(start)?))
            }
            Period::ThisQuarter => {
                let q = (today.month() - 1) / 3;
                let start = NaiveDate::from_ymd_opt(today.year(), q * 3 + 1, 1)?;
                let last = start.checked_add_months(Months::new(2))?;
                Some((start, end_of_month(last)?))
            }
            Period::ThisYear => Some((
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            )),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::NAMED.iter().position(|p| *p == self).map_or(0, |i| i + 1);
        Self::NAMED[idx % Self::NAMED.len()]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = CashbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "all" => Ok(Period::All),
            "this-month" | "month" => Ok(Period::ThisMonth),
            "last-month" => Ok(Period::LastMonth),
            "this-quarter" | "quarter" => Ok(Period::ThisQuarter),
            "this-year" | "year" => Ok(Period::ThisYear),
            other => Err(CashbookError::InvalidEntry(format!(
                "unknown period '{other}' (all, this-month, last-month, this-quarter, this-year)"
            ))),
        }
    }
}

pub fn end_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first
        .with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Statement and dashboard filter criteria. `None` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub period: Period,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub search: String,
}

impl FilterState {
    pub fn with_period(mut self, period: Period, today: NaiveDate) -> Self {
        self.set_period(period, today);
        self
    }

    pub fn set_period(&mut self, period: Period, today: NaiveDate) {
        self.period = period;
        if period == Period::Custom {
            return;
        }
        match period.range(today) {
            Some((start, end)) => {
                self.start = Some(start);
                self.end = Some(end);
            }
            None => {
                self.start = None;
                self.end = None;
            }
        }
    }

    pub fn set_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.period = if start.is_none() && end.is_none() {
            Period::All
        } else {
            Period::Custom
        };
        self.start = start;
        self.end = end;
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        if let Some(kind) = self.kind {
            if t.kind != kind {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &t.particular != category {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &t.name != name {
                return false;
            }
        }
        if let Some(start) = self.start {
            if t.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if t.date > end {
                return false;
            }
        }
        // Surrounding whitespace is ignored; a blank term matches everything.
        let term = self.search.trim().to_lowercase();
        if !term.is_empty() {
            let hit = t.name.to_lowercase().contains(&term)
                || t.particular.to_lowercase().contains(&term)
                || t
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Matching transactions, in their original order.
    pub fn apply(&self, txns: &[Transaction]) -> Vec<Transaction> {
        txns.iter().filter(|t| self.matches(t)).cloned().collect()
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
            || self.end.is_some()
            || self.kind.is_some()
            || self.category.is_some()
            || self.name.is_some()
            || !self.search.trim().is_empty()
    }

    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (self.period, self.start, self.end) {
            (Period::Custom, s, e) => {
                let s = s.map(|d| d.to_string()).unwrap_or_else(|| "...".to_string());
                let e = e.map(|d| d.to_string()).unwrap_or_else(|| "...".to_string());
                parts.push(format!("{s} to {e}"));
            }
            (p, _, _) => parts.push(p.label().to_string()),
        }
        if let Some(kind) = self.kind {
            parts.push(format!("type: {kind}"));
        }
        if let Some(c) = &self.category {
            parts.push(format!("category: {c}"));
        }
        if let Some(n) = &self.name {
            parts.push(format!("name: {n}"));
        }
        if !self.search.trim().is_empty() {
            parts.push(format!("search: '{}'", self.search.trim()));
        }
        parts.join(" | ")
    }
}

/// Advance an optional selection through `options`, wrapping back to "All" (None).
pub fn cycle_option(current: &Option<String>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(cur) => options
            .iter()
            .position(|o| o == cur)
            .and_then(|i| options.get(i + 1))
            .cloned(),
    }
}
