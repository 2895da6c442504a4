use chrono::NaiveDate;

use crate::categories;
use crate::error::{CashbookError, Result};
use crate::fmt::CURRENCY;
use crate::models::{NewTransaction, Transaction, TransactionType};

/// Raw text of the add/edit form before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub date: String,
    pub name: String,
    pub particular: String,
    pub amount: String,
    pub description: String,
    pub kind: TransactionType,
}

impl EntryDraft {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today.to_string(),
            name: String::new(),
            particular: String::new(),
            amount: String::new(),
            description: String::new(),
            kind: TransactionType::Expense,
        }
    }

    pub fn from_transaction(t: &Transaction) -> Self {
        Self {
            date: t.date.to_string(),
            name: t.name.clone(),
            particular: t.particular.clone(),
            amount: format!("{:.2}", t.amount),
            description: t.description.clone().unwrap_or_default(),
            kind: t.kind,
        }
    }

    /// Set the category; presets with a direction switch the type.
    pub fn select_category(&mut self, category: &str) {
        self.particular = category.trim().to_string();
        if let Some(kind) = categories::default_type(category) {
            self.kind = kind;
        }
    }

    pub fn validate(&self) -> Result<NewTransaction> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CashbookError::InvalidEntry("name is required".to_string()));
        }
        let particular = self.particular.trim();
        if particular.is_empty() {
            return Err(CashbookError::InvalidEntry("particular is required".to_string()));
        }
        let amount = parse_amount(&self.amount)?;
        let date = parse_date(&self.date)?;
        let description = self.description.trim();
        Ok(NewTransaction {
            name: name.to_string(),
            particular: particular.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            amount,
            kind: self.kind,
            date,
        })
    }
}

/// Accepts "1,234.50", "₹500" or "42". Rounded to paise.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(CURRENCY)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(CashbookError::InvalidEntry("amount is required".to_string()));
    }
    let value: f64 = cleaned
        .parse()
        .map_err(|_| CashbookError::InvalidEntry(format!("'{}' is not a number", raw.trim())))?;
    if value < 0.0 {
        return Err(CashbookError::InvalidEntry(
            "amount cannot be negative; set the type to expense instead".to_string(),
        ));
    }
    // Checked after rounding: scaling a huge finite value can overflow.
    let rounded = (value * 100.0).round() / 100.0;
    if !rounded.is_finite() {
        return Err(CashbookError::InvalidEntry("amount must be a finite number".to_string()));
    }
    Ok(rounded)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CashbookError::InvalidEntry(format!("'{}' is not a date (YYYY-MM-DD)", raw.trim()))
    })
}
