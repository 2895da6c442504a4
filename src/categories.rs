use std::collections::BTreeSet;

use crate::models::TransactionType;

pub struct Preset {
    pub name: &'static str,
    pub default_type: Option<TransactionType>,
}

pub const PRESETS: &[Preset] = &[
    Preset { name: "CARRY IN", default_type: Some(TransactionType::Income) },
    Preset { name: "CARRY OUT", default_type: Some(TransactionType::Expense) },
    Preset { name: "Inventory", default_type: None },
    Preset { name: "Salary", default_type: None },
    Preset { name: "Food/Meals", default_type: None },
    Preset { name: "Electricity", default_type: None },
    Preset { name: "Transport", default_type: None },
    Preset { name: "Rent", default_type: None },
    Preset { name: "Miscellaneous", default_type: None },
];

/// Counterparties offered when the ledger is empty.
pub const FALLBACK_NAMES: &[&str] = &[
    "SR INFOTECH",
    "Aman Enterprises",
    "Rahul Sharma",
    "Priya Gupta",
    "Hindustan Traders",
    "Global Solutions",
    "Self Account",
];

/// Particulars offered when the ledger is empty.
pub const FALLBACK_PARTICULARS: &[&str] = &[
    "CARRY IN",
    "CARRY OUT",
    "Inventory Purchase",
    "Client Payment",
    "Office Rent",
    "Electricity Bill",
    "Salary Payout",
    "Miscellaneous",
    "Conveyance",
];

/// Distinct non-empty values, sorted. Falls back to `fallback` when nothing is observed.
pub fn distinct_or<'a, I>(values: I, fallback: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let set: BTreeSet<&str> = values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if set.is_empty() {
        fallback.iter().map(|s| s.to_string()).collect()
    } else {
        set.into_iter().map(str::to_string).collect()
    }
}

/// Presets first, then observed categories not already listed (case-insensitive).
pub fn choices(observed: &[String]) -> Vec<String> {
    let mut out: Vec<String> = PRESETS.iter().map(|p| p.name.to_string()).collect();
    for o in observed {
        let o = o.trim();
        if o.is_empty() {
            continue;
        }
        if !out.iter().any(|c| c.eq_ignore_ascii_case(o)) {
            out.push(o.to_string());
        }
    }
    out
}

pub fn search<'a>(choices: &'a [String], query: &str) -> Vec<&'a String> {
    let q = query.trim().to_lowercase();
    choices
        .iter()
        .filter(|c| q.is_empty() || c.to_lowercase().contains(&q))
        .collect()
}

pub fn default_type(category: &str) -> Option<TransactionType> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(category.trim()))
        .and_then(|p| p.default_type)
}

/// The canonical spelling of an existing choice, or the trimmed input as a new category.
pub fn resolve(input: &str, choices: &[String]) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    Some(
        choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(input))
            .cloned()
            .unwrap_or_else(|| input.to_string()),
    )
}
