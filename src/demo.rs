use chrono::{Days, NaiveDate};

use crate::models::{Transaction, TransactionType};

// (days ago, name, particular, amount, type)
const SAMPLE: &[(u64, &str, &str, f64, TransactionType)] = &[
    (0, "Aman Enterprises", "CARRY IN", 50000.00, TransactionType::Income),
    (0, "Office Rent", "CARRY OUT", 15000.00, TransactionType::Expense),
    (1, "Rahul Sharma", "Salary Payout", 35000.00, TransactionType::Expense),
    (2, "Hindustan Traders", "Inventory Purchase", 22450.50, TransactionType::Expense),
    (3, "Priya Gupta", "Client Payment", 12000.00, TransactionType::Income),
];

/// Starter ledger shown before anything has been recorded or synced.
pub fn sample_transactions(today: NaiveDate) -> Vec<Transaction> {
    SAMPLE
        .iter()
        .enumerate()
        .map(|(i, (days_ago, name, particular, amount, kind))| Transaction {
            id: format!("sample-{}", i + 1),
            name: name.to_string(),
            particular: particular.to_string(),
            description: None,
            amount: *amount,
            kind: *kind,
            category: particular.to_string(),
            date: today.checked_sub_days(Days::new(*days_ago)).unwrap_or(today),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::totals;

    #[test]
    fn test_sample_is_newest_first_and_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let txns = sample_transactions(today);
        assert_eq!(txns.len(), 5);
        assert_eq!(txns[0].date, today);
        assert_eq!(txns[4].date, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert!(txns.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_sample_totals() {
        let t = totals(&sample_transactions(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));
        assert_eq!(t.income, 62000.0);
        assert_eq!(t.expense, 72450.5);
    }
}
