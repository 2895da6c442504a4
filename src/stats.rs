use std::collections::BTreeMap;

use crate::filter::FilterState;
use crate::models::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

impl MonthlyBucket {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashflowMonth {
    pub month: String,
    pub inflows: f64,
    pub outflows: f64,
    pub net: f64,
    pub running_balance: f64,
}

pub fn totals(txns: &[Transaction]) -> Totals {
    let mut t = Totals::default();
    for txn in txns {
        match txn.kind {
            TransactionType::Income => t.income += txn.amount,
            TransactionType::Expense => t.expense += txn.amount,
        }
    }
    t.balance = t.income - t.expense;
    t
}

pub fn month_key(txn: &Transaction) -> String {
    txn.date.format("%Y-%m").to_string()
}

/// Income and expense per calendar month, oldest first.
pub fn monthly_breakdown(txns: &[Transaction]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for txn in txns {
        let entry = buckets.entry(month_key(txn)).or_insert((0.0, 0.0));
        match txn.kind {
            TransactionType::Income => entry.0 += txn.amount,
            TransactionType::Expense => entry.1 += txn.amount,
        }
    }
    buckets
        .into_iter()
        .map(|(month, (income, expense))| MonthlyBucket { month, income, expense })
        .collect()
}

pub fn cashflow(txns: &[Transaction]) -> Vec<CashflowMonth> {
    let mut running = 0.0;
    monthly_breakdown(txns)
        .into_iter()
        .map(|b| {
            let net = b.net();
            running += net;
            CashflowMonth {
                month: b.month,
                inflows: b.income,
                outflows: b.expense,
                net,
                running_balance: running,
            }
        })
        .collect()
}

/// Figures shown on the dashboard. Totals follow the active filter; the
/// monthly trend always covers the whole ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub totals: Totals,
    pub count: usize,
    pub monthly: Vec<MonthlyBucket>,
}

impl DashboardStats {
    pub fn compute(all: &[Transaction], filter: &FilterState) -> Self {
        let filtered = filter.apply(all);
        Self {
            totals: totals(&filtered),
            count: filtered.len(),
            monthly: monthly_breakdown(all),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(amount: f64, kind: TransactionType, date: &str) -> Transaction {
        Transaction {
            id: format!("{date}-{amount}"),
            name: "Test".to_string(),
            particular: "Misc".to_string(),
            description: None,
            amount,
            kind,
            category: "Misc".to_string(),
            date: date.parse::<NaiveDate>().unwrap(),
        }
    }

    #[test]
    fn test_worked_example() {
        let txns = vec![
            txn(100.0, TransactionType::Income, "2024-01-05"),
            txn(40.0, TransactionType::Expense, "2024-01-20"),
        ];
        let t = totals(&txns);
        assert_eq!(t.income, 100.0);
        assert_eq!(t.expense, 40.0);
        assert_eq!(t.balance, 60.0);

        let monthly = monthly_breakdown(&txns);
        assert_eq!(
            monthly,
            vec![MonthlyBucket { month: "2024-01".to_string(), income: 100.0, expense: 40.0 }]
        );
    }

    #[test]
    fn test_empty_ledger() {
        assert_eq!(totals(&[]), Totals::default());
        assert!(monthly_breakdown(&[]).is_empty());
        assert!(cashflow(&[]).is_empty());
    }

    #[test]
    fn test_income_never_counts_as_expense() {
        let txns = vec![
            txn(10.0, TransactionType::Income, "2024-01-01"),
            txn(20.0, TransactionType::Income, "2024-02-01"),
        ];
        let t = totals(&txns);
        assert_eq!(t.expense, 0.0);
        assert_eq!(t.balance, t.income - t.expense);

        let only_expense = vec![txn(5.5, TransactionType::Expense, "2024-01-01")];
        assert_eq!(totals(&only_expense).income, 0.0);
        assert_eq!(totals(&only_expense).balance, -5.5);
    }

    #[test]
    fn test_months_sorted_with_seven_char_keys() {
        let txns = vec![
            txn(1.0, TransactionType::Income, "2024-11-30"),
            txn(2.0, TransactionType::Expense, "2023-02-01"),
            txn(3.0, TransactionType::Income, "2024-03-15"),
            txn(4.0, TransactionType::Income, "2024-03-01"),
        ];
        let monthly = monthly_breakdown(&txns);
        let keys: Vec<&str> = monthly.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(keys, vec!["2023-02", "2024-03", "2024-11"]);
        assert!(monthly.iter().all(|b| b.month.len() == 7));
        assert_eq!(monthly[1].income, 7.0);

        let bucket_total: f64 = monthly.iter().map(|b| b.income + b.expense).sum();
        let member_total: f64 = txns.iter().map(|t| t.amount).sum();
        assert_eq!(bucket_total, member_total);
    }

    #[test]
    fn test_cashflow_running_balance() {
        let txns = vec![
            txn(100.0, TransactionType::Income, "2024-01-05"),
            txn(40.0, TransactionType::Expense, "2024-01-20"),
            txn(70.0, TransactionType::Expense, "2024-02-03"),
        ];
        let cf = cashflow(&txns);
        assert_eq!(cf.len(), 2);
        assert_eq!(cf[0].net, 60.0);
        assert_eq!(cf[0].running_balance, 60.0);
        assert_eq!(cf[1].net, -70.0);
        assert_eq!(cf[1].running_balance, -10.0);
    }

    #[test]
    fn test_dashboard_totals_filtered_trend_unfiltered() {
        let txns = vec![
            txn(100.0, TransactionType::Income, "2024-01-05"),
            txn(40.0, TransactionType::Expense, "2024-02-20"),
        ];
        let filter = FilterState { kind: Some(TransactionType::Expense), ..Default::default() };
        let stats = DashboardStats::compute(&txns, &filter);
        assert_eq!(stats.totals.income, 0.0);
        assert_eq!(stats.totals.expense, 40.0);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.monthly.len(), 2);
        assert_eq!(stats.monthly[0].income, 100.0);
    }
}
