use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_store, today, FilterArgs};
use crate::error::Result;
use crate::fmt::{money, number, short_month};
use crate::settings::load_settings;
use crate::stats::DashboardStats;

pub fn run(filters: &FilterArgs) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings, true)?;
    let filter = filters.to_filter(today())?;
    let stats = DashboardStats::compute(store.transactions(), &filter);

    println!("{}  ({})", settings.company_name.bold(), filter.describe());
    println!("Total Cash In    {}", money(stats.totals.income).green());
    println!("Total Cash Out   {}", money(stats.totals.expense).red());
    let net = if stats.totals.balance < 0.0 {
        money(stats.totals.balance).red().bold()
    } else {
        money(stats.totals.balance).green().bold()
    };
    println!("Net Balance      {net}");
    println!("Entries          {}", number(stats.count));

    if stats.monthly.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expense", "Net"]);
    for m in &stats.monthly {
        let year = m.month.get(..4).unwrap_or("");
        let net = if m.net() < 0.0 {
            money(m.net()).red().to_string()
        } else {
            money(m.net()).green().to_string()
        };
        table.add_row(vec![
            Cell::new(format!("{} {year}", short_month(&m.month))),
            Cell::new(money(m.income)),
            Cell::new(money(m.expense)),
            Cell::new(net),
        ]);
    }
    println!("\nMonthly Trend (all time)\n{table}");
    Ok(())
}
