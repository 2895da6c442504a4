use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::categories;
use crate::cli::open_store;
use crate::error::Result;
use crate::models::Transaction;
use crate::settings::load_settings;

/// (category, default type, entries) for every preset and observed category.
pub fn usage(txns: &[Transaction]) -> Vec<(String, Option<String>, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for t in txns {
        *counts.entry(t.particular.to_lowercase()).or_default() += 1;
    }
    let observed: Vec<String> = txns.iter().map(|t| t.particular.clone()).collect();
    categories::choices(&observed)
        .into_iter()
        .map(|name| {
            let kind = categories::default_type(&name).map(|k| k.to_string());
            let n = counts.get(&name.to_lowercase()).copied().unwrap_or(0);
            (name, kind, n)
        })
        .collect()
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings, false)?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Default type", "Entries"]);
    for (name, kind, n) in usage(store.transactions()) {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(kind.unwrap_or_else(|| "-".to_string())),
            Cell::new(n),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
