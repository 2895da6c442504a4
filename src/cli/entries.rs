use std::io::Write;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categories;
use crate::cli::{open_store, today, FilterArgs};
use crate::entry::EntryDraft;
use crate::error::{CashbookError, Result};
use crate::fmt::money;
use crate::models::{Transaction, TransactionType};
use crate::settings::load_settings;
use crate::stats::totals;

const ID_WIDTH: usize = 8;

/// Fields given on `cashbook edit`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct EntryChanges {
    pub name: Option<String>,
    pub particular: Option<String>,
    pub amount: Option<String>,
    pub kind: Option<TransactionType>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl EntryChanges {
    /// Apply onto `draft`. A new particular brings its preset type unless a
    /// type is given explicitly.
    pub fn apply(self, draft: &mut EntryDraft, choices: &[String]) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(particular) = self.particular {
            if let Some(resolved) = categories::resolve(&particular, choices) {
                draft.select_category(&resolved);
            } else {
                draft.particular = particular;
            }
        }
        if let Some(amount) = self.amount {
            draft.amount = amount;
        }
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
    }
}

pub fn add(
    name: &str,
    particular: &str,
    amount: &str,
    kind: Option<TransactionType>,
    date: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let mut store = open_store(&settings, true)?;

    let mut draft = EntryDraft::new(today());
    EntryChanges {
        name: Some(name.to_string()),
        particular: Some(particular.to_string()),
        amount: Some(amount.to_string()),
        kind,
        date: date.map(str::to_string),
        description: description.map(str::to_string),
    }
    .apply(&mut draft, &store.category_choices());

    let txn = store.add(draft.validate()?)?;
    println!(
        "Added {} {} {} on {} [{}]",
        txn.kind,
        money(txn.amount),
        txn.name,
        txn.date,
        short_id(&txn.id)
    );
    warn_if_offline(&store);
    Ok(())
}

pub fn edit(id: &str, changes: EntryChanges) -> Result<()> {
    let settings = load_settings();
    let mut store = open_store(&settings, true)?;
    let id = store.resolve_id(id)?;
    let current = store
        .get(&id)
        .cloned()
        .ok_or_else(|| CashbookError::NotFound(id.clone()))?;

    let mut draft = EntryDraft::from_transaction(&current);
    changes.apply(&mut draft, &store.category_choices());
    let updated = Transaction::from_new(current.id.clone(), draft.validate()?);
    if updated == current {
        println!("Nothing to change.");
        return Ok(());
    }
    store.update(updated.clone())?;
    println!(
        "Updated [{}] {} {} {} on {}",
        short_id(&updated.id),
        updated.kind,
        money(updated.amount),
        updated.name,
        updated.date
    );
    warn_if_offline(&store);
    Ok(())
}

pub fn delete(id: &str, yes: bool) -> Result<()> {
    let settings = load_settings();
    let mut store = open_store(&settings, true)?;
    let id = store.resolve_id(id)?;
    let Some(txn) = store.get(&id).cloned() else {
        return Err(CashbookError::NotFound(id));
    };

    if !yes {
        print!(
            "Delete {} {} {} on {}? [y/N] ",
            txn.kind,
            money(txn.amount),
            txn.name,
            txn.date
        );
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.delete(&id)?;
    println!("Deleted {} ({})", removed.name, removed.date);
    warn_if_offline(&store);
    Ok(())
}

pub fn list(filters: &FilterArgs, limit: Option<usize>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings, true)?;
    let filter = filters.to_filter(today())?;

    let mut rows = filter.apply(store.transactions());
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    let t = totals(&rows);
    let total = rows.len();
    if let Some(n) = limit {
        rows.truncate(n);
    }

    if rows.is_empty() {
        println!("No transactions match ({}).", filter.describe());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Name", "Particular", "Type", "Amount", "Description"]);
    for r in &rows {
        let amount = match r.kind {
            TransactionType::Income => money(r.amount).green().to_string(),
            TransactionType::Expense => money(r.amount).red().to_string(),
        };
        table.add_row(vec![
            Cell::new(short_id(&r.id)),
            Cell::new(r.date),
            Cell::new(&r.name),
            Cell::new(&r.particular),
            Cell::new(r.kind),
            Cell::new(amount),
            Cell::new(r.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("Statement ({})\n{table}", filter.describe());
    if rows.len() < total {
        println!("Showing {} of {total} entries.", rows.len());
    }
    println!(
        "Cash in {}  Cash out {}  Balance {}",
        money(t.income).green(),
        money(t.expense).red(),
        money(t.balance).bold()
    );
    Ok(())
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(ID_WIDTH) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn warn_if_offline(store: &crate::ledger::LedgerStore) {
    if store.has_backend() && !store.is_connected() {
        eprintln!(
            "{} change saved locally only: {}",
            "Offline:".yellow().bold(),
            store.last_error().unwrap_or("remote unavailable")
        );
    }
}
