use chrono::NaiveDate;
use rusqlite::Connection;

use crate::categories::{self, FALLBACK_NAMES, FALLBACK_PARTICULARS};
use crate::db::{get_kv, set_kv};
use crate::demo::sample_transactions;
use crate::error::{CashbookError, Result};
use crate::models::{NewTransaction, Transaction};
use crate::remote::Backend;

pub const CACHE_KEY: &str = "ledger";
const CORRUPT_KEY: &str = "ledger.corrupt";

/// The in-memory ledger plus its local cache and optional remote backend.
/// Every mutation is written to the cache first; the remote only sees it while
/// the store is connected.
pub struct LedgerStore {
    conn: Connection,
    backend: Option<Box<dyn Backend>>,
    transactions: Vec<Transaction>,
    connected: bool,
    last_error: Option<String>,
}

impl LedgerStore {
    pub fn open(conn: Connection, backend: Option<Box<dyn Backend>>, today: NaiveDate) -> Result<Self> {
        let transactions = match get_kv(&conn, CACHE_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Transaction>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    log::warn!("local ledger cache is unreadable ({e}); starting from sample data");
                    set_kv(&conn, CORRUPT_KEY, &raw)?;
                    let list = sample_transactions(today);
                    set_kv(&conn, CACHE_KEY, &serde_json::to_string(&list)?)?;
                    list
                }
            },
            None => {
                let list = sample_transactions(today);
                set_kv(&conn, CACHE_KEY, &serde_json::to_string(&list)?)?;
                list
            }
        };
        Ok(Self {
            conn,
            backend,
            transactions,
            connected: false,
            last_error: None,
        })
    }

    /// Pull the full ledger from the backend. On failure the local list is
    /// kept and the store is marked disconnected. Returns the connection state.
    pub fn refresh(&mut self) -> bool {
        let Some(backend) = &self.backend else {
            self.connected = false;
            return false;
        };
        match backend.fetch_transactions() {
            Ok(rows) => {
                let total = rows.len();
                let valid: Vec<Transaction> =
                    rows.into_iter().filter(Transaction::has_valid_amount).collect();
                if valid.len() < total {
                    log::warn!(
                        "skipped {} remote rows with negative or invalid amounts",
                        total - valid.len()
                    );
                }
                log::info!("fetched {} transactions from {}", valid.len(), backend.describe());
                self.transactions = valid;
                self.connected = true;
                self.last_error = None;
                if let Err(e) = self.persist() {
                    log::error!("could not write local cache: {e}");
                }
            }
            Err(e) => {
                log::warn!("remote fetch failed: {e}");
                self.connected = false;
                self.last_error = Some(e.to_string());
            }
        }
        self.connected
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_description(&self) -> Option<String> {
        self.backend.as_ref().map(|b| b.describe())
    }

    /// Swap the remote backend, e.g. after credentials change. The store is
    /// offline until the next `refresh`.
    pub fn set_backend(&mut self, backend: Option<Box<dyn Backend>>) {
        self.backend = backend;
        self.connected = false;
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Resolve a full id or a unique id prefix (as printed by `cashbook list`).
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        let needle = id_or_prefix.trim();
        if let Some(t) = self.get(needle) {
            return Ok(t.id.clone());
        }
        let hits: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| !needle.is_empty() && t.id.starts_with(needle))
            .collect();
        match hits.as_slice() {
            [one] => Ok(one.id.clone()),
            [] => Err(CashbookError::NotFound(needle.to_string())),
            _ => Err(CashbookError::InvalidEntry(format!(
                "id prefix '{needle}' matches {} transactions",
                hits.len()
            ))),
        }
    }

    pub fn add(&mut self, new: NewTransaction) -> Result<Transaction> {
        let txn = Transaction::from_new(uuid::Uuid::new_v4().to_string(), new);
        check_amount(&txn)?;
        self.transactions.insert(0, txn.clone());
        self.persist()?;
        self.push("insert", |b| b.insert_transaction(&txn));
        log::info!("added transaction {} ({} {})", txn.id, txn.kind, txn.amount);
        Ok(txn)
    }

    pub fn update(&mut self, txn: Transaction) -> Result<()> {
        check_amount(&txn)?;
        let slot = self
            .transactions
            .iter_mut()
            .find(|t| t.id == txn.id)
            .ok_or_else(|| CashbookError::NotFound(txn.id.clone()))?;
        *slot = Transaction {
            category: txn.particular.clone(),
            ..txn.clone()
        };
        self.persist()?;
        self.push("update", |b| b.update_transaction(&txn));
        log::info!("updated transaction {}", txn.id);
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<Transaction> {
        let idx = self
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CashbookError::NotFound(id.to_string()))?;
        let removed = self.transactions.remove(idx);
        self.persist()?;
        self.push("delete", |b| b.delete_transaction(id));
        log::info!("deleted transaction {id}");
        Ok(removed)
    }

    /// Counterparties seen in the ledger, or the stock list when it is empty.
    pub fn names(&self) -> Vec<String> {
        categories::distinct_or(self.transactions.iter().map(|t| t.name.as_str()), FALLBACK_NAMES)
    }

    pub fn particulars(&self) -> Vec<String> {
        categories::distinct_or(
            self.transactions.iter().map(|t| t.particular.as_str()),
            FALLBACK_PARTICULARS,
        )
    }

    /// Category choices for the entry form: presets plus everything observed.
    pub fn category_choices(&self) -> Vec<String> {
        let observed: Vec<String> = self.transactions.iter().map(|t| t.particular.clone()).collect();
        categories::choices(&observed)
    }

    fn persist(&self) -> Result<()> {
        set_kv(&self.conn, CACHE_KEY, &serde_json::to_string(&self.transactions)?)
    }

    fn push<F>(&mut self, what: &str, op: F)
    where
        F: FnOnce(&dyn Backend) -> Result<()>,
    {
        if !self.connected {
            return;
        }
        let Some(backend) = &self.backend else {
            return;
        };
        if let Err(e) = op(backend.as_ref()) {
            log::error!("remote {what} failed, keeping local copy: {e}");
            self.connected = false;
            self.last_error = Some(e.to_string());
        }
    }
}

/// A non-finite amount serializes as `null` and would make the whole cache
/// unreadable on the next open.
fn check_amount(txn: &Transaction) -> Result<()> {
    if txn.has_valid_amount() {
        Ok(())
    } else {
        Err(CashbookError::InvalidEntry(format!(
            "amount {} must be a finite, non-negative number",
            txn.amount
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::TransactionType;

    #[derive(Default)]
    struct FakeRemote {
        rows: Vec<Transaction>,
        fail: bool,
        calls: Vec<String>,
    }

    struct FakeBackend(Rc<RefCell<FakeRemote>>);

    impl FakeBackend {
        fn check(&self, call: String) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.calls.push(call);
            if state.fail {
                Err(CashbookError::Remote { status: 503, message: "down".to_string() })
            } else {
                Ok(())
            }
        }
    }

    impl Backend for FakeBackend {
        fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
            self.check("fetch".to_string())?;
            Ok(self.0.borrow().rows.clone())
        }
        fn insert_transaction(&self, txn: &Transaction) -> Result<()> {
            self.check(format!("insert {}", txn.name))
        }
        fn update_transaction(&self, txn: &Transaction) -> Result<()> {
            self.check(format!("update {}", txn.name))
        }
        fn delete_transaction(&self, id: &str) -> Result<()> {
            self.check(format!("delete {id}"))
        }
        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn test_conn(dir: &tempfile::TempDir) -> Connection {
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        conn
    }

    fn new_txn(name: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            name: name.to_string(),
            particular: "Rent".to_string(),
            description: None,
            amount,
            kind: TransactionType::Expense,
            date: today(),
        }
    }

    fn remote_row(id: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            name: "Global Solutions".to_string(),
            particular: "Client Payment".to_string(),
            description: None,
            amount,
            kind: TransactionType::Income,
            category: "Client Payment".to_string(),
            date: today(),
        }
    }

    fn with_fake(dir: &tempfile::TempDir, remote: FakeRemote) -> (LedgerStore, Rc<RefCell<FakeRemote>>) {
        let state = Rc::new(RefCell::new(remote));
        let store = LedgerStore::open(
            test_conn(dir),
            Some(Box::new(FakeBackend(Rc::clone(&state)))),
            today(),
        )
        .unwrap();
        (store, state)
    }

    #[test]
    fn test_first_open_seeds_sample_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        assert_eq!(store.transactions().len(), 5);
        assert!(!store.is_connected());
        assert!(get_kv(store.conn(), CACHE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_cache_survives_reopen_including_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        let ids: Vec<String> = store.transactions().iter().map(|t| t.id.clone()).collect();
        for id in ids {
            store.delete(&id).unwrap();
        }
        drop(store);
        let store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        assert!(store.transactions().is_empty());
    }

    #[test]
    fn test_corrupt_cache_falls_back_and_keeps_copy() {
        let dir = tempfile::tempdir().unwrap();
        let conn = test_conn(&dir);
        set_kv(&conn, CACHE_KEY, "{not json").unwrap();
        let store = LedgerStore::open(conn, None, today()).unwrap();
        assert_eq!(store.transactions().len(), 5);
        assert_eq!(get_kv(store.conn(), CORRUPT_KEY).unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_add_prepends_and_copies_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        let t = store.add(new_txn("Office Rent", 15000.0)).unwrap();
        assert_eq!(store.transactions()[0].id, t.id);
        assert_eq!(t.category, "Rent");
        assert_eq!(uuid::Uuid::parse_str(&t.id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_invalid_amounts_never_reach_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        let mine = store.add(new_txn("Mine", 250.0)).unwrap();

        assert!(matches!(
            store.add(new_txn("Huge", f64::INFINITY)),
            Err(CashbookError::InvalidEntry(_))
        ));
        assert!(store.add(new_txn("Broken", f64::NAN)).is_err());
        assert!(store.add(new_txn("Negative", -1.0)).is_err());
        let bad = Transaction {
            amount: f64::INFINITY,
            ..mine.clone()
        };
        assert!(store.update(bad).is_err());
        assert_eq!(store.transactions().len(), 6);

        drop(store);
        let store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        assert_eq!(store.transactions().len(), 6);
        assert_eq!(store.get(&mine.id).map(|t| t.amount), Some(250.0));
        assert!(get_kv(store.conn(), CORRUPT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_update_and_delete_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        let ghost = remote_row("ghost", 1.0);
        assert!(matches!(store.update(ghost), Err(CashbookError::NotFound(_))));
        assert!(matches!(store.delete("ghost"), Err(CashbookError::NotFound(_))));
    }

    #[test]
    fn test_update_replaces_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        let mut t = store.add(new_txn("Office Rent", 15000.0)).unwrap();
        t.particular = "CARRY OUT".to_string();
        t.amount = 16000.0;
        store.update(t.clone()).unwrap();
        let stored = store.get(&t.id).unwrap();
        assert_eq!(stored.amount, 16000.0);
        assert_eq!(stored.category, "CARRY OUT");
    }

    #[test]
    fn test_refresh_replaces_ledger_and_connects() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FakeRemote {
            rows: vec![remote_row("r1", 500.0), remote_row("r2", -3.0)],
            ..Default::default()
        };
        let (mut store, _state) = with_fake(&dir, remote);
        assert!(store.refresh());
        assert!(store.is_connected());
        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.transactions()[0].id, "r1");
    }

    #[test]
    fn test_refresh_failure_keeps_local_and_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FakeRemote { fail: true, ..Default::default() };
        let (mut store, _state) = with_fake(&dir, remote);
        assert!(!store.refresh());
        assert!(!store.is_connected());
        assert_eq!(store.transactions().len(), 5);
        assert!(store.last_error().unwrap().contains("down"));
    }

    #[test]
    fn test_set_backend_goes_offline_until_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _state) = with_fake(&dir, FakeRemote::default());
        assert!(store.refresh());
        store.set_backend(None);
        assert!(!store.is_connected());
        assert!(!store.has_backend());
        assert!(!store.refresh());

        let state = Rc::new(RefCell::new(FakeRemote::default()));
        store.set_backend(Some(Box::new(FakeBackend(Rc::clone(&state)))));
        assert_eq!(store.backend_description().as_deref(), Some("fake"));
        assert!(store.refresh());
    }

    #[test]
    fn test_writes_reach_remote_only_while_connected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, state) = with_fake(&dir, FakeRemote::default());

        store.add(new_txn("Offline", 1.0)).unwrap();
        assert!(state.borrow().calls.is_empty());

        store.refresh();
        let t = store.add(new_txn("Online", 2.0)).unwrap();
        store.delete(&t.id).unwrap();
        assert_eq!(
            state.borrow().calls,
            vec!["fetch".to_string(), "insert Online".to_string(), format!("delete {}", t.id)]
        );
    }

    #[test]
    fn test_failed_push_keeps_local_change_and_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, state) = with_fake(&dir, FakeRemote::default());
        store.refresh();
        state.borrow_mut().fail = true;

        let t = store.add(new_txn("Flaky", 3.0)).unwrap();
        assert!(store.get(&t.id).is_some());
        assert!(!store.is_connected());

        store.add(new_txn("After", 4.0)).unwrap();
        assert_eq!(state.borrow().calls.len(), 2);
    }

    #[test]
    fn test_names_and_particulars_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _state) = with_fake(&dir, FakeRemote::default());
        store.refresh();
        assert!(store.transactions().is_empty());
        assert_eq!(store.names().len(), FALLBACK_NAMES.len());
        assert_eq!(store.particulars().len(), FALLBACK_PARTICULARS.len());

        store.add(new_txn("Zed Traders", 1.0)).unwrap();
        assert_eq!(store.names(), vec!["Zed Traders".to_string()]);
        assert!(store.category_choices().contains(&"Rent".to_string()));
    }

    #[test]
    fn test_resolve_id_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(test_conn(&dir), None, today()).unwrap();
        assert_eq!(store.resolve_id("sample-3").unwrap(), "sample-3");
        assert!(matches!(store.resolve_id("sample-"), Err(CashbookError::InvalidEntry(_))));
        assert!(matches!(store.resolve_id("nope"), Err(CashbookError::NotFound(_))));
    }
}
