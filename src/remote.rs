use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::{CashbookError, Result};
use crate::models::Transaction;
use crate::settings::RemoteCredentials;

const TABLE: &str = "transactions";
const TIMEOUT: Duration = Duration::from_secs(10);

/// SQL for creating the remote tables. Paste into the backend's SQL editor.
pub const SCHEMA_SQL: &str = "\
-- Transactions ledger
create table if not exists public.transactions (
  id uuid primary key default gen_random_uuid(),
  name text not null,
  particular text not null,
  description text,
  amount numeric not null check (amount >= 0),
  type text not null check (type in ('income', 'expense')),
  category text not null,
  date date not null default current_date,
  created_at timestamptz not null default now()
);

create index if not exists transactions_date_idx on public.transactions (date desc);

-- Application users (documented only; login is checked locally)
create table if not exists public.users (
  id uuid primary key default gen_random_uuid(),
  username text not null unique,
  name text not null,
  role text not null check (role in ('admin', 'staff')),
  password_hash text not null,
  created_at timestamptz not null default now()
);

alter table public.transactions enable row level security;
create policy \"anon full access\" on public.transactions
  for all using (true) with check (true);
";

/// Storage the ledger syncs with. Calls are blocking and never retried.
pub trait Backend {
    /// Every transaction, newest first.
    fn fetch_transactions(&self) -> Result<Vec<Transaction>>;
    fn insert_transaction(&self, txn: &Transaction) -> Result<()>;
    fn update_transaction(&self, txn: &Transaction) -> Result<()>;
    fn delete_transaction(&self, id: &str) -> Result<()>;
    /// Where the backend lives, for status output.
    fn describe(&self) -> String;
}

/// PostgREST-style table API (`<url>/rest/v1/<table>`).
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(creds: &RemoteCredentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&creds.key)
            .map_err(|e| CashbookError::Settings(format!("invalid remote key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", creds.key))
            .map_err(|e| CashbookError::Settings(format!("invalid remote key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: creds.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let resp = request.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(classify_error(status.as_u16(), &body))
    }
}

impl Backend for RestBackend {
    fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
        let resp = self.send(
            self.client
                .get(self.table_url())
                .query(&[("select", "*"), ("order", "date.desc")]),
        )?;
        let rows: Vec<Transaction> = resp.json()?;
        Ok(rows)
    }

    fn insert_transaction(&self, txn: &Transaction) -> Result<()> {
        self.send(
            self.client
                .post(self.table_url())
                .header("Prefer", "return=minimal")
                .json(&[txn]),
        )?;
        Ok(())
    }

    fn update_transaction(&self, txn: &Transaction) -> Result<()> {
        let id_filter = format!("eq.{}", txn.id);
        self.send(
            self.client
                .patch(self.table_url())
                .query(&[("id", id_filter.as_str())])
                .header("Prefer", "return=minimal")
                .json(txn),
        )?;
        Ok(())
    }

    fn delete_transaction(&self, id: &str) -> Result<()> {
        let id_filter = format!("eq.{id}");
        self.send(
            self.client
                .delete(self.table_url())
                .query(&[("id", id_filter.as_str())]),
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Turn a failed response into an error, recognising the two schema problems
/// users hit when the table was never created or is outdated.
pub fn classify_error(status: u16, body: &str) -> CashbookError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    let lower = message.to_lowercase();
    let missing_relation = lower.contains("relation")
        && lower.contains("transactions")
        && lower.contains("does not exist");
    if missing_relation || lower.contains("could not find the table") {
        return CashbookError::MissingTable;
    }
    if lower.contains("column") && lower.contains("date") && lower.contains("does not exist") {
        return CashbookError::SchemaMismatch;
    }
    CashbookError::Remote { status, message }
}
