//! Mock Plaid API server for testing
//!
//! A small HTTP server that answers the endpoints the adapter uses, so the
//! whole stack (adapter, HTTP client, wire models) can be exercised without
//! vendor credentials.
//!
//! - POST /link/token/create returns { link_token, expiration }
//! - POST /transactions/get pages by options.offset / options.count
//! - POST /transactions/sync pages by opaque "cursor-N" cursors
//!
//! Every request must carry a client_id starting with `test_`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// Mock Plaid server for testing
pub struct MockPlaidServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: JsonValue,
}

/// Configuration for mock data generation
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub num_accounts: usize,
    /// Transactions spread round-robin over the accounts
    pub num_transactions: usize,
    /// Vendor error code every data endpoint answers with
    pub error_code: Option<String>,
    /// Answer with a non-JSON 500
    pub malformed: bool,
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            num_accounts: 3,
            num_transactions: 150,
            error_code: None,
            malformed: false,
            delay_ms: 0,
        }
    }
}

#[derive(Serialize, Clone)]
struct MockTransaction {
    transaction_id: String,
    account_id: String,
    amount: f64,
    iso_currency_code: String,
    date: String,
    name: String,
    merchant_name: Option<String>,
    payment_channel: String,
    pending: bool,
}

impl MockPlaidServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        // Non-blocking accept so `stop` can end the loop
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = requests_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &log);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests received for one endpoint
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockPlaidServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one HTTP request: method, path and body
fn read_request(stream: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while data.len() < body_start + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let mut parts = head.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();
    let body_end = data.len().min(body_start + content_length);
    Some((method, path, data[body_start..body_end].to_vec()))
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, log: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_nonblocking(false);

    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if method != "POST" {
        send_response(&mut stream, 405, "Method Not Allowed", "Method not allowed");
        return;
    }

    let body: JsonValue = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(_) => {
            send_error(&mut stream, "INVALID_REQUEST", "INVALID_BODY", "body is not valid JSON");
            return;
        }
    };

    log.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        body: body.clone(),
    });

    let client_id = body["client_id"].as_str().unwrap_or("");
    if !client_id.starts_with("test_") || body["secret"].as_str().unwrap_or("").is_empty() {
        send_error(
            &mut stream,
            "INVALID_INPUT",
            "INVALID_API_KEYS",
            "invalid client_id or secret provided",
        );
        return;
    }

    if config.malformed {
        send_response(&mut stream, 500, "Internal Server Error", "upstream exploded");
        return;
    }

    if let Some(code) = &config.error_code {
        send_error(&mut stream, "ITEM_ERROR", code, &format!("mock failure {}", code));
        return;
    }

    let response = match path.as_str() {
        "/link/token/create" => link_token_create(&body),
        "/item/public_token/exchange" => public_token_exchange(&body),
        "/sandbox/item/reset_login" => Ok(json!({ "reset_login": true, "request_id": "req-reset" })),
        "/item/get" => Ok(item_get()),
        "/accounts/balance/get" => Ok(accounts_balance_get(config)),
        "/transactions/get" => Ok(transactions_get(config, &body)),
        "/transactions/sync" => transactions_sync(config, &body),
        _ => {
            send_response(&mut stream, 404, "Not Found", "Endpoint not found");
            return;
        }
    };

    match response {
        Ok(json) => send_response(&mut stream, 200, "OK", &json.to_string()),
        Err((code, message)) => send_error(&mut stream, "INVALID_REQUEST", code, message),
    }
}

type MockResult = Result<JsonValue, (&'static str, &'static str)>;

fn link_token_create(body: &JsonValue) -> MockResult {
    let has_products = body.get("products").is_some();
    let access_token = body.get("access_token").and_then(JsonValue::as_str);

    if has_products && access_token.is_some() {
        return Err((
            "INVALID_FIELD",
            "products cannot be provided when access_token is set",
        ));
    }
    if !has_products && access_token.is_none() {
        return Err(("MISSING_FIELDS", "products is required for new links"));
    }

    let link_token = match access_token {
        Some(_) => "link-sandbox-update",
        None => "link-sandbox-new",
    };
    Ok(json!({
        "link_token": link_token,
        "expiration": "2030-01-01T04:00:00Z",
        "request_id": "req-link"
    }))
}

fn public_token_exchange(body: &JsonValue) -> MockResult {
    let public_token = body["public_token"].as_str().unwrap_or("");
    match public_token.strip_prefix("public-sandbox-") {
        Some(suffix) => Ok(json!({
            "access_token": format!("access-sandbox-{}", suffix),
            "item_id": format!("item-{}", suffix),
            "request_id": "req-exchange"
        })),
        None => Err(("INVALID_PUBLIC_TOKEN", "provided public token is in an invalid format")),
    }
}

fn item_get() -> JsonValue {
    json!({
        "item": {
            "item_id": "item-mock",
            "institution_id": "ins_109508",
            "consent_expiration_time": null,
            "available_products": ["balance", "identity"],
            "billed_products": ["transactions"],
            "webhook": "",
            "update_type": "background",
            "error": null
        },
        "status": {
            "transactions": {
                "last_successful_update": "2024-02-01T12:00:00Z",
                "last_failed_update": null
            }
        },
        "request_id": "req-item"
    })
}

fn accounts_balance_get(config: &MockConfig) -> JsonValue {
    let kinds = [
        ("Plaid Checking", "depository", "checking"),
        ("Plaid Saving", "depository", "savings"),
        ("Plaid Credit Card", "credit", "credit card"),
        ("Plaid Mortgage", "loan", "mortgage"),
    ];

    let accounts: Vec<JsonValue> = (0..config.num_accounts)
        .map(|i| {
            let (name, kind, subtype) = kinds[i % kinds.len()];
            json!({
                "account_id": format!("acc_{}", i),
                "name": name,
                "official_name": format!("{} Official", name),
                "type": kind,
                "subtype": subtype,
                "mask": format!("{:04}", i),
                "balances": {
                    "current": 100.0 + i as f64 * 10.0,
                    "available": if kind == "loan" { JsonValue::Null } else { json!(90.0 + i as f64) },
                    "limit": if kind == "credit" { json!(2000) } else { JsonValue::Null },
                    "iso_currency_code": "USD",
                    "unofficial_currency_code": null
                }
            })
        })
        .collect();

    json!({ "accounts": accounts, "item": {"item_id": "item-mock"}, "request_id": "req-balance" })
}

fn generate_mock_transactions(config: &MockConfig) -> Vec<MockTransaction> {
    let merchants = [
        (Some("Uber"), 6.33),
        (Some("United Airlines"), 500.0),
        (Some("McDonald's"), 12.0),
        (Some("Starbucks"), 4.33),
        (None, -4.22),
        (Some("SparkFun"), 89.4),
    ];

    let today = Utc::now().date_naive();
    let num_accounts = config.num_accounts.max(1);

    (0..config.num_transactions)
        .map(|i| {
            let (merchant, amount) = merchants[i % merchants.len()];
            let date = today - Duration::days((i % 90) as i64);

            MockTransaction {
                transaction_id: format!("tx_{}", i + 1),
                account_id: format!("acc_{}", i % num_accounts),
                amount,
                iso_currency_code: "USD".to_string(),
                date: date.format("%Y-%m-%d").to_string(),
                name: merchant.unwrap_or("INTRST PYMNT").to_string(),
                merchant_name: merchant.map(str::to_string),
                payment_channel: if i % 2 == 0 { "online" } else { "in store" }.to_string(),
                pending: i < 2,
            }
        })
        .collect()
}

fn transactions_get(config: &MockConfig, body: &JsonValue) -> JsonValue {
    let options = &body["options"];
    let offset = options["offset"].as_u64().unwrap_or(0) as usize;
    let count = options["count"].as_u64().unwrap_or(100) as usize;
    let account_ids: Option<Vec<String>> = options
        .get("account_ids")
        .and_then(|ids| serde_json::from_value(ids.clone()).ok());

    let all: Vec<MockTransaction> = generate_mock_transactions(config)
        .into_iter()
        .filter(|tx| {
            account_ids
                .as_ref()
                .map_or(true, |ids| ids.contains(&tx.account_id))
        })
        .collect();

    let page: Vec<MockTransaction> = all.iter().skip(offset).take(count).cloned().collect();
    json!({
        "transactions": page,
        "total_transactions": all.len(),
        "request_id": "req-tx-get"
    })
}

fn transactions_sync(config: &MockConfig, body: &JsonValue) -> MockResult {
    let start = match body.get("cursor").and_then(JsonValue::as_str) {
        None | Some("") => 0,
        Some(cursor) => match cursor.strip_prefix("cursor-").and_then(|n| n.parse().ok()) {
            Some(n) => n,
            None => return Err(("INVALID_FIELD", "cursor is not valid")),
        },
    };
    let count = body["count"].as_u64().unwrap_or(100) as usize;

    let all = generate_mock_transactions(config);
    let end = all.len().min(start + count);
    let added: Vec<MockTransaction> = all.get(start..end).map(<[_]>::to_vec).unwrap_or_default();

    Ok(json!({
        "added": added,
        "modified": [],
        "removed": [],
        "next_cursor": format!("cursor-{}", end.max(start)),
        "has_more": end < all.len(),
        "request_id": "req-tx-sync"
    }))
}

fn send_error(stream: &mut TcpStream, error_type: &str, code: &str, message: &str) {
    let body = json!({
        "error_type": error_type,
        "error_code": code,
        "error_message": message,
        "display_message": null,
        "request_id": "req-error"
    });
    send_response(stream, 400, "Bad Request", &body.to_string());
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, PlaidConfig, TransactionFetchMode};
    use crate::domain::result::Error;
    use crate::services::{AggregatorAdapter, TransactionQuery};
    use crate::adapters::plaid::PlaidClient;
    use chrono::NaiveDate;

    fn adapter_for(
        server: &MockPlaidServer,
        mode: TransactionFetchMode,
    ) -> AggregatorAdapter<PlaidClient> {
        let mut config = PlaidConfig::new("test_client", "test_secret", Environment::Sandbox);
        config.base_url = Some(server.base_url());
        config.options.transaction_mode = mode;
        config.options.page_size = 50;
        config.options.timeout_secs = 5;
        AggregatorAdapter::from_config(&config).unwrap()
    }

    fn last_90_days() -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        (today - Duration::days(90), today)
    }

    #[test]
    fn test_mock_server_starts() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        assert!(server.port() > 0);
    }

    #[test]
    fn test_link_token_new_and_update() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        assert_eq!(adapter.get_link_token(None).unwrap(), "link-sandbox-new");
        assert_eq!(
            adapter.get_link_token(Some("access-sandbox-1")).unwrap(),
            "link-sandbox-update"
        );

        let requests = server.requests_to("/link/token/create");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body["products"], json!(["transactions"]));
        assert_eq!(requests[0].body["user"]["client_user_id"], "abc123");
        assert!(requests[1].body.get("products").is_none());
        assert_eq!(requests[1].body["access_token"], "access-sandbox-1");
    }

    #[test]
    fn test_exchange_public_token() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        let token = adapter.exchange_public_token("public-sandbox-42").unwrap();
        assert_eq!(token, "access-sandbox-42");

        let err = adapter.exchange_public_token("garbage").unwrap_err();
        assert_eq!(err.error_code(), Some("INVALID_PUBLIC_TOKEN"));
        assert!(matches!(err, Error::UnknownAggregator(_)));
    }

    #[test]
    fn test_sandbox_reset_login() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);
        assert!(adapter.sandbox_reset_login("access-sandbox-1").unwrap());
    }

    #[test]
    fn test_item_info() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        let info = adapter.get_item_info("access-sandbox-1").unwrap();
        assert_eq!(info.item_id, "item-mock");
        assert_eq!(info.institution_id.as_deref(), Some("ins_109508"));
        assert!(info.ts_consent_expiration.is_none());
        assert!(info.ts_last_successful_update.is_some());
        assert!(info.ts_last_failed_update.is_none());
    }

    #[test]
    fn test_account_balances() {
        let server = MockPlaidServer::start(MockConfig {
            num_accounts: 4,
            ..Default::default()
        })
        .unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        let balances = adapter.get_account_balances("access-sandbox-1").unwrap();
        assert_eq!(balances.len(), 4);
        assert_eq!(balances[0].account_id, "acc_0");
        assert_eq!(balances[2].balance_limit, Some(rust_decimal::Decimal::from(2000)));
        assert!(balances[3].balance_available.is_none());
        assert_eq!(balances[1].currency_code.as_deref(), Some("USD"));
    }

    #[test]
    fn test_range_mode_pages_with_offsets() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Range);
        let (start, end) = last_90_days();

        let mut seen = Vec::new();
        let mut progress = |fetched: usize, total: Option<usize>| seen.push((fetched, total));
        let transactions = adapter
            .get_transactions(
                &TransactionQuery::new("access-sandbox-1", start, end),
                Some(&mut progress),
            )
            .unwrap();

        assert_eq!(transactions.len(), 150);
        assert_eq!(transactions[0].transaction_id, "tx_1");
        assert_eq!(transactions[149].transaction_id, "tx_150");
        assert_eq!(seen, vec![(50, Some(150)), (100, Some(150)), (150, Some(150))]);

        let offsets: Vec<u64> = server
            .requests_to("/transactions/get")
            .iter()
            .map(|r| r.body["options"]["offset"].as_u64().unwrap())
            .collect();
        assert_eq!(offsets, vec![0, 50, 100]);
    }

    #[test]
    fn test_range_mode_account_filter_forwarded() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Range);
        let (start, end) = last_90_days();

        let query = TransactionQuery::new("access-sandbox-1", start, end)
            .with_account_ids(vec!["acc_1".to_string()]);
        let transactions = adapter.get_transactions(&query, None).unwrap();

        assert_eq!(transactions.len(), 50);
        assert!(transactions.iter().all(|tx| tx.account_id == "acc_1"));

        let requests = server.requests_to("/transactions/get");
        assert_eq!(requests[0].body["options"]["account_ids"], json!(["acc_1"]));
    }

    #[test]
    fn test_sync_mode_follows_cursors() {
        let server = MockPlaidServer::start(MockConfig {
            num_transactions: 120,
            ..Default::default()
        })
        .unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        let sync = adapter
            .sync_transactions("access-sandbox-1", None, None)
            .unwrap();
        assert_eq!(sync.added.len(), 120);
        assert_eq!(sync.next_cursor, "cursor-120");

        let cursors: Vec<JsonValue> = server
            .requests_to("/transactions/sync")
            .iter()
            .map(|r| r.body.get("cursor").cloned().unwrap_or(JsonValue::Null))
            .collect();
        assert_eq!(cursors, vec![JsonValue::Null, json!("cursor-50"), json!("cursor-100")]);

        let later = adapter
            .sync_transactions("access-sandbox-1", Some(&sync.next_cursor), None)
            .unwrap();
        assert!(later.is_empty());
        assert_eq!(later.next_cursor, "cursor-120");
    }

    #[test]
    fn test_sync_mode_get_transactions() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);
        let (start, end) = last_90_days();

        let transactions = adapter
            .get_transactions(&TransactionQuery::new("access-sandbox-1", start, end), None)
            .unwrap();
        assert_eq!(transactions.len(), 150);
        assert!(transactions.iter().all(|tx| tx.is_within(start, end)));
        assert!(server.requests_to("/transactions/get").is_empty());
    }

    #[test]
    fn test_item_login_required() {
        let server = MockPlaidServer::start(MockConfig {
            error_code: Some("ITEM_LOGIN_REQUIRED".to_string()),
            ..Default::default()
        })
        .unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Range);

        let err = adapter.get_item_info("access-sandbox-1").unwrap_err();
        assert!(matches!(err, Error::AccountUpdateNeeded(_)));
        assert_eq!(err.error_message(), Some("mock failure ITEM_LOGIN_REQUIRED"));

        let (start, end) = last_90_days();
        let err = adapter
            .get_transactions(&TransactionQuery::new("access-sandbox-1", start, end), None)
            .unwrap_err();
        assert!(matches!(err, Error::AccountUpdateNeeded(_)));
    }

    #[test]
    fn test_no_accounts() {
        let server = MockPlaidServer::start(MockConfig {
            error_code: Some("NO_ACCOUNTS".to_string()),
            ..Default::default()
        })
        .unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        let err = adapter.get_account_balances("access-sandbox-1").unwrap_err();
        assert!(matches!(err, Error::NoApplicableAccounts(_)));
    }

    #[test]
    fn test_bad_credentials() {
        let server = MockPlaidServer::start(MockConfig::default()).unwrap();
        let mut config = PlaidConfig::new("live_client", "secret", Environment::Sandbox);
        config.base_url = Some(server.base_url());
        let adapter = AggregatorAdapter::from_config(&config).unwrap();

        let err = adapter.get_item_info("access-sandbox-1").unwrap_err();
        assert!(matches!(err, Error::UnknownAggregator(_)));
        assert_eq!(err.error_code(), Some("INVALID_API_KEYS"));
    }

    #[test]
    fn test_malformed_response() {
        let server = MockPlaidServer::start(MockConfig {
            malformed: true,
            ..Default::default()
        })
        .unwrap();
        let adapter = adapter_for(&server, TransactionFetchMode::Sync);

        let err = adapter.get_item_info("access-sandbox-1").unwrap_err();
        assert!(matches!(err, Error::UnknownAggregator(_)));
        assert_eq!(err.error_code(), Some("INVALID_RESPONSE"));
    }
}
