use crate::adapter::BoxError;
use crate::traces::{TraceRow, TraceStore, DEFAULT_TRACES_TABLE};
use async_trait::async_trait;
use reqwest::Client;

/// Configuration for [`ClickHouseTraceStore`].
///
/// The store talks to ClickHouse over HTTP using the `JSONEachRow` format.
#[derive(Clone, Debug)]
pub struct ClickHouseConfig {
    /// Base URL without query, e.g. "http://127.0.0.1:8123"
    pub url: String,
    pub database: String,
    pub table: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ClickHouseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        ClickHouseConfig {
            url: url.into(),
            database: "default".to_string(),
            table: DEFAULT_TRACES_TABLE.to_string(),
            user: None,
            password: None,
        }
    }
}

/// ClickHouse implementation of [`TraceStore`] using the HTTP interface.
///
/// Rows are sent one per request with their column names as JSON keys; the
/// provider id is hex encoded, so `ProviderId` should be a `String` (or
/// `FixedString(32)`) column.
#[derive(Clone)]
pub struct ClickHouseTraceStore {
    client: Client,
    config: ClickHouseConfig,
}

impl ClickHouseTraceStore {
    /// Construct a new store using the provided configuration.
    ///
    /// **Parameters**
    /// - `config`: [`ClickHouseConfig`] describing target URL, database,
    ///   table and optional authentication settings.
    pub fn new(config: ClickHouseConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        let mut query = format!(
            "database={}&date_time_input_format=best_effort&query={}",
            urlencoding::encode(&self.config.database),
            urlencoding::encode(&format!(
                "INSERT INTO {} FORMAT JSONEachRow",
                quote_ident(&self.config.table)
            ))
        );

        if let Some(user) = &self.config.user {
            query.push_str(&format!("&user={}", urlencoding::encode(user)));
        }
        if let Some(password) = &self.config.password {
            query.push_str(&format!("&password={}", urlencoding::encode(password)));
        }

        format!("{}/?{}", self.config.url.trim_end_matches('/'), query)
    }
}

/// Backquoted identifier; `\` and `` ` `` are escaped.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
}

#[async_trait]
impl TraceStore for ClickHouseTraceStore {
    async fn insert(&self, row: &TraceRow) -> Result<(), BoxError> {
        let body = serde_json::to_string(row)? + "\n";
        let resp = self.client.post(self.endpoint()).body(body).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("ClickHouse insert failed with status {}: {}", status, text).into())
        }
    }
}
