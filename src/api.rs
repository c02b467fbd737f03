// API client module: a small blocking client for the PostgREST-style table
// API that fronts the catalog database. Each table operation becomes exactly
// one HTTP request; there is no retry and nothing is cached.

use std::fmt;
use std::rc::Rc;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{Error, Result};

/// One row as the backend returns it.
pub type Row = serde_json::Map<String, Value>;

const REST_PREFIX: [&str; 2] = ["rest", "v1"];

/// A fully built request, ready for a [`Transport`].
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl PreparedRequest {
    /// Value of a query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Status and body of whatever the backend answered.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a prepared request. Only transport failures are errors here;
/// HTTP status handling happens in [`Query::execute`].
pub trait Transport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse>;
}

/// The real transport, backed by a reqwest blocking client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(client_build_error)?;
        Ok(HttpTransport { client })
    }

    /// Use a preconfigured reqwest client (timeouts, proxies, TLS).
    pub fn with_client(client: Client) -> Self {
        HttpTransport { client }
    }
}

/// A client that cannot be built is a setup problem, not a failed request.
fn client_build_error(err: reqwest::Error) -> Error {
    Error::Config(format!("cannot build HTTP client: {err}"))
}

impl Transport for HttpTransport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        let mut req = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        let res = req.send()?;
        let status = res.status().as_u16();
        let body = res.text()?;
        Ok(RawResponse { status, body })
    }
}

struct Inner {
    base_url: Url,
    headers: HeaderMap,
    transport: Box<dyn Transport>,
}

/// Handle to the backend. Cloning is cheap and shares the underlying
/// transport, so one instance built at startup can be handed to every
/// gateway.
#[derive(Clone)]
pub struct RestClient {
    inner: Rc<Inner>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Client using the real HTTP transport.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Self::with_transport(config, HttpTransport::new()?)
    }

    pub fn with_transport(config: &BackendConfig, transport: impl Transport + 'static) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(base)
            .map_err(|e| Error::Config(format!("invalid backend URL {base:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid backend URL {base:?}")));
        }

        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| Error::Config("backend key contains invalid characters".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| Error::Config("backend key contains invalid characters".into()))?;
        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        Ok(RestClient {
            inner: Rc::new(Inner {
                base_url,
                headers,
                transport: Box::new(transport),
            }),
        })
    }

    /// Start a query against `table`. Without further calls it reads all
    /// columns of all rows.
    pub fn table(&self, name: &str) -> Query {
        Query {
            client: self.clone(),
            table: name.to_string(),
            intent: Intent::Select("*".to_string()),
            filters: Vec::new(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Intent {
    Select(String),
    Insert(Value),
    Upsert { rows: Vec<Value>, on_conflict: String },
    Update(Value),
    Delete,
}

/// Immutable description of one table request. Every builder method
/// consumes the query and returns the extended one; [`Query::execute`]
/// consumes the finished descriptor.
#[derive(Clone)]
pub struct Query {
    client: RestClient,
    table: String,
    intent: Intent,
    filters: Vec<(String, String)>,
    limit: Option<usize>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("intent", &self.intent)
            .field("filters", &self.filters)
            .field("limit", &self.limit)
            .finish()
    }
}

impl Query {
    pub fn select(mut self, fields: &str) -> Self {
        self.intent = Intent::Select(fields.to_string());
        self
    }

    /// Add `column=eq.value`. A second `eq` on the same column replaces the
    /// first value.
    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        match self.filters.iter_mut().find(|(c, _)| c == column) {
            Some(slot) => slot.1 = value,
            None => self.filters.push((column.to_string(), value)),
        }
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn insert(mut self, row: Value) -> Self {
        self.intent = Intent::Insert(row);
        self
    }

    /// Bulk insert that merges rows colliding on `on_conflict`
    /// (comma-separated column list).
    pub fn upsert(mut self, rows: Vec<Value>, on_conflict: &str) -> Self {
        self.intent = Intent::Upsert {
            rows,
            on_conflict: on_conflict.to_string(),
        };
        self
    }

    pub fn update(mut self, row: Value) -> Self {
        self.intent = Intent::Update(row);
        self
    }

    pub fn delete(mut self) -> Self {
        self.intent = Intent::Delete;
        self
    }

    /// Build the HTTP request without sending it.
    pub fn prepare(&self) -> Result<PreparedRequest> {
        let inner = &self.client.inner;
        let mut url = inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("backend URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(REST_PREFIX)
            .push(&self.table);

        let mut params: Vec<(&str, String)> = Vec::new();
        let mut headers = inner.headers.clone();

        let (method, body) = match &self.intent {
            Intent::Select(fields) => {
                params.push(("select", fields.clone()));
                self.push_filters(&mut params);
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
                (Method::GET, None)
            }
            Intent::Insert(row) => (Method::POST, Some(row.clone())),
            Intent::Upsert { rows, .. } => (Method::POST, Some(Value::Array(rows.clone()))),
            Intent::Update(row) => {
                self.push_filters(&mut params);
                (Method::PATCH, Some(row.clone()))
            }
            Intent::Delete => {
                self.push_filters(&mut params);
                (Method::DELETE, None)
            }
        };

        if let Some(n) = self.limit {
            params.push(("limit", n.to_string()));
        }

        if method != Method::GET {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            let prefer = match &self.intent {
                Intent::Upsert { on_conflict, .. } => {
                    params.push(("on_conflict", on_conflict.clone()));
                    "return=representation,resolution=merge-duplicates"
                }
                _ => "return=representation",
            };
            headers.insert("prefer", HeaderValue::from_static(prefer));
        }

        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
        })
    }

    fn push_filters<'a>(&'a self, params: &mut Vec<(&'a str, String)>) {
        for (column, value) in &self.filters {
            params.push((column.as_str(), format!("eq.{value}")));
        }
    }

    /// Send the request and return the rows the backend reported back.
    pub fn execute(self) -> Result<Vec<Row>> {
        let request = self.prepare()?;
        debug!(method = %request.method, table = %self.table, url = %request.url, "sending request");

        let response = match self.client.inner.transport.send(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!(table = %self.table, error = %e, "request failed");
                return Err(e);
            }
        };

        if !(200..300).contains(&response.status) {
            let message = error_message(&response.body);
            warn!(table = %self.table, status = response.status, %message, "backend rejected request");
            return Err(Error::Backend {
                status: response.status,
                message,
            });
        }
        Ok(parse_rows(&response.body))
    }
}

/// Rows from a success body. Anything that is not a JSON array counts as
/// "no rows".
pub fn parse_rows(body: &str) -> Vec<Row> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// The `message` field of a JSON error body, or the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
