pub mod error;
pub mod interceptor;
pub mod notify;
pub mod traits;
pub mod types;

pub use error::{ApiError, ErrorKind, Result};
pub use interceptor::{PassThrough, RequestIdInterceptor, RequestInterceptor};
pub use notify::{LogNotifier, Notification, NotificationLevel, NotificationLog, Notifier};
pub use traits::ScreenerApi;
pub use types::{
    DailyPoolPayload, DailyPoolRecord, DailyScanTriggered, Decimal, HistoryQuery, Kline, KlineType,
    ScanHistoryPage, SignalListPayload, SignalStatus, SignalStatusUpdate, SignalType,
    StatusUpdateAck, StockDetail, StockKlines, SystemStatus, TradeSignal, WeekendScanPayload,
    WeekendScanRecord, WeekendScanTriggered,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Every endpoint lives under this prefix on the API origin.
pub const API_PREFIX: &str = "/api";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Day count the stock page asks for when it does not say otherwise.
pub const DEFAULT_KLINE_DAYS: u32 = 60;

pub struct ScreenerClientBuilder {
    origin: String,
    timeout: Duration,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    notifier: Arc<dyn Notifier>,
}

impl ScreenerClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append an outbound interceptor. Interceptors run in the order added.
    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> Result<ScreenerClient> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let interceptors = if self.interceptors.is_empty() {
            vec![Arc::new(PassThrough) as Arc<dyn RequestInterceptor>]
        } else {
            self.interceptors
        };

        Ok(ScreenerClient {
            http,
            origin: self.origin.trim_end_matches('/').to_string(),
            interceptors,
            notifier: self.notifier,
        })
    }
}

/// Client for the screener backend.
///
/// Reuses a single `reqwest::Client` for connection pooling. Failed calls
/// raise one notification through the configured [`Notifier`] and then
/// return the error to the caller unchanged.
#[derive(Clone)]
pub struct ScreenerClient {
    http: reqwest::Client,
    origin: String,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    notifier: Arc<dyn Notifier>,
}

impl ScreenerClient {
    /// `origin` is scheme, host and port, e.g. `http://127.0.0.1:8000`.
    pub fn builder(origin: &str) -> ScreenerClientBuilder {
        ScreenerClientBuilder {
            origin: origin.to_string(),
            timeout: DEFAULT_TIMEOUT,
            interceptors: Vec::new(),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn new(origin: &str) -> Result<Self> {
        Self::builder(origin).build()
    }

    pub fn base_url(&self) -> String {
        format!("{}{}", self.origin, API_PREFIX)
    }

    /// Send one request and return the decoded payload.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T> {
        match self.dispatch(method, path, query, body).await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                warn!(path, kind = ?err.kind(), error = %err, "API request failed");
                self.notifier.notify(Notification::error(err.user_message()));
                Err(err)
            }
        }
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url(), path);
        debug!(method = %method, url = url.as_str(), "API request");

        let mut builder = self.http.request(method, &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(ref body) = body {
            builder = builder.json(body);
        }

        let mut request = builder.build()?;
        for interceptor in &self.interceptors {
            request = interceptor.intercept(request).map_err(|e| match e {
                ApiError::Config(_) => e,
                other => ApiError::Config(other.to_string()),
            })?;
        }

        let resp = self.http.execute(request).await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(ApiError::from_error_body(status.as_u16(), &body));
        }

        decode_payload(status, &bytes)
    }

    // --- Weekend scan ---

    pub async fn latest_weekend_scan(&self) -> Result<WeekendScanPayload> {
        self.request(Method::GET, "/weekend-scan/latest", &[], None)
            .await
    }

    pub async fn trigger_weekend_scan(&self) -> Result<WeekendScanTriggered> {
        self.request(Method::POST, "/weekend-scan/trigger", &[], None)
            .await
    }

    pub async fn weekend_scan_history(&self, query: HistoryQuery) -> Result<ScanHistoryPage> {
        let params = [
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
        ];
        self.request(Method::GET, "/weekend-scan/history", &params, None)
            .await
    }

    // --- Daily pool ---

    pub async fn latest_daily_pool(&self) -> Result<DailyPoolPayload> {
        self.request(Method::GET, "/daily-pool/latest", &[], None).await
    }

    pub async fn trigger_daily_scan(&self) -> Result<DailyScanTriggered> {
        self.request(Method::POST, "/daily-pool/trigger", &[], None)
            .await
    }

    // --- Signals ---

    pub async fn latest_signals(&self, status: &SignalStatus) -> Result<Option<SignalListPayload>> {
        let params = [("status", status.to_string())];
        self.request(Method::GET, "/signals/latest", &params, None)
            .await
    }

    pub async fn signal(&self, signal_id: i64) -> Result<TradeSignal> {
        self.request(Method::GET, &format!("/signals/{signal_id}"), &[], None)
            .await
    }

    pub async fn update_signal_status(
        &self,
        signal_id: i64,
        status: SignalStatus,
        note: &str,
    ) -> Result<StatusUpdateAck> {
        let body = serde_json::to_value(SignalStatusUpdate {
            status,
            note: note.to_string(),
        })
        .map_err(|e| ApiError::Config(e.to_string()))?;

        self.request(
            Method::PUT,
            &format!("/signals/{signal_id}/status"),
            &[],
            Some(body),
        )
        .await
    }

    // --- Stocks ---

    pub async fn stock_detail(&self, code: &str) -> Result<StockDetail> {
        self.request(Method::GET, &format!("/stocks/{code}"), &[], None)
            .await
    }

    pub async fn stock_klines(&self, code: &str, kind: KlineType, days: u32) -> Result<StockKlines> {
        let params = [("type", kind.to_string()), ("days", days.to_string())];
        self.request(Method::GET, &format!("/stocks/{code}/klines"), &params, None)
            .await
    }

    // --- System ---

    pub async fn system_status(&self) -> Result<SystemStatus> {
        self.request(Method::GET, "/system/status", &[], None).await
    }
}

#[async_trait]
impl ScreenerApi for ScreenerClient {
    async fn latest_weekend_scan(&self) -> Result<WeekendScanPayload> {
        ScreenerClient::latest_weekend_scan(self).await
    }

    async fn latest_daily_pool(&self) -> Result<DailyPoolPayload> {
        ScreenerClient::latest_daily_pool(self).await
    }

    async fn latest_signals(&self, status: &SignalStatus) -> Result<Option<SignalListPayload>> {
        ScreenerClient::latest_signals(self, status).await
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        ScreenerClient::system_status(self).await
    }
}

/// Decode a 2xx body. An empty body reads as JSON `null`.
fn decode_payload<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T> {
    let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"null")
    } else {
        serde_json::from_slice(bytes)
    };

    parsed.map_err(|e| {
        warn!(status = status.as_u16(), error = %e, "Response body did not match the expected shape");
        ApiError::Server {
            status: status.as_u16(),
            message: error::REQUEST_FAILED.to_string(),
        }
    })
}
