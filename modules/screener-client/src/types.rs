use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

// =============================================================================
// Weekend scan
// =============================================================================

/// One stock that went through the weekly screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendScanRecord {
    pub code: String,
    pub name: String,
    pub close_price: Decimal,
    pub ma233_weekly: Decimal,
    pub volume: Number,
    pub vol_ma20_weekly: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_met: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendScanPayload {
    pub scan_date: String,
    pub total_count: i64,
    pub passed_count: i64,
    #[serde(default)]
    pub results: Vec<WeekendScanRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendScanTriggered {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub scan_date: String,
    #[serde(default)]
    pub total_scanned: i64,
    #[serde(default)]
    pub passed_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Decimal>,
}

/// `page`/`size` for the weekend scan history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub page: u32,
    pub size: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

/// Records are whatever the backend keeps per historical run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanHistoryPage {
    pub page: u32,
    pub size: u32,
    #[serde(default)]
    pub records: Vec<Value>,
}

// =============================================================================
// Daily pool
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoolRecord {
    pub code: String,
    pub name: String,
    pub vol_ma20: Number,
    pub vol_ma60: Number,
    pub golden_cross: bool,
    pub macd_120min_status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoolPayload {
    pub scan_date: String,
    pub total_count: i64,
    pub pool_count: i64,
    #[serde(default)]
    pub results: Vec<DailyPoolRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScanTriggered {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub scan_date: String,
    #[serde(default)]
    pub pool_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Decimal>,
}

// =============================================================================
// Signals
// =============================================================================

/// Lifecycle state of a trade signal.
///
/// The backend owns the vocabulary; states this client does not know about
/// are carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalStatus {
    #[default]
    Pending,
    Confirmed,
    Invalid,
    Other(String),
}

impl SignalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Invalid => "INVALID",
            Self::Other(s) => s,
        }
    }
}

/// Status text is trimmed and uppercased on the way in, whatever its source.
impl From<String> for SignalStatus {
    fn from(s: String) -> Self {
        let s = s.trim().to_uppercase();
        match s.as_str() {
            "PENDING" => Self::Pending,
            "CONFIRMED" => Self::Confirmed,
            "INVALID" => Self::Invalid,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for SignalStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<SignalStatus> for String {
    fn from(status: SignalStatus) -> Self {
        match status {
            SignalStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
}

/// A trade signal as the backend reports it. Only `id` is required; every
/// field this client does not model is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: i64,
    #[serde(default)]
    pub status: SignalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<SignalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_up_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pullback_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_ratio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_shadow: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TradeSignal {
    pub fn new(id: i64, status: SignalStatus) -> Self {
        Self {
            id,
            status,
            note: None,
            code: None,
            name: None,
            signal_type: None,
            signal_date: None,
            signal_price: None,
            limit_up_date: None,
            pullback_days: None,
            volume_ratio: None,
            price_change: None,
            upper_shadow: None,
            stop_loss_price: None,
            stop_loss_reason: None,
            reason: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalListPayload {
    pub signal_date: String,
    pub total_signals: i64,
    #[serde(default)]
    pub signals: Vec<TradeSignal>,
}

/// Body of `PUT /signals/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStatusUpdate {
    pub status: SignalStatus,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateAck {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Stocks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetail {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub latest_price: Option<Decimal>,
    #[serde(default)]
    pub in_weekend_pool: bool,
    #[serde(default)]
    pub in_daily_pool: bool,
    #[serde(default)]
    pub has_signal: bool,
}

/// Bar interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KlineType {
    #[default]
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "120min")]
    Min120,
}

impl KlineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Min120 => "120min",
        }
    }
}

impl fmt::Display for KlineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "120min" => Ok(Self::Min120),
            other => Err(format!("unknown kline type: {other}")),
        }
    }
}

/// One bar. Daily and weekly bars carry `date`, 120-minute bars carry
/// `datetime`; the indicator columns depend on the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma233: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol_ma20: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol_ma60: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_hist: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockKlines {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: KlineType,
    #[serde(default)]
    pub data: Vec<Kline>,
}

// =============================================================================
// System
// =============================================================================

/// Health snapshot from `/system/status`. The three status strings are
/// required; a body without them is rejected at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    #[serde(default)]
    pub last_weekend_scan: Option<String>,
    #[serde(default)]
    pub last_daily_scan: Option<String>,
    #[serde(default)]
    pub next_scan: Option<String>,
    pub database_status: String,
    pub redis_status: String,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            status: "unknown".into(),
            last_weekend_scan: None,
            last_daily_scan: None,
            next_scan: None,
            database_status: "unknown".into(),
            redis_status: "unknown".into(),
        }
    }
}

// =============================================================================
// Decimal
// =============================================================================

/// A backend `Decimal` column in its wire form.
///
/// The server may send a JSON number or a numeric string; whichever arrived
/// is kept and written back unchanged, so no digits are lost. Use
/// [`as_f64`](Self::as_f64) for arithmetic or display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Decimal(Value);

impl Decimal {
    pub fn as_f64(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The value exactly as the server sent it.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Number(_) => Ok(Self(value)),
            Value::String(s) if s.trim().parse::<f64>().is_ok() => Ok(Self(value)),
            other => Err(serde::de::Error::custom(format!("invalid decimal {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signal_status_keeps_unknown_states() {
        let s: SignalStatus = serde_json::from_value(json!("EXECUTED")).unwrap();
        assert_eq!(s, SignalStatus::Other("EXECUTED".into()));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!("EXECUTED"));

        let p: SignalStatus = serde_json::from_value(json!("PENDING")).unwrap();
        assert_eq!(p, SignalStatus::Pending);
        assert_eq!(serde_json::to_value(SignalStatus::Confirmed).unwrap(), json!("CONFIRMED"));
    }

    #[test]
    fn signal_status_normalizes_case_the_same_way_everywhere() {
        assert_eq!(SignalStatus::from("pending"), SignalStatus::Pending);
        assert_eq!(SignalStatus::from(" Confirmed ".to_string()), SignalStatus::Confirmed);
        assert_eq!("confirmed".parse::<SignalStatus>().unwrap(), SignalStatus::Confirmed);
        assert_eq!(SignalStatus::from("executed").as_str(), "EXECUTED");
        assert_eq!(" executed ".parse::<SignalStatus>().unwrap().as_str(), "EXECUTED");

        let s: SignalStatus = serde_json::from_value(json!("invalid")).unwrap();
        assert_eq!(s, SignalStatus::Invalid);
    }

    #[test]
    fn decimals_keep_their_wire_form() {
        let input = json!({
            "code": "600519",
            "name": "贵州茅台",
            "close_price": "1688.50",
            "ma233_weekly": "12345678901234567.89",
            "volume": 120000.0,
            "vol_ma20_weekly": 90000
        });
        let record: WeekendScanRecord = serde_json::from_value(input.clone()).unwrap();

        assert_eq!(record.close_price.as_f64(), Some(1688.5));
        assert_eq!(record.close_price.to_string(), "1688.50");
        assert_eq!(record.ma233_weekly.as_value(), &json!("12345678901234567.89"));
        assert_eq!(record.condition_met, None);
        assert!(record.extra.is_empty());

        assert_eq!(serde_json::to_value(&record).unwrap(), input);
    }

    #[test]
    fn numeric_decimals_stay_numbers() {
        let d: Decimal = serde_json::from_value(json!(1500.25)).unwrap();
        assert_eq!(d.as_f64(), Some(1500.25));
        assert_eq!(serde_json::to_value(&d).unwrap(), json!(1500.25));

        assert!(serde_json::from_value::<Decimal>(json!(true)).is_err());
        assert!(serde_json::from_value::<Decimal>(json!(null)).is_err());
    }

    #[test]
    fn bad_decimal_string_is_rejected() {
        let res = serde_json::from_value::<Kline>(json!({
            "date": "2024-01-05",
            "open": "abc", "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1
        }));
        assert!(res.is_err());
    }

    #[test]
    fn trade_signal_needs_only_id_and_preserves_extras() {
        let signal: TradeSignal = serde_json::from_value(json!({
            "id": 7,
            "stop_loss_price": null,
            "board": "main"
        }))
        .unwrap();
        assert_eq!(signal.status, SignalStatus::Pending);
        assert_eq!(signal.stop_loss_price, None);
        assert_eq!(signal.extra.get("board"), Some(&json!("main")));

        let back = serde_json::to_value(&signal).unwrap();
        assert_eq!(back, json!({"id": 7, "status": "PENDING", "board": "main"}));
    }

    #[test]
    fn kline_type_wire_names() {
        assert_eq!(serde_json::to_value(KlineType::Min120).unwrap(), json!("120min"));
        assert_eq!("Weekly".parse::<KlineType>().unwrap(), KlineType::Weekly);
        assert!("hourly".parse::<KlineType>().is_err());
    }

    #[test]
    fn system_status_requires_component_states() {
        let missing = serde_json::from_value::<SystemStatus>(json!({"status": "healthy"}));
        assert!(missing.is_err());

        let ok: SystemStatus = serde_json::from_value(json!({
            "status": "healthy",
            "database_status": "connected",
            "redis_status": "connected",
            "next_scan": "2024-01-06T16:00:00"
        }))
        .unwrap();
        assert_eq!(ok.next_scan.as_deref(), Some("2024-01-06T16:00:00"));
        assert_eq!(ok.last_daily_scan, None);
    }
}
