//! View-state slices and the pure reducer that produces each new state.

use serde::Serialize;

use screener_client::{
    DailyPoolPayload, DailyPoolRecord, SignalListPayload, SignalStatus, SystemStatus,
    TradeSignal, WeekendScanPayload, WeekendScanRecord,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendScanResults {
    pub scan_date: String,
    pub total_count: i64,
    pub passed_count: i64,
    pub results: Vec<WeekendScanRecord>,
}

impl From<WeekendScanPayload> for WeekendScanResults {
    fn from(p: WeekendScanPayload) -> Self {
        Self {
            scan_date: p.scan_date,
            total_count: p.total_count,
            passed_count: p.passed_count,
            results: p.results,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoolResults {
    pub scan_date: String,
    pub total_count: i64,
    pub pool_count: i64,
    pub results: Vec<DailyPoolRecord>,
}

impl From<DailyPoolPayload> for DailyPoolResults {
    fn from(p: DailyPoolPayload) -> Self {
        Self {
            scan_date: p.scan_date,
            total_count: p.total_count,
            pool_count: p.pool_count,
            results: p.results,
        }
    }
}

/// The signal list. `Default` is the canonical empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignals {
    pub signal_date: String,
    pub total_signals: i64,
    pub signals: Vec<TradeSignal>,
}

impl From<Option<SignalListPayload>> for TradeSignals {
    fn from(p: Option<SignalListPayload>) -> Self {
        match p {
            Some(p) => Self {
                signal_date: p.signal_date,
                total_signals: p.total_signals,
                signals: p.signals,
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub weekend_scan_results: WeekendScanResults,
    pub daily_pool_results: DailyPoolResults,
    pub trade_signals: TradeSignals,
    pub system_status: SystemStatus,
    /// At least one weekend/daily/signal load is in flight.
    pub busy: bool,
}

/// A change to one slice.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceUpdate {
    WeekendScan(WeekendScanPayload),
    DailyPool(DailyPoolPayload),
    Signals(Option<SignalListPayload>),
    SystemStatus(SystemStatus),
    /// Local optimistic edit; the server has not confirmed it.
    SignalStatus { signal_id: i64, status: SignalStatus },
    Busy(bool),
}

/// Produce the state that follows `update`. Slices other than the one
/// named by `update` are carried over untouched.
pub fn reduce(state: &DashboardState, update: SliceUpdate) -> DashboardState {
    let mut next = state.clone();
    apply(&mut next, update);
    next
}

/// In-place form of [`reduce`]; returns whether anything changed.
pub(crate) fn apply(state: &mut DashboardState, update: SliceUpdate) -> bool {
    match update {
        SliceUpdate::WeekendScan(p) => state.weekend_scan_results = p.into(),
        SliceUpdate::DailyPool(p) => state.daily_pool_results = p.into(),
        SliceUpdate::Signals(p) => state.trade_signals = p.into(),
        SliceUpdate::SystemStatus(s) => state.system_status = s,
        SliceUpdate::SignalStatus { signal_id, status } => {
            match state
                .trade_signals
                .signals
                .iter_mut()
                .find(|s| s.id == signal_id)
            {
                Some(signal) => signal.status = status,
                None => return false,
            }
        }
        SliceUpdate::Busy(busy) => {
            if state.busy == busy {
                return false;
            }
            state.busy = busy;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weekend_payload() -> WeekendScanPayload {
        serde_json::from_value(json!({
            "scan_date": "2024-01-06",
            "total_count": 5000,
            "passed_count": 1,
            "results": [{
                "code": "600519", "name": "贵州茅台", "close_price": 1688.5,
                "ma233_weekly": 1500.0, "volume": 1, "vol_ma20_weekly": 1
            }]
        }))
        .unwrap()
    }

    fn signals(ids: &[i64]) -> SignalListPayload {
        SignalListPayload {
            signal_date: "2024-01-05".into(),
            total_signals: ids.len() as i64,
            signals: ids
                .iter()
                .map(|id| TradeSignal::new(*id, SignalStatus::Pending))
                .collect(),
        }
    }

    #[test]
    fn weekend_slice_uses_canonical_names() {
        let state = reduce(&DashboardState::default(), SliceUpdate::WeekendScan(weekend_payload()));

        let value = serde_json::to_value(&state.weekend_scan_results).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["passedCount", "results", "scanDate", "totalCount"]);
        assert_eq!(value["scanDate"], json!("2024-01-06"));
        assert_eq!(value["totalCount"], json!(5000));
    }

    #[test]
    fn slice_results_serialize_back_to_the_input_records() {
        let weekend_records = json!([
            {"code": "600519", "name": "贵州茅台", "close_price": "1688.50",
             "ma233_weekly": "12345678901234567.89", "volume": 120000.0, "vol_ma20_weekly": 90000},
            {"code": "000001", "name": "平安银行", "close_price": 10.2, "ma233_weekly": 9.8,
             "volume": 880000, "vol_ma20_weekly": 700000, "condition_met": true, "board": "main"}
        ]);
        let daily_records = json!([
            {"code": "000001", "name": "平安银行", "vol_ma20": 100.5, "vol_ma60": 90,
             "golden_cross": true, "macd_120min_status": "金叉"}
        ]);
        let weekend: WeekendScanPayload = serde_json::from_value(json!({
            "scan_date": "2024-01-06", "total_count": 5000, "passed_count": 2,
            "results": weekend_records.clone()
        }))
        .unwrap();
        let daily: DailyPoolPayload = serde_json::from_value(json!({
            "scan_date": "2024-01-08", "total_count": 30, "pool_count": 1,
            "results": daily_records.clone()
        }))
        .unwrap();

        let state = reduce(&DashboardState::default(), SliceUpdate::WeekendScan(weekend));
        let state = reduce(&state, SliceUpdate::DailyPool(daily));

        let weekend_out = serde_json::to_value(&state.weekend_scan_results.results).unwrap();
        let daily_out = serde_json::to_value(&state.daily_pool_results.results).unwrap();
        assert_eq!(weekend_out, weekend_records);
        assert_eq!(weekend_out.to_string(), weekend_records.to_string());
        assert_eq!(daily_out.to_string(), daily_records.to_string());
    }

    #[test]
    fn daily_slice_uses_canonical_names() {
        let payload: DailyPoolPayload = serde_json::from_value(json!({
            "scan_date": "2024-01-08", "total_count": 12, "pool_count": 0, "results": []
        }))
        .unwrap();
        let state = reduce(&DashboardState::default(), SliceUpdate::DailyPool(payload));

        let value = serde_json::to_value(&state.daily_pool_results).unwrap();
        assert_eq!(
            value,
            json!({"scanDate": "2024-01-08", "totalCount": 12, "poolCount": 0, "results": []})
        );
    }

    #[test]
    fn null_signal_payload_resets_to_empty() {
        let loaded = reduce(&DashboardState::default(), SliceUpdate::Signals(Some(signals(&[1, 2]))));
        let reset = reduce(&loaded, SliceUpdate::Signals(None));

        assert_eq!(
            serde_json::to_value(&reset.trade_signals).unwrap(),
            json!({"signalDate": "", "totalSignals": 0, "signals": []})
        );
    }

    #[test]
    fn reduce_leaves_other_slices_alone() {
        let loaded = reduce(&DashboardState::default(), SliceUpdate::WeekendScan(weekend_payload()));
        let next = reduce(&loaded, SliceUpdate::Signals(Some(signals(&[3]))));

        assert_eq!(next.weekend_scan_results, loaded.weekend_scan_results);
        assert_eq!(next.trade_signals.signals.len(), 1);
    }

    #[test]
    fn status_edit_touches_only_the_matching_signal() {
        let loaded = reduce(&DashboardState::default(), SliceUpdate::Signals(Some(signals(&[1, 2, 3]))));
        let next = reduce(
            &loaded,
            SliceUpdate::SignalStatus {
                signal_id: 2,
                status: SignalStatus::Confirmed,
            },
        );

        let statuses: Vec<_> = next
            .trade_signals
            .signals
            .iter()
            .map(|s| (s.id, s.status.clone()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (1, SignalStatus::Pending),
                (2, SignalStatus::Confirmed),
                (3, SignalStatus::Pending)
            ]
        );
    }

    #[test]
    fn status_edit_on_missing_id_changes_nothing() {
        let mut state = reduce(&DashboardState::default(), SliceUpdate::Signals(Some(signals(&[1, 2]))));
        let before = serde_json::to_vec(&state.trade_signals).unwrap();

        let changed = apply(
            &mut state,
            SliceUpdate::SignalStatus {
                signal_id: 99,
                status: "EXECUTED".into(),
            },
        );

        assert!(!changed);
        assert_eq!(serde_json::to_vec(&state.trade_signals).unwrap(), before);
    }

    #[test]
    fn initial_system_status_is_unknown() {
        let state = DashboardState::default();
        assert_eq!(state.system_status.status, "unknown");
        assert_eq!(state.system_status.redis_status, "unknown");
        assert!(!state.busy);
    }
}
