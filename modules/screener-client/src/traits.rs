use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    DailyPoolPayload, SignalListPayload, SignalStatus, SystemStatus, WeekendScanPayload,
};

/// The read endpoints view-state loaders depend on.
///
/// `ScreenerClient` is the production implementation; anything else
/// (a recorded fixture, a test double) can stand in for it.
#[async_trait]
pub trait ScreenerApi: Send + Sync {
    async fn latest_weekend_scan(&self) -> Result<WeekendScanPayload>;

    async fn latest_daily_pool(&self) -> Result<DailyPoolPayload>;

    /// `None` when the server answered with an empty or `null` body.
    async fn latest_signals(&self, status: &SignalStatus) -> Result<Option<SignalListPayload>>;

    async fn system_status(&self) -> Result<SystemStatus>;
}
