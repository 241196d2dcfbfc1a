pub mod busy;
pub mod config;
pub mod router;
pub mod scope;
pub mod state;
pub mod store;

pub use busy::{InFlight, LoadKind};
pub use config::Config;
pub use router::{
    resolve, Document, GuardDecision, NavigationGuard, Navigation, Page, Route, RouteDef, Router,
    RouterError, TitleGuard, APP_NAME, ROUTES,
};
pub use scope::PageScope;
pub use state::{
    reduce, DailyPoolResults, DashboardState, SliceUpdate, TradeSignals, WeekendScanResults,
};
pub use store::{DashboardStore, LoadOutcome};

use std::sync::Arc;

use screener_client::{Notifier, RequestIdInterceptor, ScreenerClient};

/// Build the API client described by `config`, reporting failures to `notifier`.
pub fn connect(config: &Config, notifier: Arc<dyn Notifier>) -> screener_client::Result<ScreenerClient> {
    let mut builder = ScreenerClient::builder(&config.api_origin)
        .timeout(config.timeout)
        .notifier(notifier);
    if config.request_ids {
        builder = builder.interceptor(Arc::new(RequestIdInterceptor));
    }
    builder.build()
}
