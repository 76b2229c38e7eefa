//! Pick the job source for a deployment.

use std::sync::Arc;

use tracing::info;

use cronview_config::{CronSourceKind, CronViewConfig};
use cronview_cron::{JobSource, StoreJobSource};
use cronview_gateway::GatewayJobSource;

/// Build the one source named by `cron.source`. Sources are never merged.
///
/// Nothing is resolved or contacted here; failures surface when jobs are
/// listed.
pub fn job_source_from_config(config: &CronViewConfig) -> Arc<dyn JobSource> {
    match config.cron.source {
        CronSourceKind::Store => {
            info!(store = ?config.cron.store, "Using cron store");
            Arc::new(StoreJobSource::from_config(config.cron.store.as_deref()))
        }
        CronSourceKind::Gateway => {
            info!(url = %config.gateway.url, "Using gateway cron registry");
            Arc::new(GatewayJobSource::from_config(&config.gateway))
        }
    }
}
