//! Gateway-backed job source (`cron.list`).

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use cronview_config::GatewayConfig;
use cronview_cron::{JobSource, SourceError};
use cronview_types::CronJob;

use crate::client::GatewayClient;

/// Remote method listing cron jobs.
pub const CRON_LIST_METHOD: &str = "cron.list";

/// Reads jobs from the gateway's cron registry, one call per listing.
pub struct GatewayJobSource {
    client: GatewayClient,
}

impl GatewayJobSource {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(GatewayClient::from_config(config))
    }
}

#[async_trait]
impl JobSource for GatewayJobSource {
    fn name(&self) -> &'static str {
        "gateway"
    }

    async fn list_jobs(&self, include_disabled: bool) -> Result<Vec<CronJob>, SourceError> {
        let result = self
            .client
            .call(
                CRON_LIST_METHOD,
                json!({ "includeDisabled": include_disabled }),
            )
            .await?;
        let jobs = jobs_from_result(result);
        debug!(url = self.client.url(), jobs = jobs.len(), "Fetched cron jobs from gateway");
        Ok(jobs)
    }
}

/// Decode the `jobs` array of a `cron.list` result.
///
/// A missing array is an empty list; entries that fail to decode are
/// skipped.
pub fn jobs_from_result(result: Value) -> Vec<CronJob> {
    let entries = match result {
        Value::Object(mut obj) => match obj.remove("jobs") {
            Some(Value::Array(entries)) => entries,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<CronJob>(entry) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(index = i, "Skipping undecodable cron job from gateway: {e}");
                None
            }
        })
        .collect()
}
