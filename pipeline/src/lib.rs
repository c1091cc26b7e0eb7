#[macro_use]
extern crate tracing;

pub mod csv;
mod error;
mod invoker;
mod parser;
pub mod present;
mod request;
pub mod sites;
mod table;

pub use error::MetricsError;
pub use invoker::{
    MetricsSource,
    RawOutput,
    TerminusCli,
};
pub use parser::{
    parse_count,
    parse_date,
    parse_metrics,
    parse_ratio,
    Column,
};
pub use present::Presenter;
pub use request::MetricsRequest;
pub use sites::Site;
pub use table::{
    ratio,
    MetricRow,
    MetricsTable,
    ParseWarning,
    Peak,
    Summary,
};
pub use terminus_metrics_config::Period;

use std::sync::Arc;

/// Everything one submission produced. `raw` is `None` when terminus could not be run at all.
#[derive(Debug)]
pub struct MetricsReport {
    pub request: MetricsRequest,
    pub raw: Option<RawOutput>,
    pub outcome: Result<MetricsTable, MetricsError>,
}

impl MetricsReport {
    pub fn table(&self) -> Option<&MetricsTable> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&MetricsError> {
        self.outcome.as_ref().err()
    }

    /// Non-fatal stderr lines from a run that exited cleanly.
    pub fn warnings(&self) -> Vec<&str> {
        self.raw
            .as_ref()
            .filter(|raw| raw.exit_code == 0)
            .map(RawOutput::warnings)
            .unwrap_or_default()
    }
}

/// Request in, report out: invoke terminus, check its exit status, parse stdout.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn MetricsSource>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn MetricsSource>) -> Self {
        Self { source }
    }

    /// Never fails: every error ends up in [`MetricsReport::outcome`].
    #[instrument(level = "info", skip_all, fields(site_env = %request.target(), period = %request.period()))]
    pub async fn run(&self, request: MetricsRequest) -> MetricsReport {
        let raw = match self.source.fetch_metrics(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(kind = err.kind(), %err, "could not run terminus");
                return MetricsReport {
                    request,
                    raw: None,
                    outcome: Err(err),
                };
            }
        };

        let outcome = raw.clone().ensure_success().and_then(|raw| parse_metrics(&raw.stdout));
        match &outcome {
            Ok(table) => info!(
                rows = table.len(),
                warnings = table.warnings().len(),
                "metrics ready"
            ),
            Err(err) => warn!(kind = err.kind(), %err, "metrics unavailable"),
        }
        MetricsReport {
            request,
            raw: Some(raw),
            outcome,
        }
    }

    /// Sites on one of `plans` (all sites when `plans` is empty).
    #[instrument(level = "info", skip_all)]
    pub async fn sites(&self, plans: &[String]) -> Result<Vec<Site>, MetricsError> {
        let raw = self.source.fetch_sites().await?.ensure_success()?;
        let sites = sites::filter_by_plan(sites::parse_site_list(&raw.stdout)?, plans);
        info!(sites = sites.len(), "site list ready");
        Ok(sites)
    }
}
