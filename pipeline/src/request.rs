use crate::MetricsError;
use serde::Serialize;
use std::fmt;
use terminus_metrics_config::Period;

/// One user submission: which site environment to query and at what granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricsRequest {
    site: String,
    environment: String,
    period: Period,
}

impl MetricsRequest {
    /// Validates the identifiers before they are handed to terminus as `<site>.<env>`.
    pub fn new(
        site: impl Into<String>,
        environment: impl Into<String>,
        period: Period,
    ) -> Result<Self, MetricsError> {
        let site = site.into().trim().to_string();
        let environment = environment.into().trim().to_string();
        validate_identifier("site", &site)?;
        validate_identifier("environment", &environment)?;
        Ok(Self {
            site,
            environment,
            period,
        })
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// The `<site>.<env>` argument terminus expects.
    pub fn target(&self) -> String {
        format!("{}.{}", self.site, self.environment)
    }

    /// File name offered for the CSV download.
    pub fn csv_file_name(&self) -> String {
        format!("{}_{}_metrics.csv", self.site, self.environment)
    }
}

impl fmt::Display for MetricsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.target(), self.period)
    }
}

fn validate_identifier(what: &str, value: &str) -> Result<(), MetricsError> {
    if value.is_empty() {
        return Err(MetricsError::InvalidRequest(format!("{what} name is required")));
    }
    if value.starts_with('-') {
        return Err(MetricsError::InvalidRequest(format!(
            "{what} name must not start with '-': {value:?}"
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(MetricsError::InvalidRequest(format!(
            "{what} name contains an invalid character {c:?}: {value:?}"
        )));
    }
    Ok(())
}
