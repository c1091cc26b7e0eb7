use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;
use strum::{
    Display,
    EnumIter,
    EnumString,
};

/// Value of `terminus ... --format`.
#[derive(Debug, Default, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Table,
    Json,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TerminusConfig {
    /// Name or path of the terminus executable, resolved against `PATH`.
    pub binary: String,
    pub timeout_secs: u64,
    pub datapoints: String,
    #[serde(default)]
    pub format: OutputFormat,
    pub fields: Vec<String>,
    /// Plans kept by the site listing.
    #[serde(default)]
    pub plans: Vec<String>,
}

impl TerminusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
