use serde::{
    Deserialize,
    Serialize,
};
use std::net::SocketAddr;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    pub listen_address: SocketAddr,
    /// chrono format string used for bucket labels in charts and raw output.
    pub date_format: String,
    #[serde(default)]
    pub bands: BandThresholds,
}

/// Lower bounds (in percent) of the medium and high cache efficiency bands.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BandThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            medium: 50.0,
            high: 70.0,
        }
    }
}
