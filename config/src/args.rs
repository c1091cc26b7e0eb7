use crate::OutputFormat;
use std::{
    net::SocketAddr,
    path::PathBuf,
};

/// Options shared by every terminus-metrics binary. Anything given here overrides the configuration files.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Args {
    /// Additional YAML configuration file, applied after the one in the config directory.
    #[arg(long, global = true, env = "TERMINUS_METRICS_CONFIG_FILE", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name or path of the terminus executable.
    #[arg(long, global = true, value_name = "PATH")]
    pub terminus_binary: Option<String>,

    /// Seconds to wait for terminus before giving up.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Output format requested from terminus (csv, table or json).
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Address the dashboard listens on.
    #[arg(long, global = true, env = "TERMINUS_METRICS_LISTEN", value_name = "ADDRESS")]
    pub listen: Option<SocketAddr>,

    /// chrono format used to display dates, e.g. `%m-%d-%Y`.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(binary) = &self.terminus_binary {
                cache.insert("terminus.binary".to_string(), binary.clone().into());
            }
            if let Some(timeout_secs) = self.timeout_secs {
                cache.insert("terminus.timeout_secs".to_string(), timeout_secs.into());
            }
            if let Some(format) = &self.format {
                cache.insert("terminus.format".to_string(), format.to_string().into());
            }
            if let Some(listen) = &self.listen {
                cache.insert("dashboard.listen_address".to_string(), listen.to_string().into());
            }
            if let Some(date_format) = &self.date_format {
                cache.insert("dashboard.date_format".to_string(), date_format.clone().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "{}

Authors: {author}

Config directory: {config_dir_path} (override with {})",
        env!("CARGO_PKG_VERSION"),
        crate::CONFIG_DIR_ENV
    )
}
