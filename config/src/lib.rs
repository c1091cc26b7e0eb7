#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod dashboard_config;
mod period;
mod terminus_config;

pub use app_config::{
    get_config_dir,
    AppConfig,
    CONFIG_DIR_ENV,
};
pub use args::{
    version,
    Args,
};
pub use dashboard_config::{
    BandThresholds,
    DashboardConfig,
};
pub use period::Period;
pub use terminus_config::{
    OutputFormat,
    TerminusConfig,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    pub terminus: TerminusConfig,
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub defaults: RequestDefaults,
}

/// Values pre-filled in the dashboard form and used by the CLI when an option is omitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestDefaults {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub period: Period,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");
const ENV_PREFIX: &str = "TERMINUS_METRICS";

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the embedded defaults, `config.yaml` from the config directory, an optional extra file,
    /// `TERMINUS_METRICS__*` environment variables and finally the command-line arguments.
    pub fn new(args: &Args) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        if let Some(path) = &args.config {
            debug!(?path, "adding config file from args");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .add_source(args.clone());

        let cfg: Self = builder.build()?.try_deserialize()?;

        Ok(cfg)
    }
}
