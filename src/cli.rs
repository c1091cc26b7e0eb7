use crate::report;
use clap::{
    Parser,
    Subcommand,
};
use color_eyre::Result;
use eyre::{
    Context as _,
    OptionExt as _,
};
use std::{
    path::PathBuf,
    sync::Arc,
};
use terminus_metrics_config::{
    version,
    Args,
    Config,
    Period,
};
use terminus_metrics_pipeline::{
    csv,
    MetricsRequest,
    Pipeline,
    Presenter,
    TerminusCli,
};

/// Pantheon site metrics from the terminus CLI, as tables, charts and CSV.
#[derive(Parser, Debug)]
#[command(author, version = version(), about, long_about = None)]
pub struct Cli {
    #[clap(flatten)]
    pub args: Args,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch metrics for one site environment and print them.
    Report(ReportArgs),
    /// List sites on the configured Performance plans.
    Sites,
}

#[derive(clap::Args, Debug, Default)]
pub struct ReportArgs {
    /// Site name. Defaults to `defaults.site` from the configuration.
    #[arg(long)]
    pub site: Option<String>,

    /// Environment, e.g. live, test or dev.
    #[arg(long)]
    pub env: Option<String>,

    /// Bucket size: day, week or month.
    #[arg(long)]
    pub period: Option<Period>,

    /// Also write the HTML report to this file.
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Also write the CSV export to this file.
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,
}

impl ReportArgs {
    fn request(&self, config: &Config) -> Result<MetricsRequest> {
        let defaults = &config.defaults;
        let site = self
            .site
            .clone()
            .or_else(|| Some(defaults.site.clone()).filter(|site| !site.is_empty()))
            .ok_or_eyre("No site given. Pass --site or set defaults.site in the configuration.")?;
        let env = self.env.clone().unwrap_or_else(|| defaults.environment.clone());
        let period = self.period.unwrap_or(defaults.period);
        Ok(MetricsRequest::new(site, env, period)?)
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::new(&self.args).wrap_err("Failed to load configuration")?;
        debug!(?config, "configuration loaded");
        let pipeline = Pipeline::new(Arc::new(TerminusCli::new(&config.terminus)));
        let presenter = Presenter::new(&config.dashboard);

        match self.command {
            Command::Report(args) => run_report(&config, &pipeline, &presenter, args).await,
            Command::Sites => {
                let sites = pipeline.sites(&config.terminus.plans).await?;
                if sites.is_empty() {
                    println!("No sites on plans: {}", config.terminus.plans.join(", "));
                } else {
                    println!("{}", report::sites_table(&sites));
                }
                Ok(())
            }
        }
    }
}

async fn run_report(config: &Config, pipeline: &Pipeline, presenter: &Presenter, args: ReportArgs) -> Result<()> {
    let request = args.request(config)?;
    let report = pipeline.run(request).await;

    for warning in report.warnings() {
        eprintln!("terminus: {warning}");
    }

    if let Some(path) = &args.html {
        tokio::fs::write(path, presenter.report_page(&report))
            .await
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote HTML report");
    }

    let table = match &report.outcome {
        Ok(table) => table,
        Err(err) => {
            if let Some(raw) = report.raw.as_ref().filter(|raw| !raw.stdout.trim().is_empty()) {
                eprintln!("{}", presenter.raw_output(&raw.stdout));
            }
            return Err(eyre::eyre!("No metrics for {}: {err}", report.request));
        }
    };

    println!("{}", report::metrics_table(presenter, table));
    println!("{}", report::summary_table(&presenter.summary_lines(&report.request, table)));

    let breakdown = presenter.breakdown(table);
    println!("{}", breakdown.note(presenter.bands().high));
    for warning in table.warnings() {
        eprintln!("warning: {warning}");
    }

    if let Some(path) = &args.csv {
        tokio::fs::write(path, csv::export(table))
            .await
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote CSV export");
    }
    Ok(())
}
