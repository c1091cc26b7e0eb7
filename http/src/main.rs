use axum::serve;
use clap::Parser;
use color_eyre::Result;
use eyre::Context as _;
use std::sync::Arc;
use terminus_metrics_config::{
    Args,
    Config,
};
use terminus_metrics_http::create_router;
use terminus_metrics_pipeline::TerminusCli;
use tokio::net::TcpListener;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

/// Serves the metrics dashboard.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[clap(flatten)]
    args: Args,
}

fn init_logging(args: &Args) -> Result<()> {
    color_eyre::install()?;

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(args.log_level()))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}

async fn start_server(args: Args) -> Result<()> {
    let config = Config::new(&args).wrap_err("Failed to load configuration")?;
    let listen_address = config.dashboard.listen_address;
    let source = Arc::new(TerminusCli::new(&config.terminus));
    let app = create_router(config, source);

    let listener = TcpListener::bind(listen_address)
        .await
        .wrap_err_with(|| format!("Failed to listen on {listen_address}"))?;
    tracing::info!("listening on http://{listen_address}");
    serve(listener, app.into_make_service()).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.args)?;
    start_server(cli.args).await
}
