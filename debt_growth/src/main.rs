use debt_growth::{pipeline, AnalysisConfig, WorldBankClient};
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debt_growth=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> debt_growth::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading configuration");
            AnalysisConfig::from_toml_file(&path)?
        }
        None => AnalysisConfig::default(),
    };

    let client = WorldBankClient::new(config.source.clone())?;
    let report = pipeline::run(&config, &client)?;

    println!("{}", report);
    for chart in &report.charts {
        println!("Chart written to {}", chart.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    info!(version = debt_growth::VERSION, "starting {}", debt_growth::NAME);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "analysis failed");
            ExitCode::FAILURE
        }
    }
}
