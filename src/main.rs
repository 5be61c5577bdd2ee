use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coin_history_ingest::config::{self, CoinGeckoConfig, DEFAULT_COINGECKO_BASE_URL};
use coin_history_ingest::error::ConfigError;
use coin_history_ingest::jobs::ingestion::{
    run_ingestion, FailurePolicy, IngestOptions, IngestReport, Sink,
};
use coin_history_ingest::models::date_range::DateRange;
use coin_history_ingest::services::coingecko::CoinGeckoService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// coin_raw + coin_aggregated tables
    Database,
    /// <output_dir>/<date>_<coin>.json files
    Filesystem,
}

/// Fetch daily CoinGecko prices for a coin and store them.
#[derive(Debug, Parser)]
#[command(name = "coin-history-ingest", version)]
struct Cli {
    /// CoinGecko coin id (e.g. bitcoin)
    #[arg(long)]
    coin: String,

    /// Single day to fetch, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,

    /// First day of a range, YYYY-MM-DD
    #[arg(long = "start_date")]
    start_date: Option<String>,

    /// Last day of a range (inclusive), YYYY-MM-DD
    #[arg(long = "end_date")]
    end_date: Option<String>,

    #[arg(long, value_enum, default_value_t = SinkKind::Database)]
    sink: SinkKind,

    /// Directory for the filesystem sink, created if missing
    #[arg(long = "output_dir", env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Stop at the first failed date, or skip it and continue
    #[arg(long = "on_error", value_enum, default_value_t = FailurePolicy::Abort)]
    on_error: FailurePolicy,

    /// Re-fetch and replace days that are already stored
    #[arg(long)]
    force: bool,

    /// Pause between requests in milliseconds
    #[arg(long = "delay_ms", default_value_t = 1500)]
    delay_ms: u64,

    /// Overrides the POSTGRES_* settings
    #[arg(long = "database_url", env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[arg(long = "coingecko_base_url", env = "COINGECKO_BASE_URL", default_value = DEFAULT_COINGECKO_BASE_URL)]
    coingecko_base_url: String,

    #[arg(long = "coingecko_api_key", env = "COINGECKO_API_KEY", hide_env_values = true)]
    coingecko_api_key: Option<String>,

    /// Do not create or upgrade the tables before ingesting
    #[arg(long = "skip_migrations")]
    skip_migrations: bool,
}

/// Everything resolved from the command line before any I/O happens.
struct Invocation {
    options: IngestOptions,
    target: Target,
    coingecko: CoinGeckoConfig,
}

enum Target {
    Database { url: String, run_migrations: bool },
    Filesystem(PathBuf),
}

impl Invocation {
    fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let range = DateRange::from_args(
            cli.date.as_deref(),
            cli.start_date.as_deref(),
            cli.end_date.as_deref(),
        )?;

        let target = match cli.sink {
            SinkKind::Database => Target::Database {
                url: config::database_url(cli.database_url)?,
                run_migrations: !cli.skip_migrations,
            },
            SinkKind::Filesystem => Target::Filesystem(cli.output_dir),
        };

        let options = IngestOptions {
            policy: cli.on_error,
            force: cli.force,
            request_delay: Duration::from_millis(cli.delay_ms),
            ..IngestOptions::new(cli.coin, range)
        };

        let coingecko = CoinGeckoConfig {
            base_url: cli.coingecko_base_url,
            api_key: cli.coingecko_api_key.filter(|key| !key.is_empty()),
            ..CoinGeckoConfig::default()
        };

        Ok(Self {
            options,
            target,
            coingecko,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let invocation = match Invocation::from_cli(cli) {
        Ok(invocation) => invocation,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };

    tokio::select! {
        result = run(invocation) => match result {
            Ok(report) if report.is_success() => ExitCode::SUCCESS,
            Ok(report) => {
                for failure in &report.failures {
                    tracing::error!("{}: {}", failure.date, failure.message);
                }
                tracing::error!(
                    "{} of {} date(s) failed",
                    report.failures.len(),
                    report.dates
                );
                ExitCode::FAILURE
            }
            Err(e) => {
                tracing::error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping before the next date");
            ExitCode::from(130)
        }
    }
}

async fn run(invocation: Invocation) -> anyhow::Result<IngestReport> {
    let Invocation {
        options,
        target,
        coingecko,
    } = invocation;

    let coingecko =
        CoinGeckoService::new(coingecko).context("Failed to build CoinGecko HTTP client")?;

    let sink = match target {
        Target::Database {
            url,
            run_migrations,
        } => {
            tracing::info!("Connecting to database...");
            let mut connect_options = ConnectOptions::new(url);
            connect_options.sqlx_logging(false);
            let db = Database::connect(connect_options)
                .await
                .context("Failed to connect to database")?;

            if run_migrations {
                tracing::info!("Running migrations...");
                migration::Migrator::up(&db, None)
                    .await
                    .context("Failed to run migrations")?;
            }

            Sink::Database(db)
        }
        Target::Filesystem(dir) => Sink::Filesystem(dir),
    };

    let report = run_ingestion(&coingecko, &sink, &options).await?;

    tracing::info!(
        "Done: {} of {} date(s) ingested for {}",
        report.succeeded(),
        report.dates,
        options.coin_id
    );

    Ok(report)
}
