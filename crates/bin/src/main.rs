//! docket CLI binary.
//!
//! Command-line interface for looking up SEC EDGAR filers, listing their
//! filings and downloading primary documents.

mod download;
mod output;

use clap::{ArgAction, Args, Parser, Subcommand};
use docket_data::edgar::{CikIndex, Company, CompanyTicker, FilingQuery, Quarter};
use docket_data::{Config, DataError};
use download::download_documents;
use indicatif::{ProgressBar, ProgressStyle};
use output::{OutputFormat, render_company, render_filings};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docket")]
#[command(about = "docket: rate-limited, cache-aware SEC EDGAR client", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file (defaults to $DOCKET_CONFIG_FILE)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Disable caching (always fetch fresh data)
    #[arg(long, global = true)]
    no_cache: bool,

    /// Requests per second
    #[arg(long, global = true)]
    rate: Option<u32>,

    /// Outbound proxy URL
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Operator name for the User-Agent
    #[arg(long, global = true)]
    company_name: Option<String>,

    /// Contact email for the User-Agent
    #[arg(long, global = true)]
    admin_email: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by `filings` and `download`.
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Form type, e.g. 10-K
    #[arg(long)]
    form: Option<String>,

    /// First report date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last report date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Report year
    #[arg(long)]
    year: Option<i32>,

    /// Quarter of --year
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    quarter: Option<u8>,

    /// Refetch the filing list instead of revalidating it
    #[arg(long)]
    refresh: bool,
}

impl FilterArgs {
    fn query(&self) -> Result<FilingQuery, DataError> {
        Ok(FilingQuery {
            start: self.start.clone(),
            end: self.end.clone(),
            form: self.form.clone(),
            year: self.year,
            quarter: self.quarter.map(Quarter::try_from).transpose()?,
            force: self.refresh,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a ticker to its CIK
    Lookup {
        /// Ticker symbol
        ticker: String,

        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List a company's filings
    Filings {
        /// Ticker symbol
        ticker: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Download primary documents
    Download {
        /// Ticker symbol
        ticker: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output directory
        #[arg(long, short)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        if is_transient(e.as_ref()) {
            eprintln!("This may be temporary; try again later or lower --rate.");
        }
        process::exit(1);
    }
}

/// Whether a [`DataError`] anywhere in the error chain could clear on retry.
fn is_transient(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(data) = e.downcast_ref::<DataError>() {
            return data.is_retryable();
        }
        current = e.source();
    }
    false
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let limiter = Arc::new(config.rate_limiter()?);
    let downloader = config.downloader(limiter)?;
    let index = CikIndex::new(Arc::clone(&downloader));

    match cli.command {
        Commands::Lookup { ticker, format } => {
            let company = resolve(&index, &ticker).await?;
            print!("{}", render_company(&company, format)?);
        }
        Commands::Filings {
            ticker,
            filters,
            format,
        } => {
            let query = filters.query()?;
            let listed = resolve(&index, &ticker).await?;
            let filings = Company::new(listed.cik, downloader).filings(&query).await?;
            print!("{}", render_filings(&filings, format)?);
        }
        Commands::Download {
            ticker,
            filters,
            out,
        } => {
            let query = filters.query()?;
            let listed = resolve(&index, &ticker).await?;
            let company = Company::new(listed.cik, downloader);
            let filings = company.filings(&query).await?;

            if filings.is_empty() {
                println!("No filings match for {}", listed.ticker);
                return Ok(());
            }

            let pb = ProgressBar::new(filings.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("█▓░"),
            );
            pb.set_message(format!("{} documents", listed.ticker));

            match download_documents(&company, &filings, &out, Some(&pb)).await {
                Ok(paths) => pb.finish_with_message(format!(
                    "Downloaded {} document(s) to {}",
                    paths.len(),
                    out.display()
                )),
                Err(e) => {
                    pb.abandon_with_message("Failed!");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

async fn resolve(index: &CikIndex, ticker: &str) -> Result<CompanyTicker, DataError> {
    index
        .by_ticker(ticker)
        .await?
        .ok_or_else(|| DataError::CikNotFound(ticker.to_uppercase()))
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

/// Layered config with command-line flags applied last.
fn load_config(cli: &Cli) -> Result<Config, DataError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(cli, &mut config);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if cli.no_cache {
        config.use_cache = false;
    }
    if let Some(rate) = cli.rate {
        config.rate_per_second = rate;
    }
    if let Some(proxy) = &cli.proxy {
        config.proxy = Some(proxy.clone());
    }
    if let Some(name) = &cli.company_name {
        config.company_name = name.clone();
    }
    if let Some(email) = &cli.admin_email {
        config.admin_email = email.clone();
    }
}
