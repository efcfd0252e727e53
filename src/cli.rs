//! CLI definition and dispatch: fetch → optimize → present.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::chart_svg::SvgChartReport;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReport;
use crate::domain::allocator::AllocatorConfig;
use crate::domain::config_validation::{parse_date, validate_data_config, validate_optimizer_config};
use crate::domain::error::PortfolioError;
use crate::domain::estimator::{EstimatorConfig, MAX_PERIODS_PER_YEAR};
use crate::domain::pipeline::{optimize, OptimizeConfig};
use crate::domain::result::OptimizationResult;
use crate::domain::returns::ReturnKind;
use crate::domain::universe::{fetch_universe, parse_assets};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Minimum universe size accepted on the command line.
pub const MIN_CLI_TICKERS: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "sharpeopt", about = "Long-only maximum Sharpe ratio portfolio optimizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate returns and covariance, then solve for max-Sharpe weights
    Optimize(OptimizeArgs),
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in a price directory
    ListAssets {
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct OptimizeArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory holding one <TICKER>.csv per asset
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Tickers, space- or comma-separated (e.g. "META NVDA SPY")
    #[arg(short, long)]
    pub tickers: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end: Option<String>,
    /// Annual risk-free rate in percent, e.g. 4 for 4%
    #[arg(long, allow_negative_numbers = true)]
    pub risk_free_pct: Option<f64>,
    #[arg(long)]
    pub periods_per_year: Option<u32>,
    /// simple or log
    #[arg(long)]
    pub return_kind: Option<String>,
    /// Write an SVG bar chart of the weights to this path
    #[arg(long)]
    pub chart: Option<PathBuf>,
    #[arg(long)]
    pub no_covariance: bool,
}

/// Everything one run needs, resolved from config and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub data_path: PathBuf,
    pub tickers: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub risk_free_rate: f64,
    pub config: OptimizeConfig,
    pub chart_path: Option<PathBuf>,
    pub show_covariance: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Optimize(args) => run_optimize(&args),
        Command::Validate { config } => run_validate(&config),
        Command::ListAssets { data } => run_list_assets(&data),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, PortfolioError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)
        }
        None => FileConfigAdapter::from_string(""),
    }
}

fn run_optimize(args: &OptimizeArgs) -> Result<(), PortfolioError> {
    let config = load_config(args.config.as_deref())?;
    validate_optimizer_config(&config)?;
    let request = resolve_request(args, &config)?;

    let data_port = CsvAdapter::new(request.data_path.clone());
    let result = run_pipeline(&data_port, &request)?;

    let report = TextReport {
        show_covariance: request.show_covariance,
    };
    print!("{}", report.render(&result));

    if let Some(chart_path) = &request.chart_path {
        SvgChartReport.write(&result, chart_path)?;
        tracing::info!(path = %chart_path.display(), "weight chart written");
    }
    Ok(())
}

/// Fetches prices for the requested tickers and runs the optimizer.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    request: &RunRequest,
) -> Result<OptimizationResult, PortfolioError> {
    tracing::info!(
        tickers = %request.tickers.join(","),
        risk_free_rate = request.risk_free_rate,
        "starting optimization"
    );
    let series = fetch_universe(
        data_port,
        &request.tickers,
        request.start_date,
        request.end_date,
    )?;
    let result = optimize(&series, request.risk_free_rate, &request.config)?;
    tracing::info!(
        sharpe = result.stats().sharpe_ratio,
        iterations = result.iterations(),
        "optimization complete"
    );
    Ok(result)
}

/// Reads `[optimizer]` settings, falling back to the library defaults.
pub fn build_optimize_config(config: &dyn ConfigPort) -> Result<OptimizeConfig, PortfolioError> {
    let defaults = OptimizeConfig::default();

    let periods = config.get_int(
        "optimizer",
        "periods_per_year",
        defaults.estimator.periods_per_year as i64,
    );
    let periods_per_year = u32::try_from(periods)
        .ok()
        .filter(|&p| p > 0 && p <= MAX_PERIODS_PER_YEAR)
        .ok_or_else(|| {
            PortfolioError::invalid(
                "optimizer",
                "periods_per_year",
                "periods_per_year must be a positive integer",
            )
        })?;

    let return_kind = match config.get_trimmed("optimizer", "return_kind") {
        Some(s) => s
            .parse::<ReturnKind>()
            .map_err(|reason| PortfolioError::invalid("optimizer", "return_kind", reason))?,
        None => defaults.return_kind,
    };

    let max_iter = config.get_int(
        "optimizer",
        "max_iter",
        defaults.allocator.max_iter as i64,
    );
    let max_iter = usize::try_from(max_iter).map_err(|_| {
        PortfolioError::invalid("optimizer", "max_iter", "max_iter must be at least 1")
    })?;

    Ok(OptimizeConfig {
        estimator: EstimatorConfig { periods_per_year },
        return_kind,
        allocator: AllocatorConfig {
            tol: config.get_double("optimizer", "tol", defaults.allocator.tol),
            max_iter,
            feasibility_tol: config.get_double(
                "optimizer",
                "feasibility_tol",
                defaults.allocator.feasibility_tol,
            ),
        },
    })
}

/// Tickers from the flag if given, else `[data] tickers`; at least two required.
pub fn resolve_tickers(
    tickers_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, PortfolioError> {
    let raw = tickers_override
        .map(str::to_string)
        .or_else(|| config.get_trimmed("data", "tickers"))
        .ok_or_else(|| PortfolioError::ConfigMissing {
            section: "data".to_string(),
            key: "tickers".to_string(),
        })?;

    let tickers = parse_assets(&raw)
        .map_err(|e| PortfolioError::invalid("data", "tickers", e.to_string()))?;
    if tickers.len() < MIN_CLI_TICKERS {
        return Err(PortfolioError::invalid(
            "data",
            "tickers",
            format!("please provide at least {MIN_CLI_TICKERS} tickers"),
        ));
    }
    Ok(tickers)
}

pub fn resolve_request(
    args: &OptimizeArgs,
    config: &dyn ConfigPort,
) -> Result<RunRequest, PortfolioError> {
    let mut optimize_config = build_optimize_config(config)?;
    if let Some(periods) = args.periods_per_year {
        optimize_config.estimator.periods_per_year = periods;
    }
    if let Some(kind) = &args.return_kind {
        optimize_config.return_kind = kind
            .parse()
            .map_err(|reason| PortfolioError::invalid("optimizer", "return_kind", reason))?;
    }

    let data_path = match &args.data {
        Some(p) => p.clone(),
        None => config
            .get_trimmed("data", "path")
            .map(PathBuf::from)
            .ok_or_else(|| PortfolioError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            })?,
    };

    let start_raw = args
        .start
        .clone()
        .or_else(|| config.get_trimmed("data", "start_date"));
    let end_raw = args
        .end
        .clone()
        .or_else(|| config.get_trimmed("data", "end_date"));
    let start_date = parse_date(start_raw.as_deref(), "start_date")?;
    let end_date = parse_date(end_raw.as_deref(), "end_date")?;
    if let (Some(s), Some(e)) = (start_date, end_date) {
        if s >= e {
            return Err(PortfolioError::invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }

    let risk_free_rate = match args.risk_free_pct {
        Some(pct) => pct / 100.0,
        None => config.get_double("optimizer", "risk_free_rate", 0.0),
    };

    let chart_path = args
        .chart
        .clone()
        .or_else(|| config.get_trimmed("report", "chart_path").map(PathBuf::from));

    Ok(RunRequest {
        data_path,
        tickers: resolve_tickers(args.tickers.as_deref(), config)?,
        start_date,
        end_date,
        risk_free_rate,
        config: optimize_config,
        chart_path,
        show_covariance: !args.no_covariance
            && config.get_bool("report", "show_covariance", true),
    })
}

fn run_validate(config_path: &Path) -> Result<(), PortfolioError> {
    let config = load_config(Some(config_path))?;
    validate_data_config(&config)?;
    validate_optimizer_config(&config)?;
    let optimize_config = build_optimize_config(&config)?;
    let tickers = resolve_tickers(None, &config)?;

    eprintln!("Tickers:          {}", tickers.join(", "));
    eprintln!(
        "Periods per year: {}",
        optimize_config.estimator.periods_per_year
    );
    eprintln!("Return kind:      {}", optimize_config.return_kind);
    eprintln!(
        "Solver:           tol={:e}, max_iter={}",
        optimize_config.allocator.tol, optimize_config.allocator.max_iter
    );
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_assets(data_path: &Path) -> Result<(), PortfolioError> {
    let adapter = CsvAdapter::new(data_path.to_path_buf());
    let assets = adapter.list_assets()?;
    if assets.is_empty() {
        eprintln!("No price files found in {}", data_path.display());
    }
    for asset in &assets {
        println!("{asset}");
    }
    Ok(())
}
