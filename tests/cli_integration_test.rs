//! CLI integration tests for the optimize command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_optimize_config, resolve_tickers, resolve_request)
//! - Flag precedence over INI values
//! - Full pipeline with MockDataPort
//! - End-to-end dispatch through `run` with CSV files on disk

mod common;

use clap::Parser;
use common::*;
use sharpeopt::adapters::file_config_adapter::FileConfigAdapter;
use sharpeopt::cli::{self, Cli, OptimizeArgs};
use sharpeopt::domain::error::PortfolioError;
use sharpeopt::domain::returns::ReturnKind;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn exit_code_eq(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

const VALID_INI: &str = r#"
[data]
path = ./prices
tickers = META, NVDA, SPY
start_date = 2024-01-01
end_date = 2024-04-30

[optimizer]
risk_free_rate = 0.04
periods_per_year = 252
return_kind = simple
tol = 1e-10
max_iter = 300

[report]
show_covariance = false
"#;

mod config_parsing {
    use super::*;

    #[test]
    fn build_optimize_config_reads_optimizer_section() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_optimize_config(&adapter).unwrap();
        assert_eq!(config.estimator.periods_per_year, 252);
        assert_eq!(config.return_kind, ReturnKind::Simple);
        assert_eq!(config.allocator.tol, 1e-10);
        assert_eq!(config.allocator.max_iter, 300);
    }

    #[test]
    fn build_optimize_config_defaults() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        let config = cli::build_optimize_config(&adapter).unwrap();
        assert_eq!(config, sharpeopt::OptimizeConfig::default());
    }

    #[test]
    fn build_optimize_config_rejects_bad_return_kind() {
        let adapter =
            FileConfigAdapter::from_string("[optimizer]\nreturn_kind = geometric\n").unwrap();
        let err = cli::build_optimize_config(&adapter).unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigInvalid { key, .. } if key == "return_kind"));
    }

    #[test]
    fn build_optimize_config_rejects_zero_periods() {
        let adapter =
            FileConfigAdapter::from_string("[optimizer]\nperiods_per_year = 0\n").unwrap();
        assert!(cli::build_optimize_config(&adapter).is_err());
    }

    #[test]
    fn resolve_tickers_from_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let tickers = cli::resolve_tickers(None, &adapter).unwrap();
        assert_eq!(tickers, vec!["META", "NVDA", "SPY"]);
    }

    #[test]
    fn resolve_tickers_flag_wins() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let tickers = cli::resolve_tickers(Some("aapl msft"), &adapter).unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn resolve_tickers_requires_two() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        let err = cli::resolve_tickers(Some("SPY"), &adapter).unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigInvalid { .. }));
    }

    #[test]
    fn resolve_tickers_missing() {
        let adapter = FileConfigAdapter::from_string("[data]\npath = x\n").unwrap();
        let err = cli::resolve_tickers(None, &adapter).unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigMissing { key, .. } if key == "tickers"));
    }

    #[test]
    fn resolve_tickers_rejects_duplicates() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        assert!(cli::resolve_tickers(Some("SPY spy"), &adapter).is_err());
    }
}

mod request_resolution {
    use super::*;

    #[test]
    fn config_only() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let request = cli::resolve_request(&OptimizeArgs::default(), &adapter).unwrap();
        assert_eq!(request.data_path, PathBuf::from("./prices"));
        assert_eq!(request.start_date, Some(date(2024, 1, 1)));
        assert_eq!(request.end_date, Some(date(2024, 4, 30)));
        assert_eq!(request.risk_free_rate, 0.04);
        assert!(!request.show_covariance);
        assert_eq!(request.chart_path, None);
    }

    #[test]
    fn flags_override_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let args = OptimizeArgs {
            data: Some(PathBuf::from("/tmp/other")),
            tickers: Some("META SPY".to_string()),
            risk_free_pct: Some(2.5),
            periods_per_year: Some(52),
            return_kind: Some("log".to_string()),
            chart: Some(PathBuf::from("weights.svg")),
            ..OptimizeArgs::default()
        };
        let request = cli::resolve_request(&args, &adapter).unwrap();
        assert_eq!(request.data_path, PathBuf::from("/tmp/other"));
        assert_eq!(request.tickers, vec!["META", "SPY"]);
        assert!((request.risk_free_rate - 0.025).abs() < 1e-15);
        assert_eq!(request.config.estimator.periods_per_year, 52);
        assert_eq!(request.config.return_kind, ReturnKind::Log);
        assert_eq!(request.chart_path, Some(PathBuf::from("weights.svg")));
    }

    #[test]
    fn missing_data_path() {
        let adapter = FileConfigAdapter::from_string("[data]\ntickers = A B\n").unwrap();
        let err = cli::resolve_request(&OptimizeArgs::default(), &adapter).unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn reversed_dates_rejected() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let args = OptimizeArgs {
            start: Some("2024-05-01".to_string()),
            ..OptimizeArgs::default()
        };
        assert!(cli::resolve_request(&args, &adapter).is_err());
    }

    #[test]
    fn malformed_date_rejected() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let args = OptimizeArgs {
            end: Some("30/04/2024".to_string()),
            ..OptimizeArgs::default()
        };
        let err = cli::resolve_request(&args, &adapter).unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigInvalid { .. }));
    }
}

mod pipeline_with_mock {
    use super::*;

    #[test]
    fn run_pipeline_produces_result() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let request = cli::resolve_request(&OptimizeArgs::default(), &adapter).unwrap();
        let result = cli::run_pipeline(&sample_port(), &request).unwrap();

        assert_eq!(result.assets(), &["META", "NVDA", "SPY"]);
        assert_eq!(result.risk_free_rate(), 0.04);
        let total: f64 = result.weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn run_pipeline_propagates_provider_error() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let request = cli::resolve_request(&OptimizeArgs::default(), &adapter).unwrap();
        let port = sample_port().with_error("SPY", "connection reset");
        let err = cli::run_pipeline(&port, &request).unwrap_err();
        assert!(matches!(err, PortfolioError::DataSource { asset, .. } if asset == "SPY"));
    }
}

mod dispatch {
    use super::*;

    #[test]
    fn validate_accepts_valid_config() {
        let ini = write_temp_ini(VALID_INI);
        let parsed = Cli::parse_from(["sharpeopt", "validate", "-c", ini.path().to_str().unwrap()]);
        assert!(exit_code_eq(cli::run(parsed), ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_missing_path() {
        let ini = write_temp_ini("[data]\ntickers = A B\n");
        let parsed = Cli::parse_from(["sharpeopt", "validate", "-c", ini.path().to_str().unwrap()]);
        assert!(exit_code_eq(cli::run(parsed), ExitCode::from(2)));
    }

    #[test]
    fn optimize_from_csv_writes_chart() {
        let dir = tempfile::TempDir::new().unwrap();
        for series in sample_universe() {
            write_price_csv(dir.path(), &series);
        }
        let chart = dir.path().join("weights.svg");
        let parsed = Cli::parse_from([
            "sharpeopt",
            "optimize",
            "--data",
            dir.path().to_str().unwrap(),
            "--tickers",
            "META,NVDA,SPY",
            "--risk-free-pct",
            "4",
            "--chart",
            chart.to_str().unwrap(),
        ]);
        assert!(exit_code_eq(cli::run(parsed), ExitCode::SUCCESS));

        let svg = std::fs::read_to_string(&chart).unwrap();
        assert!(svg.contains("Optimal Portfolio Weights"));
        assert_eq!(svg.matches("steelblue").count(), 3);
    }

    #[test]
    fn optimize_unknown_ticker_exits_with_data_code() {
        let dir = tempfile::TempDir::new().unwrap();
        for series in sample_universe() {
            write_price_csv(dir.path(), &series);
        }
        let parsed = Cli::parse_from([
            "sharpeopt",
            "optimize",
            "--data",
            dir.path().to_str().unwrap(),
            "--tickers",
            "META NOPE",
        ]);
        assert!(exit_code_eq(cli::run(parsed), ExitCode::from(3)));
    }

    #[test]
    fn optimize_single_ticker_exits_with_config_code() {
        let parsed = Cli::parse_from(["sharpeopt", "optimize", "--data", ".", "--tickers", "SPY"]);
        assert!(exit_code_eq(cli::run(parsed), ExitCode::from(2)));
    }

    #[test]
    fn negative_risk_free_pct_parses() {
        let parsed = Cli::parse_from(["sharpeopt", "optimize", "--risk-free-pct", "-0.5"]);
        match parsed.command {
            cli::Command::Optimize(args) => assert_eq!(args.risk_free_pct, Some(-0.5)),
            _ => panic!("expected optimize"),
        }
    }
}
