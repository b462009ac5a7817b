//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::csv_signal_store::CsvSignalStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{
    require_double, require_int, require_string, validate_backtest_config, validate_config,
    validate_indicator_config, validate_positions_config,
};
use crate::domain::error::FibtraderError;
use crate::domain::indicator_bar::IndicatorParams;
use crate::domain::metrics::Metrics;
use crate::domain::position::{
    MovingAverage, PositionStrategy, generate_positions, record_positions,
};
use crate::domain::position_backtest::{collect_returns, run_position_backtest};
use crate::domain::signal_table::{PositionTable, SignalTable};
use crate::domain::ticker_data::build_unified_timeline;
use crate::domain::universe::{load_price_history, load_universe, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::signal_store::{PositionStore, SignalStore};

#[derive(Parser, Debug)]
#[command(
    name = "fibtrader",
    about = "Fibonacci retracement portfolio backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Folder of <TICKER>.csv files; overrides [data] dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated tickers; overrides [data] tickers
        #[arg(long)]
        tickers: Option<String>,
        /// PnL series CSV; overrides [output] pnl_path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest a Long/Short/Neutral trend strategy from [positions]
    Positions {
        #[arg(short, long)]
        config: PathBuf,
        /// Folder of <TICKER>.csv files; overrides [data] dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated tickers; overrides [data] tickers
        #[arg(long)]
        tickers: Option<String>,
        /// PnL series CSV; overrides [output] pnl_path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers found in a data folder
    ListTickers {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            tickers,
            output,
        } => run_backtest(&config, data_dir, tickers.as_deref(), output),
        Command::Positions {
            config,
            data_dir,
            tickers,
            output,
        } => run_positions(&config, data_dir, tickers.as_deref(), output),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { data_dir } => run_list_tickers(&data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FibtraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| FibtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, FibtraderError> {
    validate_backtest_config(adapter)?;
    let get = |key: &str| require_double(adapter, "backtest", key);
    Ok(BacktestConfig {
        initial_balance: get("initial_balance")?,
        buy_full_below: get("buy_full_below")?,
        buy_half_above: get("buy_half_above")?,
        sell_full_above: get("sell_full_above")?,
        sell_half_above: get("sell_half_above")?,
        atr_volatility_threshold: get("atr_volatility_threshold")?,
        stop_loss_percent: get("stop_loss_percent")?,
        max_position_size: get("max_position_size")?,
    })
}

pub fn build_indicator_params(adapter: &dyn ConfigPort) -> Result<IndicatorParams, FibtraderError> {
    validate_indicator_config(adapter)?;
    Ok(IndicatorParams {
        swing_period: require_int(adapter, "indicators", "swing_period")? as usize,
        atr_period: require_int(adapter, "indicators", "atr_period")? as usize,
    })
}

/// The `[positions]` strategy and its starting balance.
pub fn build_position_strategy(
    adapter: &dyn ConfigPort,
) -> Result<(PositionStrategy, f64), FibtraderError> {
    validate_positions_config(adapter)?;
    let name = require_string(adapter, "positions", "strategy")?;
    let window = |key: &str| require_int(adapter, "positions", key).map(|v| v as usize);

    let average = if name.starts_with("ema_") {
        MovingAverage::Exponential
    } else {
        MovingAverage::Simple
    };
    let short_window = window("short_window")?;
    let long_window = window("long_window")?;
    let strategy = if name.ends_with("_rsi_volume") {
        PositionStrategy::Confirmed {
            average,
            short_window,
            long_window,
            rsi_window: window("rsi_window")?,
            volume_window: window("volume_window")?,
        }
    } else {
        PositionStrategy::Crossover {
            average,
            short_window,
            long_window,
        }
    };

    Ok((strategy, require_double(adapter, "positions", "initial_balance")?))
}

/// Ticker list from, in order of precedence: the CLI override, `[data]
/// tickers`, or every file the data source offers.
pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, FibtraderError> {
    let invalid = |section: &str, e: crate::domain::universe::UniverseError| {
        FibtraderError::ConfigInvalid {
            section: section.to_string(),
            key: "tickers".to_string(),
            reason: e.to_string(),
        }
    };

    let tickers = if let Some(list) = ticker_override {
        parse_tickers(list).map_err(|e| invalid("cli", e))?
    } else if let Some(list) = config.get_string("data", "tickers") {
        parse_tickers(&list).map_err(|e| invalid("data", e))?
    } else {
        data_port.list_tickers()?
    };

    if tickers.is_empty() {
        return Err(FibtraderError::NoTickers);
    }
    Ok(tickers)
}

fn optional_path(config: &dyn ConfigPort, key: &str) -> Option<PathBuf> {
    config
        .get_string("output", key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn run_backtest(
    config_path: &Path,
    data_dir_override: Option<PathBuf>,
    ticker_override: Option<&str>,
    output_override: Option<PathBuf>,
) -> Result<(), FibtraderError> {
    // Stage 1: Load and validate config
    log::info!("loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let params = build_indicator_params(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;

    // Stage 2: Resolve data source and tickers
    let data_dir = match data_dir_override {
        Some(dir) => dir,
        None => PathBuf::from(require_string(&adapter, "data", "dir")?),
    };
    let data_port = CsvAdapter::new(data_dir.clone());
    let tickers = resolve_tickers(ticker_override, &adapter, &data_port)?;
    log::info!("{} tickers from {}", tickers.len(), data_dir.display());

    // Stage 3: Run
    let pnl_path = output_override.or_else(|| optional_path(&adapter, "pnl_path"));
    let signal_store = optional_path(&adapter, "signals_path").map(CsvSignalStore::new);
    let processed_dir = optional_path(&adapter, "processed_dir");

    let mut report = TextReportAdapter::new(io::stdout().lock(), pnl_path);
    run_backtest_pipeline(
        &data_port,
        &tickers,
        &params,
        &bt_config,
        &mut report,
        signal_store.as_ref().map(|s| s as &dyn SignalStore),
        processed_dir.as_deref(),
    )?;
    Ok(())
}

/// Load, simulate and report. Returns the metrics that were reported.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    tickers: &[String],
    params: &IndicatorParams,
    bt_config: &BacktestConfig,
    report: &mut dyn ReportPort,
    signal_store: Option<&dyn SignalStore>,
    processed_dir: Option<&Path>,
) -> Result<Metrics, FibtraderError> {
    // Stage 4: Fetch bars and compute indicators
    let universe = load_universe(data_port, tickers, params)?;

    if let Some(dir) = processed_dir {
        for td in &universe.tickers {
            let path = csv_adapter::write_processed(dir, &td.ticker, &td.bars)?;
            log::debug!("wrote {}", path.display());
        }
    }

    // Stage 5: Build timeline and simulate
    let timeline = build_unified_timeline(&universe.tickers);
    if let (Some(first), Some(last)) = (timeline.first(), timeline.last()) {
        log::info!(
            "running backtest: {} tickers, {} dates, {} to {}",
            universe.count(),
            timeline.len(),
            first,
            last
        );
    }

    let mut ledger = match signal_store {
        Some(store) => store.load()?,
        None => SignalTable::new(),
    };
    let result = backtest_engine::run_backtest(&universe.tickers, &timeline, bt_config, &mut ledger)?;
    if let Some(store) = signal_store {
        store.save(&ledger)?;
    }

    // Stage 6: Metrics and report
    let metrics = Metrics::compute(&result);
    report.write_metrics(&metrics)?;
    report.write_pnl_series(&result.pnl_series())?;
    Ok(metrics)
}

fn run_positions(
    config_path: &Path,
    data_dir_override: Option<PathBuf>,
    ticker_override: Option<&str>,
    output_override: Option<PathBuf>,
) -> Result<(), FibtraderError> {
    log::info!("loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let (strategy, initial_balance) = build_position_strategy(&adapter)?;

    let data_dir = match data_dir_override {
        Some(dir) => dir,
        None => PathBuf::from(require_string(&adapter, "data", "dir")?),
    };
    let data_port = CsvAdapter::new(data_dir.clone());
    let tickers = resolve_tickers(ticker_override, &adapter, &data_port)?;
    log::info!("{} tickers from {}", tickers.len(), data_dir.display());

    let pnl_path = output_override.or_else(|| optional_path(&adapter, "pnl_path"));
    let position_store = optional_path(&adapter, "positions_path").map(CsvSignalStore::new);

    let mut report = TextReportAdapter::new(io::stdout().lock(), pnl_path);
    run_positions_pipeline(
        &data_port,
        &tickers,
        &strategy,
        initial_balance,
        &mut report,
        position_store.as_ref().map(|s| s as &dyn PositionStore),
    )?;
    Ok(())
}

/// Load prices, derive positions, backtest and report. Returns the metrics
/// that were reported.
pub fn run_positions_pipeline(
    data_port: &dyn DataPort,
    tickers: &[String],
    strategy: &PositionStrategy,
    initial_balance: f64,
    report: &mut dyn ReportPort,
    position_store: Option<&dyn PositionStore>,
) -> Result<Metrics, FibtraderError> {
    let loaded = load_price_history(data_port, tickers)?;

    let mut ledger = match position_store {
        Some(store) => store.load_positions()?,
        None => PositionTable::new(),
    };
    for history in &loaded.histories {
        let positions = generate_positions(&history.bars, strategy);
        record_positions(&mut ledger, &history.ticker, &positions);
    }

    let returns = collect_returns(
        loaded
            .histories
            .iter()
            .map(|h| (h.ticker.as_str(), h.bars.as_slice())),
    );
    log::info!(
        "running {} over {} tickers, {} dates",
        strategy,
        loaded.histories.len(),
        returns.len()
    );
    let result = run_position_backtest(&returns, &ledger, initial_balance)?;
    if let Some(store) = position_store {
        store.save_positions(&ledger)?;
    }

    let metrics = result.metrics();
    report.write_metrics(&metrics)?;
    report.write_pnl_series(&result.pnl_series())?;
    Ok(metrics)
}

fn run_validate(config_path: &Path) -> Result<(), FibtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let params = build_indicator_params(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;

    eprintln!("\nData:");
    eprintln!("  dir:     {}", require_string(&adapter, "data", "dir")?);
    match adapter.get_string("data", "tickers") {
        Some(list) => eprintln!("  tickers: {}", list),
        None => eprintln!("  tickers: (every CSV in dir)"),
    }
    eprintln!("\nIndicators:");
    eprintln!("  swing_period: {}", params.swing_period);
    eprintln!("  atr_period:   {}", params.atr_period);
    eprintln!("\nBacktest:");
    eprintln!("  initial_balance:          {:.2}", bt_config.initial_balance);
    eprintln!("  max_position_size:        {}", bt_config.max_position_size);
    eprintln!(
        "  atr_volatility_threshold: {}",
        bt_config.atr_volatility_threshold
    );
    if adapter.get_string("positions", "strategy").is_some() {
        let (strategy, initial_balance) = build_position_strategy(&adapter)?;
        eprintln!("\nPositions:");
        eprintln!("  strategy:        {}", strategy);
        eprintln!("  initial_balance: {:.2}", initial_balance);
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_tickers(data_dir: &Path) -> Result<(), FibtraderError> {
    let tickers = CsvAdapter::new(data_dir.to_path_buf()).list_tickers()?;
    if tickers.is_empty() {
        eprintln!("No tickers found in {}", data_dir.display());
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    Ok(())
}
