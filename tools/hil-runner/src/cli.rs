//! # Command Line Interface
//!
//! Runs the scenario suite against the reference trading pipeline, produces and replays
//! recorded market data, and issues single pricing requests through the bridge.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dut_model::{PipelineConfig, TradingPipelineModel};
use hil_harness::{read_events, write_events, Harness, HarnessConfig, MarketDataGenerator, SessionReport};
use pricing_bridge::{global, PricingRequest};
use simulation_clock::VcdWriter;

use crate::logging::LogFormat;

/// Hardware-in-the-loop runner for the trading pipeline
#[derive(Debug, Parser)]
#[command(name = "hil-runner")]
#[command(about = "Drive the trading pipeline and pricing unit through their ports")]
pub struct Cli {
    /// Harness configuration file (TOML); HIL__* environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full scenario suite
    Run {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[arg(long)]
        burst_events: Option<u64>,
        #[arg(long)]
        latency_samples: Option<u32>,
        #[arg(long)]
        stress_events: Option<u64>,
        /// Pipeline depth of the reference device
        #[arg(long, default_value_t = 3)]
        depth: u32,
        /// Write a value-change dump of every half period
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Write synthetic market data as CSV
    Generate {
        #[arg(short = 'n', long, default_value_t = 10_000)]
        count: usize,
        #[arg(short, long, default_value = "market_data_sample.csv")]
        output: PathBuf,
        /// Seed for a reproducible sequence
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Inject a recorded CSV sequence and await each event
    Replay {
        csv: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Issue one pricing request through the bridge
    Price {
        #[arg(long)]
        mid: f64,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        inventory: i32,
        #[arg(long)]
        volatility: f64,
    },
}

/// CLI handler
pub struct CliHandler {
    config: HarnessConfig,
}

impl CliHandler {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = HarnessConfig::load(config_path).context("loading harness configuration")?;
        Ok(Self { config })
    }

    /// Handle a command. Returns whether everything it checked passed.
    pub fn handle_command(mut self, command: Commands) -> Result<bool> {
        match command {
            Commands::Run { json, burst_events, latency_samples, stress_events, depth, trace } => {
                if let Some(n) = burst_events {
                    self.config.burst_events = n;
                }
                if let Some(n) = latency_samples {
                    self.config.latency_samples = n;
                }
                if let Some(n) = stress_events {
                    self.config.stress_events = n;
                }
                self.config.validate()?;
                self.run_suite(depth, trace, json)
            }
            Commands::Generate { count, output, seed } => {
                self.generate(count, &output, seed)?;
                Ok(true)
            }
            Commands::Replay { csv, json, trace } => self.replay(&csv, trace, json),
            Commands::Price { mid, inventory, volatility } => {
                Self::price(PricingRequest { mid_price: mid, inventory, volatility })?;
                Ok(true)
            }
        }
    }

    fn harness(&self, depth: u32, trace: Option<PathBuf>) -> Result<Harness<TradingPipelineModel>> {
        let device = TradingPipelineModel::with_config(PipelineConfig { depth, ..PipelineConfig::default() });
        let mut harness = Harness::new(device, self.config.clone())?;

        if let Some(path) = trace.or_else(|| self.config.clock.trace_path.clone()) {
            let file = File::create(&path)
                .with_context(|| format!("creating trace file {}", path.display()))?;
            harness.attach_sink(Box::new(VcdWriter::new(BufWriter::new(file), "trading_pipeline")));
            tracing::info!("Writing waveform trace to {}", path.display());
        }
        Ok(harness)
    }

    fn run_suite(&self, depth: u32, trace: Option<PathBuf>, json: bool) -> Result<bool> {
        let mut harness = self.harness(depth, trace)?;
        let report = harness.run_suite()?;
        drop(harness.into_device());
        Self::print_report(&report, json)?;
        Ok(report.all_passed)
    }

    fn replay(&self, csv: &Path, trace: Option<PathBuf>, json: bool) -> Result<bool> {
        let file = File::open(csv).with_context(|| format!("opening {}", csv.display()))?;
        let events = read_events(BufReader::new(file))
            .with_context(|| format!("reading {}", csv.display()))?;
        if events.is_empty() {
            bail!("{} contains no events", csv.display());
        }
        tracing::info!(events = events.len(), "Replaying recorded market data");

        let mut harness = self.harness(PipelineConfig::default().depth, trace)?;
        harness.reset()?;
        harness.replay(&events);
        let report = harness.report();
        drop(harness.into_device());

        Self::print_report(&report, json)?;
        Ok(report.all_passed)
    }

    fn generate(&self, count: usize, output: &Path, seed: Option<u64>) -> Result<()> {
        let mut generator = MarketDataGenerator::from_symbols(&self.config.entities, seed)?;
        let events = generator.generate_burst(count);

        let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
        write_events(BufWriter::new(file), &events)?;

        tracing::info!("Saved {} market events to {}", events.len(), output.display());
        for event in events.iter().take(10) {
            println!("{event}");
        }
        Ok(())
    }

    fn price(request: PricingRequest) -> Result<()> {
        global::init().context("initializing pricing device")?;
        let outcome = global::calculate(request);
        global::cleanup();

        let result = outcome.context("pricing request failed")?;
        println!(
            "mid {:.6} inventory {} volatility {:.6} -> bid {:.6} ask {:.6} ({} ns)",
            request.mid_price, request.inventory, request.volatility, result.bid, result.ask, result.latency_nanos
        );
        Ok(())
    }

    fn print_report(report: &SessionReport, json: bool) -> Result<()> {
        if json {
            println!("{}", report.to_json()?);
        } else {
            println!("{report}");
        }
        Ok(())
    }
}
