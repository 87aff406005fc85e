pub mod config;
pub mod logging;
pub mod report;

pub use config::{Config, ConfigError, LogFormat, ReportFormat};
pub use logging::{LoggingError, init_logging};
pub use report::RunReport;

use crate::engine::KMeans;
use crate::io::{read_objects, write_results};
use anyhow::Context;
use clap::CommandFactory;
use std::process;
use std::time::Instant;
use tracing::{error, info};

pub struct App {
    config: Config,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_config(Config::from_args(args)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the objects, clusters them and writes both result files.
    pub fn run(&self) -> anyhow::Result<RunReport> {
        let config = &self.config;
        let input = config.input.clone().context("input file not configured")?;
        let engine_config = config.engine_config();

        let io_start = Instant::now();
        let objects = read_objects(&input)
            .with_context(|| format!("failed to load objects from {}", input.display()))?;
        let mut io_time = io_start.elapsed();

        let engine = KMeans::new(engine_config).context("failed to configure the k-means engine")?;

        let compute_start = Instant::now();
        let clustering = engine.fit(&objects).context("clustering failed")?;
        let computation_time = compute_start.elapsed();

        let write_start = Instant::now();
        write_results(&config.output_dir, &clustering).with_context(|| {
            format!("failed to write results to {}", config.output_dir.display())
        })?;
        io_time += write_start.elapsed();

        let engine_config = engine.config();
        Ok(RunReport {
            version: engine_config.strategy,
            input,
            n_objs: objects.nrows(),
            n_coords: objects.ncols(),
            workers: engine_config.workers,
            n_clusters: engine_config.n_clusters,
            threshold: engine_config.threshold,
            iterations: clustering.iterations,
            termination: clustering.termination,
            io_time,
            computation_time,
        })
    }

    pub fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        match self.config.report_format {
            ReportFormat::Text => println!("\n{report}"),
            ReportFormat::Json => println!("{}", report.to_json()?),
        }
        Ok(())
    }
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn exit_with_usage(err: &ConfigError) -> ! {
    let mut command = Config::command();
    eprintln!("{}", command.render_help());
    eprintln!("Error: {err}");
    process::exit(1);
}

// Main entry point for the application
pub fn main() {
    let app = match App::from_args(std::env::args_os()) {
        Ok(app) => app,
        Err(e) if e.is_usage() => exit_with_usage(&e),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(app.config().debug, app.config().log_format) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    info!("Starting pkmeans v{}", get_version());

    match app.run() {
        Ok(report) => {
            info!(
                iterations = report.iterations,
                termination = %report.termination,
                "pkmeans finished"
            );
            if app.config().timing
                && let Err(e) = app.print_report(&report)
            {
                error!("Failed to print report: {e:#}");
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Application error: {e:#}");
            process::exit(1);
        }
    }
}
