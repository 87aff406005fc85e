use crate::engine::{DEFAULT_MAX_ITERATIONS, DEFAULT_THRESHOLD, EngineConfig, Strategy};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing input file (-i)")]
    MissingInput,
    #[error("Number of clusters must be greater than 1, got {0}")]
    InvalidClusters(usize),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

impl ConfigError {
    /// Errors answered with the usage text rather than a plain message.
    pub fn is_usage(&self) -> bool {
        matches!(self, ConfigError::MissingInput | ConfigError::InvalidClusters(_))
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines (default)
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Output format of the timing report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(name = "pkmeans", author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// File containing data to be clustered
    #[arg(short = 'i', long = "input", env = "PKMEANS_INPUT")]
    pub input: Option<PathBuf>,

    /// Number of clusters (must be greater than 1)
    #[arg(short = 'n', long = "clusters", env = "PKMEANS_CLUSTERS", default_value = "0")]
    pub n_clusters: usize,

    /// Convergence threshold on the fraction of changed assignments
    #[arg(short = 't', long, env = "PKMEANS_THRESHOLD", default_value = "0.001")]
    pub threshold: f32,

    /// Number of worker threads (default: all available)
    #[arg(short = 'p', long = "threads", env = "PKMEANS_THREADS")]
    pub threads: Option<usize>,

    /// Use the ATOMIC reduction (default LOCAL)
    #[arg(short = 'a', long)]
    pub atomic: bool,

    /// Print the timing report
    #[arg(short = 'o', long = "timing")]
    pub timing: bool,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Hard cap on the number of iterations
    #[arg(long, env = "PKMEANS_MAX_ITERATIONS", default_value = "500")]
    pub max_iterations: usize,

    /// Directory receiving cluster_centres.csv and membership.csv
    #[arg(long, env = "PKMEANS_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Log output format
    #[arg(long, env = "PKMEANS_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Timing report format
    #[arg(long, default_value = "text")]
    pub report_format: ReportFormat,

    /// Configuration file path (optional, TOML)
    #[arg(long = "config", env = "PKMEANS_CONFIG")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            n_clusters: 0,
            threshold: DEFAULT_THRESHOLD,
            threads: None,
            atomic: false,
            timing: false,
            debug: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            output_dir: PathBuf::from("."),
            log_format: LogFormat::Text,
            report_format: ReportFormat::Text,
            config_file: None,
        }
    }
}

impl Config {
    /// Parses command-line arguments, then overlays the `--config` file if any.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Config::command().get_matches_from(args);
        let mut config = Config::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
        if let Some(path) = config.config_file.clone() {
            config = config.merge(Config::from_file(path)?, &matches);
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file. The result is not validated on its own since the
    /// command line may still supply the missing pieces.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Takes each value from `file` unless the command line or the
    /// environment set it explicitly.
    pub fn merge(mut self, file: Config, matches: &ArgMatches) -> Self {
        let unset = |id: &str| !is_explicit(matches, id);

        if unset("input") {
            self.input = file.input;
        }
        if unset("n_clusters") {
            self.n_clusters = file.n_clusters;
        }
        if unset("threshold") {
            self.threshold = file.threshold;
        }
        if unset("threads") {
            self.threads = file.threads;
        }
        if unset("atomic") {
            self.atomic = file.atomic;
        }
        if unset("timing") {
            self.timing = file.timing;
        }
        if unset("debug") {
            self.debug = file.debug;
        }
        if unset("max_iterations") {
            self.max_iterations = file.max_iterations;
        }
        if unset("output_dir") {
            self.output_dir = file.output_dir;
        }
        if unset("log_format") {
            self.log_format = file.log_format;
        }
        if unset("report_format") {
            self.report_format = file.report_format;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.is_none() {
            return Err(ConfigError::MissingInput);
        }

        if self.n_clusters <= 1 {
            return Err(ConfigError::InvalidClusters(self.n_clusters));
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidConfig(format!(
                "Threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        if self.threads == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "Thread count must be greater than 0".to_string(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max iterations must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn strategy(&self) -> Strategy {
        if self.atomic {
            Strategy::Atomic
        } else {
            Strategy::Local
        }
    }

    pub fn workers(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.n_clusters)
            .with_threshold(self.threshold)
            .with_max_iterations(self.max_iterations)
            .with_strategy(self.strategy())
            .with_workers(self.workers())
    }
}

fn is_explicit(matches: &ArgMatches, id: &str) -> bool {
    matches!(
        matches.value_source(id),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn short_flags_match_the_classic_interface() {
        let config = Config::from_args([
            "pkmeans", "-i", "points.txt", "-n", "4", "-t", "0.01", "-p", "3", "-a", "-o", "-d",
        ])
        .unwrap();

        assert_eq!(config.input, Some(PathBuf::from("points.txt")));
        assert_eq!(config.n_clusters, 4);
        assert_eq!(config.threshold, 0.01);
        assert_eq!(config.threads, Some(3));
        assert!(config.atomic && config.timing && config.debug);
        assert_eq!(config.strategy(), Strategy::Atomic);
    }

    #[test]
    fn defaults_select_local_strategy_and_standard_threshold() {
        let config = Config::from_args(["pkmeans", "-i", "points.txt", "-n", "2"]).unwrap();
        assert_eq!(config.strategy(), Strategy::Local);
        assert_eq!(config.threshold, 0.001);
        assert_eq!(config.max_iterations, 500);

        let engine = config.engine_config();
        assert_eq!(engine.n_clusters, 2);
        assert_eq!(engine.workers, num_cpus::get());
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        let err = Config::from_args(["pkmeans", "-n", "3"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput));
        assert!(err.is_usage());
    }

    #[test]
    fn single_cluster_is_a_usage_error() {
        let err = Config::from_args(["pkmeans", "-i", "points.txt", "-n", "1"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidClusters(1)));
        assert!(err.is_usage());
    }

    #[test]
    fn zero_threads_is_rejected() {
        let err = Config::from_args(["pkmeans", "-i", "p.txt", "-n", "2", "-p", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
        assert!(!err.is_usage());
    }

    #[test]
    fn file_values_fill_unset_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "input = \"from-file.txt\"").unwrap();
        writeln!(file, "n_clusters = 5\nthreshold = 0.05\natomic = true").unwrap();
        writeln!(file, "log_format = \"json\"").unwrap();

        let config = Config::from_args([
            "pkmeans",
            "-n",
            "3",
            "--config",
            file.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(config.input, Some(PathBuf::from("from-file.txt")));
        // Command line wins over the file.
        assert_eq!(config.n_clusters, 3);
        assert_eq!(config.threshold, 0.05);
        assert!(config.atomic);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn explicit_flags_equal_to_defaults_beat_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold = 0.05\nmax_iterations = 20\nn_clusters = 6").unwrap();

        let config = Config::from_args([
            "pkmeans",
            "-i",
            "points.txt",
            "-n",
            "2",
            "-t",
            "0.001",
            "--max-iterations",
            "500",
            "--config",
            file.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(config.threshold, 0.001);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.n_clusters, 2);
    }

    #[test]
    fn file_can_turn_a_flag_off_when_the_command_line_is_silent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "input = \"points.txt\"\nn_clusters = 3\natomic = false").unwrap();

        let config =
            Config::from_args(["pkmeans", "--config", file.path().to_str().unwrap()]).unwrap();
        assert!(!config.atomic);
        assert_eq!(config.n_clusters, 3);

        let config = Config::from_args(["pkmeans", "-a", "--config", file.path().to_str().unwrap()])
            .unwrap();
        assert!(config.atomic);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_clusters = \"many\"").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
