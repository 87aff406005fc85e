use crate::domain::Termination;
use crate::engine::Strategy;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of one command-line run, printed with `-o`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: Strategy,
    pub input: PathBuf,
    pub n_objs: usize,
    pub n_coords: usize,
    pub workers: usize,
    pub n_clusters: usize,
    pub threshold: f32,
    pub iterations: usize,
    pub termination: Termination,
    #[serde(rename = "io_seconds", serialize_with = "as_seconds")]
    pub io_time: Duration,
    #[serde(rename = "computation_seconds", serialize_with = "as_seconds")]
    pub computation_time: Duration,
}

fn as_seconds<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**** Report: parallel k-means ****")?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f)?;
        writeln!(f, "----Data statistics----")?;
        writeln!(f, "Input file:     {}", self.input.display())?;
        writeln!(f, "n_objs       = {}", self.n_objs)?;
        writeln!(f, "n_coords     = {}", self.n_coords)?;
        writeln!(f)?;
        writeln!(f, "----Param statistics----")?;
        writeln!(f, "Number of threads = {}", self.workers)?;
        writeln!(f, "n_clusters   = {}", self.n_clusters)?;
        writeln!(f, "threshold     = {:.4}", self.threshold)?;
        writeln!(f, "iterations   = {} ({})", self.iterations, self.termination)?;
        writeln!(f)?;
        writeln!(f, "----Time statistics----")?;
        writeln!(f, "I/O time           = {:10.4} sec", self.io_time.as_secs_f64())?;
        write!(
            f,
            "Computation timing = {:10.4} sec",
            self.computation_time.as_secs_f64()
        )
    }
}
