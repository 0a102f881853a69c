//! Persisted generation history.
//!
//! A run with a log directory leaves behind:
//!
//! ```text
//! log.txt            one line per generation, `lineage:fitness,` per slot
//! params_<g>.bin     parameter snapshot taken after generation g
//! ```
//!
//! Snapshot layout (little-endian):
//!
//! ```text
//! Header (48 bytes):
//!   Magic: "GAPS" (4 bytes)
//!   Version: u16
//!   Reserved: u16
//!   NumParams: u32
//!   NumParent: u32
//!   Generation: u64
//!   NextJobId: u64
//!   Reserved: 16 bytes
//!
//! Lineage ids: NumParent * i64 (-1 for initial individuals)
//! Fitness:     NumParent * f64
//! Parameters:  NumParent * NumParams * f64, slot-major
//! ```

mod format;
mod recorder;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

pub use format::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION, Snapshot, SnapshotHeader};
pub use recorder::HistoryRecorder;

use crate::compute::Lineage;

/// Name of the per-generation fitness log.
pub const LOG_FILE: &str = "log.txt";

/// Backup name used when a run is resumed in its own directory.
pub const PREV_LOG_FILE: &str = "log_prev.txt";

/// Path of the snapshot for `generation` inside `dir`.
pub fn snapshot_path(dir: &Path, generation: u64) -> PathBuf {
    dir.join(format!("params_{}.bin", generation))
}

/// History persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed log line {line}: {reason}")]
    Format { line: usize, reason: String },
    #[error("Stored snapshot has {stored} parameters, engine expects {expected}")]
    DimensionMismatch { stored: usize, expected: usize },
    #[error("Stored snapshot has {stored} individuals, engine expects {expected}")]
    PopulationMismatch { stored: usize, expected: usize },
    #[error("No snapshot for generation {0}")]
    MissingSnapshot(u64),
    #[error("History log is empty")]
    Empty,
}

/// One `lineage:fitness` pair from the log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry {
    pub lineage: Lineage,
    pub fitness: f64,
}

/// Parsed contents of a history directory.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    dir: PathBuf,
    generations: Vec<Vec<LogEntry>>,
}

impl HistoryLog {
    /// Read `log.txt` from `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, HistoryError> {
        let dir = dir.as_ref().to_path_buf();
        let text = fs::read_to_string(dir.join(LOG_FILE))?;
        let generations = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_line(i + 1, line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { dir, generations })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Logged generations; entry `i` was written after generation `i + 1`.
    pub fn generations(&self) -> &[Vec<LogEntry>] {
        &self.generations
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Mean non-NaN fitness per generation.
    pub fn mean_fitness(&self) -> Vec<f64> {
        self.generations
            .iter()
            .map(|row| {
                let valid: Vec<f64> = row
                    .iter()
                    .map(|e| e.fitness)
                    .filter(|f| !f.is_nan())
                    .collect();
                if valid.is_empty() {
                    f64::NAN
                } else {
                    valid.iter().sum::<f64>() / valid.len() as f64
                }
            })
            .collect()
    }

    /// Best non-NaN fitness per generation.
    pub fn best_fitness(&self) -> Vec<f64> {
        self.generations
            .iter()
            .map(|row| {
                row.iter()
                    .map(|e| e.fitness)
                    .filter(|f| !f.is_nan())
                    .fold(f64::NAN, f64::max)
            })
            .collect()
    }

    /// Load the parameter snapshot written after `generation`.
    pub fn load_snapshot(&self, generation: u64) -> Result<Snapshot, HistoryError> {
        let path = snapshot_path(&self.dir, generation);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(HistoryError::MissingSnapshot(generation));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Snapshot::read_from(&mut BufReader::new(file))?)
    }

    /// Load the newest snapshot taken at or before the last logged generation.
    pub fn latest_snapshot(&self) -> Result<Snapshot, HistoryError> {
        let last = self.generations.len() as u64;
        if last == 0 {
            return Err(HistoryError::Empty);
        }
        for generation in (1..=last).rev() {
            match self.load_snapshot(generation) {
                Err(HistoryError::MissingSnapshot(_)) => continue,
                result => return result,
            }
        }
        Err(HistoryError::MissingSnapshot(last))
    }

    /// Drop generations logged after `generations`.
    pub fn truncate(&mut self, generations: usize) {
        self.generations.truncate(generations);
    }
}

fn parse_line(line_no: usize, line: &str) -> Result<Vec<LogEntry>, HistoryError> {
    let bad = |reason: String| HistoryError::Format {
        line: line_no,
        reason,
    };

    line.trim()
        .split(',')
        .filter(|field| !field.is_empty())
        .map(|field| {
            let (lineage, fitness) = field
                .split_once(':')
                .ok_or_else(|| bad(format!("missing ':' in {field:?}")))?;
            let lineage: f64 = lineage
                .trim()
                .parse()
                .map_err(|_| bad(format!("invalid lineage {lineage:?}")))?;
            let fitness: f64 = fitness
                .trim()
                .parse()
                .map_err(|_| bad(format!("invalid fitness {fitness:?}")))?;
            Ok(LogEntry {
                lineage: Lineage::from_raw(lineage as i64),
                fitness,
            })
        })
        .collect()
}
