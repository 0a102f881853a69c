//! Writes the generation log and parameter snapshots.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::format::Snapshot;
use super::{HistoryError, LOG_FILE, PREV_LOG_FILE, snapshot_path};
use crate::compute::Population;

/// Appends one log line per generation and writes periodic snapshots.
///
/// Usage:
/// ```ignore
/// let recorder = HistoryRecorder::new("./log", 1)?;
/// recorder.record(engine.clock(), engine.population(), engine.next_job_id())?;
/// ```
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    dir: PathBuf,
    snapshot_interval: u64,
}

impl HistoryRecorder {
    /// Create a recorder, creating `dir` if needed.
    pub fn new<P: AsRef<Path>>(dir: P, snapshot_interval: u64) -> Result<Self, HistoryError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            snapshot_interval: snapshot_interval.max(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record the population as it stands after `generation`.
    ///
    /// Returns true if a snapshot was written.
    pub fn record(
        &self,
        generation: u64,
        population: &Population,
        next_job_id: u64,
    ) -> Result<bool, HistoryError> {
        self.append_line(population)?;

        if generation % self.snapshot_interval != 0 {
            return Ok(false);
        }
        let snapshot = Snapshot::capture(population.iter(), generation, next_job_id);
        let mut writer = BufWriter::new(File::create(snapshot_path(&self.dir, generation))?);
        snapshot.write_to(&mut writer)?;
        writer.flush()?;
        Ok(true)
    }

    fn append_line(&self, population: &Population) -> Result<(), HistoryError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(LOG_FILE))?;
        let mut writer = BufWriter::new(file);

        for ind in population.iter() {
            write!(writer, "{}:{:.6},", ind.lineage, ind.fitness)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Carry over the first `generations` lines of the log of a run being
    /// resumed from `source`.
    ///
    /// Resuming in place keeps a full copy of the old log as `log_prev.txt`.
    pub fn adopt_log<P: AsRef<Path>>(
        &self,
        source: P,
        generations: usize,
    ) -> Result<(), HistoryError> {
        let source = source.as_ref();
        let text = fs::read_to_string(source.join(LOG_FILE))?;
        if same_dir(source, &self.dir) {
            fs::write(self.dir.join(PREV_LOG_FILE), &text)?;
        }

        let mut kept = String::with_capacity(text.len());
        for line in text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(generations)
        {
            kept.push_str(line);
            kept.push('\n');
        }
        fs::write(self.dir.join(LOG_FILE), kept)?;
        Ok(())
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{EvoRng, Lineage};
    use crate::schema::Bounds;
    use tempfile::tempdir;

    fn population() -> Population {
        let bounds = Bounds::uniform(2, -1.0, 1.0).unwrap();
        let mut pop = Population::random(3, &bounds, &mut EvoRng::new(1));
        pop.replace(0, vec![0.5, 0.5], -0.5, Lineage::Job(4));
        pop.replace(1, vec![0.0, 0.25], 1.25, Lineage::Initial);
        pop
    }

    #[test]
    fn test_log_line_format() {
        let dir = tempdir().unwrap();
        let recorder = HistoryRecorder::new(dir.path(), 1).unwrap();

        recorder.record(1, &population(), 5).unwrap();
        recorder.record(2, &population(), 5).unwrap();

        let text = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "4:-0.500000,-1:1.250000,-1:NaN,");
    }

    #[test]
    fn test_snapshot_interval() {
        let dir = tempdir().unwrap();
        let recorder = HistoryRecorder::new(dir.path(), 3).unwrap();
        let pop = population();

        let written: Vec<bool> = (1..=6)
            .map(|g| recorder.record(g, &pop, 0).unwrap())
            .collect();

        assert_eq!(written, vec![false, false, true, false, false, true]);
        assert!(snapshot_path(dir.path(), 3).exists());
        assert!(!snapshot_path(dir.path(), 4).exists());
    }

    #[test]
    fn test_adopt_log_in_place_keeps_backup() {
        let dir = tempdir().unwrap();
        let recorder = HistoryRecorder::new(dir.path(), 1).unwrap();
        recorder.record(1, &population(), 0).unwrap();

        recorder.record(2, &population(), 0).unwrap();

        recorder.adopt_log(dir.path(), 1).unwrap();
        let prev = fs::read_to_string(dir.path().join(PREV_LOG_FILE)).unwrap();
        let kept = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert_eq!(prev.lines().count(), 2);
        assert_eq!(kept.lines().count(), 1);
    }

    #[test]
    fn test_adopt_log_from_other_dir() {
        let old = tempdir().unwrap();
        let new = tempdir().unwrap();
        HistoryRecorder::new(old.path(), 1)
            .unwrap()
            .record(1, &population(), 0)
            .unwrap();

        let recorder = HistoryRecorder::new(new.path(), 1).unwrap();
        recorder.adopt_log(old.path(), 1).unwrap();

        let copied = fs::read_to_string(new.path().join(LOG_FILE)).unwrap();
        let original = fs::read_to_string(old.path().join(LOG_FILE)).unwrap();
        assert_eq!(copied, original);
    }
}
