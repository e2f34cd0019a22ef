use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::LogError;
use crate::session::SessionRecord;

/// Append-only history of finished sessions.
pub trait LogRepository: Send {
    fn append(&mut self, record: &SessionRecord) -> Result<(), LogError>;

    /// Every stored row, oldest first.
    fn load_all(&self) -> Result<Vec<SessionRecord>, LogError>;

    fn filter_by_day(&self, day: NaiveDate) -> Result<Vec<SessionRecord>, LogError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|r| r.timestamp.date() == day)
            .collect())
    }

    /// Where the rows live, if anywhere on disk.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// CSV file with a header row. Rows are appended; the file is never rewritten.
#[derive(Debug, Clone)]
pub struct CsvLogRepository {
    path: PathBuf,
}

impl CsvLogRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn io_err(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_err(&self, source: csv::Error) -> LogError {
        LogError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

impl LogRepository for CsvLogRepository {
    fn append(&mut self, record: &SessionRecord) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        // A new or empty file needs the header row first.
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record).map_err(|e| self.csv_err(e))?;
        writer.flush().map_err(|e| self.io_err(e))?;

        tracing::debug!(path = %self.path.display(), "session row appended");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SessionRecord>, LogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_err(e))?;
        let mut rows = Vec::new();
        for row in reader.deserialize::<SessionRecord>() {
            rows.push(row.map_err(|e| self.csv_err(e))?);
        }
        Ok(rows)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Keeps rows in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogRepository {
    rows: Vec<SessionRecord>,
}

impl MemoryLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogRepository for MemoryLogRepository {
    fn append(&mut self, record: &SessionRecord) -> Result<(), LogError> {
        self.rows.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SessionRecord>, LogError> {
        Ok(self.rows.clone())
    }
}

/// Column order of the CSV log.
pub const COLUMNS: [&str; 21] = [
    "timestamp",
    "workMinutes",
    "restMinutes",
    "recommendedStimulus",
    "recommendReason",
    "chosenStimulus",
    "preRT",
    "postRT",
    "preErr",
    "postErr",
    "preIdea",
    "postIdea",
    "dRT",
    "dErr",
    "dIdea",
    "mwi",
    "easyPreQ1",
    "easyQ1",
    "easyQ2",
    "easyQ3",
    "easyMwi",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::RecommendReason;
    use crate::stimulus::Stimulus;
    use assert_matches::assert_matches;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn record(at: &str, mwi: Option<f64>) -> SessionRecord {
        SessionRecord {
            timestamp: ts(at),
            work_minutes: 25,
            rest_minutes: 3,
            recommended_stimulus: Some(Stimulus::BreathGuide),
            recommend_reason: Some(RecommendReason::Exploit),
            chosen_stimulus: Stimulus::BreathGuide,
            pre_rt: Some(0.5),
            post_rt: None,
            pre_err: Some(3),
            post_err: Some(1),
            pre_idea: None,
            post_idea: None,
            d_rt: mwi.map(|_| 0.0),
            d_err: mwi.map(|_| 2.0 / 3.0),
            d_idea: mwi.map(|_| 0.0),
            mwi,
            easy_pre_q1: Some(1),
            easy_q1: None,
            easy_q2: None,
            easy_q3: None,
            easy_mwi: None,
        }
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempdir().unwrap();
        let repo = CsvLogRepository::new(dir.path().join("none.csv"));
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("log.csv");
        let mut repo = CsvLogRepository::new(&path);

        repo.append(&record("2026-10-19T09:00:00", Some(0.1))).unwrap();
        repo.append(&record("2026-10-19T10:00:00", None)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join(","));
        assert!(lines[1].starts_with("2026-10-19T09:00:00,25,3,S3_BreathGuide,exploit,S3_BreathGuide,"));
        // Missing values serialize as empty fields.
        assert!(lines[2].contains(",,"));
    }

    #[test]
    fn test_rows_survive_a_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut repo = CsvLogRepository::new(&path);
        let a = record("2026-10-18T23:59:59", Some(0.25));
        let b = record("2026-10-19T00:00:01", None);
        repo.append(&a).unwrap();
        repo.append(&b).unwrap();

        let reopened = CsvLogRepository::new(&path);
        let rows = reopened.load_all().unwrap();
        assert_eq!(rows, vec![a, b.clone()]);
        assert_eq!(rows[1].mwi, None);
        assert_eq!(rows[1].post_rt, None);
    }

    #[test]
    fn test_filter_by_day() {
        let mut repo = MemoryLogRepository::new();
        repo.append(&record("2026-10-18T22:00:00", Some(0.3))).unwrap();
        repo.append(&record("2026-10-19T08:00:00", Some(0.1))).unwrap();
        repo.append(&record("2026-10-19T18:30:00", None)).unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let rows = repo.filter_by_day(day).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.timestamp.date() == day));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "timestamp,workMinutes\nyesterday,lots\n").unwrap();
        let repo = CsvLogRepository::new(&path);
        assert_matches!(repo.load_all(), Err(LogError::Csv { .. }));
    }

    #[test]
    fn test_unwritable_location_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut repo = CsvLogRepository::new(blocker.join("log.csv"));
        assert_matches!(
            repo.append(&record("2026-10-19T09:00:00", None)),
            Err(LogError::Io { .. })
        );
    }
}
