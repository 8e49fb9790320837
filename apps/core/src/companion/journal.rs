//! Mood journal: one label per calendar day.
//!
//! Recording the same day twice overwrites the label (last write wins)
//! while keeping the day's original position in `history()`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::sentiment::SentimentLabel;
use crate::error::AppError;

pub const EXPORT_HEADER: &str = "Date,Mood";
pub const EXPORT_FILENAME: &str = "mood_history.csv";

/// Entries needed before a dominant mood is reported.
pub const DOMINANT_MIN_ENTRIES: usize = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One exported (date, label) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoodRecord {
    pub date: NaiveDate,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalEntry {
    date: NaiveDate,
    label: SentimentLabel,
    /// Sequence number of the write that set `label`.
    written_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoodJournal {
    entries: Vec<JournalEntry>,
    writes: u64,
}

impl MoodJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.writes = 0;
    }

    /// Sets the label for `date`, overwriting any earlier label for that day.
    pub fn record(&mut self, date: NaiveDate, label: SentimentLabel) {
        self.writes += 1;
        let written_at = self.writes;

        match self.entries.iter_mut().find(|e| e.date == date) {
            Some(entry) => {
                entry.label = label;
                entry.written_at = written_at;
            }
            None => self.entries.push(JournalEntry {
                date,
                label,
                written_at,
            }),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<SentimentLabel> {
        self.entries.iter().find(|e| e.date == date).map(|e| e.label)
    }

    /// Entries in order of first-seen date.
    pub fn history(&self) -> Vec<MoodRecord> {
        self.entries
            .iter()
            .map(|e| MoodRecord {
                date: e.date,
                label: e.label,
            })
            .collect()
    }

    /// Per-label frequency, highest first; ties follow `SentimentLabel::ALL` order.
    pub fn counts(&self) -> Vec<(SentimentLabel, usize)> {
        let mut counts: Vec<(SentimentLabel, usize)> = SentimentLabel::ALL
            .into_iter()
            .map(|label| {
                let n = self.entries.iter().filter(|e| e.label == label).count();
                (label, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        // stable sort keeps ALL order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Most frequent label once the journal holds at least three days.
    /// On a tie, the label written most recently wins.
    pub fn dominant(&self) -> Option<SentimentLabel> {
        if self.entries.len() < DOMINANT_MIN_ENTRIES {
            return None;
        }

        let counts = self.counts();
        let top = counts.first()?.1;

        counts
            .iter()
            .filter(|(_, n)| *n == top)
            .map(|(label, _)| *label)
            .max_by_key(|label| self.last_written(*label))
    }

    fn last_written(&self, label: SentimentLabel) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.written_at)
            .max()
            .unwrap_or(0)
    }

    /// Rows sorted by date ascending.
    pub fn export(&self) -> Vec<MoodRecord> {
        let mut rows = self.history();
        rows.sort_by_key(|r| r.date);
        rows
    }

    /// `Date,Mood` CSV, one row per day, `\n` line endings.
    pub fn export_csv(&self) -> String {
        let mut csv = String::from(EXPORT_HEADER);
        csv.push('\n');
        for row in self.export() {
            csv.push_str(&format!("{},{}\n", row.date.format(DATE_FORMAT), row.label));
        }
        csv
    }

    /// Writes `mood_history.csv` into `dir` and returns its path.
    pub fn write_export(&self, dir: &Path) -> Result<PathBuf, AppError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(EXPORT_FILENAME);
        fs::write(&path, self.export_csv())?;
        info!("Exported {} mood entries to {:?}", self.len(), path);
        Ok(path)
    }

    /// Parses the export format back into rows.
    pub fn parse_csv(csv: &str) -> Result<Vec<MoodRecord>, AppError> {
        let mut lines = csv.lines();

        match lines.next().map(|h| h.trim_start_matches('\u{feff}').trim()) {
            Some(EXPORT_HEADER) => {}
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "Unexpected mood export header: {:?}",
                    other
                )))
            }
            None => return Err(AppError::Validation("Empty mood export".into())),
        }

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            let [date, label] = fields.as_slice() else {
                return Err(AppError::Validation(format!(
                    "Row {}: expected 2 columns, found {}",
                    i + 2,
                    fields.len()
                )));
            };
            rows.push(MoodRecord {
                date: NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)?,
                label: label.parse()?,
            });
        }

        Ok(rows)
    }

    /// Rebuilds a journal from exported rows, in row order.
    pub fn from_records(records: &[MoodRecord]) -> Self {
        let mut journal = Self::new();
        for record in records {
            journal.record(record.date, record.label);
        }
        journal
    }

    /// Text bar chart of the mood distribution; empty journal → empty string.
    ///
    /// The most frequent label gets a bar of exactly `width` cells. Any other
    /// label present gets at least one cell, unless `width` is 0, in which
    /// case every bar is empty. No bar is ever longer than `width`.
    pub fn bar_chart(&self, width: usize) -> String {
        let counts = self.counts();
        let Some(max) = counts.first().map(|(_, n)| *n) else {
            return String::new();
        };
        let label_width = counts
            .iter()
            .map(|(label, _)| label.as_str().len())
            .max()
            .unwrap_or(0);

        let mut chart = String::new();
        for (label, n) in counts {
            let bar_len = if max == 0 || width == 0 {
                0
            } else {
                let scaled = ((n * width) as f64 / max as f64).round() as usize;
                scaled.clamp(1, width)
            };
            chart.push_str(&format!(
                "{:<label_width$} {} {}\n",
                label.as_str(),
                "█".repeat(bar_len),
                n,
                label_width = label_width
            ));
        }
        chart
    }
}
