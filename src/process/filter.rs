use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::process::{columns::ResolvedColumns, date_parser::parse_date_with_format};

/// Running counters for one file. `filtered_out` includes `bad_dates`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub kept: usize,
    pub filtered_out: usize,
    pub bad_dates: usize,
}

/// Retention rule: drop a row only when its status is terminal AND its order
/// date is on or before the cutoff. Everything else survives.
#[derive(Debug, Clone)]
pub struct RowFilter {
    cutoff: NaiveDateTime,
    terminal_statuses: Vec<String>,
}

impl RowFilter {
    pub fn new<S: AsRef<str>>(cutoff: NaiveDateTime, terminal_statuses: &[S]) -> Self {
        Self {
            cutoff,
            terminal_statuses: terminal_statuses
                .iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Cutoff `lookback_days` before `now`. Fails if the cutoff is not a
    /// representable date.
    pub fn with_lookback<S: AsRef<str>>(
        now: NaiveDateTime,
        lookback_days: i64,
        terminal_statuses: &[S],
    ) -> Result<Self> {
        let cutoff = Duration::try_days(lookback_days)
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| {
                anyhow!(
                    "lookback of {} days from {} is out of range",
                    lookback_days,
                    now
                )
            })?;
        Ok(Self::new(cutoff, terminal_statuses))
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    /// `status` must already be trimmed and lower-cased.
    pub fn should_keep(&self, status: &str, order_date: NaiveDateTime) -> bool {
        !self.terminal_statuses.iter().any(|t| t == status) || order_date > self.cutoff
    }

    /// Apply the rule to `rows` in order. Rows whose date can't be parsed are
    /// dropped and counted, never fatal.
    pub fn filter_rows(
        &self,
        rows: Vec<StringRecord>,
        columns: &ResolvedColumns,
    ) -> (Vec<StringRecord>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut kept = Vec::with_capacity(rows.len());

        for row in rows {
            stats.total += 1;
            let status = row
                .get(columns.status.index)
                .unwrap_or("")
                .trim()
                .to_lowercase();
            let date_raw = row.get(columns.date.index).unwrap_or("").trim();

            let order_date = match parse_date_with_format(date_raw) {
                Ok((dt, fmt)) => {
                    debug!(row = stats.total, raw = date_raw, format = fmt.pattern, parsed = %dt.date(), "parsed order date");
                    dt
                }
                Err(e) => {
                    warn!(row = stats.total, raw = ?date_raw, error = %e, "bad date, skipping row");
                    stats.filtered_out += 1;
                    stats.bad_dates += 1;
                    continue;
                }
            };

            if self.should_keep(&status, order_date) {
                kept.push(row);
            } else {
                stats.filtered_out += 1;
            }
        }

        stats.kept = kept.len();
        (kept, stats)
    }
}
