//! Inclusive date ranges used by settlements and reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Longest range accepted by the densified daily reports.
pub const MAX_REPORT_DAYS: i64 = 366;

/// An inclusive `[start, end]` range of calendar days (UTC).
///
/// Timestamps fall inside the period when they are within
/// `[start 00:00, end + 1 day 00:00)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if start > end {
            return Err(EngineError::InvalidPeriod(format!(
                "start {start} is after end {end}"
            )));
        }
        if end.checked_add_days(Days::new(1)).is_none() {
            return Err(EngineError::InvalidPeriod(format!("end {end} out of range")));
        }
        Ok(Self { start, end })
    }

    /// Same as [`Period::new`], additionally capping the length for reports
    /// that emit one row per day.
    pub fn for_report(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        let period = Self::new(start, end)?;
        if period.len_days() > MAX_REPORT_DAYS {
            return Err(EngineError::InvalidPeriod(format!(
                "report range must not exceed {MAX_REPORT_DAYS} days"
            )));
        }
        Ok(period)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive lower bound.
    pub fn lower_bound(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound (midnight after `end`).
    pub fn upper_bound(&self) -> DateTime<Utc> {
        self.end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.lower_bound() && at < self.upper_bound()
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every day of the period, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }

    /// Left-joins `buckets` against every day of the period, so days without
    /// activity come out as `T::default()`.
    pub fn densify<T: Default + Clone>(
        &self,
        buckets: &BTreeMap<NaiveDate, T>,
    ) -> Vec<(NaiveDate, T)> {
        self.days()
            .map(|day| (day, buckets.get(&day).cloned().unwrap_or_default()))
            .collect()
    }
}
