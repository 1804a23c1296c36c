//! Multi-predicate log filter.

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entry::LogRecord;

/// Filter predicates; every unset field passes.
///
/// Date and time bounds compare as strings, which matches calendar order for
/// `YYYY-MM-DD` dates and zero-padded `HH:mm` times.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Earliest `date`, inclusive.
    pub date_start: Option<String>,
    /// Latest `date`, inclusive.
    pub date_end: Option<String>,
    /// Earliest `time`, inclusive.
    pub time_start: Option<String>,
    /// Latest `time`, inclusive.
    pub time_end: Option<String>,
    /// Case-insensitive substring of the author username.
    pub username: Option<String>,
    /// Smallest value field, inclusive.
    pub value_min: Option<f64>,
    /// Largest value field, inclusive.
    pub value_max: Option<f64>,
    /// Case-insensitive substring of detail, notes, id, machine and worker.
    pub keyword: Option<String>,
}

impl FilterCriteria {
    /// Returns true when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Restricts to `today` only.
    pub fn today(self, today: NaiveDate) -> Self {
        self.last_days(today, 0)
    }

    /// Restricts to the `days` days before `today` plus `today` itself.
    pub fn last_days(mut self, today: NaiveDate, days: u64) -> Self {
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        self.date_start = Some(start.format("%Y-%m-%d").to_string());
        self.date_end = Some(today.format("%Y-%m-%d").to_string());
        self
    }

    /// Returns true when `entry` satisfies every set predicate.
    pub fn matches<T: LogRecord + ?Sized>(&self, entry: &T) -> bool {
        let base = entry.base();

        if let Some(start) = non_blank(&self.date_start) {
            if base.date.as_str() < start {
                return false;
            }
        }
        if let Some(end) = non_blank(&self.date_end) {
            if base.date.as_str() > end {
                return false;
            }
        }
        if let Some(start) = non_blank(&self.time_start) {
            if base.time.as_str() < start {
                return false;
            }
        }
        if let Some(end) = non_blank(&self.time_end) {
            if base.time.as_str() > end {
                return false;
            }
        }

        if let Some(name) = non_blank(&self.username) {
            if !base.username.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }

        let value = entry.value();
        if self.value_min.is_some_and(|min| value < min) {
            return false;
        }
        if self.value_max.is_some_and(|max| value > max) {
            return false;
        }

        if let Some(keyword) = non_blank(&self.keyword) {
            if !entry.keyword_haystack().contains(&keyword.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Newest first: descending by date, then by time.
pub fn newest_first<T: LogRecord + ?Sized>(a: &T, b: &T) -> Ordering {
    let (a, b) = (a.base(), b.base());
    b.date.cmp(&a.date).then_with(|| b.time.cmp(&a.time))
}

/// Returns the entries matching `criteria`, newest first.
pub fn filter<T: LogRecord + Clone>(logs: &[T], criteria: &FilterCriteria) -> Vec<T> {
    let mut out: Vec<T> = logs.iter().filter(|e| criteria.matches(*e)).cloned().collect();
    out.sort_by(|a, b| newest_first(a, b));
    out
}

/// Borrowing variant of [`filter`].
pub fn filter_refs<'a, T: LogRecord>(logs: &'a [T], criteria: &FilterCriteria) -> Vec<&'a T> {
    let mut out: Vec<&T> = logs.iter().filter(|e| criteria.matches(*e)).collect();
    out.sort_by(|a, b| newest_first(*a, *b));
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::entry::{EntryBase, InputEntry};

    fn input(id: &str, date: &str, time: &str, weight: f64) -> InputEntry {
        InputEntry {
            base: EntryBase {
                id: id.into(),
                user_id: "u2".into(),
                username: "Operator".into(),
                timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
                date: date.into(),
                time: time.into(),
                notes: None,
            },
            input_item_id: "in1".into(),
            detail: "Coil 7".into(),
            weight,
        }
    }

    #[test]
    fn presets_fill_date_bounds() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let c = FilterCriteria::default().last_days(today, 7);
        assert_eq!(c.date_start.as_deref(), Some("2024-02-24"));
        assert_eq!(c.date_end.as_deref(), Some("2024-03-02"));

        let c = FilterCriteria::default().today(today);
        assert_eq!(c.date_start, c.date_end);
    }

    #[test]
    fn blank_strings_are_unset() {
        let c = FilterCriteria {
            username: Some(String::new()),
            keyword: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert!(c.matches(&input("a", "2024-01-01", "08:00", 1.0)));
    }

    #[test]
    fn sort_breaks_date_ties_on_time() {
        let logs = vec![
            input("a", "2024-01-01", "08:00", 1.0),
            input("b", "2024-01-01", "17:30", 1.0),
            input("c", "2023-12-31", "23:59", 1.0),
        ];
        let ids: Vec<_> = filter_refs(&logs, &FilterCriteria::default())
            .into_iter()
            .map(|e| e.base.id.as_str())
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }
}
