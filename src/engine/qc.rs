//! QC pass/fail rule.

use crate::{master::QcSize, types::QcStatus};

/// Judges `measured_value` against the inclusive range of `size`.
pub fn evaluate(measured_value: f64, size: &QcSize) -> QcStatus {
    if size.min_val <= measured_value && measured_value <= size.max_val {
        QcStatus::Correct
    } else {
        QcStatus::Wrong
    }
}

/// Live verdict for a value still being typed into a capture form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcVerdict {
    /// Nothing usable entered yet.
    Pending,
    /// Input parsed and was judged.
    Judged(QcStatus),
}

/// Parses a raw measurement as entered by an operator.
///
/// Blank, unparseable and non-finite text yields `None`.
pub fn parse_measurement(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Evaluates raw form input, reporting [`QcVerdict::Pending`] when it is not a number.
pub fn preview(raw: &str, size: &QcSize) -> QcVerdict {
    match parse_measurement(raw) {
        Some(v) => QcVerdict::Judged(evaluate(v, size)),
        None => QcVerdict::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(min_val: f64, max_val: f64) -> QcSize {
        QcSize {
            id: "sz1".into(),
            qc_item_id: "qc1".into(),
            name: "Small Gear (10mm)".into(),
            min_val,
            max_val,
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let s = size(9.8, 10.2);
        assert_eq!(evaluate(9.8, &s), QcStatus::Correct);
        assert_eq!(evaluate(10.2, &s), QcStatus::Correct);
        assert_eq!(evaluate(10.0, &s), QcStatus::Correct);
        assert_eq!(evaluate(9.79, &s), QcStatus::Wrong);
        assert_eq!(evaluate(10.21, &s), QcStatus::Wrong);
    }

    #[test]
    fn degenerate_range_accepts_only_its_point() {
        let s = size(55.0, 55.0);
        assert_eq!(evaluate(55.0, &s), QcStatus::Correct);
        assert_eq!(evaluate(55.5, &s), QcStatus::Wrong);
    }

    #[test]
    fn preview_is_pending_for_blank_or_garbage() {
        let s = size(9.8, 10.2);
        assert_eq!(preview("", &s), QcVerdict::Pending);
        assert_eq!(preview("abc", &s), QcVerdict::Pending);
        assert_eq!(preview("NaN", &s), QcVerdict::Pending);
        assert_eq!(preview(" 10.1 ", &s), QcVerdict::Judged(QcStatus::Correct));
        assert_eq!(preview("11", &s), QcVerdict::Judged(QcStatus::Wrong));
    }
}
