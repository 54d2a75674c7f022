//! Step-progress rules
//!
//! Steps unlock strictly in order: step 1 is always open, step N opens
//! once step N-1 is complete. `progress` and `current_step` are derived
//! here after every update so they can never drift from the checklist.

use chrono::{Months, NaiveDate};
use thiserror::Error;

use crate::ipr::filing::Filing;

/// Patents run 20 years from the filing date
const PATENT_TERM_MONTHS: u32 = 20 * 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("step {0} does not exist on this filing")]
    UnknownStep(u32),

    #[error("step {0} is locked until the previous step is completed")]
    StepLocked(u32),
}

/// Whether a step may be worked on yet
pub fn can_access_step(filing: &Filing, step_id: u32) -> bool {
    if step_id == 1 {
        return true;
    }
    filing
        .steps
        .iter()
        .find(|s| s.id == step_id - 1)
        .map(|s| s.completed)
        .unwrap_or(false)
}

/// Set a step's completed flag and re-derive `progress`,
/// `current_step` and `last_updated`.
///
/// Rejects ids not on the checklist and steps whose predecessor is
/// still incomplete.
pub fn apply_step_update(
    filing: &mut Filing,
    step_id: u32,
    completed: bool,
    today: NaiveDate,
) -> Result<(), TrackerError> {
    if !filing.steps.iter().any(|s| s.id == step_id) {
        return Err(TrackerError::UnknownStep(step_id));
    }
    if !can_access_step(filing, step_id) {
        return Err(TrackerError::StepLocked(step_id));
    }

    for step in filing.steps.iter_mut() {
        if step.id == step_id {
            step.completed = completed;
        }
    }

    let total = filing.steps.len();
    let done = filing.completed_steps();
    filing.progress = if total == 0 {
        0
    } else {
        (100.0 * done as f64 / total as f64).round() as u8
    };
    filing.current_step = filing
        .steps
        .iter()
        .find(|s| !s.completed)
        .map(|s| s.id)
        .unwrap_or_else(|| filing.steps.last().map(|s| s.id + 1).unwrap_or(1));
    filing.last_updated = today;

    Ok(())
}

/// Expiry date for a granted patent: 20 years from the start date
pub fn expiry_date(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(PATENT_TERM_MONTHS))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipr::filing::IprType;

    fn patent_filing() -> Filing {
        Filing::new(
            "user-1".to_string(),
            "Test patent".to_string(),
            IprType::Patent,
            String::new(),
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn test_first_step_always_accessible() {
        let filing = patent_filing();
        assert!(can_access_step(&filing, 1));
        assert!(!can_access_step(&filing, 2));
        assert!(!can_access_step(&filing, 7));
    }

    #[test]
    fn test_steps_unlock_in_order() {
        let mut filing = patent_filing();
        apply_step_update(&mut filing, 1, true, today()).unwrap();
        assert!(can_access_step(&filing, 2));
        assert!(!can_access_step(&filing, 3));

        apply_step_update(&mut filing, 2, true, today()).unwrap();
        assert!(can_access_step(&filing, 3));
    }

    #[test]
    fn test_locked_step_rejected() {
        let mut filing = patent_filing();
        let err = apply_step_update(&mut filing, 3, true, today()).unwrap_err();
        assert_eq!(err, TrackerError::StepLocked(3));
        assert_eq!(filing.progress, 0);
        assert_eq!(filing.current_step, 1);
    }

    #[test]
    fn test_unknown_step_rejected() {
        let mut filing = patent_filing();
        let err = apply_step_update(&mut filing, 99, true, today()).unwrap_err();
        assert_eq!(err, TrackerError::UnknownStep(99));
    }

    #[test]
    fn test_progress_rounds_half_up() {
        // (completed, total) -> expected percentage
        let cases = [
            (1usize, 7usize, 14u8),
            (2, 7, 29),
            (5, 7, 71),
            (1, 3, 33),
            (2, 3, 67),
            (1, 6, 17),
            (3, 6, 50),
        ];
        for (done, total, expected) in cases {
            let got = (100.0 * done as f64 / total as f64).round() as u8;
            assert_eq!(got, expected, "{}/{}", done, total);
        }

        let mut filing = patent_filing();
        apply_step_update(&mut filing, 1, true, today()).unwrap();
        assert_eq!(filing.progress, 14);
        apply_step_update(&mut filing, 2, true, today()).unwrap();
        assert_eq!(filing.progress, 29);
    }

    #[test]
    fn test_all_complete_yields_100_and_past_end() {
        let mut filing = patent_filing();
        for id in 1..=7 {
            apply_step_update(&mut filing, id, true, today()).unwrap();
        }
        assert_eq!(filing.progress, 100);
        assert_eq!(filing.current_step, 8);
    }

    #[test]
    fn test_current_step_is_first_incomplete() {
        let mut filing = patent_filing();
        apply_step_update(&mut filing, 1, true, today()).unwrap();
        apply_step_update(&mut filing, 2, true, today()).unwrap();
        assert_eq!(filing.current_step, 3);

        // Unchecking an earlier step pulls current_step back
        apply_step_update(&mut filing, 1, false, today()).unwrap();
        assert_eq!(filing.current_step, 1);
        assert_eq!(filing.progress, 14);
    }

    #[test]
    fn test_update_stamps_last_updated() {
        let mut filing = patent_filing();
        let day = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        apply_step_update(&mut filing, 1, true, day).unwrap();
        assert_eq!(filing.last_updated, day);
    }

    #[test]
    fn test_expiry_is_twenty_years_out() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert_eq!(
            expiry_date(start),
            NaiveDate::from_ymd_opt(2046, 1, 10).unwrap()
        );

        // Leap day clamps to Feb 28 when the target year is not a leap year
        let leap = NaiveDate::from_ymd_opt(2080, 2, 29).unwrap();
        assert_eq!(
            expiry_date(leap),
            NaiveDate::from_ymd_opt(2100, 2, 28).unwrap()
        );
    }
}
