//! IPR filing tracker
//!
//! Filings progress through an ordered step checklist (seven steps for
//! patents, five generic steps for other IPR types). Step access is
//! strictly linear: a step unlocks only once the previous step is
//! complete. Progress and the current step are derived from the
//! checklist, never stored independently by callers.

pub mod fees;
pub mod filing;
pub mod steps;
pub mod store;
pub mod tracker;
pub mod wizard;

pub use fees::{excess_fee, total_fee, validate_base_fee, FeeError, SheetCounts};
pub use filing::{Filing, FilingStatus, FilingStep, IprType};
pub use steps::{catalog, seed_steps, StepInfo};
pub use store::FilingStore;
pub use tracker::{apply_step_update, can_access_step, expiry_date, TrackerError};
pub use wizard::{is_complete, section_title, validate_section, ApplicationDraft, SECTION_TITLES};
