//! Filing domain types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ipr::steps;

/// Kinds of intellectual property a filing can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IprType {
    #[default]
    Patent,
    Trademark,
    Copyright,
    Design,
    #[serde(rename = "Trade Secret")]
    TradeSecret,
}

impl IprType {
    /// All supported types, in display order
    pub const ALL: [IprType; 5] = [
        IprType::Patent,
        IprType::Trademark,
        IprType::Copyright,
        IprType::Design,
        IprType::TradeSecret,
    ];

    /// Parse from the wire label ("Trade Secret" keeps its space)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Patent" => Some(IprType::Patent),
            "Trademark" => Some(IprType::Trademark),
            "Copyright" => Some(IprType::Copyright),
            "Design" => Some(IprType::Design),
            "Trade Secret" => Some(IprType::TradeSecret),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IprType::Patent => "Patent",
            IprType::Trademark => "Trademark",
            IprType::Copyright => "Copyright",
            IprType::Design => "Design",
            IprType::TradeSecret => "Trade Secret",
        }
    }
}

impl fmt::Display for IprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filing lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    #[default]
    Active,
    Completed,
    Rejected,
}

impl FilingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(FilingStatus::Active),
            "completed" => Some(FilingStatus::Completed),
            "rejected" => Some(FilingStatus::Rejected),
            _ => None,
        }
    }
}

/// One step in a filing's checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilingStep {
    /// 1-based step id
    pub id: u32,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// An IPR filing being tracked
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Filing {
    /// Stable filing identifier (UUID)
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Filing title
    pub title: String,

    /// Kind of IPR being filed
    #[serde(rename = "type")]
    pub ipr_type: IprType,

    /// Short description of the invention/work
    pub description: String,

    /// Date the filing was opened
    pub start_date: NaiveDate,

    /// Date of the last step update
    pub last_updated: NaiveDate,

    /// Percentage of completed steps (0..=100, half-up rounding)
    pub progress: u8,

    /// First incomplete step id; one past the last step when all complete
    pub current_step: u32,

    /// Lifecycle state
    pub status: FilingStatus,

    /// Ordered step checklist
    pub steps: Vec<FilingStep>,
}

impl Filing {
    /// Open a new filing with the step checklist for its type
    pub fn new(
        user_id: String,
        title: String,
        ipr_type: IprType,
        description: String,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title,
            ipr_type,
            description,
            start_date,
            last_updated: start_date,
            progress: 0,
            current_step: 1,
            status: FilingStatus::Active,
            steps: steps::seed_steps(ipr_type),
        }
    }

    /// Number of completed steps
    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipr_type_labels_round_trip() {
        for t in IprType::ALL {
            assert_eq!(IprType::parse(t.as_str()), Some(t));
        }
        assert_eq!(IprType::parse("Trade Secret"), Some(IprType::TradeSecret));
        assert_eq!(IprType::parse("Utility Model"), None);
    }

    #[test]
    fn test_trade_secret_serializes_with_space() {
        let json = serde_json::to_string(&IprType::TradeSecret).unwrap();
        assert_eq!(json, "\"Trade Secret\"");
    }

    #[test]
    fn test_new_patent_filing_shape() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let filing = Filing::new(
            "user-1".to_string(),
            "Graphene battery anode".to_string(),
            IprType::Patent,
            "Fast-charging anode design".to_string(),
            start,
        );

        assert_eq!(filing.steps.len(), 7);
        assert_eq!(filing.progress, 0);
        assert_eq!(filing.current_step, 1);
        assert_eq!(filing.status, FilingStatus::Active);
        assert_eq!(filing.last_updated, start);

        // Wire format keeps the original field names
        let json = serde_json::to_value(&filing).unwrap();
        assert!(json.get("startDate").is_some());
        assert!(json.get("currentStep").is_some());
        assert_eq!(json.get("type").unwrap(), "Patent");
        assert_eq!(json.get("status").unwrap(), "active");
    }

    #[test]
    fn test_non_patent_gets_generic_steps() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let filing = Filing::new(
            "user-1".to_string(),
            "Brand mark".to_string(),
            IprType::Trademark,
            String::new(),
            start,
        );
        assert_eq!(filing.steps.len(), 5);
        assert_eq!(filing.steps[0].title, "Research & Analysis");
    }
}
