//! Step catalogs for each IPR type
//!
//! Patents get the full seven-step Indian filing procedure; every other
//! type gets a generic five-step checklist.

use serde::Serialize;

use crate::ipr::filing::{FilingStep, IprType};

/// Catalog entry describing one step, including the guidance shown
/// alongside the checklist
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub uploads: &'static [&'static str],
    pub checkbox_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<&'static str>,
}

pub const PATENT_STEPS: [StepInfo; 7] = [
    StepInfo {
        id: 1,
        title: "Patent Search Report",
        description: "Use https://iprsearch.ipindia.gov.in/PublicSearch/ or consult a Patent Attorney (7–10 days). Warn users about rejection reasons (no novelty, living organism, discovery, etc.)",
        uploads: &["Search report (optional)"],
        checkbox_text: "I've completed the patent search",
        warning: Some("Common rejection reasons: lack of novelty, living organism patents, mere discoveries"),
        info: None,
    },
    StepInfo {
        id: 2,
        title: "Filing the Patent Application",
        description: "Submit required forms with complete application details",
        uploads: &[
            "Form 1: Applicant Details",
            "Form 2: Invention + Diagram",
            "Form 3: Statement & Undertaking",
            "Form 5: Declaration of Inventorship",
            "Form 28: For startups/small entities (80% fee benefit)",
        ],
        checkbox_text: "Filed application with Forms",
        warning: None,
        info: Some("Form 28 provides 80% fee reduction for startups and small entities"),
    },
    StepInfo {
        id: 3,
        title: "Publication of Application",
        description: "Standard publishing = 18 months, early possible with Form 9. Fee: ₹2,500 (startups), ₹12,500 (others)",
        uploads: &["Form 9 (optional for early publication)"],
        checkbox_text: "Application published or early publication requested",
        warning: None,
        info: Some("Early publication accelerates the process but makes invention public sooner"),
    },
    StepInfo {
        id: 4,
        title: "Request for Examination",
        description: "Form 18 (Normal): ₹4,000 (individual), ₹20,000 (company), valid up to 31 months. Form 18A (Expedited): ₹8,000 (startup), ₹60,000 (company), needs Form 9. Exam time: 6–12 months (fast track)",
        uploads: &["Form 18 or 18A"],
        checkbox_text: "Requested for Examination",
        warning: None,
        info: Some("Expedited examination reduces waiting time significantly"),
    },
    StepInfo {
        id: 5,
        title: "Response to Objections",
        description: "Must respond within 6 months, extension available (3 months, ₹400)",
        uploads: &["Reply draft", "Form 4 (if extension used)"],
        checkbox_text: "Responded to FER",
        warning: Some("Failure to respond within deadline results in application abandonment"),
        info: None,
    },
    StepInfo {
        id: 6,
        title: "Grant of Patent",
        description: "Once granted, patent is valid for 20 years from filing date",
        uploads: &["Grant Certificate"],
        checkbox_text: "Patent granted",
        warning: None,
        info: Some("Patent provides exclusive rights for 20 years from filing date"),
    },
    StepInfo {
        id: 7,
        title: "Renewal of Patent",
        description: "Renewal required to retain rights; expired patents enter the public domain",
        uploads: &[],
        checkbox_text: "Renewed or marked for future renewal",
        warning: None,
        info: Some("Annual renewal fees increase over time. Missing renewal results in patent expiry"),
    },
];

pub const GENERIC_STEPS: [StepInfo; 5] = [
    StepInfo {
        id: 1,
        title: "Research & Analysis",
        description: "Conduct thorough prior art search",
        uploads: &[],
        checkbox_text: "Completed research and analysis",
        warning: None,
        info: None,
    },
    StepInfo {
        id: 2,
        title: "Application Preparation",
        description: "Prepare detailed application documents",
        uploads: &[],
        checkbox_text: "Prepared application documents",
        warning: None,
        info: None,
    },
    StepInfo {
        id: 3,
        title: "Filing & Payment",
        description: "Submit application and pay required fees",
        uploads: &[],
        checkbox_text: "Filed application and paid fees",
        warning: None,
        info: None,
    },
    StepInfo {
        id: 4,
        title: "Examination",
        description: "Review by patent office and respond to queries",
        uploads: &[],
        checkbox_text: "Completed examination stage",
        warning: None,
        info: None,
    },
    StepInfo {
        id: 5,
        title: "Grant & Maintenance",
        description: "Obtain grant and maintain IP rights",
        uploads: &[],
        checkbox_text: "Granted and under maintenance",
        warning: None,
        info: None,
    },
];

/// Catalog for an IPR type
pub fn catalog(ipr_type: IprType) -> &'static [StepInfo] {
    match ipr_type {
        IprType::Patent => &PATENT_STEPS,
        _ => &GENERIC_STEPS,
    }
}

/// Build the initial (all-incomplete) checklist for a new filing
pub fn seed_steps(ipr_type: IprType) -> Vec<FilingStep> {
    catalog(ipr_type)
        .iter()
        .map(|info| FilingStep {
            id: info.id,
            title: info.title.to_string(),
            description: info.description.to_string(),
            completed: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patent_catalog_has_seven_ordered_steps() {
        assert_eq!(PATENT_STEPS.len(), 7);
        for (i, step) in PATENT_STEPS.iter().enumerate() {
            assert_eq!(step.id as usize, i + 1);
        }
        assert_eq!(PATENT_STEPS[1].uploads.len(), 5);
        assert_eq!(PATENT_STEPS[6].uploads.len(), 0);
    }

    #[test]
    fn test_generic_catalog_for_non_patents() {
        for t in [
            IprType::Trademark,
            IprType::Copyright,
            IprType::Design,
            IprType::TradeSecret,
        ] {
            assert_eq!(catalog(t).len(), 5);
        }
        assert_eq!(catalog(IprType::Patent).len(), 7);
    }

    #[test]
    fn test_seed_steps_start_incomplete() {
        let steps = seed_steps(IprType::Patent);
        assert!(steps.iter().all(|s| !s.completed));
        assert_eq!(steps[0].title, "Patent Search Report");
        assert_eq!(steps[6].title, "Renewal of Patent");
    }

    #[test]
    fn test_catalog_serializes_camel_case() {
        let json = serde_json::to_value(&PATENT_STEPS[0]).unwrap();
        assert!(json.get("checkboxText").is_some());
        assert!(json.get("warning").is_some());
        assert!(json.get("info").is_none());
    }
}
