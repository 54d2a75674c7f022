//! Form-1 patent application wizard
//!
//! Sixteen sections, validated per section so the client can gate
//! navigation. Sections 9-12 only apply under their matching
//! application type. Field values stay raw form strings.

use serde::{Deserialize, Serialize};

use crate::ipr::fees::{self, FeeError};

pub const SECTION_TITLES: [&str; 16] = [
    "Reference ID",
    "Application Type",
    "Applicant Details",
    "Applicant Category",
    "Inventor Details",
    "Invention Title",
    "Patent Agent",
    "Service Address",
    "Convention Details",
    "PCT Details",
    "Divisional Details",
    "Patent Addition",
    "Declarations",
    "Attachments",
    "Fees",
    "Final Details",
];

pub const APPLICATION_TYPES: [&str; 6] = [
    "Ordinary",
    "Convention",
    "PCT-NP",
    "PPH",
    "Divisional",
    "Patent of Addition",
];

pub const APPLICANT_CATEGORIES: [&str; 5] = [
    "Natural Person",
    "Educational Institution",
    "Small Entity",
    "Startup",
    "Others",
];

pub const PAYMENT_METHODS: [&str; 3] = ["cash", "check", "draft"];

/// Invention titles are capped at a 15 word statement
pub const TITLE_WORD_LIMIT: usize = 15;

/// Working copy of a Form-1 application, one field per form input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub ref_type: String,
    pub ref_number: String,
    pub app_type: String,
    pub applicant_name: String,
    pub gender: String,
    pub nationality: String,
    pub country: String,
    pub age: String,
    pub address: String,
    pub email: String,
    pub contact: String,
    pub applicant_category: String,
    pub inventor_same: String,
    pub inventor_name: String,
    pub inventor_gender: String,
    pub inventor_nationality: String,
    pub inventor_country: String,
    pub inventor_age: String,
    pub inventor_address: String,
    pub inventor_email: String,
    pub inventor_contact: String,
    pub title: String,
    pub agent_number: String,
    pub agent_name: String,
    pub agent_mobile: String,
    pub service_name: String,
    pub service_address: String,
    pub service_phone: String,
    pub service_mobile: String,
    pub service_fax: String,
    pub service_email: String,
    pub conv_country: String,
    pub conv_app_number: String,
    pub conv_filing_date: String,
    pub conv_applicant: String,
    pub conv_title: String,
    #[serde(rename = "convIPC")]
    pub conv_ipc: String,
    pub pct_number: String,
    pub pct_date: String,
    pub div_app_number: String,
    pub div_date: String,
    pub main_app_number: String,
    pub main_date: String,
    pub spec_pages: String,
    pub claims: String,
    #[serde(rename = "abstract")]
    pub abstract_pages: String,
    pub drawings: String,
    pub total_fees: String,
    pub payment_method: String,
    pub payment_number: String,
    pub payment_date: String,
    pub payment_bank: String,
    pub submission_date: String,
    pub applicant_name_final: String,
}

/// Title of a 1-based section number
pub fn section_title(section: u32) -> Option<&'static str> {
    if section == 0 {
        return None;
    }
    SECTION_TITLES.get(section as usize - 1).copied()
}

fn require(errors: &mut Vec<String>, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(message.to_string());
    }
}

fn require_count(errors: &mut Vec<String>, value: &str, label: &str) {
    if !value.trim().is_empty() && value.trim().parse::<u32>().is_err() {
        errors.push(format!("{} must be a whole number", label));
    }
}

/// Validate one section of the draft. Sections 9-12 pass vacuously
/// unless the draft's application type selects them.
pub fn validate_section(draft: &ApplicationDraft, section: u32) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match section {
        1 => match draft.ref_type.as_str() {
            "provisional" => {}
            "complete" => require(
                &mut errors,
                &draft.ref_number,
                "Application number is required for a complete specification",
            ),
            "" => errors.push("Reference type is required".to_string()),
            other => errors.push(format!("Unknown reference type '{}'", other)),
        },
        2 => {
            if draft.app_type.trim().is_empty() {
                errors.push("Application type is required".to_string());
            } else if !APPLICATION_TYPES.contains(&draft.app_type.as_str()) {
                errors.push(format!("Unknown application type '{}'", draft.app_type));
            }
        }
        3 => {
            require(&mut errors, &draft.applicant_name, "Applicant name is required");
            require(&mut errors, &draft.gender, "Gender is required");
            require(&mut errors, &draft.nationality, "Nationality is required");
            require(&mut errors, &draft.country, "Country of residence is required");
            require(&mut errors, &draft.age, "Age is required");
            require_count(&mut errors, &draft.age, "Age");
            require(&mut errors, &draft.address, "Address is required");
            require(&mut errors, &draft.email, "Email is required");
            require(&mut errors, &draft.contact, "Contact number is required");
        }
        4 => {
            if draft.applicant_category.trim().is_empty() {
                errors.push("Applicant category is required".to_string());
            } else if !APPLICANT_CATEGORIES.contains(&draft.applicant_category.as_str()) {
                errors.push(format!(
                    "Unknown applicant category '{}'",
                    draft.applicant_category
                ));
            }
        }
        5 => match draft.inventor_same.as_str() {
            "yes" => {}
            "no" => {
                require(&mut errors, &draft.inventor_name, "Inventor name is required");
                require(&mut errors, &draft.inventor_gender, "Inventor gender is required");
                require(
                    &mut errors,
                    &draft.inventor_nationality,
                    "Inventor nationality is required",
                );
                require(&mut errors, &draft.inventor_country, "Inventor country is required");
                require(&mut errors, &draft.inventor_age, "Inventor age is required");
                require_count(&mut errors, &draft.inventor_age, "Inventor age");
                require(&mut errors, &draft.inventor_address, "Inventor address is required");
                require(&mut errors, &draft.inventor_email, "Inventor email is required");
                require(&mut errors, &draft.inventor_contact, "Inventor contact is required");
            }
            _ => errors.push("Select whether all patent owners are the inventors".to_string()),
        },
        6 => {
            require(&mut errors, &draft.title, "Invention title is required");
            if draft.title.split_whitespace().count() > TITLE_WORD_LIMIT {
                errors.push(format!("Title must be {} words or fewer", TITLE_WORD_LIMIT));
            }
        }
        7 => {
            require(&mut errors, &draft.agent_number, "Agent IN/PA number is required");
            require(&mut errors, &draft.agent_name, "Agent name is required");
            require(&mut errors, &draft.agent_mobile, "Agent mobile is required");
        }
        8 => {
            require(&mut errors, &draft.service_name, "Service name is required");
            require(&mut errors, &draft.service_address, "Service postal address is required");
            require(&mut errors, &draft.service_mobile, "Service mobile is required");
            require(&mut errors, &draft.service_email, "Service email is required");
        }
        9 => {
            if draft.app_type == "Convention" {
                require(&mut errors, &draft.conv_country, "Convention country is required");
                require(
                    &mut errors,
                    &draft.conv_app_number,
                    "Convention application number is required",
                );
                require(
                    &mut errors,
                    &draft.conv_filing_date,
                    "Convention filing date is required",
                );
                require(
                    &mut errors,
                    &draft.conv_applicant,
                    "Convention applicant name is required",
                );
                require(&mut errors, &draft.conv_title, "Convention title is required");
                require(&mut errors, &draft.conv_ipc, "IPC classification is required");
            }
        }
        10 => {
            if draft.app_type == "PCT-NP" {
                require(
                    &mut errors,
                    &draft.pct_number,
                    "International application number is required",
                );
                require(&mut errors, &draft.pct_date, "International filing date is required");
            }
        }
        11 => {
            if draft.app_type == "Divisional" {
                require(
                    &mut errors,
                    &draft.div_app_number,
                    "Original application number is required",
                );
                require(&mut errors, &draft.div_date, "Original filing date is required");
            }
        }
        12 => {
            if draft.app_type == "Patent of Addition" {
                require(
                    &mut errors,
                    &draft.main_app_number,
                    "Main application number is required",
                );
                require(&mut errors, &draft.main_date, "Main application filing date is required");
            }
        }
        // Declarations are informational only
        13 => {}
        14 => {
            require(&mut errors, &draft.spec_pages, "Specification page count is required");
            require_count(&mut errors, &draft.spec_pages, "Specification pages");
            require(&mut errors, &draft.claims, "Claim count is required");
            require_count(&mut errors, &draft.claims, "Claims");
            require_count(&mut errors, &draft.abstract_pages, "Abstract pages");
            require_count(&mut errors, &draft.drawings, "Drawings");
        }
        15 => {
            if let Err(err) = fees::validate_base_fee(&draft.total_fees) {
                errors.push(match err {
                    FeeError::NotANumber => "Base fee must be a whole number".to_string(),
                    FeeError::OutOfRange => format!(
                        "Base fee must be between ₹{} and ₹{}",
                        fees::BASE_FEE_MIN,
                        fees::BASE_FEE_MAX
                    ),
                });
            }
            if draft.payment_method.trim().is_empty() {
                errors.push("Payment method is required".to_string());
            } else if !PAYMENT_METHODS.contains(&draft.payment_method.as_str()) {
                errors.push(format!("Unknown payment method '{}'", draft.payment_method));
            } else if draft.payment_method != "cash" {
                require(&mut errors, &draft.payment_number, "Payment number is required");
                require(&mut errors, &draft.payment_date, "Payment date is required");
                require(&mut errors, &draft.payment_bank, "Bank name is required");
            }
        }
        16 => {
            require(&mut errors, &draft.submission_date, "Submission date is required");
            require(
                &mut errors,
                &draft.applicant_name_final,
                "Applicant name is required",
            );
        }
        other => errors.push(format!("Section {} does not exist", other)),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether every section of the draft validates
pub fn is_complete(draft: &ApplicationDraft) -> bool {
    (1..=SECTION_TITLES.len() as u32).all(|n| validate_section(draft, n).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_draft() -> ApplicationDraft {
        ApplicationDraft {
            ref_type: "complete".to_string(),
            ref_number: "202641001234".to_string(),
            app_type: "Ordinary".to_string(),
            applicant_name: "Asha Rao".to_string(),
            gender: "female".to_string(),
            nationality: "Indian".to_string(),
            country: "India".to_string(),
            age: "34".to_string(),
            address: "14 MG Road, Bengaluru".to_string(),
            email: "asha@example.com".to_string(),
            contact: "9876543210".to_string(),
            applicant_category: "Startup".to_string(),
            inventor_same: "yes".to_string(),
            title: "Self-cooling beverage container".to_string(),
            agent_number: "IN/PA-2291".to_string(),
            agent_name: "R. Mehta".to_string(),
            agent_mobile: "9876500000".to_string(),
            service_name: "Mehta & Associates".to_string(),
            service_address: "Fort, Mumbai".to_string(),
            service_mobile: "9876511111".to_string(),
            service_email: "office@mehta.example".to_string(),
            spec_pages: "28".to_string(),
            claims: "9".to_string(),
            abstract_pages: "1".to_string(),
            drawings: "4".to_string(),
            total_fees: "1600".to_string(),
            payment_method: "cash".to_string(),
            submission_date: "2026-04-01".to_string(),
            applicant_name_final: "Asha Rao".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_section_titles() {
        assert_eq!(SECTION_TITLES.len(), 16);
        assert_eq!(section_title(1), Some("Reference ID"));
        assert_eq!(section_title(16), Some("Final Details"));
        assert_eq!(section_title(0), None);
        assert_eq!(section_title(17), None);
    }

    #[test]
    fn test_reference_section() {
        let mut draft = ApplicationDraft::default();
        assert!(validate_section(&draft, 1).is_err());

        draft.ref_type = "provisional".to_string();
        assert!(validate_section(&draft, 1).is_ok());

        draft.ref_type = "complete".to_string();
        let errors = validate_section(&draft, 1).unwrap_err();
        assert!(errors[0].contains("Application number"));

        draft.ref_number = "2026/1234".to_string();
        assert!(validate_section(&draft, 1).is_ok());
    }

    #[test]
    fn test_application_type_membership() {
        let mut draft = ApplicationDraft::default();
        draft.app_type = "Ordinary".to_string();
        assert!(validate_section(&draft, 2).is_ok());

        draft.app_type = "Express".to_string();
        let errors = validate_section(&draft, 2).unwrap_err();
        assert!(errors[0].contains("Express"));
    }

    #[test]
    fn test_inventor_details_conditional_on_answer() {
        let mut draft = ApplicationDraft::default();
        assert!(validate_section(&draft, 5).is_err());

        draft.inventor_same = "yes".to_string();
        assert!(validate_section(&draft, 5).is_ok());

        draft.inventor_same = "no".to_string();
        let errors = validate_section(&draft, 5).unwrap_err();
        assert_eq!(errors.len(), 8);
    }

    #[test]
    fn test_title_word_limit() {
        let mut draft = ApplicationDraft::default();
        draft.title = "word ".repeat(16).trim().to_string();
        let errors = validate_section(&draft, 6).unwrap_err();
        assert!(errors[0].contains("15 words"));

        draft.title = "word ".repeat(15).trim().to_string();
        assert!(validate_section(&draft, 6).is_ok());
    }

    #[test]
    fn test_conditional_sections_skip_other_types() {
        let mut draft = ApplicationDraft::default();
        draft.app_type = "Ordinary".to_string();
        for section in 9..=12 {
            assert!(validate_section(&draft, section).is_ok(), "section {}", section);
        }

        draft.app_type = "Convention".to_string();
        let errors = validate_section(&draft, 9).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(validate_section(&draft, 10).is_ok());

        draft.app_type = "PCT-NP".to_string();
        assert!(validate_section(&draft, 9).is_ok());
        assert!(validate_section(&draft, 10).is_err());
    }

    #[test]
    fn test_fees_section() {
        let mut draft = ApplicationDraft::default();
        draft.total_fees = "1600".to_string();
        draft.payment_method = "cash".to_string();
        assert!(validate_section(&draft, 15).is_ok());

        draft.payment_method = "check".to_string();
        let errors = validate_section(&draft, 15).unwrap_err();
        assert_eq!(errors.len(), 3);

        draft.payment_number = "CHQ-1044".to_string();
        draft.payment_date = "2026-04-01".to_string();
        draft.payment_bank = "SBI".to_string();
        assert!(validate_section(&draft, 15).is_ok());

        draft.total_fees = "1000".to_string();
        assert!(validate_section(&draft, 15).is_err());
    }

    #[test]
    fn test_attachments_counts_numeric() {
        let mut draft = ApplicationDraft::default();
        draft.spec_pages = "40".to_string();
        draft.claims = "twelve".to_string();
        let errors = validate_section(&draft, 14).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Claims")));

        draft.claims = "12".to_string();
        assert!(validate_section(&draft, 14).is_ok());
    }

    #[test]
    fn test_unknown_section() {
        let draft = ApplicationDraft::default();
        let errors = validate_section(&draft, 42).unwrap_err();
        assert!(errors[0].contains("42"));
    }

    #[test]
    fn test_filled_draft_is_complete() {
        let draft = filled_draft();
        for section in 1..=16 {
            assert!(
                validate_section(&draft, section).is_ok(),
                "section {}: {:?}",
                section,
                validate_section(&draft, section)
            );
        }
        assert!(is_complete(&draft));
        assert!(!is_complete(&ApplicationDraft::default()));
    }

    #[test]
    fn test_wire_field_names() {
        let draft: ApplicationDraft = serde_json::from_str(
            r#"{"refType":"provisional","convIPC":"H04L","abstract":"2","applicantNameFinal":"A"}"#,
        )
        .unwrap();
        assert_eq!(draft.ref_type, "provisional");
        assert_eq!(draft.conv_ipc, "H04L");
        assert_eq!(draft.abstract_pages, "2");
        assert_eq!(draft.applicant_name_final, "A");
    }
}
