//! Patent application fee arithmetic
//!
//! The base official fee is entered by the applicant (₹1600-₹4000
//! depending on category). Extra charges accrue at ₹10 per unit over
//! the free allowances: 30 specification pages and 10 each of claims,
//! abstract pages and drawings. Counts arrive as raw form-field
//! strings; anything non-numeric counts as zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SPEC_PAGE_ALLOWANCE: u32 = 30;
pub const CLAIM_ALLOWANCE: u32 = 10;
pub const ABSTRACT_ALLOWANCE: u32 = 10;
pub const DRAWING_ALLOWANCE: u32 = 10;

/// Rupees charged per excess page, claim or drawing
pub const EXCESS_RATE: u32 = 10;

pub const BASE_FEE_MIN: u32 = 1600;
pub const BASE_FEE_MAX: u32 = 4000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    #[error("base fee must be a whole number")]
    NotANumber,

    #[error("base fee must be between ₹{BASE_FEE_MIN} and ₹{BASE_FEE_MAX}")]
    OutOfRange,
}

/// Sheet and claim counts as entered on the application form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetCounts {
    #[serde(rename = "specPages", default)]
    pub spec_pages: String,
    #[serde(default)]
    pub claims: String,
    #[serde(rename = "abstract", default)]
    pub abstract_pages: String,
    #[serde(default)]
    pub drawings: String,
}

/// Parse a count typed into a form field; anything non-numeric counts
/// as zero
pub fn parse_count(s: &str) -> u32 {
    s.trim().parse().unwrap_or(0)
}

fn excess_units(count: &str, allowance: u32) -> u32 {
    parse_count(count).saturating_sub(allowance)
}

/// Extra charges over the free allowances
pub fn excess_fee(counts: &SheetCounts) -> u32 {
    let over = excess_units(&counts.spec_pages, SPEC_PAGE_ALLOWANCE)
        + excess_units(&counts.claims, CLAIM_ALLOWANCE)
        + excess_units(&counts.abstract_pages, ABSTRACT_ALLOWANCE)
        + excess_units(&counts.drawings, DRAWING_ALLOWANCE);
    over * EXCESS_RATE
}

/// The base fee must be a whole number inside the official band
pub fn validate_base_fee(s: &str) -> Result<u32, FeeError> {
    let amount: u32 = s.trim().parse().map_err(|_| FeeError::NotANumber)?;
    if (BASE_FEE_MIN..=BASE_FEE_MAX).contains(&amount) {
        Ok(amount)
    } else {
        Err(FeeError::OutOfRange)
    }
}

/// Base fee plus excess charges
pub fn total_fee(base: &str, counts: &SheetCounts) -> Result<u32, FeeError> {
    Ok(validate_base_fee(base)? + excess_fee(counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pages: &str, claims: &str, abstract_pages: &str, drawings: &str) -> SheetCounts {
        SheetCounts {
            spec_pages: pages.to_string(),
            claims: claims.to_string(),
            abstract_pages: abstract_pages.to_string(),
            drawings: drawings.to_string(),
        }
    }

    #[test]
    fn test_excess_fee_vector() {
        // 5 pages + 2 claims + 0 abstract + 5 drawings = 12 units
        assert_eq!(excess_fee(&counts("35", "12", "8", "15")), 120);
    }

    #[test]
    fn test_counts_at_allowance_are_free() {
        assert_eq!(excess_fee(&counts("30", "10", "10", "10")), 0);
        assert_eq!(excess_fee(&SheetCounts::default()), 0);
        assert_eq!(excess_fee(&counts("", "", "", "")), 0);
    }

    #[test]
    fn test_garbage_counts_are_zero() {
        assert_eq!(excess_fee(&counts("lots", "12", "", "-3")), 20);
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count("abc"), 0);
    }

    #[test]
    fn test_base_fee_band() {
        assert_eq!(validate_base_fee("1600"), Ok(1600));
        assert_eq!(validate_base_fee("4000"), Ok(4000));
        assert_eq!(validate_base_fee(" 2000 "), Ok(2000));
        assert_eq!(validate_base_fee("1599"), Err(FeeError::OutOfRange));
        assert_eq!(validate_base_fee("4001"), Err(FeeError::OutOfRange));
        assert_eq!(validate_base_fee(""), Err(FeeError::NotANumber));
        assert_eq!(validate_base_fee("2k"), Err(FeeError::NotANumber));
    }

    #[test]
    fn test_total_fee_adds_excess() {
        let c = counts("35", "12", "8", "15");
        assert_eq!(total_fee("1600", &c), Ok(1720));
        assert_eq!(total_fee("1500", &c), Err(FeeError::OutOfRange));
    }

    #[test]
    fn test_sheet_counts_wire_names() {
        let parsed: SheetCounts = serde_json::from_str(
            r#"{"specPages": "35", "claims": "12", "abstract": "8", "drawings": "15"}"#,
        )
        .unwrap();
        assert_eq!(parsed.spec_pages, "35");
        assert_eq!(parsed.abstract_pages, "8");
        assert_eq!(excess_fee(&parsed), 120);
    }
}
