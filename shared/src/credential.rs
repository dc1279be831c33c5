//! CV verification matcher
//!
//! Checks the text extracted from an uploaded CV for the claims made in the
//! professional profile: holder name, declared service, skill keywords, and
//! a years-of-experience mention. Unlike identity verification this verdict
//! never gates registration — it is stored for downstream display and audit.

use serde::{Deserialize, Serialize};

/// Profile claims checked against the CV text.
#[derive(Debug, Clone)]
pub struct CvClaim {
    pub full_name: String,
    pub service: String,
    pub skills: Vec<String>,
    pub years_of_experience: i32,
}

/// Per-field result of a CV check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvVerdict {
    pub verified: bool,
    pub name_matched: bool,
    pub service_matched: bool,
    pub skills_matched: Vec<String>,
    pub experience_matched: bool,
    pub extracted_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CvVerdict {
    /// Verdict for a document format the extractor cannot handle.
    pub fn unsupported_format() -> Self {
        Self {
            error: Some("Unsupported CV format".to_string()),
            ..Self::default()
        }
    }

    /// Verdict for a document that failed to read or extract.
    pub fn extraction_error() -> Self {
        Self {
            error: Some("Error reading CV".to_string()),
            ..Self::default()
        }
    }
}

/// Match the CV text against the claims.
///
/// All checks are case-insensitive substring containment. The skills
/// criterion fails only when none of the claimed skills appear; a partial
/// skill match is acceptable and the matched subset is reported.
pub fn verify_cv_text(claim: &CvClaim, cv_text: &str) -> CvVerdict {
    let text = cv_text.to_lowercase();

    let name_matched = text.contains(&claim.full_name.to_lowercase());
    let service_matched = text.contains(&claim.service.to_lowercase());

    let skills_matched: Vec<String> = claim
        .skills
        .iter()
        .filter(|skill| text.contains(&skill.to_lowercase()))
        .cloned()
        .collect();

    let experience_matched = text.contains(&claim.years_of_experience.to_string());
    let extracted_years = experience_matched.then_some(claim.years_of_experience);

    let verified =
        name_matched && service_matched && !skills_matched.is_empty() && experience_matched;

    CvVerdict {
        verified,
        name_matched,
        service_matched,
        skills_matched,
        experience_matched,
        extracted_years,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> CvClaim {
        CvClaim {
            full_name: "Sita Sharma".to_string(),
            service: "Plumbing".to_string(),
            skills: vec!["pipe fitting".to_string(), "welding".to_string()],
            years_of_experience: 4,
        }
    }

    #[test]
    fn verifies_when_all_fields_present() {
        let text = "SITA SHARMA\nPlumbing professional with 4 years of \
                    experience in pipe fitting and welding.";
        let verdict = verify_cv_text(&claim(), text);
        assert!(verdict.verified);
        assert_eq!(verdict.skills_matched.len(), 2);
        assert_eq!(verdict.extracted_years, Some(4));
    }

    #[test]
    fn partial_skill_match_is_enough() {
        let text = "Sita Sharma, plumbing, 4 years, expert in welding";
        let verdict = verify_cv_text(&claim(), text);
        assert!(verdict.verified);
        assert_eq!(verdict.skills_matched, vec!["welding".to_string()]);
    }

    #[test]
    fn zero_skill_matches_fail() {
        let text = "Sita Sharma, plumbing, 4 years of experience";
        let verdict = verify_cv_text(&claim(), text);
        assert!(!verdict.verified);
        assert!(verdict.skills_matched.is_empty());
        // The other criteria still report their own results.
        assert!(verdict.name_matched);
        assert!(verdict.service_matched);
        assert!(verdict.experience_matched);
    }

    #[test]
    fn missing_experience_numeral_fails() {
        let text = "Sita Sharma, plumbing, many years of welding";
        let verdict = verify_cv_text(&claim(), text);
        assert!(!verdict.verified);
        assert!(!verdict.experience_matched);
        assert_eq!(verdict.extracted_years, None);
    }

    #[test]
    fn degraded_verdicts_carry_detail() {
        assert_eq!(
            CvVerdict::unsupported_format().error.as_deref(),
            Some("Unsupported CV format")
        );
        assert!(!CvVerdict::extraction_error().verified);
    }
}
