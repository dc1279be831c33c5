//! Tests for the CV verification matcher

use shared::{verify_cv_text, CvClaim, CvVerdict};

fn plumber_claim() -> CvClaim {
    CvClaim {
        full_name: "Hari Prasad Koirala".to_string(),
        service: "Plumbing".to_string(),
        skills: vec![
            "pipe fitting".to_string(),
            "leak repair".to_string(),
            "welding".to_string(),
        ],
        years_of_experience: 6,
    }
}

#[test]
fn full_cv_verifies() {
    let text = "HARI PRASAD KOIRALA\n\
                Plumbing specialist, 6 years of experience.\n\
                Skills: pipe fitting, leak repair, welding.";
    let verdict = verify_cv_text(&plumber_claim(), text);
    assert!(verdict.verified);
    assert!(verdict.name_matched);
    assert!(verdict.service_matched);
    assert_eq!(verdict.skills_matched.len(), 3);
    assert!(verdict.experience_matched);
    assert_eq!(verdict.extracted_years, Some(6));
    assert!(verdict.error.is_none());
}

#[test]
fn comparisons_are_case_insensitive() {
    let text = "hari prasad koirala — PLUMBING — 6 yrs — WELDING";
    let verdict = verify_cv_text(&plumber_claim(), text);
    assert!(verdict.verified);
}

#[test]
fn one_matching_skill_is_sufficient() {
    let text = "Hari Prasad Koirala, plumbing, 6 years, good at welding";
    let verdict = verify_cv_text(&plumber_claim(), text);
    assert!(verdict.verified);
    assert_eq!(verdict.skills_matched, vec!["welding".to_string()]);
}

#[test]
fn zero_matching_skills_fail_overall() {
    let text = "Hari Prasad Koirala, plumbing, 6 years of general work";
    let verdict = verify_cv_text(&plumber_claim(), text);
    assert!(!verdict.verified);
    assert!(verdict.skills_matched.is_empty());
}

#[test]
fn missing_name_fails_but_reports_other_fields() {
    let text = "Anonymous CV, plumbing, 6 years, welding and pipe fitting";
    let verdict = verify_cv_text(&plumber_claim(), text);
    assert!(!verdict.verified);
    assert!(!verdict.name_matched);
    assert!(verdict.service_matched);
    assert!(verdict.experience_matched);
}

#[test]
fn experience_must_appear_as_literal_numeral() {
    let text = "Hari Prasad Koirala, plumbing, six years, welding";
    let verdict = verify_cv_text(&plumber_claim(), text);
    assert!(!verdict.experience_matched);
    assert_eq!(verdict.extracted_years, None);
    assert!(!verdict.verified);
}

#[test]
fn unsupported_format_verdict_never_verifies() {
    let verdict = CvVerdict::unsupported_format();
    assert!(!verdict.verified);
    assert_eq!(verdict.error.as_deref(), Some("Unsupported CV format"));
}

#[test]
fn extraction_error_verdict_never_verifies() {
    let verdict = CvVerdict::extraction_error();
    assert!(!verdict.verified);
    assert_eq!(verdict.error.as_deref(), Some("Error reading CV"));
}
