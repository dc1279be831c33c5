//! Tests for the identity verification matcher
//!
//! Covers the name token-coverage threshold, mixed-script ward matching
//! with the fuzzy fallback, and ID-type classification order.

use shared::{
    dice_coefficient, name_matches, normalize_digits, normalize_text, verify_identity,
    verify_identity_with, ward_matches, DigitPatternClassifier, IdType, IdTypeClassifier,
    IdentityClaim,
};

fn claim(full_name: &str, ward_no: &str, id_type: &str, sex: &str) -> IdentityClaim {
    IdentityClaim {
        full_name: full_name.to_string(),
        ward_no: ward_no.to_string(),
        id_type: id_type.to_string(),
        sex: sex.to_string(),
    }
}

// =============================================================================
// Name matching: ≥70% of normalized name tokens must appear in the text
// =============================================================================

mod name_matching {
    use super::*;

    #[test]
    fn zero_percent_coverage_fails() {
        assert!(!name_matches("Ram Bahadur Thapa", "entirely different words"));
    }

    #[test]
    fn sixty_nine_percent_coverage_fails() {
        // 9 of 13 tokens = 69.2%, just under the bar.
        let name = "t1 t2 t3 t4 t5 t6 t7 t8 t9 t10 t11 t12 t13";
        let text = "t1 t2 t3 t4 t5 t6 t7 t8 t9";
        assert!(!name_matches(name, text));
    }

    #[test]
    fn seventy_percent_coverage_passes() {
        // 7 of 10 tokens = exactly 70%.
        let name = "a1 b2 c3 d4 e5 f6 g7 h8 i9 j0";
        let text = "a1 b2 c3 d4 e5 f6 g7";
        assert!(name_matches(name, text));
    }

    #[test]
    fn full_coverage_passes() {
        assert!(name_matches(
            "Ram Bahadur Thapa",
            "Full Name: Ram Bahadur Thapa, Citizenship"
        ));
    }

    #[test]
    fn matching_ignores_case_spacing_and_punctuation() {
        assert!(name_matches("Ram K.C.", "RAM   k-c lives in ward 4"));
    }

    #[test]
    fn devanagari_name_matches_latin_text() {
        // "राम" transliterates to "ram".
        assert!(name_matches("राम", "citizen ram, ward 2"));
    }
}

// =============================================================================
// Ward matching: digit normalization, label stripping, fuzzy fallback
// =============================================================================

mod ward_matching {
    use super::*;

    #[test]
    fn ward_digits_embedded_in_noise() {
        assert!(ward_matches("5", "ward:5."));
    }

    #[test]
    fn devanagari_ward_digits() {
        assert!(ward_matches("5", "वडा नं ५"));
        assert!(ward_matches("१२", "Ward No. 12"));
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert!(!ward_matches("5", "no digits or similar content here"));
    }

    #[test]
    fn fuzzy_fallback_accepts_noisy_ocr() {
        // Containment fails but bigram similarity is 6/7 ≈ 0.86.
        assert!(ward_matches("1234", "12334"));
    }

    #[test]
    fn fuzzy_fallback_rejects_below_threshold() {
        assert!(!ward_matches("1234", "9876543"));
    }

    #[test]
    fn digit_normalization_maps_all_glyphs() {
        assert_eq!(normalize_digits("०१२३४५६७८९"), "0123456789");
    }

    #[test]
    fn dice_is_symmetric_enough_for_the_threshold() {
        let a = dice_coefficient("1234", "12334");
        let b = dice_coefficient("12334", "1234");
        assert!((a - b).abs() < f64::EPSILON);
    }
}

// =============================================================================
// ID-type classification: most specific digit grouping first
// =============================================================================

mod id_type_detection {
    use super::*;

    #[test]
    fn citizenship_beats_shorter_patterns() {
        // 11 digits contain a 10-digit and several 5..8-digit runs; the
        // citizenship pattern must win.
        let classifier = DigitPatternClassifier;
        assert_eq!(
            classifier.classify(&normalize_text("No. 12-34-56-78901")),
            IdType::Citizenship
        );
    }

    #[test]
    fn national_id_is_exactly_ten_digits() {
        let classifier = DigitPatternClassifier;
        assert_eq!(classifier.classify("nid1234567890"), IdType::NationalId);
    }

    #[test]
    fn passport_is_letter_plus_seven_digits() {
        let classifier = DigitPatternClassifier;
        assert_eq!(classifier.classify("passportp1234567"), IdType::Passport);
    }

    #[test]
    fn license_is_five_to_eight_digits() {
        let classifier = DigitPatternClassifier;
        assert_eq!(classifier.classify("dl 12345"), IdType::License);
        assert_eq!(classifier.classify("dl 12345678"), IdType::License);
    }

    #[test]
    fn no_digit_run_is_unknown() {
        let classifier = DigitPatternClassifier;
        assert_eq!(classifier.classify("no usable numbers"), IdType::Unknown);
    }

    #[test]
    fn custom_classifier_is_pluggable() {
        struct AlwaysPassport;
        impl IdTypeClassifier for AlwaysPassport {
            fn classify(&self, _text: &str) -> IdType {
                IdType::Passport
            }
        }

        let verdict = verify_identity_with(
            &claim("Sita Sharma", "5", "Passport", "Female"),
            "Full Name: Sita Sharma\nWard 5",
            &AlwaysPassport,
        );
        assert!(verdict.id_type_match);
        assert!(verdict.passed);
    }
}

// =============================================================================
// Full verdicts
// =============================================================================

mod verdicts {
    use super::*;

    const GOOD_TEXT: &str =
        "Full Name: Sita Sharma\nSex: Female\nWard: 5\nCitizenship No 12-34-56-78901";

    #[test]
    fn all_checks_pass() {
        let verdict = verify_identity(&claim("Sita Sharma", "5", "Citizenship", "Female"), GOOD_TEXT);
        assert!(verdict.name_match);
        assert!(verdict.ward_match);
        assert!(verdict.id_type_match);
        assert!(verdict.sex_match);
        assert!(verdict.passed);
        assert_eq!(verdict.detected_id_type, IdType::Citizenship);
        assert_eq!(verdict.extracted_name.as_deref(), Some("Sita Sharma"));
    }

    #[test]
    fn claimed_type_mismatch_fails_with_detail() {
        let verdict = verify_identity(&claim("Sita Sharma", "5", "License", "Female"), GOOD_TEXT);
        assert!(verdict.name_match);
        assert!(verdict.ward_match);
        assert!(!verdict.id_type_match);
        assert!(!verdict.passed);
    }

    #[test]
    fn sex_mismatch_is_advisory_only() {
        let verdict = verify_identity(&claim("Sita Sharma", "5", "Citizenship", "Male"), GOOD_TEXT);
        assert!(!verdict.sex_match);
        assert!(verdict.passed);
    }

    #[test]
    fn empty_extraction_fails_everything() {
        // The degraded path after an extraction failure: empty text.
        let verdict = verify_identity(&claim("Sita Sharma", "5", "Citizenship", "Female"), "");
        assert!(!verdict.name_match);
        assert!(!verdict.ward_match);
        assert!(!verdict.passed);
    }

    #[test]
    fn snippet_is_capped_for_manual_review() {
        let long_text = "x".repeat(1000);
        let verdict = verify_identity(&claim("A B", "1", "Citizenship", "Male"), &long_text);
        assert_eq!(verdict.text_snippet.chars().count(), 300);
    }
}
