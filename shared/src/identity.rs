//! Identity document verification matcher
//!
//! Compares the text extracted from an uploaded ID document against the
//! profile claims submitted at registration (full name, ward number, ID
//! type). All comparisons run over a normalized Latin baseline so the same
//! matcher works for Devanagari and English documents alike.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum fraction of name tokens that must appear in the extracted text.
pub const NAME_MATCH_THRESHOLD: f64 = 0.70;

/// Minimum bigram similarity accepted by the fuzzy ward fallback.
pub const WARD_SIMILARITY_THRESHOLD: f64 = 0.70;

/// Number of characters of raw extracted text kept for manual review.
const SNIPPET_LEN: usize = 300;

/// Profile claims checked against the ID document.
#[derive(Debug, Clone)]
pub struct IdentityClaim {
    pub full_name: String,
    pub ward_no: String,
    pub id_type: String,
    pub sex: String,
}

/// Structured verdict produced by [`verify_identity`].
///
/// Registration is gated on `passed`; the per-criterion booleans and the
/// text snippet are returned to the caller for manual review when it fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityVerdict {
    pub name_match: bool,
    pub ward_match: bool,
    pub id_type_match: bool,
    /// Advisory only, never part of `passed`.
    pub sex_match: bool,
    pub detected_id_type: IdType,
    pub extracted_name: Option<String>,
    pub text_snippet: String,
    pub passed: bool,
}

/// Document types the classifier can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdType {
    Citizenship,
    License,
    #[serde(rename = "National ID")]
    NationalId,
    Passport,
    Unknown,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Citizenship => "Citizenship",
            IdType::License => "License",
            IdType::NationalId => "National ID",
            IdType::Passport => "Passport",
            IdType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "citizenship" => Ok(IdType::Citizenship),
            "license" => Ok(IdType::License),
            "nationalid" => Ok(IdType::NationalId),
            "passport" => Ok(IdType::Passport),
            _ => Err("unrecognized ID type"),
        }
    }
}

/// Classifies the type of an ID document from its normalized text.
///
/// Kept behind a trait so the fragile pattern set can be tuned or replaced
/// without touching the matcher or its callers.
pub trait IdTypeClassifier {
    fn classify(&self, normalized_text: &str) -> IdType;
}

/// Default classifier based on digit-run grouping.
///
/// Patterns are checked most specific first: an 11-digit citizenship run
/// also contains 10- and 5..8-digit runs, so the broader patterns must
/// only apply when the narrower ones did not.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitPatternClassifier;

impl IdTypeClassifier for DigitPatternClassifier {
    fn classify(&self, normalized_text: &str) -> IdType {
        let runs = digit_runs(normalized_text);
        if runs.iter().any(|len| *len >= 11) {
            return IdType::Citizenship;
        }
        if runs.iter().any(|len| *len == 10) {
            return IdType::NationalId;
        }
        if has_passport_pattern(normalized_text) {
            return IdType::Passport;
        }
        if runs.iter().any(|len| (5..=8).contains(len)) {
            return IdType::License;
        }
        IdType::Unknown
    }
}

/// Verify identity claims against extracted document text using the
/// default ID-type classifier.
pub fn verify_identity(claim: &IdentityClaim, extracted_text: &str) -> IdentityVerdict {
    verify_identity_with(claim, extracted_text, &DigitPatternClassifier)
}

/// Verify identity claims with a caller-supplied classifier.
pub fn verify_identity_with(
    claim: &IdentityClaim,
    extracted_text: &str,
    classifier: &dyn IdTypeClassifier,
) -> IdentityVerdict {
    let name_match = name_matches(&claim.full_name, extracted_text);
    let ward_match = ward_matches(&claim.ward_no, extracted_text);

    let detected_id_type = classifier.classify(&normalize_text(extracted_text));
    let id_type_match = detected_id_type
        .as_str()
        .eq_ignore_ascii_case(claim.id_type.trim());

    let sex_match = extract_sex(extracted_text)
        .map(|sex| sex.eq_ignore_ascii_case(claim.sex.trim()))
        .unwrap_or(false);

    IdentityVerdict {
        name_match,
        ward_match,
        id_type_match,
        sex_match,
        detected_id_type,
        extracted_name: extract_labeled_name(extracted_text),
        text_snippet: extracted_text.chars().take(SNIPPET_LEN).collect(),
        passed: name_match && ward_match && id_type_match,
    }
}

/// Token-coverage name check: at least [`NAME_MATCH_THRESHOLD`] of the
/// normalized name tokens must appear as substrings of the normalized text.
pub fn name_matches(full_name: &str, extracted_text: &str) -> bool {
    let haystack = normalize_text(extracted_text);
    let tokens: Vec<String> = full_name
        .split_whitespace()
        .map(normalize_text)
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        return false;
    }

    let matched = tokens
        .iter()
        .filter(|token| haystack.contains(token.as_str()))
        .count();
    matched as f64 / tokens.len() as f64 >= NAME_MATCH_THRESHOLD
}

/// Ward-number check tolerant of mixed-script digits and OCR noise.
///
/// Digits are mapped to ASCII, the literal ward label is stripped in either
/// language, and direct containment is tried before the bigram-similarity
/// fallback.
pub fn ward_matches(ward_no: &str, extracted_text: &str) -> bool {
    let stripped = extracted_text
        .to_lowercase()
        .replace("ward", "")
        .replace("वडा", "");
    let haystack = normalize_text(&normalize_digits(&stripped));
    let needle = normalize_text(&normalize_digits(ward_no));
    if needle.is_empty() {
        return false;
    }
    if haystack.contains(&needle) {
        return true;
    }
    dice_coefficient(&needle, &haystack) >= WARD_SIMILARITY_THRESHOLD
}

/// Transliterate Devanagari to a Latin baseline, drop
/// whitespace/punctuation, and lowercase.
pub fn normalize_text(text: &str) -> String {
    // Conjuncts span multiple code points and must be mapped before the
    // per-character pass.
    let text = text
        .replace("क्ष", "ksh")
        .replace("त्र", "tr")
        .replace("ज्ञ", "gy");

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some(latin) = devanagari_to_latin(c) {
            out.push_str(latin);
        } else if c.is_whitespace() || matches!(c, '.' | '-' | '_' | ',') {
            continue;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn devanagari_to_latin(c: char) -> Option<&'static str> {
    let latin = match c {
        'अ' => "a",
        'आ' => "aa",
        'इ' => "i",
        'ई' => "ii",
        'उ' => "u",
        'ऊ' => "uu",
        'ए' => "e",
        'ऐ' => "ai",
        'ओ' => "o",
        'औ' => "au",
        'ऋ' => "ri",
        'ॠ' => "rri",
        'ऌ' => "li",
        'ॡ' => "lli",
        'ा' => "a",
        'ि' => "i",
        'ी' => "ii",
        'ु' => "u",
        'ू' => "uu",
        'े' => "e",
        'ै' => "ai",
        'ो' => "o",
        'ौ' => "au",
        'ृ' => "ri",
        'ॄ' => "rri",
        'ॢ' => "li",
        'ॣ' => "lli",
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "ng",
        'च' => "ch",
        'छ' => "chh",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "ny",
        'ट' => "t",
        'ठ' => "th",
        'ड' => "d",
        'ढ' => "dh",
        'ण' => "n",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' => "r",
        'ल' => "l",
        'व' => "w",
        'श' => "sh",
        'ष' => "sh",
        'स' => "s",
        'ह' => "h",
        'ं' => "n",
        'ः' => "h",
        'ँ' => "n",
        '्' => "",
        '०' => "0",
        '१' => "1",
        '२' => "2",
        '३' => "3",
        '४' => "4",
        '५' => "5",
        '६' => "6",
        '७' => "7",
        '८' => "8",
        '९' => "9",
        _ => return None,
    };
    Some(latin)
}

/// Map Devanagari digit glyphs to ASCII 0-9, leaving everything else as is.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '०' => '0',
            '१' => '1',
            '२' => '2',
            '३' => '3',
            '४' => '4',
            '५' => '5',
            '६' => '6',
            '७' => '7',
            '८' => '8',
            '९' => '9',
            other => other,
        })
        .collect()
}

/// Dice coefficient over character bigrams, in [0, 1].
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len() < 2 || b_chars.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a_chars.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in b_chars.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (a_chars.len() - 1 + b_chars.len() - 1) as f64
}

/// Pull the holder name out of a labeled line ("Full Name: ..." or
/// "नाम थर: ..."). Returns `None` when no label is present.
pub fn extract_labeled_name(text: &str) -> Option<String> {
    extract_after_label(text, &["नाम थर", "full name"])
}

/// Pull the holder sex out of a labeled line; advisory input for the
/// non-gating sex check.
pub fn extract_sex(text: &str) -> Option<String> {
    let rest = extract_after_label(text, &["लिङ्ग", "sex"])?;
    let lower = rest.to_lowercase();
    // "female" contains "male", so it must be checked first.
    if lower.contains("female") {
        Some("Female".to_string())
    } else if lower.contains("male") {
        Some("Male".to_string())
    } else if lower.contains("other") {
        Some("Other".to_string())
    } else {
        None
    }
}

fn extract_after_label(text: &str, labels: &[&str]) -> Option<String> {
    for line in text.lines() {
        let lower = line.to_lowercase();
        let Some(pos) = labels.iter().find_map(|label| lower.find(label)) else {
            continue;
        };
        let Some(after_label) = line.get(pos..) else {
            continue;
        };
        let Some(sep) = after_label.find(|c| c == ':' || c == '.') else {
            continue;
        };
        let value = after_label[sep + 1..].trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Lengths of maximal ASCII digit runs in the text.
fn digit_runs(text: &str) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0usize;
    for c in text.chars() {
        if c.is_ascii_digit() {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

/// One letter immediately followed by exactly seven digits.
fn has_passport_pattern(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if !c.is_ascii_alphabetic() {
            continue;
        }
        let digits = chars[i + 1..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits == 7 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(full_name: &str, ward_no: &str, id_type: &str) -> IdentityClaim {
        IdentityClaim {
            full_name: full_name.to_string(),
            ward_no: ward_no.to_string(),
            id_type: id_type.to_string(),
            sex: "Male".to_string(),
        }
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_text("Ram  Bahadur-K.C."), "rambahadurkc");
    }

    #[test]
    fn normalize_transliterates_devanagari() {
        assert_eq!(normalize_text("राम"), "ram");
        assert_eq!(normalize_text("१२३"), "123");
    }

    #[test]
    fn name_matches_all_tokens() {
        assert!(name_matches(
            "Ram Bahadur Thapa",
            "Full Name: Ram Bahadur Thapa, Ward 5"
        ));
    }

    #[test]
    fn name_fails_below_threshold() {
        // 1 of 3 tokens present = 33%, below the 70% bar.
        assert!(!name_matches("Ram Bahadur Thapa", "only ram appears here"));
    }

    #[test]
    fn name_passes_at_threshold() {
        // 7 of 10 tokens = exactly 70%.
        let name = "a1 b2 c3 d4 e5 f6 g7 h8 i9 j0";
        let text = "a1 b2 c3 d4 e5 f6 g7";
        assert!(name_matches(name, text));
        // 6 of 10 = 60%, below.
        let text = "a1 b2 c3 d4 e5 f6";
        assert!(!name_matches(name, text));
    }

    #[test]
    fn ward_matches_embedded_digits() {
        assert!(ward_matches("5", "ward:5."));
        assert!(ward_matches("5", "वडा ५"));
    }

    #[test]
    fn ward_rejects_unrelated_text() {
        assert!(!ward_matches("5", "completely unrelated text with no digits"));
    }

    #[test]
    fn ward_fuzzy_fallback() {
        // "12334" does not contain "1234", but the bigram overlap scores
        // 6/7 and clears the 0.70 threshold.
        assert!(!"12334".contains("1234"));
        assert!(ward_matches("1234", "12334"));
    }

    #[test]
    fn dice_coefficient_bounds() {
        assert_eq!(dice_coefficient("ward5", "ward5"), 1.0);
        assert_eq!(dice_coefficient("5", "unrelated"), 0.0);
        let score = dice_coefficient("1234", "12334");
        assert!(score >= 0.7 && score < 1.0);
    }

    #[test]
    fn classifier_orders_patterns_by_specificity() {
        let classifier = DigitPatternClassifier;
        assert_eq!(classifier.classify("12345678901"), IdType::Citizenship);
        assert_eq!(classifier.classify("id1234567890"), IdType::NationalId);
        assert_eq!(classifier.classify("p1234567"), IdType::Passport);
        assert_eq!(classifier.classify("lic123456"), IdType::License);
        assert_eq!(classifier.classify("no numbers here"), IdType::Unknown);
    }

    #[test]
    fn verdict_passes_only_when_all_gating_checks_pass() {
        let text = "Full Name: Sita Sharma\nWard: 5\nCitizenship No 12-34-56-78901";
        let verdict = verify_identity(&claim("Sita Sharma", "5", "Citizenship"), text);
        assert!(verdict.name_match);
        assert!(verdict.ward_match);
        assert!(verdict.id_type_match);
        assert!(verdict.passed);

        let verdict = verify_identity(&claim("Sita Sharma", "5", "Passport"), text);
        assert!(!verdict.id_type_match);
        assert!(!verdict.passed);
    }

    #[test]
    fn sex_mismatch_never_gates() {
        let text = "Full Name: Sita Sharma\nSex: Female\nWard: 5\nNo 12-34-56-78901";
        let verdict = verify_identity(&claim("Sita Sharma", "5", "Citizenship"), text);
        assert!(!verdict.sex_match);
        assert!(verdict.passed);
    }

    #[test]
    fn extracts_labeled_name_and_sex() {
        let text = "Full Name: Hari Prasad\nSex: Male";
        assert_eq!(extract_labeled_name(text).as_deref(), Some("Hari Prasad"));
        assert_eq!(extract_sex(text).as_deref(), Some("Male"));
    }
}
