//! Document verification orchestration
//!
//! Bridges the black-box text extractor to the pure matchers in the shared
//! crate. Extraction failures never propagate: the identity path degrades
//! to an empty text (and therefore a failing verdict), the CV path to a
//! verdict carrying an error detail.

use std::path::Path;

use crate::external::TextExtractorClient;
use shared::{verify_cv_text, verify_identity, CvClaim, CvVerdict, IdentityClaim, IdentityVerdict};

/// Verification service wrapping the text extractor
#[derive(Clone)]
pub struct VerificationService {
    extractor: TextExtractorClient,
}

impl VerificationService {
    pub fn new(extractor: TextExtractorClient) -> Self {
        Self { extractor }
    }

    /// Run identity verification over an uploaded ID image.
    ///
    /// Returns the verdict together with the raw extracted text, which is
    /// stored on the provider row for audit. A failed extraction yields
    /// empty text, and an empty text yields a failing verdict.
    pub async fn verify_identity_document(
        &self,
        id_path: &Path,
        claim: &IdentityClaim,
    ) -> (IdentityVerdict, String) {
        let text = match self.extractor.extract_image_text(id_path).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("ID text extraction failed: {}", err);
                String::new()
            }
        };

        let verdict = verify_identity(claim, &text);
        tracing::debug!(
            "Identity verdict: name={} ward={} id_type={} passed={}",
            verdict.name_match,
            verdict.ward_match,
            verdict.id_type_match,
            verdict.passed
        );
        (verdict, text)
    }

    /// Run CV verification over an uploaded CV document.
    ///
    /// Text acquisition depends on the file type: native documents go
    /// through document extraction, plain text is read directly, images go
    /// through OCR. Unsupported formats and extraction failures produce
    /// degraded verdicts, never errors.
    pub async fn verify_cv_document(&self, cv_path: &Path, claim: &CvClaim) -> CvVerdict {
        let ext = cv_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let text = match ext.as_str() {
            "pdf" | "docx" => self.extractor.extract_document_text(cv_path).await,
            "txt" => tokio::fs::read_to_string(cv_path)
                .await
                .map_err(|e| crate::error::AppError::ExtractionError(e.to_string())),
            "jpg" | "jpeg" | "png" => self.extractor.extract_image_text(cv_path).await,
            _ => return CvVerdict::unsupported_format(),
        };

        match text {
            Ok(text) => verify_cv_text(claim, &text),
            Err(err) => {
                tracing::warn!("CV text extraction failed: {}", err);
                CvVerdict::extraction_error()
            }
        }
    }
}
