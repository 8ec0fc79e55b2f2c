// on_error.rs - what ingestion does with a document that does not fit its table.

use serde::{Deserialize, Serialize};

use crate::errors::SweepError;

/// Handling of a result document whose key set differs from the table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Stop the ingestion run at the first mismatching document.
    #[default]
    Abort,

    /// Record the document as skipped and keep ingesting the rest.
    Skip,
}

impl MismatchPolicy {
    /// Decide whether an ingestion error ends the run. Only schema mismatches
    /// can be skipped; everything else is fatal regardless of policy.
    pub fn apply(&self, error: SweepError) -> Result<SkippedDocument, SweepError> {
        match (self, &error) {
            (MismatchPolicy::Skip, SweepError::SchemaMismatch { document, .. }) => {
                let skipped = SkippedDocument {
                    document: document.clone(),
                    reason: error.to_string(),
                };
                log_skipped_document(&skipped);
                Ok(skipped)
            }
            _ => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub document: String,
    pub reason: String,
}

pub fn log_skipped_document(skipped: &SkippedDocument) {
    tracing::warn!(
        event = "sweep.ingest.document_skipped",
        document = %skipped.document,
        reason = %skipped.reason,
        action = "skipped",
        "Skipped result document: {}", skipped.document
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn mismatch() -> SweepError {
        SweepError::SchemaMismatch {
            table: "t".into(),
            document: "results_4.yaml".into(),
            expected: ["status".to_string(), "time".to_string()].into_iter().collect(),
            found: ["time".to_string()].into_iter().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn default_is_abort() {
        assert_eq!(MismatchPolicy::default(), MismatchPolicy::Abort);
    }

    #[test]
    fn abort_propagates_mismatch() {
        let err = MismatchPolicy::Abort.apply(mismatch()).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn skip_records_mismatch_only() {
        let skipped = MismatchPolicy::Skip.apply(mismatch()).unwrap();
        assert_eq!(skipped.document, "results_4.yaml");

        let err = MismatchPolicy::Skip
            .apply(SweepError::TableNotFound("t".into()))
            .unwrap_err();
        assert!(matches!(err, SweepError::TableNotFound(_)));
    }

    #[test]
    fn test_serde_names() {
        let p: MismatchPolicy = serde_yaml::from_str("skip").unwrap();
        assert_eq!(p, MismatchPolicy::Skip);
        let p: MismatchPolicy = serde_yaml::from_str("abort").unwrap();
        assert_eq!(p, MismatchPolicy::Abort);
    }
}
