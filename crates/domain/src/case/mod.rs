//! Case model: loading and validating declarative case documents.

mod definition;
mod parse;
mod validate;

pub use definition::{
    AccusationPoints, AnalysisPoints, CaseDefinition, CaseMetadata, CaseType, Difficulty,
    EvidenceDefinition, Importance, LocationDefinition, RequiredAnalysis, ScoringRules, Solution,
    SuspectDefinition, TimeBonusTier, ValidationRules,
};
pub use parse::parse;
pub use validate::validate;

use serde_json::Value;

use crate::error::CaseLoadError;

/// Parse and validate a case document. A case that fails either step is
/// never handed to the engine.
pub fn load(raw: &Value) -> Result<CaseDefinition, CaseLoadError> {
    let case = parse(raw)?;
    let errors = validate(&case);
    if !errors.is_empty() {
        return Err(CaseLoadError::Inconsistent(errors));
    }
    Ok(case)
}

/// [`load`] from JSON text.
pub fn load_str(text: &str) -> Result<CaseDefinition, CaseLoadError> {
    let raw: Value =
        serde_json::from_str(text).map_err(|e| CaseLoadError::Json(e.to_string()))?;
    load(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{sample_case_json, SAMPLE_CASE_JSON};

    #[test]
    fn load_accepts_sample_case() {
        let case = load_str(SAMPLE_CASE_JSON).unwrap();
        assert_eq!(case.title(), "The Midnight Gallery Heist");
    }

    #[test]
    fn load_rejects_text_that_is_not_json() {
        assert!(matches!(load_str("{ nope"), Err(CaseLoadError::Json(_))));
    }

    #[test]
    fn load_rejects_structurally_invalid_case() {
        let mut raw = sample_case_json();
        raw["solution"]["culprit"] = Value::from("nobody");
        assert!(matches!(load(&raw), Err(CaseLoadError::Inconsistent(_))));
    }

    #[test]
    fn load_surfaces_parse_errors() {
        let mut raw = sample_case_json();
        raw["metadata"]["difficulty"] = Value::from(0);
        assert!(matches!(load(&raw), Err(CaseLoadError::Malformed(_))));
    }
}
