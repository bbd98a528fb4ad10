//! Structural checks over a parsed case.

use std::collections::HashSet;
use std::hash::Hash;

use super::definition::CaseDefinition;
use crate::dependency::DependencyAction;
use crate::error::ValidationError;
use crate::ids::{EvidenceId, LocationId, SuspectId};

/// Collect every structural problem of a case. Never fails; an empty list
/// means the case is playable.
pub fn validate(case: &CaseDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_unique(&mut errors, "evidence", case.evidence().iter().map(|e| &e.id));
    check_unique(&mut errors, "suspects", case.suspects().iter().map(|s| &s.id));
    check_unique(&mut errors, "locations", case.locations().iter().map(|l| &l.id));
    check_unique(&mut errors, "files", case.files().iter().map(|f| &f.id));

    let guilty: Vec<_> = case.suspects().iter().filter(|s| s.is_guilty).collect();
    if guilty.len() != 1 {
        errors.push(ValidationError::new(
            "suspects",
            format!("exactly one guilty suspect, found {}", guilty.len()),
        ));
    }

    let culprit = &case.solution().culprit;
    match case.find_suspect(culprit) {
        None => errors.push(ValidationError::new(
            "solution.culprit",
            format!("an existing suspect id, got `{}`", culprit),
        )),
        Some(suspect) if guilty.len() == 1 && !suspect.is_guilty => {
            errors.push(ValidationError::new(
                "solution.culprit",
                "the suspect flagged as guilty",
            ))
        }
        Some(_) => {}
    }

    let evidence_ids: HashSet<&EvidenceId> = case.evidence().iter().map(|e| &e.id).collect();
    let check_evidence = |errors: &mut Vec<ValidationError>, field: String, id: &EvidenceId| {
        if !evidence_ids.contains(id) {
            errors.push(ValidationError::new(
                field,
                format!("an existing evidence id, got `{}`", id),
            ));
        }
    };

    for (i, id) in case.solution().key_evidence.iter().enumerate() {
        check_evidence(&mut errors, format!("solution.keyEvidence[{}]", i), id);
    }
    for (i, id) in case.validation().required_evidence.iter().enumerate() {
        check_evidence(&mut errors, format!("validation.requiredEvidence[{}]", i), id);
    }
    for (i, analysis) in case.validation().required_analyses.iter().enumerate() {
        check_evidence(
            &mut errors,
            format!("validation.requiredAnalyses[{}].evidenceId", i),
            &analysis.evidence_id,
        );
    }
    for (i, suspect) in case.suspects().iter().enumerate() {
        for (j, id) in suspect.evidence_connections.iter().enumerate() {
            check_evidence(
                &mut errors,
                format!("suspects[{}].evidenceConnections[{}]", i, j),
                id,
            );
        }
    }

    for (i, evidence) in case.evidence().iter().enumerate() {
        if evidence.requires_analysis && evidence.analysis_type.is_none() {
            errors.push(ValidationError::new(
                format!("evidence[{}].analysisType", i),
                "an analysis type when requiresAnalysis is true",
            ));
        }
    }

    for (i, file) in case.files().iter().enumerate() {
        for (j, dependency) in file.dependencies.iter().enumerate() {
            let field = format!("files[{}].dependencies[{}].itemId", i, j);
            let known = match dependency.action {
                DependencyAction::DiscoverEvidence | DependencyAction::CompleteAnalysis => {
                    evidence_ids.contains(&EvidenceId::new(dependency.item_id.as_str()))
                }
                DependencyAction::InterviewSuspect => case
                    .find_suspect(&SuspectId::new(dependency.item_id.as_str()))
                    .is_some(),
                // Free-form locations are allowed when the case lists none.
                DependencyAction::VisitLocation => {
                    case.locations().is_empty()
                        || case
                            .find_location(&LocationId::new(dependency.item_id.as_str()))
                            .is_some()
                }
            };
            if !known {
                errors.push(ValidationError::new(
                    field,
                    format!(
                        "an existing target for {}, got `{}`",
                        dependency.action, dependency.item_id
                    ),
                ));
            }
        }
    }

    let minimum = case.validation().minimum_evidence_to_accuse as usize;
    if minimum > case.evidence().len() {
        errors.push(ValidationError::new(
            "validation.minimumEvidenceToAccuse",
            format!("at most the number of evidence items ({})", case.evidence().len()),
        ));
    }

    for (i, tier) in case.scoring().time_bonus.iter().enumerate() {
        if !(tier.max_time_ratio.is_finite() && tier.max_time_ratio > 0.0) {
            errors.push(ValidationError::new(
                format!("scoring.timeBonus[{}].maxTimeRatio", i),
                "a positive number",
            ));
        }
    }

    errors
}

fn check_unique<'a, T: Eq + Hash + std::fmt::Display + 'a>(
    errors: &mut Vec<ValidationError>,
    section: &str,
    ids: impl Iterator<Item = &'a T>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                section,
                format!("unique ids, `{}` appears more than once", id),
            ));
        }
    }
}
