//! Scores an accusation against the case solution.

use std::collections::BTreeSet;

use super::feedback::{self, Verdict};
use super::similarity::similarity;
use super::{Accusation, AccusationValidation, ScoreBonuses, ScorePenalties};
use crate::case::{CaseDefinition, ScoringRules};
use crate::error::DomainError;
use crate::ids::EvidenceId;
use crate::progress::GameProgress;

/// Motive and method count as correct from this similarity on.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Elapsed/estimated time ratio beyond which the overtime penalty applies.
pub const OVERTIME_RATIO: f64 = 1.5;

const KEY_EVIDENCE_POINTS: i64 = 20;
const IRRELEVANT_EVIDENCE_PENALTY: i64 = 5;

const REASONING_BASE: u32 = 10;
const REASONING_DETAILED: u32 = 20;
const REASONING_DETAILED_LEN: usize = 50;
const REASONING_SIMILARITY_WEIGHT: f64 = 30.0;
const REASONING_KEY_MENTION: u32 = 10;

/// Score `accusation` for `case` given the player's `progress`.
///
/// Pure and deterministic. Fails if the evidence or analysis requirements of
/// the case are unmet; callers check eligibility first.
pub fn validate(
    accusation: &Accusation,
    case: &CaseDefinition,
    progress: &GameProgress,
) -> Result<AccusationValidation, DomainError> {
    check_preconditions(case, progress)?;

    let solution = case.solution();
    let scoring = case.scoring();

    let correct_culprit = accusation.suspect_id == solution.culprit;
    let motive_similarity = similarity(&accusation.motive, &solution.motive);
    let method_similarity = similarity(&accusation.method, &solution.method);
    let correct_motive = motive_similarity >= SIMILARITY_THRESHOLD;
    let correct_method = method_similarity >= SIMILARITY_THRESHOLD;

    let base_points = base_points(scoring, correct_culprit, correct_motive, correct_method);
    let (evidence_score, key_evidence_cited) = evidence_score(case, &accusation.supporting_evidence);
    let reasoning_score = reasoning_score(case, &accusation.reasoning);

    let time_ratio = time_ratio(case, progress, accusation);
    let bonuses = ScoreBonuses {
        time: time_ratio.map_or(0, |ratio| time_bonus(scoring, ratio)),
        thoroughness: if is_thorough(case, progress) {
            scoring.thoroughness_bonus
        } else {
            0
        },
        analysis: per_analysis(progress.correct_analyses(), scoring.analysis_points.correct),
    };
    let incorrect_analyses = progress.analyses_completed().len() - progress.correct_analyses();
    let penalties = ScorePenalties {
        hints: progress.hints_used().saturating_mul(scoring.hints_used_penalty),
        overtime: match time_ratio {
            Some(ratio) if ratio > OVERTIME_RATIO => scoring.overtime_penalty,
            _ => 0,
        },
        analysis: per_analysis(
            incorrect_analyses,
            scoring.analysis_points.incorrect.saturating_neg(),
        ),
    };

    let total = base_points
        .saturating_add(i64::from(evidence_score))
        .saturating_add(i64::from(reasoning_score))
        .saturating_add(bonuses.total())
        .saturating_sub(penalties.total());
    let score = clamp_u32(total);

    let feedback = feedback::compose(&Verdict {
        correct_culprit,
        correct_motive,
        correct_method,
        key_evidence_cited,
        key_evidence_total: solution.key_evidence.len(),
        reasoning_score,
        score,
        max_score: scoring.max_score,
    });

    Ok(AccusationValidation {
        score,
        max_score: scoring.max_score,
        is_correct: correct_culprit && correct_motive && correct_method,
        correct_culprit,
        correct_motive,
        correct_method,
        motive_similarity,
        method_similarity,
        base_points,
        evidence_score,
        key_evidence_cited,
        reasoning_score,
        bonuses,
        penalties,
        feedback,
    })
}

fn check_preconditions(case: &CaseDefinition, progress: &GameProgress) -> Result<(), DomainError> {
    let rules = case.validation();

    let found = progress.evidence_discovered().len();
    if found < rules.minimum_evidence_to_accuse as usize {
        return Err(DomainError::constraint(format!(
            "Accusation needs at least {} pieces of evidence, {} found",
            rules.minimum_evidence_to_accuse, found
        )));
    }
    if let Some(missing) = rules
        .required_evidence
        .iter()
        .find(|id| !progress.has_discovered(id))
    {
        return Err(DomainError::constraint(format!(
            "Required evidence not discovered: {}",
            missing
        )));
    }
    if let Some(missing) = rules
        .required_analyses
        .iter()
        .find(|required| !progress.has_completed_analysis(&required.key()))
    {
        return Err(DomainError::constraint(format!(
            "Required analysis not completed: {}",
            missing.key()
        )));
    }
    Ok(())
}

fn base_points(scoring: &ScoringRules, culprit: bool, motive: bool, method: bool) -> i64 {
    let points = &scoring.accusation_points;
    if !culprit {
        return points.incorrect_accusation;
    }
    let mut total = i64::from(points.correct_culprit);
    if motive {
        total += i64::from(points.correct_motive);
    }
    if method {
        total += i64::from(points.correct_method);
    }
    total
}

/// Returns the clamped score and how many key pieces were cited.
fn evidence_score(case: &CaseDefinition, supporting: &[EvidenceId]) -> (u32, usize) {
    let cited: BTreeSet<&EvidenceId> = supporting.iter().collect();
    let mut score = 0i64;
    let mut key_cited = 0;

    for id in cited {
        if case.is_key_evidence(id) {
            score += KEY_EVIDENCE_POINTS;
            key_cited += 1;
        } else {
            score -= IRRELEVANT_EVIDENCE_PENALTY;
        }
        if let Some(evidence) = case.find_evidence(id) {
            score += i64::from(evidence.points);
        }
    }
    (clamp_u32(score), key_cited)
}

fn reasoning_score(case: &CaseDefinition, reasoning: &str) -> u32 {
    let mut score = if reasoning.chars().count() > REASONING_DETAILED_LEN {
        REASONING_DETAILED
    } else {
        REASONING_BASE
    };

    let sim = similarity(reasoning, &case.solution().explanation);
    score += (REASONING_SIMILARITY_WEIGHT * sim).floor() as u32;

    let mentioned = case
        .solution()
        .key_evidence
        .iter()
        .filter_map(|id| case.find_evidence(id))
        .filter(|e| !e.name.is_empty() && reasoning.contains(e.name.as_str()))
        .count();
    let mentioned = u32::try_from(mentioned).unwrap_or(u32::MAX);
    score.saturating_add(mentioned.saturating_mul(REASONING_KEY_MENTION))
}

/// Elapsed over estimated investigation time; `None` without an estimate.
fn time_ratio(case: &CaseDefinition, progress: &GameProgress, accusation: &Accusation) -> Option<f64> {
    let estimated = case.metadata().estimated_time_minutes;
    if estimated == 0 {
        return None;
    }
    let elapsed_ms = (accusation.submitted_at - progress.started_at())
        .num_milliseconds()
        .max(0);
    let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
    Some(elapsed_minutes / f64::from(estimated))
}

/// Points of the tightest tier the ratio fits in. Tiers are sorted by ratio.
fn time_bonus(scoring: &ScoringRules, ratio: f64) -> u32 {
    scoring
        .time_bonus
        .iter()
        .find(|tier| ratio <= tier.max_time_ratio)
        .map_or(0, |tier| tier.points)
}

/// Every high or critical piece of evidence was discovered.
fn is_thorough(case: &CaseDefinition, progress: &GameProgress) -> bool {
    case.evidence()
        .iter()
        .filter(|e| e.importance.is_major())
        .all(|e| progress.has_discovered(&e.id))
}

/// `count` analyses worth `points` each, clamped to `u32`.
fn per_analysis(count: usize, points: i64) -> u32 {
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    clamp_u32(count.saturating_mul(points))
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
