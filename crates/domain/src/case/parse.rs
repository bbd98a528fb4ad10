//! Case document parsing.
//!
//! Walks the raw JSON tree and builds a `CaseDefinition`, reporting the first
//! problem as a `ValidationError` that names the offending field by its path
//! in the document.

use std::str::FromStr;

use serde_json::{Map, Value};

use super::definition::{
    AccusationPoints, AnalysisPoints, CaseDefinition, CaseMetadata, CaseType, Difficulty,
    EvidenceDefinition, Importance, LocationDefinition, RequiredAnalysis, ScoringRules, Solution,
    SuspectDefinition, TimeBonusTier, ValidationRules,
};
use crate::dependency::{CaseFile, DependencyAction, DependencyStatus, FileDependency};
use crate::error::ValidationError;
use crate::ids::{AnalysisType, CaseId, EvidenceId, FileId, LocationId, SuspectId};

/// Parse a case document into a typed definition.
///
/// Only shape is checked here: required fields, primitive types, enumerated
/// values and ranges. Cross-references are checked by [`super::validate`].
pub fn parse(raw: &Value) -> Result<CaseDefinition, ValidationError> {
    let root = Node::root(raw)?;

    let metadata = parse_metadata(&root.object("metadata")?)?;
    let evidence = root
        .array("evidence")?
        .iter()
        .map(parse_evidence)
        .collect::<Result<Vec<_>, _>>()?;
    let suspects = root
        .array("suspects")?
        .iter()
        .map(parse_suspect)
        .collect::<Result<Vec<_>, _>>()?;
    let locations = root
        .opt_array("locations")?
        .iter()
        .map(parse_location)
        .collect::<Result<Vec<_>, _>>()?;
    let files = root
        .opt_array("files")?
        .iter()
        .map(parse_file)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CaseDefinition {
        id: CaseId::new(root.string("id")?),
        title: root.string("title")?,
        description: root.opt_string("description")?.unwrap_or_default(),
        metadata,
        evidence,
        suspects,
        locations,
        files,
        solution: parse_solution(&root.object("solution")?)?,
        scoring: parse_scoring(&root.object("scoring")?)?,
        validation: parse_validation_rules(&root.object("validation")?)?,
    })
}

fn parse_metadata(node: &Node<'_>) -> Result<CaseMetadata, ValidationError> {
    let raw_difficulty = node.u32("difficulty")?;
    let difficulty = u8::try_from(raw_difficulty)
        .ok()
        .and_then(|d| Difficulty::new(d).ok())
        .ok_or_else(|| {
            ValidationError::new(
                node.path_of("difficulty"),
                format!(
                    "an integer between {} and {}",
                    Difficulty::MIN,
                    Difficulty::MAX
                ),
            )
        })?;

    let case_type_names: Vec<_> = CaseType::ALL.iter().map(|t| t.as_str()).collect();
    Ok(CaseMetadata {
        difficulty,
        estimated_time_minutes: node.u32("estimatedTimeMinutes")?,
        case_type: node.parsed("type", &one_of(&case_type_names))?,
        tags: node.opt_strings("tags")?,
    })
}

fn parse_evidence(node: &Node<'_>) -> Result<EvidenceDefinition, ValidationError> {
    let importance_names: Vec<_> = Importance::ALL.iter().map(|i| i.as_str()).collect();
    Ok(EvidenceDefinition {
        id: EvidenceId::new(node.string("id")?),
        name: node.string("name")?,
        description: node.opt_string("description")?.unwrap_or_default(),
        location: node.opt_string("location")?.map(LocationId::new),
        importance: node.parsed("importance", &one_of(&importance_names))?,
        points: node.u32("points")?,
        requires_analysis: node.opt_bool("requiresAnalysis", false)?,
        analysis_type: node.opt_string("analysisType")?.map(AnalysisType::new),
    })
}

fn parse_suspect(node: &Node<'_>) -> Result<SuspectDefinition, ValidationError> {
    Ok(SuspectDefinition {
        id: SuspectId::new(node.string("id")?),
        name: node.string("name")?,
        is_guilty: node.bool("isGuilty")?,
        motive: node.opt_string("motive")?.unwrap_or_default(),
        alibi: node.opt_string("alibi")?.unwrap_or_default(),
        evidence_connections: node
            .opt_strings("evidenceConnections")?
            .into_iter()
            .map(EvidenceId::new)
            .collect(),
    })
}

fn parse_location(node: &Node<'_>) -> Result<LocationDefinition, ValidationError> {
    Ok(LocationDefinition {
        id: LocationId::new(node.string("id")?),
        name: node.string("name")?,
        description: node.opt_string("description")?.unwrap_or_default(),
    })
}

fn parse_file(node: &Node<'_>) -> Result<CaseFile, ValidationError> {
    let dependencies = node
        .opt_array("dependencies")?
        .iter()
        .map(|dep| {
            let status = match dep.opt_string("status")? {
                Some(_) => dep.parsed("status", "one of pending, ok")?,
                None => DependencyStatus::Pending,
            };
            Ok(FileDependency {
                action: dep.parsed(
                    "action",
                    "one of discover_evidence, complete_analysis, interview_suspect, visit_location",
                )?,
                item_id: dep.string("itemId")?,
                status,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(CaseFile {
        id: FileId::new(node.string("id")?),
        name: node.string("name")?,
        content: node.opt_string("content")?.unwrap_or_default(),
        dependencies,
    })
}

fn parse_solution(node: &Node<'_>) -> Result<Solution, ValidationError> {
    Ok(Solution {
        culprit: SuspectId::new(node.string("culprit")?),
        motive: node.string("motive")?,
        method: node.string("method")?,
        key_evidence: node
            .strings("keyEvidence")?
            .into_iter()
            .map(EvidenceId::new)
            .collect(),
        explanation: node.string("explanation")?,
    })
}

fn parse_scoring(node: &Node<'_>) -> Result<ScoringRules, ValidationError> {
    let accusation = node.object("accusationPoints")?;
    let analysis = node.object("analysisPoints")?;

    let mut time_bonus = node
        .opt_array("timeBonus")?
        .iter()
        .map(|tier| {
            Ok(TimeBonusTier {
                max_time_ratio: tier.f64("maxTimeRatio")?,
                points: tier.u32("points")?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;
    time_bonus.sort_by(|a, b| a.max_time_ratio.total_cmp(&b.max_time_ratio));

    Ok(ScoringRules {
        max_score: node.u32("maxScore")?,
        accusation_points: AccusationPoints {
            correct_culprit: accusation.u32("correctCulprit")?,
            correct_motive: accusation.u32("correctMotive")?,
            correct_method: accusation.u32("correctMethod")?,
            incorrect_accusation: accusation.i64("incorrectAccusation")?,
        },
        analysis_points: AnalysisPoints {
            correct: analysis.i64("correct")?,
            incorrect: analysis.i64("incorrect")?,
        },
        time_bonus,
        thoroughness_bonus: node.opt_u32("thoroughnessBonus")?.unwrap_or(0),
        hints_used_penalty: node.u32("hintsUsedPenalty")?,
        overtime_penalty: node.opt_u32("overtimePenalty")?.unwrap_or(0),
    })
}

fn parse_validation_rules(node: &Node<'_>) -> Result<ValidationRules, ValidationError> {
    let required_analyses = node
        .opt_array("requiredAnalyses")?
        .iter()
        .map(|entry| {
            Ok(RequiredAnalysis {
                evidence_id: EvidenceId::new(entry.string("evidenceId")?),
                analysis_type: AnalysisType::new(entry.string("analysisType")?),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(ValidationRules {
        required_evidence: node
            .strings("requiredEvidence")?
            .into_iter()
            .map(EvidenceId::new)
            .collect(),
        required_analyses,
        minimum_evidence_to_accuse: node.u32("minimumEvidenceToAccuse")?,
        allow_multiple_accusations: node.bool("allowMultipleAccusations")?,
        accusation_cooldown_minutes: node.opt_u32("accusationCooldownMinutes")?,
    })
}

fn one_of(names: &[&str]) -> String {
    format!("one of {}", names.join(", "))
}

// =============================================================================
// JSON walker
// =============================================================================

/// A JSON object together with its path from the document root.
struct Node<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self {
                path: String::new(),
                map,
            }),
            _ => Err(ValidationError::wrong_type("$", "object")),
        }
    }

    fn path_of(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.path, field)
        }
    }

    /// `null` is treated the same as an absent field.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &str) -> Result<&'a Value, ValidationError> {
        self.get(field)
            .ok_or_else(|| ValidationError::missing(self.path_of(field)))
    }

    fn string(&self, field: &str) -> Result<String, ValidationError> {
        self.required(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "string"))
    }

    fn opt_string(&self, field: &str) -> Result<Option<String>, ValidationError> {
        match self.get(field) {
            None => Ok(None),
            Some(_) => self.string(field).map(Some),
        }
    }

    fn u32(&self, field: &str) -> Result<u32, ValidationError> {
        self.required(field)?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "non-negative integer"))
    }

    fn opt_u32(&self, field: &str) -> Result<Option<u32>, ValidationError> {
        match self.get(field) {
            None => Ok(None),
            Some(_) => self.u32(field).map(Some),
        }
    }

    fn i64(&self, field: &str) -> Result<i64, ValidationError> {
        self.required(field)?
            .as_i64()
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "integer"))
    }

    fn f64(&self, field: &str) -> Result<f64, ValidationError> {
        self.required(field)?
            .as_f64()
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "number"))
    }

    fn bool(&self, field: &str) -> Result<bool, ValidationError> {
        self.required(field)?
            .as_bool()
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "boolean"))
    }

    fn opt_bool(&self, field: &str, default: bool) -> Result<bool, ValidationError> {
        match self.get(field) {
            None => Ok(default),
            Some(_) => self.bool(field),
        }
    }

    /// A string field restricted to the values `T` knows how to parse.
    fn parsed<T: FromStr>(&self, field: &str, expected: &str) -> Result<T, ValidationError> {
        self.string(field)?
            .parse()
            .map_err(|_| ValidationError::new(self.path_of(field), expected))
    }

    fn object(&self, field: &str) -> Result<Node<'a>, ValidationError> {
        match self.required(field)? {
            Value::Object(map) => Ok(Node {
                path: self.path_of(field),
                map,
            }),
            _ => Err(ValidationError::wrong_type(self.path_of(field), "object")),
        }
    }

    fn array(&self, field: &str) -> Result<Vec<Node<'a>>, ValidationError> {
        let items = self
            .required(field)?
            .as_array()
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "array"))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("{}[{}]", self.path_of(field), i);
                match item {
                    Value::Object(map) => Ok(Node { path, map }),
                    _ => Err(ValidationError::wrong_type(path, "object")),
                }
            })
            .collect()
    }

    fn opt_array(&self, field: &str) -> Result<Vec<Node<'a>>, ValidationError> {
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(_) => self.array(field),
        }
    }

    fn strings(&self, field: &str) -> Result<Vec<String>, ValidationError> {
        let items = self
            .required(field)?
            .as_array()
            .ok_or_else(|| ValidationError::wrong_type(self.path_of(field), "array"))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::wrong_type(format!("{}[{}]", self.path_of(field), i), "string")
                })
            })
            .collect()
    }

    fn opt_strings(&self, field: &str) -> Result<Vec<String>, ValidationError> {
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(_) => self.strings(field),
        }
    }
}
