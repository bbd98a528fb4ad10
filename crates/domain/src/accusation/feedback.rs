//! Player-facing verdict text.

use serde::{Deserialize, Serialize};

/// The same verdict in every supported language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub en: String,
    pub es: String,
}

/// What the feedback talks about.
pub(super) struct Verdict {
    pub correct_culprit: bool,
    pub correct_motive: bool,
    pub correct_method: bool,
    pub key_evidence_cited: usize,
    pub key_evidence_total: usize,
    pub reasoning_score: u32,
    pub score: u32,
    pub max_score: u32,
}

const STRONG_REASONING: u32 = 40;
const FAIR_REASONING: u32 = 20;

pub(super) fn compose(verdict: &Verdict) -> Feedback {
    let mut en = Vec::new();
    let mut es = Vec::new();

    if verdict.correct_culprit && verdict.correct_motive && verdict.correct_method {
        en.push("Case solved! You identified the culprit, the motive and the method.".to_string());
        es.push("¡Caso resuelto! Identificaste al culpable, el móvil y el método.".to_string());
    } else {
        if !verdict.correct_culprit {
            en.push("The accused suspect is not the culprit.".to_string());
            es.push("El sospechoso acusado no es el culpable.".to_string());
        }
        if !verdict.correct_motive {
            en.push("The motive does not match what happened.".to_string());
            es.push("El móvil no coincide con lo ocurrido.".to_string());
        }
        if !verdict.correct_method {
            en.push("The method does not match what happened.".to_string());
            es.push("El método no coincide con lo ocurrido.".to_string());
        }
    }

    let (cited, total) = (verdict.key_evidence_cited, verdict.key_evidence_total);
    if total > 0 && cited == total {
        en.push("Your evidence covers every key piece.".to_string());
        es.push("Tus pruebas cubren todas las pruebas clave.".to_string());
    } else if cited > 0 {
        en.push(format!("You cited some of the key evidence ({}/{}).", cited, total));
        es.push(format!("Citaste parte de las pruebas clave ({}/{}).", cited, total));
    } else {
        en.push("None of the key evidence supports your accusation.".to_string());
        es.push("Ninguna prueba clave respalda tu acusación.".to_string());
    }

    if verdict.reasoning_score >= STRONG_REASONING {
        en.push("Your reasoning is well argued.".to_string());
        es.push("Tu razonamiento está bien argumentado.".to_string());
    } else if verdict.reasoning_score >= FAIR_REASONING {
        en.push("Your reasoning is plausible but incomplete.".to_string());
        es.push("Tu razonamiento es plausible pero incompleto.".to_string());
    } else {
        en.push("Your reasoning needs more detail.".to_string());
        es.push("Tu razonamiento necesita más detalle.".to_string());
    }

    en.push(format!("Score: {}/{}.", verdict.score, verdict.max_score));
    es.push(format!("Puntuación: {}/{}.", verdict.score, verdict.max_score));

    Feedback {
        en: en.join(" "),
        es: es.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict() -> Verdict {
        Verdict {
            correct_culprit: true,
            correct_motive: false,
            correct_method: true,
            key_evidence_cited: 1,
            key_evidence_total: 2,
            reasoning_score: 25,
            score: 180,
            max_score: 500,
        }
    }

    #[test]
    fn lists_only_the_wrong_parts() {
        let feedback = compose(&verdict());
        assert!(feedback.en.contains("motive does not match"));
        assert!(!feedback.en.contains("not the culprit"));
        assert!(!feedback.en.contains("method does not match"));
        assert!(feedback.es.contains("móvil no coincide"));
    }

    #[test]
    fn always_ends_with_score_over_max() {
        let feedback = compose(&verdict());
        assert!(feedback.en.ends_with("Score: 180/500."));
        assert!(feedback.es.ends_with("Puntuación: 180/500."));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(compose(&verdict()), compose(&verdict()));
    }
}
