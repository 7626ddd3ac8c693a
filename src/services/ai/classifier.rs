use std::time::Duration;

use crate::models::{
    ClassificationResult, FlowVariant, IntakeAnswers, Language, Mode, Priority, Urgency,
};
use crate::services::ai::{ChatOptions, LlmProvider, Message};

pub const CLASSIFICATION_OPTIONS: ChatOptions = ChatOptions {
    max_tokens: Some(150),
    temperature: 0.5,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassificationParseError {
    #[error("no recognized priority term in model response")]
    MissingPriority,

    #[error("no recognized consultation mode in model response")]
    MissingMode,

    #[error("model did not answer within {0} seconds")]
    TimedOut(u64),
}

/// The model call itself failed (network, provider error). Retryable by the
/// patient; no fallback is applied.
#[derive(Debug, thiserror::Error)]
#[error("classification service unavailable: {0}")]
pub struct ExternalCallFailure(pub String);

#[derive(Debug, Clone)]
pub struct Classification {
    pub result: ClassificationResult,
    pub urgency: Urgency,
    /// Raw model text, kept so the session can reuse it instead of calling
    /// again. `None` when the call timed out.
    pub raw_response: Option<String>,
    pub parse_error: Option<ClassificationParseError>,
}

// Scanned in order; the first term present in the response as a whole word
// wins. Longer phrases come before the words they contain, and "urgent" leads
// the sexual health lists so an urgent reply is never filed as routine.
const GP_TERMS_EN: &[(&str, Priority)] = &[
    ("low", Priority::Low),
    ("medium", Priority::Medium),
    ("high", Priority::High),
    ("urgent", Priority::High),
];

const GP_TERMS_FR: &[(&str, Priority)] = &[
    ("faible", Priority::Low),
    ("moyenne", Priority::Medium),
    ("moyen", Priority::Medium),
    ("élevée", Priority::High),
    ("élevé", Priority::High),
    ("haute", Priority::High),
    ("haut", Priority::High),
    ("urgente", Priority::High),
    ("urgent", Priority::High),
    ("basse", Priority::Low),
];

const SEXUAL_HEALTH_TERMS_EN: &[(&str, Priority)] = &[
    ("urgent", Priority::Urgent),
    ("contraception", Priority::ContraceptionReferral),
    ("no symptoms", Priority::RoutineNoSymptoms),
    ("without symptoms", Priority::RoutineNoSymptoms),
    ("symptoms", Priority::RoutineSymptoms),
];

const SEXUAL_HEALTH_TERMS_FR: &[(&str, Priority)] = &[
    ("urgente", Priority::Urgent),
    ("urgent", Priority::Urgent),
    ("contraception", Priority::ContraceptionReferral),
    ("sans symptômes", Priority::RoutineNoSymptoms),
    ("avec symptômes", Priority::RoutineSymptoms),
    ("symptômes", Priority::RoutineSymptoms),
];

fn priority_terms(variant: FlowVariant, language: Language) -> &'static [(&'static str, Priority)] {
    match (variant, language) {
        (FlowVariant::Gp, Language::English) => GP_TERMS_EN,
        (FlowVariant::Gp, Language::French) => GP_TERMS_FR,
        (FlowVariant::SexualHealth, Language::English) => SEXUAL_HEALTH_TERMS_EN,
        (FlowVariant::SexualHealth, Language::French) => SEXUAL_HEALTH_TERMS_FR,
    }
}

fn system_role(language: Language) -> &'static str {
    match language {
        Language::English => "You are a triage assistant.",
        Language::French => "Vous êtes un assistant de triage médical.",
    }
}

pub fn build_prompt(summary: &str, language: Language, variant: FlowVariant) -> String {
    match (variant, language) {
        (FlowVariant::Gp, Language::English) => format!(
            "Patient's symptoms summary:\n{summary}\n\
             Based on this information, what is the priority level (Low, Medium, High) and the \
             recommended consultation mode (Telephone, Face-to-Face)? \
             Provide only the priority level and consultation mode in a short format. \
             For example: 'Priority Level: Medium, Consultation Mode: Telephone'."
        ),
        (FlowVariant::Gp, Language::French) => format!(
            "Résumé des symptômes du patient:\n{summary}\n\
             Sur la base de ces informations, quel est le niveau de priorité (Faible, Moyen, Élevé) \
             et le mode de consultation recommandé (Téléphone, En personne)? \
             Fournissez uniquement le niveau de priorité et le mode de consultation dans un format court. \
             Par exemple: 'Niveau de Priorité: Moyen, Mode de Consultation: Téléphone'."
        ),
        (FlowVariant::SexualHealth, Language::English) => format!(
            "Patient's intake summary:\n{summary}\n\
             Based on this information, which triage priority applies \
             (Urgent, Routine - Symptoms, Routine - No Symptoms, Contraception Referral)? \
             Provide only the priority in a short format. \
             For example: 'Priority: Routine - Symptoms'."
        ),
        (FlowVariant::SexualHealth, Language::French) => format!(
            "Résumé de l'admission du patient:\n{summary}\n\
             Sur la base de ces informations, quelle priorité de triage s'applique \
             (Urgent, Routine - Avec symptômes, Routine - Sans symptômes, Orientation contraception)? \
             Fournissez uniquement la priorité dans un format court. \
             Par exemple: 'Priorité: Routine - Avec symptômes'."
        ),
    }
}

/// True when `term` occurs in `text` with no letter or digit directly on
/// either side, so "low" does not fire inside "follow".
fn contains_word(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn parse_mode(text: &str) -> Option<Mode> {
    if contains_word(text, "telephone") || contains_word(text, "téléphone") {
        Some(Mode::Telephone)
    } else if contains_word(text, "face") || contains_word(text, "personne") {
        Some(Mode::FaceToFace)
    } else {
        None
    }
}

pub fn parse_classification(
    text: &str,
    language: Language,
    variant: FlowVariant,
) -> Result<ClassificationResult, ClassificationParseError> {
    let lower = text.to_lowercase();

    let priority = priority_terms(variant, language)
        .iter()
        .find(|(term, _)| contains_word(&lower, term))
        .map(|(_, priority)| *priority)
        .ok_or(ClassificationParseError::MissingPriority)?;

    let mode = match variant.modes() {
        [only] => *only,
        _ => parse_mode(&lower).ok_or(ClassificationParseError::MissingMode)?,
    };

    Ok(ClassificationResult { priority, mode })
}

/// Deterministic pair used whenever the model output cannot be used.
pub fn fallback_classification(answers: &IntakeAnswers) -> ClassificationResult {
    match answers {
        IntakeAnswers::Gp(_) => ClassificationResult {
            priority: Priority::Medium,
            mode: Mode::Telephone,
        },
        IntakeAnswers::SexualHealth(a) => {
            let priority = if a.emergency_contraception == Some(true) {
                Priority::ContraceptionReferral
            } else if a.has_symptoms == Some(true) {
                Priority::RoutineSymptoms
            } else {
                Priority::RoutineNoSymptoms
            };
            ClassificationResult {
                priority,
                mode: Mode::Telephone,
            }
        }
    }
}

/// Classifies a confirmed intake. Calls the model only when no cached
/// response is supplied.
pub async fn classify(
    llm: &dyn LlmProvider,
    answers: &IntakeAnswers,
    summary: &str,
    language: Language,
    cached_response: Option<&str>,
    timeout: Duration,
) -> Result<Classification, ExternalCallFailure> {
    let variant = answers.variant();

    let raw_response = match cached_response {
        Some(cached) => Some(cached.to_string()),
        None => {
            let messages = [Message::user(build_prompt(summary, language, variant))];
            let call = llm.chat(system_role(language), &messages, CLASSIFICATION_OPTIONS);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(text)) => Some(text),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "classification call failed");
                    return Err(ExternalCallFailure(e.to_string()));
                }
                Err(_) => None,
            }
        }
    };

    let parsed = match raw_response.as_deref() {
        Some(text) => parse_classification(text, language, variant),
        None => Err(ClassificationParseError::TimedOut(timeout.as_secs())),
    };

    let (result, parse_error) = match parsed {
        Ok(result) => (result, None),
        Err(e) => {
            let fallback = fallback_classification(answers);
            tracing::warn!(
                error = %e,
                priority = fallback.priority.as_str(),
                mode = fallback.mode.as_str(),
                "could not classify model response, using fallback"
            );
            (fallback, Some(e))
        }
    };

    Ok(Classification {
        urgency: result.priority.urgency(),
        result,
        raw_response,
        parse_error,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::SexualHealthIntake;

    struct FixedLlm {
        reply: anyhow::Result<String>,
        calls: AtomicUsize,
    }

    impl FixedLlm {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _options: ChatOptions,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    struct SlowLlm;

    #[async_trait]
    impl LlmProvider for SlowLlm {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _options: ChatOptions,
        ) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("Priority Level: High, Consultation Mode: Telephone".to_string())
        }
    }

    fn gp() -> IntakeAnswers {
        IntakeAnswers::new(FlowVariant::Gp)
    }

    #[test]
    fn test_parse_high_telephone() {
        let result = parse_classification(
            "Priority Level: High, Consultation Mode: Telephone",
            Language::English,
            FlowVariant::Gp,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.mode, Mode::Telephone);
    }

    #[test]
    fn test_parse_french_synonyms() {
        let result = parse_classification(
            "Niveau de Priorité: Élevé, Mode de Consultation: En personne",
            Language::French,
            FlowVariant::Gp,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.mode, Mode::FaceToFace);

        let result = parse_classification("Priorité haute, téléphone", Language::French, FlowVariant::Gp)
            .unwrap();
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.mode, Mode::Telephone);
    }

    #[test]
    fn test_term_list_order_beats_text_position() {
        // "high" appears first in the text but "medium" is earlier in the list.
        let result = parse_classification(
            "High risk ruled out; Medium priority, Face-to-Face",
            Language::English,
            FlowVariant::Gp,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::Medium);
    }

    #[test]
    fn test_terms_match_whole_words_only() {
        let result = parse_classification(
            "Priority Level: High, Consultation Mode: Face-to-Face. Follow up within 24h.",
            Language::English,
            FlowVariant::Gp,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.mode, Mode::FaceToFace);

        assert_eq!(
            parse_classification("Pain is slowly improving", Language::English, FlowVariant::Gp),
            Err(ClassificationParseError::MissingPriority)
        );
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("priority: low, telephone", "low"));
        assert!(contains_word("low", "low"));
        assert!(!contains_word("follow below", "low"));
        assert!(contains_word("routine - no symptoms.", "no symptoms"));
        assert!(contains_word("priorité: élevé", "élevé"));
        assert!(!contains_word("priorité: élevées", "élevé"));
    }

    #[test]
    fn test_urgent_wins_over_contraception_mention() {
        let result = parse_classification(
            "Priority: Urgent. Emergency contraception was not requested.",
            Language::English,
            FlowVariant::SexualHealth,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::Urgent);

        let result = parse_classification(
            "Priorité: Urgente, contraception d'urgence demandée",
            Language::French,
            FlowVariant::SexualHealth,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::Urgent);

        let result = parse_classification(
            "Priority: Contraception Referral",
            Language::English,
            FlowVariant::SexualHealth,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::ContraceptionReferral);
    }

    #[test]
    fn test_urgent_normalizes_to_high_for_gp() {
        let result =
            parse_classification("URGENT - telephone", Language::English, FlowVariant::Gp).unwrap();
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn test_missing_terms() {
        assert_eq!(
            parse_classification("I cannot help with that.", Language::English, FlowVariant::Gp),
            Err(ClassificationParseError::MissingPriority)
        );
        assert_eq!(
            parse_classification("Priority: Medium", Language::English, FlowVariant::Gp),
            Err(ClassificationParseError::MissingMode)
        );
    }

    #[test]
    fn test_sexual_health_mode_is_fixed() {
        let result = parse_classification(
            "Priority: Routine - No Symptoms",
            Language::English,
            FlowVariant::SexualHealth,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::RoutineNoSymptoms);
        assert_eq!(result.mode, Mode::Telephone);

        let result = parse_classification(
            "Priority: Routine - Symptoms",
            Language::English,
            FlowVariant::SexualHealth,
        )
        .unwrap();
        assert_eq!(result.priority, Priority::RoutineSymptoms);
    }

    #[test]
    fn test_fallback_depends_on_emergency_contraception() {
        let answers = IntakeAnswers::SexualHealth(SexualHealthIntake {
            emergency_contraception: Some(true),
            has_symptoms: Some(true),
            ..Default::default()
        });
        assert_eq!(
            fallback_classification(&answers).priority,
            Priority::ContraceptionReferral
        );

        let answers = IntakeAnswers::SexualHealth(SexualHealthIntake {
            emergency_contraception: Some(false),
            has_symptoms: Some(false),
            ..Default::default()
        });
        assert_eq!(
            fallback_classification(&answers).priority,
            Priority::RoutineNoSymptoms
        );
        assert_eq!(
            fallback_classification(&gp()),
            ClassificationResult {
                priority: Priority::Medium,
                mode: Mode::Telephone
            }
        );
    }

    #[test]
    fn test_prompt_embeds_summary_and_example() {
        let prompt = build_prompt("Name: Jo", Language::English, FlowVariant::Gp);
        assert!(prompt.contains("Name: Jo"));
        assert!(prompt.contains("'Priority Level: Medium, Consultation Mode: Telephone'"));
    }

    #[tokio::test]
    async fn test_classify_unparseable_uses_fallback() {
        let llm = FixedLlm::replying("Please consult a doctor.");
        let c = classify(&llm, &gp(), "summary", Language::English, None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(c.result.priority, Priority::Medium);
        assert_eq!(c.result.mode, Mode::Telephone);
        assert_eq!(c.parse_error, Some(ClassificationParseError::MissingPriority));
        assert_eq!(c.urgency, Urgency::Routine);
    }

    #[tokio::test]
    async fn test_classify_reuses_cached_response() {
        let llm = FixedLlm::replying("Priority Level: Low, Consultation Mode: Telephone");
        let c = classify(
            &llm,
            &gp(),
            "summary",
            Language::English,
            Some("Priority Level: High, Consultation Mode: Face-to-Face"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert_eq!(c.result.priority, Priority::High);
        assert_eq!(c.urgency, Urgency::Urgent);
    }

    #[tokio::test]
    async fn test_classify_provider_error_is_not_a_fallback() {
        let llm = FixedLlm {
            reply: Err(anyhow::anyhow!("503 service unavailable")),
            calls: AtomicUsize::new(0),
        };
        let err = classify(&llm, &gp(), "summary", Language::English, None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_timeout_uses_fallback() {
        let c = classify(
            &SlowLlm,
            &gp(),
            "summary",
            Language::English,
            None,
            Duration::from_millis(20),
        )
        .await
        .unwrap();
        assert!(c.raw_response.is_none());
        assert!(matches!(c.parse_error, Some(ClassificationParseError::TimedOut(_))));
        assert_eq!(c.result.priority, Priority::Medium);
    }
}
