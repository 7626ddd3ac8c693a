use crate::models::{
    Answer, AnswerKind, FlowVariant, GpIntake, IntakeAnswers, IntakeFlow, Language,
    SexualHealthIntake, Sex, Step,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FlowError {
    #[error("an answer is required before continuing")]
    EmptyAnswer,

    #[error("step {step:?} expects a {expected:?} answer")]
    UnexpectedAnswer { step: Step, expected: AnswerKind },

    #[error("session is at step {actual:?}, not {expected:?}")]
    StepMismatch { expected: Step, actual: Step },

    #[error("step {0:?} is not part of this intake")]
    StepNotInFlow(Step),

    #[error("intake questions are closed")]
    IntakeClosed,
}

impl IntakeFlow {
    pub fn start(variant: FlowVariant) -> Self {
        Self {
            answers: IntakeAnswers::new(variant),
            step: Step::Name,
        }
    }

    pub fn variant(&self) -> FlowVariant {
        self.answers.variant()
    }

    /// Stores the answer for the current question and moves to the next
    /// applicable step.
    pub fn submit(&mut self, answer: Answer) -> Result<Step, FlowError> {
        let expected = self.step.answer_kind().ok_or(FlowError::IntakeClosed)?;
        if answer.kind() != expected {
            return Err(FlowError::UnexpectedAnswer {
                step: self.step,
                expected,
            });
        }
        if let Answer::Text(text) = &answer {
            if text.trim().is_empty() {
                return Err(FlowError::EmptyAnswer);
            }
        }

        record(&mut self.answers, self.step, answer)?;
        self.step = next_step(&self.answers, self.step);
        Ok(self.step)
    }

    /// Moves past a non-question stage. Fails unless the flow is at `from`.
    pub fn advance_from(&mut self, from: Step) -> Result<Step, FlowError> {
        if self.step != from {
            return Err(FlowError::StepMismatch {
                expected: from,
                actual: self.step,
            });
        }
        if self.step.is_question() {
            return Err(FlowError::EmptyAnswer);
        }
        self.step = next_step(&self.answers, self.step);
        Ok(self.step)
    }

    pub fn summary_confirmed(&self) -> bool {
        matches!(
            self.step,
            Step::Classification | Step::BookingDetails | Step::Booking | Step::Complete
        )
    }

    pub fn summary_text(&self, language: Language) -> String {
        summary_lines(&self.answers, language)
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn next_step(answers: &IntakeAnswers, current: Step) -> Step {
    match current {
        Step::Summary => return Step::Classification,
        Step::Classification => return Step::BookingDetails,
        Step::BookingDetails => return Step::Booking,
        Step::Booking | Step::Complete => return Step::Complete,
        _ => {}
    }

    match answers {
        IntakeAnswers::Gp(_) => match current {
            Step::Name => Step::PresentingComplaint,
            Step::PresentingComplaint => Step::Age,
            Step::Age => Step::Sex,
            Step::Sex => Step::PastHistory,
            Step::PastHistory => Step::FamilyHistory,
            Step::FamilyHistory => Step::Medications,
            Step::Medications => Step::Allergies,
            Step::Allergies => Step::Investigations,
            _ => Step::Summary,
        },
        IntakeAnswers::SexualHealth(a) => {
            let has_symptoms = a.has_symptoms == Some(true);
            match current {
                Step::Name => Step::DateOfBirth,
                Step::DateOfBirth => Step::PhoneNumber,
                Step::PhoneNumber => Step::NeedsTranslator,
                Step::NeedsTranslator if a.needs_translator == Some(true) => {
                    Step::TranslatorLanguage
                }
                Step::NeedsTranslator | Step::TranslatorLanguage => Step::Sex,
                Step::Sex => Step::HasSymptoms,
                Step::HasSymptoms if has_symptoms => Step::SymptomDetails,
                Step::HasSymptoms => Step::EmergencyContraception,
                Step::SymptomDetails => Step::SymptomDuration,
                Step::SymptomDuration => Step::EmergencyContraception,
                Step::EmergencyContraception if a.sex == Some(Sex::Female) => {
                    Step::LastMenstrualPeriod
                }
                Step::EmergencyContraception | Step::LastMenstrualPeriod => Step::MedicalHistory,
                Step::MedicalHistory if has_symptoms => Step::Smoking,
                Step::Smoking => Step::Drugs,
                Step::Drugs => Step::Alcohol,
                _ => Step::Summary,
            }
        }
    }
}

fn text(answer: Answer) -> Option<String> {
    match answer {
        Answer::Text(t) => Some(t.trim().to_string()),
        _ => None,
    }
}

fn yes_no(answer: Answer) -> Option<bool> {
    match answer {
        Answer::YesNo(b) => Some(b),
        _ => None,
    }
}

fn record(answers: &mut IntakeAnswers, step: Step, answer: Answer) -> Result<(), FlowError> {
    match answers {
        IntakeAnswers::Gp(a) => record_gp(a, step, answer),
        IntakeAnswers::SexualHealth(a) => record_sexual_health(a, step, answer),
    }
}

fn record_gp(a: &mut GpIntake, step: Step, answer: Answer) -> Result<(), FlowError> {
    match step {
        Step::Name => a.name = text(answer),
        Step::PresentingComplaint => a.presenting_complaint = text(answer),
        Step::Age => a.age = text(answer),
        Step::Sex => {
            if let Answer::Sex(sex) = answer {
                a.sex = Some(sex);
            }
        }
        Step::PastHistory => a.past_history = text(answer),
        Step::FamilyHistory => a.family_history = text(answer),
        Step::Medications => a.medications = text(answer),
        Step::Allergies => a.allergies = text(answer),
        Step::Investigations => a.investigations = text(answer),
        other => return Err(FlowError::StepNotInFlow(other)),
    }
    Ok(())
}

fn record_sexual_health(
    a: &mut SexualHealthIntake,
    step: Step,
    answer: Answer,
) -> Result<(), FlowError> {
    match (step, answer) {
        (Step::Name, answer) => a.name = text(answer),
        (Step::DateOfBirth, Answer::Date(d)) => a.date_of_birth = Some(d),
        (Step::PhoneNumber, answer) => a.phone_number = text(answer),
        (Step::NeedsTranslator, answer) => a.needs_translator = yes_no(answer),
        (Step::TranslatorLanguage, answer) => a.translator_language = text(answer),
        (Step::Sex, Answer::Sex(sex)) => a.sex = Some(sex),
        (Step::HasSymptoms, answer) => a.has_symptoms = yes_no(answer),
        (Step::SymptomDetails, answer) => a.symptom_details = text(answer),
        (Step::SymptomDuration, answer) => a.symptom_duration = text(answer),
        (Step::EmergencyContraception, answer) => a.emergency_contraception = yes_no(answer),
        (Step::LastMenstrualPeriod, Answer::Date(d)) => a.last_menstrual_period = Some(d),
        (Step::MedicalHistory, answer) => a.medical_history = text(answer),
        (Step::Smoking, answer) => a.smoking = text(answer),
        (Step::Drugs, answer) => a.drugs = text(answer),
        (Step::Alcohol, answer) => a.alcohol = text(answer),
        (other, _) => return Err(FlowError::StepNotInFlow(other)),
    }
    Ok(())
}

fn yes_no_label(value: bool, language: Language) -> &'static str {
    match (language, value) {
        (Language::English, true) => "Yes",
        (Language::English, false) => "No",
        (Language::French, true) => "Oui",
        (Language::French, false) => "Non",
    }
}

fn summary_lines(answers: &IntakeAnswers, language: Language) -> Vec<(&'static str, String)> {
    let fr = language == Language::French;
    let label = |en: &'static str, french: &'static str| if fr { french } else { en };
    let mut lines = Vec::new();
    let mut push = |l: &'static str, v: Option<String>| {
        if let Some(v) = v {
            lines.push((l, v));
        }
    };

    match answers {
        IntakeAnswers::Gp(a) => {
            push(label("Name", "Nom"), a.name.clone());
            push(label("Age", "Âge"), a.age.clone());
            push(label("Sex", "Sexe"), a.sex.map(|s| s.label(language).to_string()));
            push(
                label("Presenting Complaint", "Motif de Consultation"),
                a.presenting_complaint.clone(),
            );
            push(label("Past History", "Antécédents Médicaux"), a.past_history.clone());
            push(label("Family History", "Antécédents Familiaux"), a.family_history.clone());
            push(label("Medications", "Médicaments"), a.medications.clone());
            push(label("Allergies", "Allergies"), a.allergies.clone());
            push(label("Investigations", "Examens"), a.investigations.clone());
        }
        IntakeAnswers::SexualHealth(a) => {
            let flag = |v: Option<bool>| v.map(|b| yes_no_label(b, language).to_string());
            push(label("Name", "Nom"), a.name.clone());
            push(
                label("Date of Birth", "Date de Naissance"),
                a.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            );
            push(label("Phone Number", "Téléphone"), a.phone_number.clone());
            push(label("Translator Needed", "Interprète Requis"), flag(a.needs_translator));
            push(
                label("Translator Language", "Langue de l'Interprète"),
                a.translator_language.clone(),
            );
            push(label("Sex", "Sexe"), a.sex.map(|s| s.label(language).to_string()));
            push(label("Has Symptoms", "Symptômes Présents"), flag(a.has_symptoms));
            push(label("Symptoms", "Symptômes"), a.symptom_details.clone());
            push(label("Duration", "Durée"), a.symptom_duration.clone());
            push(
                label("Emergency Contraception", "Contraception d'Urgence"),
                flag(a.emergency_contraception),
            );
            push(
                label("Last Menstrual Period", "Dernières Règles"),
                a.last_menstrual_period.map(|d| d.format("%Y-%m-%d").to_string()),
            );
            push(label("Medical History", "Antécédents Médicaux"), a.medical_history.clone());
            push(label("Smoking", "Tabac"), a.smoking.clone());
            push(label("Drugs", "Drogues"), a.drugs.clone());
            push(label("Alcohol", "Alcool"), a.alcohol.clone());
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Answers every question the flow asks and returns the steps visited.
    fn run_sexual_health(has_symptoms: bool, sex: Sex, translator: bool) -> (IntakeFlow, Vec<Step>) {
        let mut flow = IntakeFlow::start(FlowVariant::SexualHealth);
        let mut visited = vec![];
        while flow.step.is_question() {
            visited.push(flow.step);
            let answer = match flow.step {
                Step::NeedsTranslator => Answer::YesNo(translator),
                Step::HasSymptoms => Answer::YesNo(has_symptoms),
                Step::EmergencyContraception => Answer::YesNo(false),
                Step::Sex => Answer::Sex(sex),
                Step::DateOfBirth => Answer::Date(date("1990-04-12")),
                Step::LastMenstrualPeriod => Answer::Date(date("2025-05-30")),
                _ => Answer::Text("some answer".to_string()),
            };
            flow.submit(answer).unwrap();
        }
        (flow, visited)
    }

    #[test]
    fn test_no_symptoms_never_visits_symptom_steps() {
        for sex in [Sex::Male, Sex::Female, Sex::Other] {
            for translator in [true, false] {
                let (flow, visited) = run_sexual_health(false, sex, translator);
                for skipped in [
                    Step::SymptomDetails,
                    Step::SymptomDuration,
                    Step::Smoking,
                    Step::Drugs,
                    Step::Alcohol,
                ] {
                    assert!(!visited.contains(&skipped), "visited {skipped:?}");
                }
                assert_eq!(flow.step, Step::Summary);
            }
        }
    }

    #[test]
    fn test_non_female_never_visits_last_menstrual_period() {
        for sex in [Sex::Male, Sex::Other] {
            for has_symptoms in [true, false] {
                let (_, visited) = run_sexual_health(has_symptoms, sex, false);
                assert!(!visited.contains(&Step::LastMenstrualPeriod));
            }
        }
        let (_, visited) = run_sexual_health(false, Sex::Female, false);
        assert!(visited.contains(&Step::LastMenstrualPeriod));
    }

    #[test]
    fn test_symptoms_path_visits_lifestyle_steps_in_order() {
        let (_, visited) = run_sexual_health(true, Sex::Female, false);
        assert_eq!(
            visited,
            vec![
                Step::Name,
                Step::DateOfBirth,
                Step::PhoneNumber,
                Step::NeedsTranslator,
                Step::Sex,
                Step::HasSymptoms,
                Step::SymptomDetails,
                Step::SymptomDuration,
                Step::EmergencyContraception,
                Step::LastMenstrualPeriod,
                Step::MedicalHistory,
                Step::Smoking,
                Step::Drugs,
                Step::Alcohol,
            ]
        );
    }

    #[test]
    fn test_translator_language_only_when_needed() {
        let (_, visited) = run_sexual_health(false, Sex::Male, true);
        assert!(visited.contains(&Step::TranslatorLanguage));
        let (_, visited) = run_sexual_health(false, Sex::Male, false);
        assert!(!visited.contains(&Step::TranslatorLanguage));
    }

    #[test]
    fn test_empty_answer_does_not_advance() {
        let mut flow = IntakeFlow::start(FlowVariant::Gp);
        assert_eq!(
            flow.submit(Answer::Text("   ".to_string())),
            Err(FlowError::EmptyAnswer)
        );
        assert_eq!(flow.step, Step::Name);
    }

    #[test]
    fn test_wrong_answer_kind_rejected() {
        let mut flow = IntakeFlow::start(FlowVariant::Gp);
        let err = flow.submit(Answer::YesNo(true)).unwrap_err();
        assert!(matches!(err, FlowError::UnexpectedAnswer { step: Step::Name, .. }));
    }

    #[test]
    fn test_gp_flow_and_summary() {
        let mut flow = IntakeFlow::start(FlowVariant::Gp);
        flow.submit(Answer::Text("Jane Doe".to_string())).unwrap();
        flow.submit(Answer::Text("Sore throat for 3 days".to_string())).unwrap();
        flow.submit(Answer::Text("34".to_string())).unwrap();
        flow.submit(Answer::Sex(Sex::Female)).unwrap();
        for _ in 0..5 {
            flow.submit(Answer::Text("None".to_string())).unwrap();
        }
        assert_eq!(flow.step, Step::Summary);
        assert!(!flow.summary_confirmed());

        let summary = flow.summary_text(Language::English);
        assert!(summary.starts_with("Name: Jane Doe\nAge: 34\nSex: Female"));
        assert!(summary.contains("Presenting Complaint: Sore throat for 3 days"));

        let french = flow.summary_text(Language::French);
        assert!(french.contains("Nom: Jane Doe"));
        assert!(french.contains("Sexe: Femme"));

        assert_eq!(flow.advance_from(Step::Summary), Ok(Step::Classification));
        assert!(flow.summary_confirmed());
        assert_eq!(
            flow.submit(Answer::Text("late".to_string())),
            Err(FlowError::IntakeClosed)
        );
    }

    #[test]
    fn test_advance_requires_matching_step() {
        let mut flow = IntakeFlow::start(FlowVariant::Gp);
        let err = flow.advance_from(Step::Summary).unwrap_err();
        assert_eq!(
            err,
            FlowError::StepMismatch {
                expected: Step::Summary,
                actual: Step::Name
            }
        );
    }
}
