use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{FlowVariant, Language};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::English, Sex::Male) => "Male",
            (Language::English, Sex::Female) => "Female",
            (Language::English, Sex::Other) => "Other",
            (Language::French, Sex::Male) => "Homme",
            (Language::French, Sex::Female) => "Femme",
            (Language::French, Sex::Other) => "Autre",
        }
    }
}

/// One typed value submitted by the form host for the current step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    YesNo(bool),
    Sex(Sex),
    Date(NaiveDate),
}

impl Answer {
    pub fn kind(&self) -> AnswerKind {
        match self {
            Answer::Text(_) => AnswerKind::Text,
            Answer::YesNo(_) => AnswerKind::YesNo,
            Answer::Sex(_) => AnswerKind::Sex,
            Answer::Date(_) => AnswerKind::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    Text,
    YesNo,
    Sex,
    Date,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Name,
    PresentingComplaint,
    Age,
    DateOfBirth,
    PhoneNumber,
    NeedsTranslator,
    TranslatorLanguage,
    Sex,
    HasSymptoms,
    SymptomDetails,
    SymptomDuration,
    EmergencyContraception,
    LastMenstrualPeriod,
    PastHistory,
    FamilyHistory,
    Medications,
    Allergies,
    Investigations,
    MedicalHistory,
    Smoking,
    Drugs,
    Alcohol,
    Summary,
    Classification,
    BookingDetails,
    Booking,
    Complete,
}

impl Step {
    /// The answer kind a question step accepts; `None` for the stages after
    /// the questions.
    pub fn answer_kind(&self) -> Option<AnswerKind> {
        match self {
            Step::NeedsTranslator | Step::HasSymptoms | Step::EmergencyContraception => {
                Some(AnswerKind::YesNo)
            }
            Step::Sex => Some(AnswerKind::Sex),
            Step::DateOfBirth | Step::LastMenstrualPeriod => Some(AnswerKind::Date),
            Step::Summary
            | Step::Classification
            | Step::BookingDetails
            | Step::Booking
            | Step::Complete => None,
            _ => Some(AnswerKind::Text),
        }
    }

    pub fn is_question(&self) -> bool {
        self.answer_kind().is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GpIntake {
    pub name: Option<String>,
    pub presenting_complaint: Option<String>,
    pub age: Option<String>,
    pub sex: Option<Sex>,
    pub past_history: Option<String>,
    pub family_history: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub investigations: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SexualHealthIntake {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub needs_translator: Option<bool>,
    pub translator_language: Option<String>,
    pub sex: Option<Sex>,
    pub has_symptoms: Option<bool>,
    pub symptom_details: Option<String>,
    pub symptom_duration: Option<String>,
    pub emergency_contraception: Option<bool>,
    pub last_menstrual_period: Option<NaiveDate>,
    pub medical_history: Option<String>,
    pub smoking: Option<String>,
    pub drugs: Option<String>,
    pub alcohol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum IntakeAnswers {
    Gp(GpIntake),
    SexualHealth(SexualHealthIntake),
}

impl IntakeAnswers {
    pub fn new(variant: FlowVariant) -> Self {
        match variant {
            FlowVariant::Gp => IntakeAnswers::Gp(GpIntake::default()),
            FlowVariant::SexualHealth => IntakeAnswers::SexualHealth(SexualHealthIntake::default()),
        }
    }

    pub fn variant(&self) -> FlowVariant {
        match self {
            IntakeAnswers::Gp(_) => FlowVariant::Gp,
            IntakeAnswers::SexualHealth(_) => FlowVariant::SexualHealth,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            IntakeAnswers::Gp(a) => a.name.as_deref(),
            IntakeAnswers::SexualHealth(a) => a.name.as_deref(),
        }
    }
}

/// Current step plus accumulated answers. The whole intake state; nothing
/// about the flow lives outside this value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeFlow {
    pub answers: IntakeAnswers,
    pub step: Step,
}
