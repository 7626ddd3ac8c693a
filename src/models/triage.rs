use serde::{Deserialize, Serialize};

/// Triage priority assigned to an intake. Each flow variant draws from its
/// own subset, see [`FlowVariant::priorities`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
    #[serde(rename = "Routine - Symptoms")]
    RoutineSymptoms,
    #[serde(rename = "Routine - No Symptoms")]
    RoutineNoSymptoms,
    #[serde(rename = "Contraception Referral")]
    ContraceptionReferral,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
            Priority::RoutineSymptoms => "Routine - Symptoms",
            Priority::RoutineNoSymptoms => "Routine - No Symptoms",
            Priority::ContraceptionReferral => "Contraception Referral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            "Urgent" => Some(Priority::Urgent),
            "Routine - Symptoms" => Some(Priority::RoutineSymptoms),
            "Routine - No Symptoms" => Some(Priority::RoutineNoSymptoms),
            "Contraception Referral" => Some(Priority::ContraceptionReferral),
            _ => None,
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::French, Priority::Low) => "Faible",
            (Language::French, Priority::Medium) => "Moyen",
            (Language::French, Priority::High) => "Élevé",
            (Language::French, Priority::RoutineSymptoms) => "Routine - Avec symptômes",
            (Language::French, Priority::RoutineNoSymptoms) => "Routine - Sans symptômes",
            (Language::French, Priority::ContraceptionReferral) => "Orientation contraception",
            _ => self.as_str(),
        }
    }

    pub fn urgency(&self) -> Urgency {
        match self {
            Priority::High | Priority::Urgent => Urgency::Urgent,
            _ => Urgency::Routine,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mode {
    Telephone,
    #[serde(rename = "Face-to-Face")]
    FaceToFace,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Telephone => "Telephone",
            Mode::FaceToFace => "Face-to-Face",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Telephone" => Some(Mode::Telephone),
            "Face-to-Face" => Some(Mode::FaceToFace),
            _ => None,
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::French, Mode::Telephone) => "Téléphone",
            (Language::French, Mode::FaceToFace) => "En personne",
            _ => self.as_str(),
        }
    }
}

/// Coarse bucket used for internal reporting; stored as the appointment's
/// severity classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Routine,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Urgent => "urgent",
            Urgency::Routine => "routine",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationResult {
    pub priority: Priority,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "french" | "fr" | "français" | "francais" => Language::French,
            _ => Language::English,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    #[default]
    Gp,
    SexualHealth,
}

impl FlowVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowVariant::Gp => "gp",
            FlowVariant::SexualHealth => "sexual_health",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "sexual_health" => FlowVariant::SexualHealth,
            _ => FlowVariant::Gp,
        }
    }

    pub fn priorities(&self) -> &'static [Priority] {
        match self {
            FlowVariant::Gp => &[Priority::High, Priority::Medium, Priority::Low],
            FlowVariant::SexualHealth => &[
                Priority::Urgent,
                Priority::RoutineSymptoms,
                Priority::RoutineNoSymptoms,
                Priority::ContraceptionReferral,
            ],
        }
    }

    pub fn modes(&self) -> &'static [Mode] {
        match self {
            FlowVariant::Gp => &[Mode::Telephone, Mode::FaceToFace],
            FlowVariant::SexualHealth => &[Mode::Telephone],
        }
    }

    /// Whether slot searches must match the classified priority bucket.
    pub fn keys_bookings_by_priority(&self) -> bool {
        matches!(self, FlowVariant::SexualHealth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_round_trips_through_storage_string() {
        for p in FlowVariant::SexualHealth.priorities() {
            assert_eq!(Priority::parse(p.as_str()), Some(*p));
        }
        assert_eq!(Priority::parse("Critical"), None);
    }

    #[test]
    fn test_urgency_mapping() {
        assert_eq!(Priority::High.urgency(), Urgency::Urgent);
        assert_eq!(Priority::Urgent.urgency(), Urgency::Urgent);
        assert_eq!(Priority::Medium.urgency(), Urgency::Routine);
        assert_eq!(Priority::ContraceptionReferral.urgency(), Urgency::Routine);
    }

    #[test]
    fn test_priority_serializes_with_display_names() {
        let json = serde_json::to_string(&Priority::RoutineNoSymptoms).unwrap();
        assert_eq!(json, "\"Routine - No Symptoms\"");
        let mode: Mode = serde_json::from_str("\"Face-to-Face\"").unwrap();
        assert_eq!(mode, Mode::FaceToFace);
    }

    #[test]
    fn test_single_mode_variant() {
        assert_eq!(FlowVariant::SexualHealth.modes(), &[Mode::Telephone]);
        assert!(FlowVariant::SexualHealth.keys_bookings_by_priority());
        assert!(!FlowVariant::Gp.keys_bookings_by_priority());
    }
}
