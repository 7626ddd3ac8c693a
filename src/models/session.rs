use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{ClassificationResult, IntakeFlow, Language, Mode, TimeOfDay};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingPreferences {
    pub clinic: String,
    pub time_of_day: TimeOfDay,
    pub mode: Mode,
}

/// Everything one patient interaction has accumulated. Loaded and saved
/// around every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub language: Language,
    pub flow: IntakeFlow,
    /// Raw model output for the current triage attempt; reused until the
    /// patient moves past classification.
    pub classification_response: Option<String>,
    pub classification: Option<ClassificationResult>,
    /// Set when the model output could not be parsed and the fallback pair
    /// was used.
    pub classification_error: Option<String>,
    pub booking: Option<BookingPreferences>,
    pub appointment_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
