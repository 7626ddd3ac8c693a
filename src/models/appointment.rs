use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Mode, Priority, TimeOfDay, Urgency};

/// Fields captured when a slot is booked. Variant-specific flags stay `None`
/// for intakes that never ask them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub name: String,
    pub priority: Priority,
    pub clinic: String,
    pub time_preference: TimeOfDay,
    pub mode: Mode,
    pub phone_number: Option<String>,
    pub symptoms_summary: String,
    pub severity_classification: Urgency,
    pub date_of_birth: Option<NaiveDate>,
    pub has_symptoms: Option<bool>,
    pub emergency_contraception: Option<bool>,
    pub needs_translator: Option<bool>,
    pub translator_language: Option<String>,
    pub slot_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewAppointment,
    pub created_at: NaiveDateTime,
}
