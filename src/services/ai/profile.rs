use crate::models::{Appointment, Language};
use crate::services::ai::{ChatOptions, LlmProvider, Message};

/// Flattens a saved appointment into the plain record handed to the model.
pub fn appointment_record(appointment: &Appointment) -> String {
    let d = &appointment.details;
    let mut lines = vec![
        format!("Appointment ID: {}", appointment.id),
        format!("Name: {}", d.name),
        format!("Priority: {}", d.priority.as_str()),
        format!("Severity: {}", d.severity_classification.as_str()),
        format!("Clinic: {}", d.clinic),
        format!("Time preference: {}", d.time_preference.as_str()),
        format!("Consultation mode: {}", d.mode.as_str()),
    ];
    if let Some(phone) = &d.phone_number {
        lines.push(format!("Phone: {phone}"));
    }
    if let Some(dob) = d.date_of_birth {
        lines.push(format!("Date of birth: {}", dob.format("%Y-%m-%d")));
    }
    if let Some(language) = &d.translator_language {
        lines.push(format!("Translator language: {language}"));
    }
    lines.push(format!("Summary:\n{}", d.symptoms_summary));
    lines.join("\n")
}

pub async fn format_profile(
    llm: &dyn LlmProvider,
    appointment: &Appointment,
    language: Language,
) -> anyhow::Result<String> {
    let record = appointment_record(appointment);
    let prompt = match language {
        Language::English => {
            format!("Format the following patient's profile in a neat and concise way:\n{record}")
        }
        Language::French => {
            format!("Formatez le profil du patient suivant de manière soignée et concise:\n{record}")
        }
    };

    llm.chat(
        "You format clinical intake records for practice staff.",
        &[Message::user(prompt)],
        ChatOptions::default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, NewAppointment, Priority, TimeOfDay, Urgency};

    #[test]
    fn test_appointment_record_skips_missing_fields() {
        let appointment = Appointment {
            id: 7,
            details: NewAppointment {
                name: "Sam Jones".to_string(),
                priority: Priority::High,
                clinic: "Clinic A".to_string(),
                time_preference: TimeOfDay::Morning,
                mode: Mode::FaceToFace,
                phone_number: None,
                symptoms_summary: "Name: Sam Jones\nAge: 40".to_string(),
                severity_classification: Urgency::Urgent,
                date_of_birth: None,
                has_symptoms: None,
                emergency_contraception: None,
                needs_translator: None,
                translator_language: None,
                slot_id: 3,
            },
            created_at: chrono::Utc::now().naive_utc(),
        };

        let record = appointment_record(&appointment);
        assert!(record.contains("Appointment ID: 7"));
        assert!(record.contains("Priority: High"));
        assert!(record.contains("Consultation mode: Face-to-Face"));
        assert!(!record.contains("Phone:"));
        assert!(record.ends_with("Summary:\nName: Sam Jones\nAge: 40"));
    }
}
