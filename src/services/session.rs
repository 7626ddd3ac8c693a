use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Answer, BookingPreferences, IntakeAnswers, IntakeFlow, Language, NewAppointment, Session,
    Slot, Step,
};
use crate::services::ai::classifier;
use crate::services::booking::{self, tick_times, SlotQuery};
use crate::services::catalog::{self, CatalogSpec};
use crate::services::intake::FlowError;
use crate::state::AppState;

pub fn start_session(state: &Arc<AppState>, language: Language) -> Result<Session, AppError> {
    let now = Utc::now().naive_utc();
    let session = Session {
        id: uuid::Uuid::new_v4().to_string(),
        language,
        flow: IntakeFlow::start(state.config.flow_variant),
        classification_response: None,
        classification: None,
        classification_error: None,
        booking: None,
        appointment_id: None,
        created_at: now,
        updated_at: now,
    };

    save(state, &session)?;
    tracing::info!(session_id = %session.id, variant = session.flow.variant().as_str(), "session started");
    Ok(session)
}

pub fn load_session(state: &Arc<AppState>, id: &str) -> Result<Session, AppError> {
    let db = state.db.lock().unwrap();
    queries::get_session(&db, id)?.ok_or_else(|| AppError::NotFound(format!("session {id}")))
}

fn save(state: &Arc<AppState>, session: &Session) -> Result<(), AppError> {
    let db = state.db.lock().unwrap();
    queries::save_session(&db, session)?;
    Ok(())
}

fn touch_and_save(state: &Arc<AppState>, session: &mut Session) -> Result<(), AppError> {
    session.updated_at = Utc::now().naive_utc();
    save(state, session)
}

pub fn submit_answer(
    state: &Arc<AppState>,
    id: &str,
    answer: Answer,
) -> Result<Session, AppError> {
    let mut session = load_session(state, id)?;
    let answered = session.flow.step;
    let next = session.flow.submit(answer)?;
    tracing::debug!(session_id = %id, ?answered, ?next, "answer recorded");

    touch_and_save(state, &mut session)?;
    Ok(session)
}

pub fn confirm_summary(state: &Arc<AppState>, id: &str) -> Result<Session, AppError> {
    let mut session = load_session(state, id)?;
    session.flow.advance_from(Step::Summary)?;
    touch_and_save(state, &mut session)?;
    Ok(session)
}

/// Runs triage for a confirmed summary. The model is called at most once per
/// attempt: a stored classification or cached raw response is reused.
pub async fn classify_session(state: &Arc<AppState>, id: &str) -> Result<Session, AppError> {
    let mut session = load_session(state, id)?;
    require_step(&session, Step::Classification)?;
    if session.classification.is_some() {
        return Ok(session);
    }

    let summary = session.flow.summary_text(session.language);
    let classification = classifier::classify(
        state.llm.as_ref(),
        &session.flow.answers,
        &summary,
        session.language,
        session.classification_response.as_deref(),
        Duration::from_secs(state.config.llm_timeout_secs),
    )
    .await?;

    tracing::info!(
        session_id = %id,
        priority = classification.result.priority.as_str(),
        mode = classification.result.mode.as_str(),
        urgency = classification.urgency.as_str(),
        fallback = classification.parse_error.is_some(),
        "intake classified"
    );

    session.classification_response = classification.raw_response;
    session.classification = Some(classification.result);
    session.classification_error = classification.parse_error.map(|e| e.to_string());
    touch_and_save(state, &mut session)?;
    Ok(session)
}

/// Leaves the classification step; the cached model response is dropped so a
/// later attempt gets a fresh call.
pub fn continue_to_booking(state: &Arc<AppState>, id: &str) -> Result<Session, AppError> {
    let mut session = load_session(state, id)?;
    if session.flow.step == Step::Classification && session.classification.is_none() {
        return Err(AppError::InvalidRequest(
            "intake has not been classified yet".to_string(),
        ));
    }
    session.flow.advance_from(Step::Classification)?;
    session.classification_response = None;
    touch_and_save(state, &mut session)?;
    Ok(session)
}

pub fn submit_booking_details(
    state: &Arc<AppState>,
    id: &str,
    preferences: BookingPreferences,
) -> Result<Session, AppError> {
    let mut session = load_session(state, id)?;
    require_step(&session, Step::BookingDetails)?;
    let variant = session.flow.variant();

    if !state.config.clinics.contains(&preferences.clinic) {
        return Err(AppError::InvalidRequest(format!(
            "unknown clinic: {}",
            preferences.clinic
        )));
    }
    if !variant.modes().contains(&preferences.mode) {
        return Err(AppError::InvalidRequest(format!(
            "consultation mode {} is not offered",
            preferences.mode.as_str()
        )));
    }
    session.flow.advance_from(Step::BookingDetails)?;
    session.booking = Some(preferences);

    if state.config.reset_catalog_on_booking {
        tracing::warn!(session_id = %id, "RESET_CATALOG_ON_BOOKING is set, wiping all bookings");
        let spec = CatalogSpec::for_variant(variant, &state.config.clinics);
        let db = state.db.lock().unwrap();
        catalog::generate_catalog(&db, &spec)?;
    }

    touch_and_save(state, &mut session)?;
    Ok(session)
}

fn slot_query(session: &Session) -> Result<SlotQuery, AppError> {
    let classification = session
        .classification
        .ok_or_else(|| AppError::InvalidRequest("intake has not been classified".to_string()))?;
    let booking = session
        .booking
        .as_ref()
        .ok_or_else(|| AppError::InvalidRequest("booking details are missing".to_string()))?;

    let priority = session
        .flow
        .variant()
        .keys_bookings_by_priority()
        .then_some(classification.priority);

    Ok(SlotQuery {
        clinic: booking.clinic.clone(),
        time_of_day: booking.time_of_day,
        mode: booking.mode,
        priority,
    })
}

fn require_step(session: &Session, step: Step) -> Result<(), AppError> {
    if session.flow.step != step {
        return Err(AppError::Flow(FlowError::StepMismatch {
            expected: step,
            actual: session.flow.step,
        }));
    }
    Ok(())
}

/// Free slots for an already loaded session at the booking step.
pub fn available_slots(state: &Arc<AppState>, session: &Session) -> Result<Vec<Slot>, AppError> {
    require_step(session, Step::Booking)?;
    let query = slot_query(session)?;

    let db = state.db.lock().unwrap();
    let slots = booking::find_available_slots(&db, &query)?;
    if slots.is_empty() {
        tracing::info!(session_id = %session.id, clinic = %query.clinic, "no slots match");
    }
    Ok(slots)
}

fn slot_matches(slot: &Slot, query: &SlotQuery) -> bool {
    slot.clinic == query.clinic
        && slot.mode == query.mode
        && query.priority.map_or(true, |p| slot.priority == p)
        && tick_times(query.time_of_day).contains(&slot.time)
}

fn new_appointment(
    session: &Session,
    query: &SlotQuery,
    slot_id: i64,
) -> Result<NewAppointment, AppError> {
    let classification = session
        .classification
        .ok_or_else(|| AppError::InvalidRequest("intake has not been classified".to_string()))?;
    let name = session.flow.answers.name().unwrap_or_default().to_string();

    let mut appointment = NewAppointment {
        name,
        priority: classification.priority,
        clinic: query.clinic.clone(),
        time_preference: query.time_of_day,
        mode: query.mode,
        phone_number: None,
        symptoms_summary: session.flow.summary_text(session.language),
        severity_classification: classification.priority.urgency(),
        date_of_birth: None,
        has_symptoms: None,
        emergency_contraception: None,
        needs_translator: None,
        translator_language: None,
        slot_id,
    };

    if let IntakeAnswers::SexualHealth(a) = &session.flow.answers {
        appointment.phone_number = a.phone_number.clone();
        appointment.date_of_birth = a.date_of_birth;
        appointment.has_symptoms = a.has_symptoms;
        appointment.emergency_contraception = a.emergency_contraception;
        appointment.needs_translator = a.needs_translator;
        appointment.translator_language = a.translator_language.clone();
    }

    Ok(appointment)
}

pub fn book_slot(state: &Arc<AppState>, id: &str, slot_id: i64) -> Result<Session, AppError> {
    let mut session = load_session(state, id)?;
    require_step(&session, Step::Booking)?;
    let query = slot_query(&session)?;
    let appointment = new_appointment(&session, &query, slot_id)?;

    let appointment_id = {
        let db = state.db.lock().unwrap();
        let slot = queries::get_slot(&db, slot_id)?
            .ok_or_else(|| AppError::NotFound(format!("slot {slot_id}")))?;
        if !slot_matches(&slot, &query) {
            return Err(AppError::InvalidRequest(format!(
                "slot {slot_id} does not match the booking details"
            )));
        }
        booking::book_appointment(&db, &appointment)?
    };

    tracing::info!(session_id = %id, slot_id, appointment_id, "appointment booked");

    session.appointment_id = Some(appointment_id);
    session.flow.advance_from(Step::Booking)?;
    touch_and_save(state, &mut session)?;
    Ok(session)
}
