use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    Answer, AnswerKind, BookingPreferences, FlowVariant, IntakeAnswers, Language, Mode, Priority,
    Session, Slot, Step, TimeOfDay, Urgency,
};
use crate::services::session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ClassificationView {
    priority: Priority,
    priority_label: &'static str,
    mode: Mode,
    mode_label: &'static str,
    urgency: Urgency,
}

#[derive(Serialize)]
pub struct SessionView {
    id: String,
    variant: FlowVariant,
    language: Language,
    step: Step,
    expected_answer: Option<AnswerKind>,
    answers: IntakeAnswers,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<ClassificationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking: Option<BookingPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appointment_id: Option<i64>,
}

impl From<Session> for SessionView {
    fn from(s: Session) -> Self {
        let language = s.language;
        let summary = (s.flow.step == Step::Summary || s.flow.summary_confirmed())
            .then(|| s.flow.summary_text(language));
        let classification = s.classification.map(|c| ClassificationView {
            priority: c.priority,
            priority_label: c.priority.label(language),
            mode: c.mode,
            mode_label: c.mode.label(language),
            urgency: c.priority.urgency(),
        });

        SessionView {
            id: s.id,
            variant: s.flow.variant(),
            language,
            step: s.flow.step,
            expected_answer: s.flow.step.answer_kind(),
            answers: s.flow.answers,
            summary,
            classification,
            classification_error: s.classification_error,
            booking: s.booking,
            appointment_id: s.appointment_id,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct CreateSessionRequest {
    pub language: Option<String>,
}

// POST /api/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let language = payload
        .language
        .as_deref()
        .map(Language::parse)
        .unwrap_or_default();

    let session = session::start_session(&state, language)?;
    Ok(Json(session.into()))
}

// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::load_session(&state, &id)?;
    Ok(Json(session.into()))
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub answer: Answer,
}

// POST /api/sessions/:id/answer
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::submit_answer(&state, &id, payload.answer)?;
    Ok(Json(session.into()))
}

// POST /api/sessions/:id/confirm
pub async fn confirm_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::confirm_summary(&state, &id)?;
    Ok(Json(session.into()))
}

// POST /api/sessions/:id/classify
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::classify_session(&state, &id).await?;
    Ok(Json(session.into()))
}

// POST /api/sessions/:id/continue
pub async fn continue_to_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::continue_to_booking(&state, &id)?;
    Ok(Json(session.into()))
}

#[derive(Deserialize)]
pub struct BookingDetailsRequest {
    pub clinic: String,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    pub mode: Mode,
}

// POST /api/sessions/:id/booking-details
pub async fn submit_booking_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<BookingDetailsRequest>,
) -> Result<Json<SessionView>, AppError> {
    let preferences = BookingPreferences {
        clinic: payload.clinic,
        time_of_day: payload.time_of_day,
        mode: payload.mode,
    };
    let session = session::submit_booking_details(&state, &id, preferences)?;
    Ok(Json(session.into()))
}

#[derive(Serialize)]
pub struct SlotsResponse {
    slots: Vec<Slot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

// GET /api/sessions/:id/slots
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SlotsResponse>, AppError> {
    let current = session::load_session(&state, &id)?;
    let slots = session::available_slots(&state, &current)?;

    let message = slots.is_empty().then_some(match current.language {
        Language::English => "No available slots matching your criteria.",
        Language::French => "Aucun créneau disponible correspondant à vos critères.",
    });
    Ok(Json(SlotsResponse { slots, message }))
}

#[derive(Deserialize)]
pub struct BookRequest {
    pub slot_id: i64,
}

// POST /api/sessions/:id/book
pub async fn book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<BookRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::book_slot(&state, &id, payload.slot_id)?;
    Ok(Json(session.into()))
}
