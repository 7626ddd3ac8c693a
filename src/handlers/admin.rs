use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, Language};
use crate::services::ai::classifier::ExternalCallFailure;
use crate::services::ai::profile;
use crate::services::catalog::{self, CatalogSpec};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub limit: Option<i64>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let appointments = {
        let db = state.db.lock().unwrap();
        queries::list_appointments(&db, limit)?
    };

    Ok(Json(appointments))
}

// GET /api/admin/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    queries::get_appointment(&db, id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))
}

// POST /api/admin/appointments/:id/profile
#[derive(Deserialize, Default)]
pub struct ProfileRequest {
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    appointment_id: i64,
    profile: String,
}

pub async fn format_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<ProfileRequest>>,
) -> Result<Json<ProfileResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let Json(body) = body.unwrap_or_default();
    let language = body
        .language
        .as_deref()
        .map(Language::parse)
        .unwrap_or_default();

    let appointment = {
        let db = state.db.lock().unwrap();
        queries::get_appointment(&db, id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;

    let profile = profile::format_profile(state.llm.as_ref(), &appointment, language)
        .await
        .map_err(|e| {
            tracing::warn!(appointment_id = id, error = %e, "profile formatting failed");
            AppError::ExternalCall(ExternalCallFailure(e.to_string()))
        })?;

    Ok(Json(ProfileResponse {
        appointment_id: id,
        profile,
    }))
}

// POST /api/admin/catalog/reset
pub async fn reset_catalog(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let spec = CatalogSpec::for_variant(state.config.flow_variant, &state.config.clinics);
    let slots = {
        let db = state.db.lock().unwrap();
        catalog::generate_catalog(&db, &spec)?
    };
    tracing::warn!(slots, "slot catalog reset by admin");

    Ok(Json(serde_json::json!({"ok": true, "slots": slots})))
}
