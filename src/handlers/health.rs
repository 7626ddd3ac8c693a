use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::db::queries;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let slots = {
        let db = state.db.lock().unwrap();
        queries::count_slots(&db).ok()
    };

    Json(json!({
        "status": if slots.is_some() { "ok" } else { "degraded" },
        "variant": state.config.flow_variant.as_str(),
        "slots": slots,
    }))
}
