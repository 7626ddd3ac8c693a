use std::env;

use crate::models::FlowVariant;

pub const DEFAULT_CLINICS: &[&str] = &[
    "Mortimer Market Sexual Health Centre, WC1E 6JB",
    "Dean Street Sexual Health Clinic, W1D 6AQ",
    "Archway Sexual Health Clinic, N19 5NF",
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub llm_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout_secs: u64,
    pub flow_variant: FlowVariant,
    pub clinics: Vec<String>,
    /// Regenerate the slot catalog every time a patient reaches the booking
    /// step. Wipes all existing bookings.
    pub reset_catalog_on_booking: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "triagebook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            flow_variant: env::var("FLOW_VARIANT")
                .map(|v| FlowVariant::parse(&v))
                .unwrap_or_default(),
            clinics: env::var("CLINICS")
                .ok()
                .map(|v| parse_clinics(&v))
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CLINICS.iter().map(|c| c.to_string()).collect()),
            reset_catalog_on_booking: env::var("RESET_CATALOG_ON_BOOKING")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

fn parse_clinics(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
