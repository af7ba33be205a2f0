use crate::script_store::{NewScript, SavedScript};
use crate::userscript::Userscript;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use domscript_ai::{GateReport, ModelPhase};
use domscript_core::GenerationResult;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct GenerateQuery {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub message: String,
    pub id: u64,
}

#[derive(Serialize)]
pub struct SystemInfo {
    pub platform: String,
    pub arch: String,
    pub version: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub available: bool,
    pub model_phase: ModelPhase,
    pub gate: Option<GateReport>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn generate(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> ApiResult<Json<GenerationResult>> {
    // Blank prompts are not an error; the catch-all still answers them
    Ok(Json(state.generator.generate(&query.prompt).await))
}

pub async fn save_script(
    State(state): State<AppState>,
    Json(script): Json<NewScript>,
) -> ApiResult<Json<SaveResponse>> {
    let saved = state.scripts.save(script).await?;
    Ok(Json(SaveResponse {
        message: "Script saved successfully".to_string(),
        id: saved.id,
    }))
}

pub async fn get_saved_scripts(State(state): State<AppState>) -> ApiResult<Json<Vec<SavedScript>>> {
    Ok(Json(state.scripts.list().await?))
}

pub async fn export_userscript(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Userscript>> {
    let script = state
        .scripts
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Script {} not found", id)))?;

    Ok(Json(Userscript::from_script(&script)))
}

pub async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    let generator = &state.generator;
    Json(SystemInfo {
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: generator.provider_name().map(str::to_string),
        model: generator.model_name().map(str::to_string),
        available: generator.provider_available().await,
        model_phase: generator.model_phase(),
        gate: generator.gate_report().cloned(),
    })
}
