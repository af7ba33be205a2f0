use async_trait::async_trait;
use axum_test::TestServer;
use domscript_ai::{
    CompletionOptions, CompletionProvider, CompletionResult, Generator, GeneratorSettings,
};
use domscript_api::{create_router, AppState, ScriptStore};
use domscript_core::{DomScriptConfig, StorageConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn server_in(dir: &TempDir) -> TestServer {
    let config = DomScriptConfig {
        storage: StorageConfig {
            scripts_path: dir.path().join("working_scripts.json"),
        },
        ..Default::default()
    };
    TestServer::new(create_router(AppState::new(&config))).unwrap()
}

/// Backend that passes the gate and then answers every request the same way
struct ScriptedProvider;

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        prefix: &str,
        options: &CompletionOptions,
    ) -> CompletionResult<String> {
        if options.deterministic {
            Ok(format!("{prefix}');"))
        } else {
            Ok(format!("{prefix}\ndocument.body.style.color = 'teal';"))
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    let resp = server.get("/health").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn generate_without_model_uses_rule_engine() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    let resp = server
        .get("/generate")
        .add_query_param("prompt", "make buttons red")
        .await;
    assert_eq!(resp.status_code(), 200);

    let body: Value = resp.json();
    assert_eq!(
        body["code"],
        "document.querySelectorAll('button').forEach(btn => btn.style.backgroundColor = 'red');"
    );
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["prompt"], "make buttons red");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn generate_answers_blank_prompt_with_catch_all() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    let resp = server.get("/generate").add_query_param("prompt", "   ").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["source"], "fallback");
    let code = body["code"].as_str().unwrap();
    assert!(code.starts_with("console.log('Extension executed: "));
    assert!(code.ends_with(';'));

    // A missing parameter is still a malformed request
    let missing = server.get("/generate").expect_failure().await;
    assert_eq!(missing.status_code(), 400);
}

#[tokio::test]
async fn generate_with_model_returns_ai_snippet() {
    let dir = TempDir::new().unwrap();
    let provider: Arc<dyn CompletionProvider> = Arc::new(ScriptedProvider);
    let state = AppState::with_generator(
        Generator::new(Some(provider), GeneratorSettings::default()),
        ScriptStore::new(dir.path().join("scripts.json")),
    );
    let server = TestServer::new(create_router(state)).unwrap();

    let body: Value = server
        .get("/generate")
        .add_query_param("prompt", "make buttons red")
        .await
        .json();
    assert_eq!(body["source"], "ai");
    assert_eq!(body["code"], "document.body.style.color = 'teal';");

    let info: Value = server.get("/system_info").await.json();
    assert_eq!(info["provider"], "scripted");
    assert_eq!(info["model"], "scripted-1");
    assert_eq!(info["model_phase"], "enabled");
    assert_eq!(info["available"], true);
    assert_eq!(info["gate"]["passed"], 3);
}

#[tokio::test]
async fn saved_scripts_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    let empty: Value = server.get("/get_saved_scripts").await.json();
    assert_eq!(empty, json!([]));

    let resp = server
        .post("/save_script")
        .json(&json!({
            "prompt": "make text bold",
            "code": "document.body.style.fontWeight = 'bold';",
            "source": "fallback",
            "success": true,
            "timestamp": "2026-10-18T09:00:00Z",
            "url": "https://example.com/page"
        }))
        .await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["id"], 1);
    assert_eq!(body["message"], "Script saved successfully");

    let second: Value = server
        .post("/save_script")
        .json(&json!({"prompt": "hide images", "code": "document.body.style.color = 'red';"}))
        .await
        .json();
    assert_eq!(second["id"], 2);

    let scripts: Value = server.get("/get_saved_scripts").await.json();
    let scripts = scripts.as_array().unwrap();
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[0]["url"], "https://example.com/page");
    assert_eq!(scripts[1]["source"], "unknown");
    assert_eq!(scripts[1]["platform"], std::env::consts::OS);

    assert!(dir.path().join("working_scripts.json").exists());
}

#[tokio::test]
async fn export_userscript_for_saved_script() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    server
        .post("/save_script")
        .json(&json!({
            "prompt": "make text bold!",
            "code": "document.body.style.fontWeight = 'bold';",
            "source": "ai"
        }))
        .await;

    let resp = server.get("/export_userscript/1").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["filename"], "script_1_make_text_bold.user.js");

    let userscript = body["userscript"].as_str().unwrap();
    assert!(userscript.starts_with("// ==UserScript=="));
    assert!(userscript.contains("@name         Auto-generated: make text bold!"));
    assert!(userscript.contains("document.body.style.fontWeight = 'bold';"));
}

#[tokio::test]
async fn export_unknown_script_is_404() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    let resp = server.get("/export_userscript/42").expect_failure().await;
    assert_eq!(resp.status_code(), 404);
    let body: Value = resp.json();
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn system_info_reports_rule_only_mode() {
    let dir = TempDir::new().unwrap();
    let server = server_in(&dir);

    let info: Value = server.get("/system_info").await.json();
    assert_eq!(info["platform"], std::env::consts::OS);
    assert_eq!(info["arch"], std::env::consts::ARCH);
    assert_eq!(info["model_phase"], "disabled");
    assert!(info["provider"].is_null());
    assert_eq!(info["available"], false);
    assert!(info["gate"].is_null());
}
