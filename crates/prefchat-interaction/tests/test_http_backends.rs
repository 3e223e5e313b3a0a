use std::sync::Arc;
use std::time::Duration;

use prefchat_core::backend::{
    GenerationBackend, GenerationRequest, LivenessProbe, ModelCatalog, PreferenceBackend,
};
use prefchat_core::error::PrefchatError;
use prefchat_core::preference::{Platform, PreferenceSnapshot, SettingValue, SnapshotStore};
use prefchat_interaction::{
    HttpLivenessProbe, HttpPreferenceBackend, OllamaGenerationBackend, OllamaModelCatalog,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(2);

fn preferences_json() -> Value {
    json!({
        "text scaling factor": {
            "lower_bound": 0.5,
            "upper_bound": 3.0,
            "current": 1.0,
            "commands": {
                "gnome": "gsettings set org.gnome.desktop.interface text-scaling-factor",
                "windows": "reg add HKCU\\Software\\Microsoft\\Accessibility /v TextScaleFactor /d"
            }
        },
        "high contrast": {
            "current": false,
            "commands": { "gnome": "gsettings set org.gnome.desktop.a11y.interface high-contrast" }
        }
    })
}

fn chat_reply(content: &str) -> Value {
    json!({
        "model": "granite3-dense:8b",
        "created_at": "2025-01-01T00:00:00Z",
        "message": { "role": "assistant", "content": content },
        "done": true
    })
}

// ── Model catalog ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_models_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "beta:latest", "size": 1 },
                { "name": "alpha:7b", "size": 2 },
                { "name": "beta:latest", "size": 1 }
            ]
        })))
        .mount(&server)
        .await;

    let catalog = OllamaModelCatalog::new(server.uri(), TIMEOUT).unwrap();
    let models = catalog.list_models().await.unwrap();
    assert_eq!(models, vec!["beta:latest", "alpha:7b"]);
}

#[tokio::test]
async fn test_empty_catalog_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let catalog = OllamaModelCatalog::new(server.uri(), TIMEOUT).unwrap();
    assert!(catalog.list_models().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_unreachable_is_transport_error() {
    let catalog = OllamaModelCatalog::new("http://127.0.0.1:59998", TIMEOUT).unwrap();
    let err = catalog.list_models().await.unwrap_err();
    assert!(err.is_transport(), "Expected transport error, got: {err:?}");
}

// ── Preferences ───────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_wrapped_preferences() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/preferences/alice"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "preferences": preferences_json() })),
        )
        .mount(&server)
        .await;

    let backend = HttpPreferenceBackend::new(server.uri(), "alice", TIMEOUT).unwrap();
    let snapshot = backend.fetch_preferences().await.unwrap();

    let expected: PreferenceSnapshot = serde_json::from_value(preferences_json()).unwrap();
    assert_eq!(snapshot, expected);
    assert_eq!(
        snapshot.get("text scaling factor").unwrap().lower_bound,
        Some(0.5)
    );
}

#[tokio::test]
async fn test_fetch_bare_preferences() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/preferences/bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(preferences_json()))
        .mount(&server)
        .await;

    let backend = HttpPreferenceBackend::new(server.uri(), "bob", TIMEOUT).unwrap();
    let snapshot = backend.fetch_preferences().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(
        snapshot.get("high contrast").unwrap().current,
        SettingValue::Bool(false)
    );
}

#[tokio::test]
async fn test_fetch_preferences_server_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/preferences/alice"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "detail": "maintenance" })))
        .mount(&server)
        .await;

    let backend = HttpPreferenceBackend::new(server.uri(), "alice", TIMEOUT).unwrap();
    let err = backend.fetch_preferences().await.unwrap_err();
    assert_eq!(err, PrefchatError::backend(503, "maintenance"));
}

#[tokio::test]
async fn test_store_preferences_sends_username_and_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/preferences/update"))
        .and(body_partial_json(json!({
            "username": "alice",
            "preferences": { "high contrast": { "current": true } }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot: PreferenceSnapshot = serde_json::from_value(preferences_json()).unwrap();
    let updated = snapshot
        .with_current("high contrast", SettingValue::Bool(true))
        .unwrap();

    let backend = HttpPreferenceBackend::new(server.uri(), "alice", TIMEOUT).unwrap();
    backend.store_preferences(&updated).await.unwrap();
}

// ── Liveness ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_liveness_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let probe = HttpLivenessProbe::new(&server.uri(), "/health", TIMEOUT).unwrap();
    assert!(probe.check_liveness().await);

    let missing = HttpLivenessProbe::new(&server.uri(), "/nope", TIMEOUT).unwrap();
    assert!(!missing.check_liveness().await);
}

#[tokio::test]
async fn test_liveness_timeout_is_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let probe = HttpLivenessProbe::new(&server.uri(), "/health", Duration::from_millis(200)).unwrap();
    assert!(!probe.check_liveness().await);
}

// ── Generation ────────────────────────────────────────────────────

async fn generation_backend(server: &MockServer) -> OllamaGenerationBackend {
    let store = SnapshotStore::new();
    store
        .replace(serde_json::from_value(preferences_json()).unwrap())
        .await;
    OllamaGenerationBackend::new(server.uri(), TIMEOUT, Some(Platform::Gnome), store).unwrap()
}

#[tokio::test]
async fn test_generate_extracts_message_and_command() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "granite3-dense:8b", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"message":"Done","command":"set-font-scale 1.5"}"#,
        )))
        .mount(&server)
        .await;

    let backend = generation_backend(&server).await;
    let result = backend
        .generate(GenerationRequest {
            model: "granite3-dense:8b".to_string(),
            prompt: "make the text bigger".to_string(),
            session_id: "s-1".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.message.role, "assistant");
    assert_eq!(result.message.content, "Done");
    assert_eq!(result.command.as_deref(), Some("set-font-scale 1.5"));
}

#[tokio::test]
async fn test_generate_blank_command_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"message":"Already at maximum","command":"  "}"#)),
        )
        .mount(&server)
        .await;

    let backend = generation_backend(&server).await;
    let result = backend
        .generate(GenerationRequest {
            model: "m".to_string(),
            prompt: "bigger text".to_string(),
            session_id: "s-1".to_string(),
        })
        .await
        .unwrap();
    assert!(result.command.is_none());
}

#[tokio::test]
async fn test_generate_history_is_per_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"message":"ok","command":""}"#)),
        )
        .mount(&server)
        .await;

    let backend = generation_backend(&server).await;
    for (session, prompt) in [("s-1", "text bigger"), ("s-1", "a bit more"), ("s-2", "contrast")] {
        backend
            .generate(GenerationRequest {
                model: "m".to_string(),
                prompt: prompt.to_string(),
                session_id: session.to_string(),
            })
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let bodies: Vec<Value> = requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    let roles = |body: &Value| -> Vec<String> {
        body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect()
    };

    assert_eq!(roles(&bodies[0]), vec!["system", "user"]);
    assert_eq!(roles(&bodies[1]), vec!["system", "user", "assistant", "user"]);
    // a new session starts over
    assert_eq!(roles(&bodies[2]), vec!["system", "user"]);

    // the system prompt only carries the platform's commands
    let system = bodies[0]["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("text-scaling-factor"));
    assert!(!system.contains("TextScaleFactor"));

    // the best-matching snippet is reused when the prompt matches nothing
    let second_user = bodies[1]["messages"][3]["content"].as_str().unwrap();
    assert!(second_user.contains("text scaling factor"));
    assert!(second_user.ends_with("a bit more"));
}

fn request(session: &str, prompt: &str) -> GenerationRequest {
    GenerationRequest {
        model: "m".to_string(),
        prompt: prompt.to_string(),
        session_id: session.to_string(),
    }
}

#[tokio::test]
async fn test_generate_keeps_only_latest_session_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"message":"ok","command":""}"#)),
        )
        .mount(&server)
        .await;

    let backend = generation_backend(&server).await;
    for n in 0..100 {
        backend
            .generate(request(&format!("s-{n}"), "text bigger"))
            .await
            .unwrap();
    }
    assert_eq!(backend.active_session().await.as_deref(), Some("s-99"));

    // returning to an evicted session starts over
    backend.generate(request("s-0", "text bigger")).await.unwrap();
    let requests = server.received_requests().await.unwrap();
    let last: Value = serde_json::from_slice(&requests.last().unwrap().body).unwrap();
    assert_eq!(last["messages"].as_array().unwrap().len(), 2);

    backend.end_session("s-1").await;
    assert_eq!(backend.active_session().await.as_deref(), Some("s-0"));
    backend.end_session("s-0").await;
    assert!(backend.active_session().await.is_none());
}

#[tokio::test]
async fn test_late_reply_does_not_restore_replaced_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("slow question"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"message":"late","command":""}"#))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"message":"ok","command":""}"#)),
        )
        .mount(&server)
        .await;

    let backend = Arc::new(generation_backend(&server).await);
    let slow = {
        let backend = backend.clone();
        tokio::spawn(async move { backend.generate(request("old", "slow question")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    backend.generate(request("new", "contrast")).await.unwrap();

    slow.await.unwrap().unwrap();
    assert_eq!(backend.active_session().await.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_generate_unparsable_reply_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("I'd rather not.")))
        .mount(&server)
        .await;

    let backend = generation_backend(&server).await;
    let err = backend
        .generate(GenerationRequest {
            model: "m".to_string(),
            prompt: "text bigger".to_string(),
            session_id: "s-1".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PrefchatError::Serialization { .. }));
}

#[tokio::test]
async fn test_generate_unknown_model_surfaces_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "model 'ghost' not found" })),
        )
        .mount(&server)
        .await;

    let backend = generation_backend(&server).await;
    let err = backend
        .generate(GenerationRequest {
            model: "ghost".to_string(),
            prompt: "text bigger".to_string(),
            session_id: "s-1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, PrefchatError::backend(404, "model 'ghost' not found"));
}
