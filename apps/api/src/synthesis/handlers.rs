//! Axum route handlers for the Synthesis API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::profile::ProfileContext;
use crate::state::AppState;
use crate::synthesis::kind::GenerationKind;
use crate::synthesis::pipeline::{extract_and_assemble, synthesize};
use crate::synthesis::prompt_builder::{build, PromptText};
use crate::synthesis::records::SynthesisRecord;
use crate::synthesis::sections::{find_section, normalize};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SynthesisRequest {
    pub profile: ProfileContext,
    pub request: GenerationKind,
}

#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    pub request: GenerationKind,
    pub raw_text: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub raw_text: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub label: String,
    /// `None` when the label is absent.
    pub text: Option<String>,
    pub items: Vec<String>,
}

fn validate_kind(kind: &GenerationKind) -> Result<(), AppError> {
    kind.validate().map_err(AppError::Validation)
}

fn validate(request: &SynthesisRequest) -> Result<(), AppError> {
    request.profile.validate().map_err(AppError::Validation)?;
    validate_kind(&request.request)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/synthesis
///
/// Full pipeline: prompt → provider → extraction → assembly.
/// Fails only on provider errors; any provider text yields a complete record.
pub async fn handle_synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesisRequest>,
) -> Result<Json<SynthesisRecord>, AppError> {
    validate(&request)?;

    let cancel = state.shutdown.child_token();
    let record = synthesize(
        state.client.as_ref(),
        &state.settings,
        &request.profile,
        &request.request,
        &cancel,
    )
    .await?;

    info!(kind = %request.request.tag(), id = %record.id(), "Synthesis complete");
    Ok(Json(record))
}

/// POST /api/v1/synthesis/prompt
///
/// Returns the prompt that would be sent, without calling the provider.
pub async fn handle_preview_prompt(
    Json(request): Json<SynthesisRequest>,
) -> Result<Json<PromptText>, AppError> {
    validate(&request)?;
    Ok(Json(build(&request.profile, &request.request)))
}

/// POST /api/v1/synthesis/assemble
///
/// Re-runs extraction and assembly over provider text obtained earlier.
pub async fn handle_assemble(
    Json(request): Json<AssembleRequest>,
) -> Result<Json<SynthesisRecord>, AppError> {
    validate_kind(&request.request)?;
    Ok(Json(extract_and_assemble(&request.request, &request.raw_text)))
}

/// POST /api/v1/synthesis/section
///
/// Looks up one labelled block in provider text, for checking how a response
/// was sectioned when tuning prompts.
pub async fn handle_find_section(
    Json(request): Json<SectionRequest>,
) -> Result<Json<SectionResponse>, AppError> {
    let label = request.label.trim();
    if label.is_empty() {
        return Err(AppError::Validation("label must not be empty".to_string()));
    }

    let text = normalize(&request.raw_text);
    let block = find_section(&text, label);
    Ok(Json(SectionResponse {
        label: label.to_string(),
        text: block.map(|b| b.as_scalar().to_string()),
        items: block.map(|b| b.as_list()).unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::routes::build_router;
    use crate::state::AppState;
    use crate::synthesis::pipeline::SynthesisSettings;
    use crate::synthesis::provider::testing::ScriptedClient;
    use crate::synthesis::provider::ProviderError;

    fn app_with(client: ScriptedClient) -> (Router, CancellationToken) {
        let shutdown = CancellationToken::new();
        let state = AppState {
            client: Arc::new(client),
            settings: SynthesisSettings::default(),
            shutdown: shutdown.clone(),
        };
        (build_router(state), shutdown)
    }

    async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn narrative_request() -> Value {
        json!({
            "profile": { "mood": 3, "challenges": ["work stress"] },
            "request": { "kind": "narrative", "subtype": "story" }
        })
    }

    #[tokio::test]
    async fn test_synthesize_returns_tagged_record() {
        let (app, _) = app_with(ScriptedClient::replying(
            "Title: Calm Harbor\nDescription: A grounding story.\n",
        ));
        let (status, body) = post(app, "/api/v1/synthesis", narrative_request()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "narrative");
        assert_eq!(body["subtype"], "story");
        assert_eq!(body["title"], "Calm Harbor");
        assert_eq!(body["duration_minutes"], 1);
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_profile_mood_is_rejected_before_provider() {
        let client = Arc::new(ScriptedClient::replying("unused"));
        let state = AppState {
            client: client.clone(),
            settings: SynthesisSettings::default(),
            shutdown: CancellationToken::new(),
        };
        let body = json!({
            "profile": { "mood": 9 },
            "request": { "kind": "narrative", "subtype": "meditation" }
        });
        let (status, body) = post(build_router(state), "/api/v1/synthesis", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_homework_duration_out_of_range_is_rejected() {
        let (app, _) = app_with(ScriptedClient::replying("unused"));
        let body = json!({
            "profile": { "mood": 2 },
            "request": {
                "kind": "homework",
                "homework_type": "journaling",
                "duration_days": 0
            }
        });
        let (status, body) = post(app, "/api/v1/synthesis", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("duration_days"));
    }

    #[tokio::test]
    async fn test_rate_limited_provider_maps_to_429_with_kind() {
        let (app, _) = app_with(ScriptedClient::new(vec![Err(ProviderError::RateLimited)]));
        let (status, body) = post(app, "/api/v1/synthesis", narrative_request()).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "GENERATION_RATE_LIMITED");
        assert_eq!(body["error"]["kind"], "narrative");
    }

    #[tokio::test]
    async fn test_unavailable_provider_maps_to_502() {
        let (app, _) = app_with(ScriptedClient::new(vec![Err(ProviderError::Unavailable(
            "connection refused".into(),
        ))]));
        let (status, body) = post(app, "/api/v1/synthesis", narrative_request()).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "GENERATION_FAILED");
    }

    #[tokio::test]
    async fn test_shutdown_cancels_new_requests() {
        let (app, shutdown) = app_with(ScriptedClient::replying("Title: Unused"));
        shutdown.cancel();
        let (status, body) = post(app, "/api/v1/synthesis", narrative_request()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "GENERATION_CANCELLED");
    }

    #[tokio::test]
    async fn test_prompt_preview_does_not_call_provider() {
        let client = Arc::new(ScriptedClient::replying("unused"));
        let state = AppState {
            client: client.clone(),
            settings: SynthesisSettings::default(),
            shutdown: CancellationToken::new(),
        };
        let (status, body) =
            post(build_router(state), "/api/v1/synthesis/prompt", narrative_request()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["system"].as_str().unwrap().contains("section labels"));
        assert!(body["body"].as_str().unwrap().contains("work stress"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_assemble_builds_full_homework_plan() {
        let (app, _) = app_with(ScriptedClient::new(vec![]));
        let body = json!({
            "request": {
                "kind": "homework",
                "homework_type": "mindfulness",
                "duration_days": 7,
                "difficulty": "intermediate"
            },
            "raw_text": "Title: A Week of Noticing\nDay 1: Breathing\nDay 2: Walking\nDay 3: Eating\n"
        });
        let (status, body) = post(app, "/api/v1/synthesis/assemble", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "homework");
        assert_eq!(body["title"], "A Week of Noticing");
        let tasks = body["daily_tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 7);
        assert_eq!(tasks[1]["title"], "Walking");
        assert_eq!(tasks[6]["day"], 7);
    }

    #[tokio::test]
    async fn test_find_section_returns_block_and_items() {
        let (app, _) = app_with(ScriptedClient::new(vec![]));
        let body = json!({
            "raw_text": "```\r\nKEY THEMES:\r\n- anxiety\r\n- sleep\r\n\r\nEmotional Patterns:\r\n- rumination\r\n```",
            "label": " Key Themes "
        });
        let (status, body) = post(app, "/api/v1/synthesis/section", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "Key Themes");
        assert_eq!(body["text"], "- anxiety\n- sleep");
        assert_eq!(body["items"], json!(["anxiety", "sleep"]));
    }

    #[tokio::test]
    async fn test_find_section_missing_label_is_null() {
        let (app, _) = app_with(ScriptedClient::new(vec![]));
        let body = json!({ "raw_text": "Summary: fine", "label": "Key Themes" });
        let (status, body) = post(app.clone(), "/api/v1/synthesis/section", body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["text"].is_null());
        assert_eq!(body["items"], json!([]));

        let blank = json!({ "raw_text": "Title: x", "label": "  " });
        let (status, body) = post(app, "/api/v1/synthesis/section", blank).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app_with(ScriptedClient::new(vec![]));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "synthesis-api");
    }
}
