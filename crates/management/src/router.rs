//! Management API router — mounts entity, letter and wizard session
//! endpoints under /api.

use crate::handlers::{self, ManagementState};
use axum::routing::{get, patch, post};
use axum::Router;

/// Build the management router with all endpoints.
/// Returns a Router that should be merged into the main app.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        // Recipients
        .route("/api/recipients", get(handlers::list_recipients).post(handlers::create_recipient))
        .route("/api/recipients/batch", post(handlers::create_recipients_batch))
        .route("/api/recipients/:id", get(handlers::get_recipient))
        // Templates
        .route("/api/templates", get(handlers::list_templates).post(handlers::create_template))
        .route("/api/templates/:id", get(handlers::get_template))
        // Campaigns
        .route("/api/campaigns", get(handlers::list_campaigns))
        .route("/api/campaigns/:id", get(handlers::get_campaign).put(handlers::update_campaign))
        // Letters
        .route("/api/letters", get(handlers::list_letters))
        // Activity log
        .route("/api/activity", get(handlers::activity_log))
        // Wizard sessions
        .route("/api/wizard/sessions", post(handlers::create_session))
        .route("/api/wizard/sessions/:id", get(handlers::get_session).delete(handlers::delete_session))
        .route("/api/wizard/sessions/:id/draft", patch(handlers::update_draft))
        .route("/api/wizard/sessions/:id/next", post(handlers::next_step))
        .route("/api/wizard/sessions/:id/previous", post(handlers::previous_step))
        .route("/api/wizard/sessions/:id/jump", post(handlers::jump_to_step))
        .route("/api/wizard/sessions/:id/edit", post(handlers::edit_section))
        .route("/api/wizard/sessions/:id/preview", post(handlers::preview_letter))
        .route("/api/wizard/sessions/:id/submit", post(handlers::submit_session))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use campaign_core::config::AppConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, ManagementState) {
        let mut config = AppConfig::default();
        config.handwriting.preview_delay_ms = 0;
        let state = ManagementState::from_config(&config).unwrap();
        (management_router(state.clone()), state)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_list_seeded_recipients() {
        let (app, _) = app();
        let (status, body) = call(&app, "GET", "/api/recipients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["firstName"], "John");
    }

    #[tokio::test]
    async fn test_unknown_recipient_is_404() {
        let (app, _) = app();
        let (status, body) = call(&app, "GET", "/api/recipients/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_create_template_extracts_merge_fields() {
        let (app, _) = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/templates",
            Some(json!({"name": "Thanks", "content": "Thanks {{firstName}} at {{company}}"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["mergeFields"], json!(["firstName", "company"]));

        let (status, body) = call(&app, "POST", "/api/templates", Some(json!({"name": "", "content": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_rejected_step_is_422() {
        let (app, _) = app();
        let (status, session) = call(&app, "POST", "/api/wizard/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["currentStep"], "recipients");
        let id = session["sessionId"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "POST", &format!("/api/wizard/sessions/{id}/next"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_failed");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Please select at least one recipient for your campaign."));
    }

    #[tokio::test]
    async fn test_jump_errors() {
        let (app, _) = app();
        let (_, session) = call(&app, "POST", "/api/wizard/sessions", None).await;
        let id = session["sessionId"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/wizard/sessions/{id}/jump"),
            Some(json!({"step": "review"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/wizard/sessions/{id}/jump"),
            Some(json!({"step": "details"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deep_link_session() {
        let (app, _) = app();
        let (status, session) = call(
            &app,
            "POST",
            "/api/wizard/sessions",
            Some(json!({
                "step": "review",
                "draft": {"name": "Spring", "recipientIds": [1], "templateId": 1}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["currentStep"], "schedule");
        assert_eq!(session["draft"]["name"], "Spring");
    }

    #[tokio::test]
    async fn test_full_session_over_http() {
        let (app, state) = app();
        let (_, session) = call(&app, "POST", "/api/wizard/sessions", None).await;
        let id = session["sessionId"].as_str().unwrap().to_string();
        let base = format!("/api/wizard/sessions/{id}");

        let (status, _) = call(
            &app,
            "PATCH",
            &format!("{base}/draft"),
            Some(json!({
                "name": "Spring Outreach",
                "recipientIds": [1, 2],
                "templateId": 1,
                "schedule": {"mode": "send_now"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        for _ in 0..2 {
            let (status, _) = call(&app, "POST", &format!("{base}/next"), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, preview) = call(
            &app,
            "POST",
            &format!("{base}/preview"),
            Some(json!({"recipientId": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(preview["text"].as_str().unwrap().starts_with("Dear Jane,"));

        call(&app, "POST", &format!("{base}/next"), None).await;
        let (status, summary) = call(&app, "POST", &format!("{base}/next"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["currentStep"], "review");
        assert_eq!(summary["canSubmit"], true);

        let (status, submitted) = call(&app, "POST", &format!("{base}/submit"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(submitted["campaign"]["status"], "in_progress");
        assert_eq!(submitted["campaign"]["recipientIds"], json!(["1", "2"]));
        assert_eq!(submitted["letters"].as_array().unwrap().len(), 2);

        assert!(state.sessions.is_empty());
        let (status, _) = call(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, campaigns) = call(&app, "GET", "/api/campaigns", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(campaigns[0]["name"], "Spring Outreach");

        let campaign_id = submitted["campaign"]["id"].as_i64().unwrap();
        let (status, letters) = call(&app, "GET", &format!("/api/letters?campaignId={campaign_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(letters.as_array().unwrap().len(), 2);
        assert_eq!(letters[0]["campaignId"], campaign_id);
        assert!(letters[0]["id"].is_i64());
        assert!(letters[1]["content"].as_str().unwrap().starts_with("Dear Jane,"));
    }

    #[tokio::test]
    async fn test_malformed_deep_link_is_rejected() {
        let (app, state) = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/wizard/sessions",
            Some(json!({
                "step": "review",
                "draft": {"recipientIds": [1], "templateId": 1, "handwritingStyle": "fancy"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");

        let (status, _) = call(&app, "POST", "/api/wizard/sessions", Some(json!({"step": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.sessions.is_empty());

        let (status, _) = call(&app, "POST", "/api/wizard/sessions", Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_campaign_status_update() {
        let (app, state) = app();
        let (_, session) = call(
            &app,
            "POST",
            "/api/wizard/sessions",
            Some(json!({
                "step": "review",
                "draft": {
                    "name": "Spring",
                    "recipientIds": [1],
                    "templateId": 1,
                    "schedule": {"mode": "send_now"}
                }
            })),
        )
        .await;
        let id = session["sessionId"].as_str().unwrap().to_string();
        let (_, submitted) = call(&app, "POST", &format!("/api/wizard/sessions/{id}/submit"), None).await;
        let uri = format!("/api/campaigns/{}", submitted["campaign"]["id"]);

        let (status, campaign) = call(&app, "PUT", &uri, Some(json!({"status": "paused"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(campaign["status"], "paused");

        let (status, _) = call(&app, "PUT", &uri, Some(json!({"status": "completed"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, "PUT", &uri, Some(json!({"status": "in_progress"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_transition");

        let (status, _) = call(&app, "PUT", "/api/campaigns/99", Some(json!({"status": "paused"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.store.list_campaigns()[0].status.to_string(), "completed");
    }

    #[tokio::test]
    async fn test_recipient_batch_import() {
        let (app, _) = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/recipients/batch",
            Some(json!({"recipients": [
                {"firstName": "Ada", "lastName": "Lovelace", "company": "Engines Ltd"},
                {"firstName": "", "lastName": "Blank"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["recipients"][0]["id"], 3);
        assert_eq!(body["errors"][0]["index"], 1);

        let (status, body) = call(&app, "POST", "/api/recipients/batch", Some(json!({"recipients": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");

        let (_, recipients) = call(&app, "GET", "/api/recipients", None).await;
        assert_eq!(recipients.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_letters_for_unknown_campaign_is_404() {
        let (app, _) = app();
        let (status, letters) = call(&app, "GET", "/api/letters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(letters.as_array().unwrap().is_empty());

        let (status, _) = call(&app, "GET", "/api/letters?campaignId=5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
