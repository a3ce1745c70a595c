use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, WebhookPayload},
    services::webhook_service::WebhookAction,
};

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub action: &'static str,
}

fn parse_payload(body: serde_json::Value) -> Result<WebhookPayload> {
    serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))
}

fn action_name(action: WebhookAction) -> &'static str {
    match action {
        WebhookAction::TokenStored => "token_stored",
        WebhookAction::TokenRemoved => "token_removed",
    }
}

/// POST /api/webhook
pub async fn receive(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<WebhookAck>>> {
    let payload = parse_payload(body)?;
    let action = state.webhooks.handle(payload).await?;
    Ok(Json(ApiResponse::success(WebhookAck {
        action: action_name(action),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WebhookEvent;

    #[test]
    fn parse_payload_accepts_legacy_frame_events() {
        let payload = parse_payload(serde_json::json!({
            "fid": 5,
            "event": "frame_removed"
        }))
        .unwrap();
        assert_eq!(payload.event, WebhookEvent::MiniappRemoved);
    }

    #[test]
    fn parse_payload_rejects_unknown_event() {
        let result = parse_payload(serde_json::json!({"fid": 5, "event": "launched"}));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        let result = parse_payload(serde_json::json!({"event": "miniapp_removed"}));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn action_names_are_snake_case() {
        assert_eq!(action_name(WebhookAction::TokenStored), "token_stored");
        assert_eq!(action_name(WebhookAction::TokenRemoved), "token_removed");
    }
}
