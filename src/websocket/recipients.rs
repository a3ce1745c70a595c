use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, timeout, Duration};

use crate::{
    api::AppState,
    constants::{RESOLVER_DEBOUNCE_MS, WS_CLIENT_TIMEOUT_SECS, WS_HEARTBEAT_INTERVAL_SECS},
    services::debounce::{DebouncedResolver, TaggedResolution},
};

fn connected_payload() -> String {
    serde_json::json!({
        "type": "connected",
        "message": "Send recipient input as text frames"
    }).to_string()
}

fn resolution_payload(tagged: &TaggedResolution) -> String {
    serde_json::json!({
        "type": "resolution",
        "generation": tagged.generation,
        "result": tagged.result,
    }).to_string()
}

/// WebSocket handler for as-you-type recipient resolution
pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let debouncer = DebouncedResolver::new(
        state.resolver.clone(),
        Duration::from_millis(RESOLVER_DEBOUNCE_MS),
    );
    let mut rx = debouncer.subscribe();

    let _ = sender.send(Message::Text(connected_payload().into())).await;

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = interval(Duration::from_secs(WS_HEARTBEAT_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let payload = rx.borrow_and_update().as_ref().map(resolution_payload);
                    if let Some(json) = payload {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        loop {
            let next_msg = timeout(Duration::from_secs(WS_CLIENT_TIMEOUT_SECS), receiver.next()).await;
            let msg = match next_msg {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(_))) | Ok(None) => break,
                Err(_) => {
                    tracing::info!("WebSocket client timeout");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let generation = debouncer.submit(text.to_string());
                    tracing::debug!("Recipient input queued generation={}", generation);
                }
                Message::Close(_) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::info!("Recipient resolution socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipientResolutionResult;

    #[test]
    fn connected_payload_has_type() {
        let payload = connected_payload();
        assert!(payload.contains("\"type\":\"connected\""));
    }

    #[test]
    fn resolution_payload_carries_generation_and_result() {
        let tagged = TaggedResolution {
            generation: 4,
            result: RecipientResolutionResult::failed("ghost", "not found"),
        };
        let json: serde_json::Value = serde_json::from_str(&resolution_payload(&tagged)).unwrap();
        assert_eq!(json["type"], "resolution");
        assert_eq!(json["generation"], 4);
        assert_eq!(json["result"]["originalInput"], "ghost");
        assert_eq!(json["result"]["success"], false);
    }
}
