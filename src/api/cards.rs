use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{connected_wallet, AppState};
use crate::{
    constants::MAX_CARD_UPLOAD_BYTES,
    error::{AppError, Result},
    models::{ApiResponse, CardActivityItem, CardMintRequest, CardMintResponse, MintRequest},
    services::identifier::parse_address,
};

const CARD_RECEIVED_TITLE: &str = "You received a card";
const CARD_RECEIVED_BODY: &str = "Someone sent you a greeting card. Open it now!";

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

/// A well-formed `address` query parameter wins over the connected wallet.
fn select_wallet(requested: Option<&str>, connected: Option<String>) -> Option<String> {
    requested
        .map(str::trim)
        .filter(|a| parse_address(a).is_some())
        .map(str::to_string)
        .or(connected)
}

// No wallet at all reads like an invalid one: an empty list, not an error.
fn wallet_for(query: &ActivityQuery, headers: &HeaderMap) -> String {
    select_wallet(query.address.as_deref(), connected_wallet(headers)).unwrap_or_default()
}

fn validate_token_uri(uri: &str) -> Result<&str> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(AppError::BadRequest("tokenURI is required".to_string()));
    }
    Ok(uri)
}

/// GET /api/v1/cards/sent
pub async fn get_sent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<CardActivityItem>>>> {
    let wallet = wallet_for(&query, &headers);
    let items = state.activity.sent_cards(&wallet).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/v1/cards/received
pub async fn get_received(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<CardActivityItem>>>> {
    let wallet = wallet_for(&query, &headers);
    let items = state.activity.received_cards(&wallet).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/v1/cards/mint
pub async fn mint_card(
    State(state): State<AppState>,
    Json(req): Json<CardMintRequest>,
) -> Result<Json<ApiResponse<CardMintResponse>>> {
    let token_uri = validate_token_uri(&req.token_uri)?.to_string();

    let resolution = state.resolver.resolve(&req.recipient).await;
    let Some(address) = resolution.address.clone().filter(|_| resolution.success) else {
        let reason = resolution
            .error
            .clone()
            .unwrap_or_else(|| "Recipient not found".to_string());
        return Err(AppError::RecipientUnresolved(reason));
    };

    let receipt = state
        .mint
        .mint(&MintRequest {
            token_uri,
            recipient: address.clone(),
            contract_address: state.config.card_contract_address.clone(),
        })
        .await?;
    tracing::info!(
        "Card minted for {} tx={}",
        address,
        receipt.transaction_hash
    );

    if let Some(fid) = req.recipient_fid {
        match state
            .notifications
            .notify_fid(fid, CARD_RECEIVED_TITLE, CARD_RECEIVED_BODY)
            .await
        {
            Ok(outcome) => tracing::debug!("recipient notification fid={} {:?}", fid, outcome),
            Err(err) => tracing::warn!("recipient notification failed fid={}: {}", fid, err),
        }
    }

    Ok(Json(ApiResponse::success(CardMintResponse {
        recipient: resolution,
        transaction_hash: receipt.transaction_hash,
        token_id: receipt.token_id,
        mint_price: receipt.mint_price,
    })))
}

/// Multipart framing allowance on top of the PNG itself.
const UPLOAD_FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Body limit for the upload route; axum's default would cut PNGs short of
/// `MAX_CARD_UPLOAD_BYTES`.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_CARD_UPLOAD_BYTES + UPLOAD_FORM_OVERHEAD_BYTES)
}

/// Returns the file name and bytes of the `file` part.
async fn read_card_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("card.png").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        return Ok((file_name, bytes.to_vec()));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// POST /api/v1/cards/upload
pub async fn upload_card(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>> {
    let (file_name, bytes) = read_card_upload(&mut multipart).await?;
    let image_url = state.pinata.upload_png(&file_name, bytes).await?;
    Ok(Json(ApiResponse::success(UploadResponse { image_url })))
}
