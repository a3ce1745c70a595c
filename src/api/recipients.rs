use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::models::RecipientResolutionResult;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBasenameRequest {
    #[serde(default)]
    pub name: String,
}

fn status_for(result: &RecipientResolutionResult) -> StatusCode {
    if result.success {
        StatusCode::OK
    } else if result.original_input.trim().is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/v1/recipients/resolve?input=
pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> (StatusCode, Json<RecipientResolutionResult>) {
    let result = state.resolver.resolve(&query.input).await;
    (status_for(&result), Json(result))
}

/// POST /api/resolve-basename
pub async fn resolve_basename(
    State(state): State<AppState>,
    Json(req): Json<ResolveBasenameRequest>,
) -> (StatusCode, Json<RecipientResolutionResult>) {
    if req.name.trim().is_empty() {
        let result = RecipientResolutionResult::failed(&req.name, "Name is required");
        return (StatusCode::BAD_REQUEST, Json(result));
    }
    let result = state.basename_resolver.resolve_basename_only(&req.name).await;
    (status_for(&result), Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolvedFrom;
    use ethers::types::Address;

    #[test]
    fn status_reflects_outcome() {
        let ok = RecipientResolutionResult::resolved("a", Address::zero(), ResolvedFrom::Basename);
        assert_eq!(status_for(&ok), StatusCode::OK);
        let empty = RecipientResolutionResult::failed("  ", "Recipient is required");
        assert_eq!(status_for(&empty), StatusCode::BAD_REQUEST);
        let miss = RecipientResolutionResult::failed("ghost", "nope");
        assert_eq!(status_for(&miss), StatusCode::NOT_FOUND);
    }
}
