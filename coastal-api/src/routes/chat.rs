/// Chat endpoint
///
/// ```text
/// POST /chat
/// { "message": "Any homes in Charleston?" }
/// ```
///
/// Answers with `{ "reply": "..." }` from the canned responder.

use crate::error::ApiResult;
use axum::{extract::rejection::JsonRejection, Json};
use coastal_shared::chat;
use serde::{Deserialize, Serialize};

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Visitor message
    pub message: String,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply
    pub reply: String,
}

pub async fn chat(payload: Result<Json<ChatRequest>, JsonRejection>) -> ApiResult<Json<ChatResponse>> {
    let Json(req) = payload?;

    Ok(Json(ChatResponse {
        reply: chat::reply(&req.message).to_string(),
    }))
}
