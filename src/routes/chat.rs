use std::sync::Arc;

use actix_web::{post, web};
use tracing::error;

use crate::errors::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::prompts::Prompts;
use crate::types::{ChatRequest, ChatResponse};
use crate::AppState;

/// One conversational turn. Internal failures degrade to an apologetic reply
/// with a 200 so the conversation UI never dead-ends; only input validation
/// surfaces as an error status.
#[post("/chat")]
async fn chat(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    web::Json(request): web::Json<ChatRequest>,
) -> Result<web::Json<ChatResponse>, ApiError> {
    match app_state
        .chat_engine
        .handle_turn(&authenticated_user.user_id, &request.message)
        .await
    {
        Ok(response) => Ok(web::Json(response)),
        Err(e) if e.is_validation() => Err(e),
        Err(e) => {
            error!(
                "Chat turn failed for user {}: {:?}",
                authenticated_user.user_id, e
            );
            Ok(web::Json(ChatResponse {
                response: Prompts::FALLBACK_REPLY.to_string(),
                action: None,
                payment_details: None,
            }))
        }
    }
}
