use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_openai::Client;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::booking::{parse_visit_date, ADULT_RATE};
use crate::models::{Booking, Conversation, Message, NewBooking, Sender};
use crate::prompts::Prompts;
use crate::service::directives::{parse_reply, BookingDirective};
use crate::types::{ChatResponse, PaymentHandle};

/// Stored messages replayed to the model each turn, newest first in the
/// query, oldest first on the wire.
pub const HISTORY_LIMIT: usize = 20;

const MODEL: &str = "gpt-4";
const MODEL_TIMEOUT: Duration = Duration::from_secs(30);
const CURRENCY: &str = "INR";

/// Drives one conversational turn end to end: resolve the conversation,
/// replay history, call the model, split out directives, record pending
/// bookings, persist the exchange. Collaborators are injected; the engine
/// holds no global state.
#[derive(Clone)]
pub struct ChatEngine {
    pool: PgPool,
    oai_client: Client<OpenAIConfig>,
}

impl ChatEngine {
    pub fn new(pool: PgPool, oai_client: Client<OpenAIConfig>) -> Self {
        ChatEngine { pool, oai_client }
    }

    pub async fn handle_turn(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<ChatResponse, ApiError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::validation("Message is required"));
        }

        let conversation = Conversation::latest_or_create(&self.pool, user_id).await?;
        let history = Message::history(&self.pool, conversation.id, HISTORY_LIMIT as i64).await?;

        let request = CreateChatCompletionRequest {
            messages: build_model_context(&history, message),
            model: MODEL.to_string(),
            temperature: Some(0.7),
            ..Default::default()
        };

        let completion = match tokio::time::timeout(
            MODEL_TIMEOUT,
            self.oai_client.chat().create(request),
        )
        .await
        {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                error!("Chat completion failed: {:?}", e);
                return Err(ApiError::upstream("Chat completion failed"));
            }
            Err(_) => {
                error!("Chat completion timed out after {:?}", MODEL_TIMEOUT);
                return Err(ApiError::upstream("Chat completion timed out"));
            }
        };

        let raw_reply = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        if raw_reply.trim().is_empty() {
            error!("Chat completion returned no content");
            return Err(ApiError::upstream("Chat completion returned no content"));
        }

        let parsed = parse_reply(&raw_reply);

        let payment_details = match &parsed.booking_details {
            Some(details) => {
                self.create_directive_booking(user_id, conversation.id, details)
                    .await
            }
            None => None,
        };

        Message::append_exchange(&self.pool, conversation.id, message, &parsed.display_text)
            .await?;

        Ok(ChatResponse {
            response: parsed.display_text,
            action: parsed.action,
            payment_details,
        })
    }

    /// Directive-path booking creation. Failures degrade: the reply still
    /// reaches the user, just without a payment handle.
    async fn create_directive_booking(
        &self,
        user_id: &str,
        conversation_id: Uuid,
        details: &Value,
    ) -> Option<PaymentHandle> {
        let directive = match BookingDirective::from_value(details) {
            Some(directive) => directive,
            None => {
                warn!("Booking directive dropped, unrecognized payload: {}", details);
                return None;
            }
        };
        let date = match parse_visit_date(&directive.date) {
            Ok(date) => date,
            Err(_) => {
                warn!("Booking directive dropped, invalid date: {:?}", directive.date);
                return None;
            }
        };
        if directive.number_of_tickets == 0 {
            warn!("Booking directive dropped, zero tickets");
            return None;
        }

        // The directive carries no age breakdown, so tickets are priced at
        // the adult rate. The model's own quote is advisory only.
        let total_amount = f64::from(directive.number_of_tickets) * ADULT_RATE;
        if let Some(quoted) = directive.total_price {
            if (quoted - total_amount).abs() > 0.005 {
                warn!(
                    "Model quoted {} but server priced {}; keeping the server price",
                    quoted, total_amount
                );
            }
        }

        let new = NewBooking {
            user_id: user_id.to_string(),
            conversation_id: Some(conversation_id),
            park_id: None,
            attraction_name: directive.attraction_name,
            date,
            time_slot: directive.time_slot,
            adults: 0,
            children: 0,
            seniors: 0,
            quantity: directive.number_of_tickets,
            total_amount,
        };
        match Booking::create(&self.pool, new).await {
            Ok(booking) => Some(PaymentHandle {
                booking_id: booking.id,
                amount: booking.total_amount,
                currency: CURRENCY.to_string(),
            }),
            Err(e) => {
                warn!("Booking directive dropped, create failed: {:?}", e);
                None
            }
        }
    }
}

/// Assembles the model request: system prompt first, then up to
/// HISTORY_LIMIT stored messages oldest first, then the new user turn.
pub fn build_model_context(
    history: &[Message],
    user_message: &str,
) -> Vec<ChatCompletionRequestMessage> {
    let tail = if history.len() > HISTORY_LIMIT {
        &history[history.len() - HISTORY_LIMIT..]
    } else {
        history
    };

    let mut messages = Vec::with_capacity(tail.len() + 2);
    messages.push(ChatCompletionRequestMessage::System(
        ChatCompletionRequestSystemMessage {
            content: Prompts::SYSTEM.to_string(),
            ..Default::default()
        },
    ));
    for message in tail {
        match message.sender {
            Sender::User => messages.push(ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(
                        message.content.clone(),
                    ),
                    ..Default::default()
                },
            )),
            Sender::Bot => messages.push(ChatCompletionRequestMessage::Assistant(
                ChatCompletionRequestAssistantMessage {
                    content: Some(message.content.clone()),
                    ..Default::default()
                },
            )),
        }
    }
    messages.push(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(user_message.to_string()),
            ..Default::default()
        },
    ));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(sender: Sender, content: &str) -> Message {
        Message {
            sender,
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn text_of(message: &ChatCompletionRequestMessage) -> String {
        match message {
            ChatCompletionRequestMessage::System(m) => m.content.clone(),
            ChatCompletionRequestMessage::User(m) => match &m.content {
                ChatCompletionRequestUserMessageContent::Text(text) => text.clone(),
                other => panic!("unexpected user content shape: {:?}", other),
            },
            ChatCompletionRequestMessage::Assistant(m) => m.content.clone().unwrap_or_default(),
            other => panic!("unexpected message kind: {:?}", other),
        }
    }

    #[test]
    fn context_opens_with_the_system_prompt_and_closes_with_the_user_turn() {
        let messages = build_model_context(&[], "I want to book tickets");
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert_eq!(text_of(&messages[0]), Prompts::SYSTEM);
        assert!(matches!(
            messages.last().unwrap(),
            ChatCompletionRequestMessage::User(_)
        ));
        assert_eq!(text_of(messages.last().unwrap()), "I want to book tickets");
    }

    #[test]
    fn history_maps_senders_onto_model_roles_in_order() {
        let history = vec![
            stored(Sender::User, "show me the parks"),
            stored(Sender::Bot, "Here are our parks!"),
        ];
        let messages = build_model_context(&history, "book the first one");
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert_eq!(text_of(&messages[1]), "show me the parks");
        assert!(matches!(
            messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert_eq!(text_of(&messages[2]), "Here are our parks!");
        assert_eq!(text_of(&messages[3]), "book the first one");
    }

    #[test]
    fn oversized_history_keeps_only_the_newest_window() {
        let history: Vec<Message> = (0..25)
            .map(|i| stored(Sender::User, &format!("m{}", i)))
            .collect();
        let messages = build_model_context(&history, "latest");
        assert_eq!(messages.len(), HISTORY_LIMIT + 2);
        assert_eq!(text_of(&messages[1]), "m5");
        assert_eq!(text_of(&messages[HISTORY_LIMIT]), "m24");
        assert_eq!(text_of(messages.last().unwrap()), "latest");
    }
}
