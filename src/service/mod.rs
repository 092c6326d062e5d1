pub mod chat;
pub mod directives;
pub mod gateway;
pub mod notify;
pub mod signature;

pub use chat::ChatEngine;
pub use gateway::RazorpayClient;
pub use notify::{ConfirmationNotice, Notifier};
