use std::env;

use anyhow::anyhow;
use tracing::warn;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub openai_api_key: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_from_email: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_phone_number: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let openai_api_key = required("OPENAI_API_KEY")?;
        let razorpay_key_id = required("RAZORPAY_KEY_ID")?;
        let razorpay_key_secret = required("RAZORPAY_KEY_SECRET")?;

        let sendgrid_api_key = optional("SENDGRID_API_KEY");
        let sendgrid_from_email = optional("SENDGRID_FROM_EMAIL");
        let twilio_account_sid = optional("TWILIO_ACCOUNT_SID");
        let twilio_auth_token = optional("TWILIO_AUTH_TOKEN");
        let twilio_phone_number = optional("TWILIO_PHONE_NUMBER");

        if sendgrid_api_key.is_none() || sendgrid_from_email.is_none() {
            warn!("SendGrid not configured, confirmation emails will be skipped");
        }
        if twilio_account_sid.is_none() || twilio_auth_token.is_none() || twilio_phone_number.is_none() {
            warn!("Twilio not configured, confirmation SMS will be skipped");
        }

        let port = match optional("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow!("PORT is not a valid port number: {raw}"))?,
            None => 3001,
        };

        Ok(AppConfig {
            database_url,
            jwt_secret,
            openai_api_key,
            razorpay_key_id,
            razorpay_key_secret,
            sendgrid_api_key,
            sendgrid_from_email,
            twilio_account_sid,
            twilio_auth_token,
            twilio_phone_number,
            port,
        })
    }
}

fn required(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).map_err(|_| anyhow!("{key} not found"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
