use chrono::NaiveDate;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::AppConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const SMS_MAX_CHARS: usize = 1600;

/// Everything the confirmation templates need, resolved up front so the
/// dispatcher never touches the database.
#[derive(Debug, Clone)]
pub struct ConfirmationNotice {
    pub booking_id: Uuid,
    pub venue: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub quantity: i32,
    pub total_amount: f64,
    pub payment_id: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
}

/// Best-effort email and SMS sender. Missing provider config or missing
/// recipient contact details downgrade to a warning, never an error.
#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    sendgrid_api_key: Option<String>,
    sendgrid_from_email: Option<String>,
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
    twilio_phone_number: Option<String>,
}

impl Notifier {
    pub fn from_config(http: reqwest::Client, config: &AppConfig) -> Self {
        Notifier {
            http,
            sendgrid_api_key: config.sendgrid_api_key.clone(),
            sendgrid_from_email: config.sendgrid_from_email.clone(),
            twilio_account_sid: config.twilio_account_sid.clone(),
            twilio_auth_token: config.twilio_auth_token.clone(),
            twilio_phone_number: config.twilio_phone_number.clone(),
        }
    }

    pub async fn dispatch_confirmation(&self, notice: ConfirmationNotice) {
        tokio::join!(self.send_email(&notice), self.send_sms(&notice));
    }

    async fn send_email(&self, notice: &ConfirmationNotice) {
        let (api_key, from_email) = match (&self.sendgrid_api_key, &self.sendgrid_from_email) {
            (Some(key), Some(from)) => (key, from),
            _ => {
                warn!(
                    "Email not sent for booking {}: SendGrid is not configured",
                    notice.booking_id
                );
                return;
            }
        };
        let to_email = match &notice.recipient_email {
            Some(email) => email,
            None => {
                warn!(
                    "Email not sent for booking {}: user email missing",
                    notice.booking_id
                );
                return;
            }
        };

        let (subject, html) = render_confirmation_email(notice);
        let payload = serde_json::json!({
            "personalizations": [{ "to": [{ "email": to_email }] }],
            "from": { "email": from_email },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });

        match self
            .http
            .post(SENDGRID_SEND_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(
                    "Confirmation email sent to {} for booking {}",
                    to_email, notice.booking_id
                );
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(
                    "SendGrid rejected the email for booking {} ({}): {}",
                    notice.booking_id, status, body
                );
            }
            Err(e) => {
                error!(
                    "Email sending error for booking {}: {:?}",
                    notice.booking_id, e
                );
            }
        }
    }

    async fn send_sms(&self, notice: &ConfirmationNotice) {
        let (sid, token, from_number) = match (
            &self.twilio_account_sid,
            &self.twilio_auth_token,
            &self.twilio_phone_number,
        ) {
            (Some(sid), Some(token), Some(from)) => (sid, token, from),
            _ => {
                warn!(
                    "SMS not sent for booking {}: Twilio is not configured",
                    notice.booking_id
                );
                return;
            }
        };
        let to_number = match &notice.recipient_phone {
            Some(phone) => phone,
            None => {
                warn!(
                    "SMS not sent for booking {}: user phone number missing",
                    notice.booking_id
                );
                return;
            }
        };

        let mut body = render_confirmation_sms(notice);
        if body.chars().count() > SMS_MAX_CHARS {
            body = body.chars().take(SMS_MAX_CHARS).collect();
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            sid
        );
        match self
            .http
            .post(url)
            .basic_auth(sid, Some(token))
            .form(&[
                ("To", to_number.as_str()),
                ("From", from_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(
                    "Confirmation SMS sent to {} for booking {}",
                    to_number, notice.booking_id
                );
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(
                    "Twilio rejected the SMS for booking {} ({}): {}",
                    notice.booking_id, status, body
                );
            }
            Err(e) => {
                error!(
                    "SMS sending error for booking {}: {:?}",
                    notice.booking_id, e
                );
            }
        }
    }
}

fn render_confirmation_email(notice: &ConfirmationNotice) -> (String, String) {
    let subject = format!(
        "Your booking confirmation for {} (#{})",
        notice.venue, notice.booking_id
    );
    let recipient = notice.recipient_name.as_deref().unwrap_or("Customer");
    let payment_line = match &notice.payment_id {
        Some(payment_id) => format!("<p><strong>Payment ID:</strong> {}</p>", payment_id),
        None => String::new(),
    };
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 20px auto; border: 1px solid #ddd; padding: 20px; border-radius: 8px; line-height: 1.6;">
  <h1 style="color: #3498db; text-align: center; margin-top: 0;">Booking Confirmation</h1>
  <p>Dear {recipient},</p>
  <p>Your booking at <strong>{venue}</strong> has been confirmed!</p>
  <div style="background-color: #f8f9fa; padding: 15px; border-radius: 5px; margin: 20px 0;">
    <h3 style="margin-top: 0; margin-bottom: 10px; border-bottom: 1px solid #eee; padding-bottom: 5px;">Booking Details:</h3>
    <p><strong>Booking ID:</strong> {booking_id}</p>
    <p><strong>Date:</strong> {date}</p>
    <p><strong>Time:</strong> {time_slot}</p>
    <p><strong>Quantity:</strong> {quantity}</p>
    <p><strong>Total Amount:</strong> ₹{amount:.2}</p>
    {payment_line}
  </div>
  <p>Please present this booking ID at the entrance.</p>
  <p>We hope you have a great time!</p>
  <p style="margin-top: 30px; font-size: 0.9em; color: #777;">Best regards,<br>ParkChat Team</p>
</div>"#,
        recipient = recipient,
        venue = notice.venue,
        booking_id = notice.booking_id,
        date = notice.date.format("%A, %B %-d, %Y"),
        time_slot = notice.time_slot,
        quantity = notice.quantity,
        amount = notice.total_amount,
        payment_line = payment_line,
    );
    (subject, html)
}

fn render_confirmation_sms(notice: &ConfirmationNotice) -> String {
    format!(
        "ParkChat Booking Confirmed!\nPark: {}\nDate: {}\nTime: {}\nTickets: {}\nBooking ID: {}\nEnjoy!",
        notice.venue,
        notice.date.format("%-m/%-d/%Y"),
        notice.time_slot,
        notice.quantity,
        notice.booking_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_notice() -> ConfirmationNotice {
        ConfirmationNotice {
            booking_id: Uuid::nil(),
            venue: "VGP Universal Kingdom".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            time_slot: "10:00 AM".to_string(),
            quantity: 3,
            total_amount: 2600.0,
            payment_id: Some("pay_abc123".to_string()),
            recipient_name: Some("Asha".to_string()),
            recipient_email: Some("asha@example.com".to_string()),
            recipient_phone: Some("+919999999999".to_string()),
        }
    }

    #[test]
    fn email_template_carries_the_booking_facts() {
        let (subject, html) = render_confirmation_email(&sample_notice());
        assert!(subject.contains("VGP Universal Kingdom"));
        assert!(subject.contains(&Uuid::nil().to_string()));
        assert!(html.contains("Dear Asha,"));
        assert!(html.contains("VGP Universal Kingdom"));
        assert!(html.contains("Tuesday, July 15, 2025"));
        assert!(html.contains("10:00 AM"));
        assert!(html.contains("<strong>Quantity:</strong> 3"));
        assert!(html.contains("₹2600.00"));
        assert!(html.contains("pay_abc123"));
    }

    #[test]
    fn email_template_degrades_without_optional_fields() {
        let mut notice = sample_notice();
        notice.recipient_name = None;
        notice.payment_id = None;
        let (_, html) = render_confirmation_email(&notice);
        assert!(html.contains("Dear Customer,"));
        assert!(!html.contains("Payment ID"));
    }

    #[test]
    fn sms_template_is_compact_and_complete() {
        let sms = render_confirmation_sms(&sample_notice());
        assert_eq!(
            sms,
            format!(
                "ParkChat Booking Confirmed!\nPark: VGP Universal Kingdom\nDate: 7/15/2025\nTime: 10:00 AM\nTickets: 3\nBooking ID: {}\nEnjoy!",
                Uuid::nil()
            )
        );
        assert!(sms.chars().count() <= SMS_MAX_CHARS);
    }
}
