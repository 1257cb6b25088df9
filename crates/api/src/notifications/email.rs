//! Email delivery via per-user SMTP credentials.
//!
//! Unlike a typical service mailer there is no process-wide transport:
//! every user brings their own SMTP account, so a transport is built per
//! send from the user's stored configuration. Reminder mail is addressed to
//! the user's push-gateway address, which forwards it as a phone
//! notification.

use std::time::Duration;

use chrono::Utc;
use lettre::message::{header::ContentType, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use medtrack_db::models::notification_settings::NotificationSettings;

/// Transport-level timeout so a hung SMTP server cannot stall a sweep cycle.
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The connectivity pre-flight check was rejected by the server.
    #[error("SMTP connection verification failed")]
    Verify,
}

// ---------------------------------------------------------------------------
// SmtpConfig
// ---------------------------------------------------------------------------

/// Resolved SMTP credentials for one user.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// `true` for implicit TLS (typically port 465), `false` for STARTTLS (587).
    pub secure: bool,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    /// Build a config from stored settings, or `None` if credentials are
    /// incomplete.
    pub fn from_settings(settings: &NotificationSettings) -> Option<Self> {
        if !settings.has_smtp_config() {
            return None;
        }
        Some(Self {
            host: settings.smtp_host.clone()?,
            port: u16::try_from(settings.smtp_port?).ok()?,
            secure: settings.smtp_secure,
            username: settings.smtp_username.clone()?,
            password: settings.smtp_password.clone()?,
        })
    }
}

/// Open an async SMTP transport for the given credentials.
fn build_transport(
    config: &SmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    let builder = if config.secure {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
    };
    Ok(builder
        .port(config.port)
        .credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ))
        .timeout(Some(SMTP_TIMEOUT))
        .build())
}

// ---------------------------------------------------------------------------
// Reminder payload
// ---------------------------------------------------------------------------

/// The medication details rendered into a reminder email.
#[derive(Debug, Clone)]
pub struct ReminderPayload {
    pub medication_name: String,
    pub dosage: Option<String>,
    pub description: Option<String>,
    pub frequency_hours: f64,
    pub user_name: String,
}

fn render_text(payload: &ReminderPayload) -> String {
    let mut body = format!(
        "MedTrack - Medication Reminder\n\n\
         Hello {}!\n\n\
         It is time to take your medication:\n\n\
         Medication: {}\n",
        payload.user_name, payload.medication_name
    );
    if let Some(dosage) = &payload.dosage {
        body.push_str(&format!("Dosage: {dosage}\n"));
    }
    if let Some(description) = &payload.description {
        body.push_str(&format!("Notes: {description}\n"));
    }
    body.push_str(&format!(
        "Frequency: every {} hour(s)\n\n\
         ---\n\
         Sent by MedTrack at {}\n",
        payload.frequency_hours,
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));
    body
}

fn render_html(payload: &ReminderPayload) -> String {
    let dosage_row = payload
        .dosage
        .as_deref()
        .map(|d| format!("<tr><td><strong>Dosage</strong></td><td>{d}</td></tr>"))
        .unwrap_or_default();
    let description_row = payload
        .description
        .as_deref()
        .map(|d| format!("<tr><td><strong>Notes</strong></td><td>{d}</td></tr>"))
        .unwrap_or_default();
    format!(
        "<div style=\"font-family: sans-serif; max-width: 600px;\">\
           <h1>MedTrack</h1>\
           <h2>Time to take your medication</h2>\
           <p>Hello <strong>{}</strong>, it is time to take:</p>\
           <table>\
             <tr><td><strong>Medication</strong></td><td>{}</td></tr>\
             {dosage_row}{description_row}\
             <tr><td><strong>Frequency</strong></td><td>every {} hour(s)</td></tr>\
           </table>\
           <p style=\"color: #6b7280; font-size: 12px;\">Sent by MedTrack at {}</p>\
         </div>",
        payload.user_name,
        payload.medication_name,
        payload.frequency_hours,
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    )
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

/// Send a medication reminder to the user's push-gateway address.
pub async fn send_reminder(
    config: &SmtpConfig,
    to: &str,
    payload: &ReminderPayload,
) -> Result<(), EmailError> {
    let subject = format!("Medication Reminder: {}", payload.medication_name);
    let email = Message::builder()
        .from(config.username.parse()?)
        .to(to.parse()?)
        .subject(subject)
        .multipart(MultiPart::alternative_plain_html(
            render_text(payload),
            render_html(payload),
        ))
        .map_err(|e| EmailError::Build(e.to_string()))?;

    let mailer = build_transport(config)?;
    mailer.send(email).await?;

    tracing::info!(
        to,
        medication = %payload.medication_name,
        "Reminder email sent"
    );
    Ok(())
}

/// Send a configuration test email. Runs the connectivity pre-flight first
/// so credential problems surface as a verification error rather than a
/// failed send.
pub async fn send_test(config: &SmtpConfig, to: &str, user_name: &str) -> Result<(), EmailError> {
    verify(config).await?;

    let body = format!(
        "MedTrack - Configuration Test\n\n\
         Hello {user_name}!\n\n\
         Your email settings are working. Test message delivered to: {to}\n\
         The system can now send medication reminders.\n"
    );
    let email = Message::builder()
        .from(config.username.parse()?)
        .to(to.parse()?)
        .subject("MedTrack Configuration Test")
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(body),
        )
        .map_err(|e| EmailError::Build(e.to_string()))?;

    let mailer = build_transport(config)?;
    mailer.send(email).await?;

    tracing::info!(to, "Test email sent");
    Ok(())
}

/// Pre-flight connectivity check against the configured SMTP server.
pub async fn verify(config: &SmtpConfig) -> Result<(), EmailError> {
    let mailer = build_transport(config)?;
    if !mailer.test_connection().await? {
        return Err(EmailError::Verify);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use medtrack_db::models::notification_settings::NotificationSettings;

    fn settings() -> NotificationSettings {
        NotificationSettings {
            id: 1,
            user_id: 1,
            gateway_email: Some("phone@gateway.example".into()),
            smtp_host: Some("smtp.example.com".into()),
            smtp_port: Some(587),
            smtp_secure: false,
            smtp_username: Some("sender@example.com".into()),
            smtp_password: Some("hunter2".into()),
            notifications_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn smtp_config_from_complete_settings() {
        let config = SmtpConfig::from_settings(&settings()).unwrap();
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 587);
        assert!(!config.secure);
    }

    #[test]
    fn smtp_config_missing_credentials() {
        let mut s = settings();
        s.smtp_password = None;
        assert!(SmtpConfig::from_settings(&s).is_none());
    }

    #[test]
    fn text_body_includes_optional_fields_when_present() {
        let payload = ReminderPayload {
            medication_name: "Ibuprofen".into(),
            dosage: Some("200mg".into()),
            description: Some("after meals".into()),
            frequency_hours: 8.0,
            user_name: "Ana".into(),
        };
        let text = render_text(&payload);
        assert!(text.contains("Ibuprofen"));
        assert!(text.contains("Dosage: 200mg"));
        assert!(text.contains("Notes: after meals"));
        assert!(text.contains("every 8 hour(s)"));
    }

    #[test]
    fn text_body_omits_absent_fields() {
        let payload = ReminderPayload {
            medication_name: "Ibuprofen".into(),
            dosage: None,
            description: None,
            frequency_hours: 8.0,
            user_name: "Ana".into(),
        };
        let text = render_text(&payload);
        assert!(!text.contains("Dosage:"));
        assert!(!text.contains("Notes:"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
