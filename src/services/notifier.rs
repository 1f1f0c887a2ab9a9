// src/services/notifier.rs

//! New-listing notifications.
//!
//! Email is the only channel. A disabled or unset channel is skipped
//! silently; a half-filled one is reported. Delivery problems are returned
//! as a `Delivery` value and logged, never raised.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::models::{Delivery, EmailConfig, ListingItem, SmtpSettings, format_listings};

/// Channel that announces new listings for a topic.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, items: &[ListingItem], topic: &str) -> Delivery;
}

/// Sends one HTML + plain text email per topic with new listings.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn send(
        &self,
        settings: &SmtpSettings,
        items: &[ListingItem],
        topic: &str,
    ) -> Result<()> {
        let message = build_message(settings, items, topic, Local::now())?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(AppError::email)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .build();

        mailer.send(message).await.map_err(AppError::email)?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, items: &[ListingItem], topic: &str) -> Delivery {
        let settings = match self.config.settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => return Delivery::Skipped,
            Err(AppError::ConfigIncomplete { missing, .. }) => {
                log::error!(
                    "Email settings incomplete (missing: {}). No notification sent.",
                    missing.join(", ")
                );
                return Delivery::Incomplete { missing };
            }
            Err(e) => {
                log::error!("Email settings unusable: {e}");
                return Delivery::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match self.send(&settings, items, topic).await {
            Ok(()) => {
                log::info!("Notification sent to {}", settings.recipient);
                Delivery::Sent {
                    recipient: settings.recipient,
                }
            }
            Err(e) => {
                log::error!("Failed to send email for '{topic}': {e}");
                Delivery::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Subject line for a topic's digest.
pub fn subject(count: usize, topic: &str) -> String {
    format!("Found {count} new listings in {topic}")
}

/// Build the multipart email for a topic's new listings.
pub fn build_message(
    settings: &SmtpSettings,
    items: &[ListingItem],
    topic: &str,
    scanned_at: DateTime<Local>,
) -> Result<Message> {
    let from: Mailbox = settings.sender.parse().map_err(AppError::email)?;
    let to: Mailbox = settings.recipient.parse().map_err(AppError::email)?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject(items.len(), topic))
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(render_text(items, topic, scanned_at)),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(render_html(items, topic, scanned_at)),
                ),
        )
        .map_err(AppError::email)
}

fn timestamp(scanned_at: DateTime<Local>) -> String {
    scanned_at.format("%d/%m/%Y %H:%M").to_string()
}

/// Plain text body.
pub fn render_text(items: &[ListingItem], topic: &str, scanned_at: DateTime<Local>) -> String {
    format!(
        "Scanned at: {}\n\n{}",
        timestamp(scanned_at),
        format_listings(items, topic)
    )
}

/// Right-to-left HTML body with one block per listing.
pub fn render_html(items: &[ListingItem], topic: &str, scanned_at: DateTime<Local>) -> String {
    let mut html = format!(
        r#"<html dir="rtl">
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: Arial, sans-serif; direction: rtl; }}
        .item {{ border: 1px solid #ddd; margin: 10px 0; padding: 15px; border-radius: 5px; }}
        .title {{ font-size: 18px; font-weight: bold; color: #3366cc; }}
        .price {{ font-size: 16px; color: #e63946; font-weight: bold; }}
        .address {{ color: #666; }}
        .date {{ color: #888; font-size: 14px; }}
    </style>
</head>
<body>
    <h2>{}</h2>
    <p>Scanned at: {}</p>
"#,
        escape(&subject(items.len(), topic)),
        timestamp(scanned_at)
    );

    for item in items {
        html.push_str(&format!(
            r#"    <div class="item">
        <div class="title">{}</div>
        <div class="price">{}</div>
        <div class="address">{}</div>
        <div class="date">{}</div>
        <p><a href="{}">View listing</a></p>
    </div>
"#,
            escape(&item.title),
            escape(&item.price),
            escape(&item.address),
            escape(&item.posted_date),
            escape(item.link_or_placeholder()),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            server: "smtp.example.com".into(),
            port: 587,
            sender: "watch@example.com".into(),
            password: "secret".into(),
            recipient: "me@example.com".into(),
        }
    }

    fn items() -> Vec<ListingItem> {
        let mut a = ListingItem::new(Some("1".into()));
        a.title = "4 rooms <renovated>".into();
        a.price = "1,950,000 ₪".into();
        a.detail_link = Some("https://www.yad2.co.il/item/1".into());
        let b = ListingItem::new(None);
        vec![a, b]
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_render_text_has_header_and_blocks() {
        let text = render_text(&items(), "Haifa", at());
        assert!(text.starts_with("Scanned at: 01/03/2026 09:30"));
        assert!(text.contains("Found 2 new listings for 'Haifa'"));
        assert!(text.contains("Price: 1,950,000 ₪"));
        assert!(text.contains("Link: #"));
    }

    #[test]
    fn test_render_html_escapes_content() {
        let html = render_html(&items(), "Haifa", at());
        assert!(html.contains("4 rooms &lt;renovated&gt;"));
        assert!(html.contains(r#"href="https://www.yad2.co.il/item/1""#));
        assert_eq!(html.matches(r#"<div class="item">"#).count(), 2);
    }

    #[test]
    fn test_build_message() {
        assert!(build_message(&settings(), &items(), "Haifa", at()).is_ok());

        let mut bad = settings();
        bad.recipient = "not-an-address".into();
        assert!(matches!(
            build_message(&bad, &items(), "Haifa", at()),
            Err(AppError::Email(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_channel_is_skipped() {
        let notifier = EmailNotifier::new(EmailConfig::default());
        let delivery = notifier.notify(&items(), "Haifa").await;
        assert_eq!(delivery, Delivery::Skipped);
        assert!(!delivery.is_delivered());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_failed_delivery() {
        let notifier = EmailNotifier::new(EmailConfig {
            enabled: true,
            smtp_server: Some("127.0.0.1".into()),
            smtp_port: Some(1),
            sender_email: Some("watch@example.com".into()),
            sender_password: Some("secret".into()),
            recipient_email: Some("me@example.com".into()),
        });

        match notifier.notify(&items(), "Haifa").await {
            Delivery::Failed { reason } => assert!(!reason.is_empty()),
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_settings_are_reported() {
        let notifier = EmailNotifier::new(EmailConfig {
            enabled: true,
            smtp_server: Some("smtp.example.com".into()),
            ..EmailConfig::default()
        });
        match notifier.notify(&items(), "Haifa").await {
            Delivery::Incomplete { missing } => {
                assert!(missing.contains(&"recipient_email".to_string()));
                assert!(!missing.contains(&"smtp_server".to_string()));
            }
            other => panic!("unexpected delivery: {other:?}"),
        }
    }
}
