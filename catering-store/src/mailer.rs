//! Lifecycle email delivery: Brevo's transactional API in production, the
//! log in development.

use std::time::Duration;

use async_trait::async_trait;
use catering_core::{Notification, NotificationDispatcher, NotificationError};
use catering_shared::mask_email;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::info;

use crate::app_config::BrevoConfig;

pub mod templates {
    use catering_core::{Notification, NotificationDetails, PAYMENT_WINDOW_HOURS};
    use catering_shared::format_peso;
    use chrono::{DateTime, NaiveDate, Utc};

    const BRAND: &str = "Zaf's Kitchen";

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RenderedEmail {
        pub subject: String,
        pub html: String,
    }

    fn escape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        out
    }

    fn long_date(date: NaiveDate) -> String {
        date.format("%B %-d, %Y").to_string()
    }

    fn long_timestamp(at: DateTime<Utc>) -> String {
        at.format("%B %-d, %Y %H:%M UTC").to_string()
    }

    fn row(label: &str, value: &str) -> String {
        format!(
            "<tr><td style='padding:8px 0;border-bottom:1px solid #dee2e6;'><strong>{label}</strong></td>\
             <td style='padding:8px 0;border-bottom:1px solid #dee2e6;'>{value}</td></tr>"
        )
    }

    fn layout(heading: &str, intro: &str, rows: &[String], footer_note: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head><meta charset='UTF-8'><title>{heading}</title></head>\
             <body style='font-family:Arial,sans-serif;color:#333;background-color:#f4f4f4;'>\
             <div style='max-width:600px;margin:0 auto;padding:20px;background-color:#ffffff;'>\
             <h1 style='color:#DC2626;text-align:center;'>{brand}</h1>\
             <h2>{heading}</h2><p>{intro}</p>\
             <table style='width:100%;border-collapse:collapse;'>{rows}</table>\
             {footer_note}\
             <p style='font-size:14px;color:#666;text-align:center;'>Thank you for choosing {brand}!</p>\
             </div></body></html>",
            brand = escape(BRAND),
            rows = rows.concat(),
        )
    }

    /// Subject and HTML body for one lifecycle email.
    pub fn render(notification: &Notification) -> RenderedEmail {
        let booking_id = notification.booking_id.to_string();
        let name = escape(&notification.recipient.name);

        match &notification.details {
            NotificationDetails::Approval {
                total_price,
                event_date,
                payment_deadline,
            } => RenderedEmail {
                subject: format!("🎉 Your Booking Has Been Approved! - {BRAND}"),
                html: layout(
                    "🎉 Booking Approved!",
                    &format!("Hi {name}, your booking request has been approved."),
                    &[
                        row("Booking ID:", &booking_id),
                        row("Event Date:", &long_date(*event_date)),
                        row("Total Amount:", &format_peso(*total_price)),
                        row("Pay Before:", &long_timestamp(*payment_deadline)),
                    ],
                    &format!(
                        "<p><strong>You have {PAYMENT_WINDOW_HOURS} hours to complete your payment.</strong> \
                         If payment is not received within {PAYMENT_WINDOW_HOURS} hours, your booking \
                         will be automatically cancelled.</p>"
                    ),
                ),
            },
            NotificationDetails::Rejection { reason } => RenderedEmail {
                subject: format!("❌ Booking Request Declined - {BRAND}"),
                html: layout(
                    "Booking Request Declined",
                    &format!("Hi {name}, unfortunately we are unable to accept your booking request."),
                    &[
                        row("Booking ID:", &booking_id),
                        row("Reason:", &escape(reason)),
                    ],
                    "<p>You are welcome to submit a new request for another date.</p>",
                ),
            },
            NotificationDetails::PaymentReceived {
                total_price,
                event_date,
            } => RenderedEmail {
                subject: format!("✅ Payment Received - Booking Confirmed! - {BRAND}"),
                html: layout(
                    "✅ Payment Received!",
                    &format!("Hi {name}, we have received your payment and your booking is confirmed."),
                    &[
                        row("Booking ID:", &booking_id),
                        row("Event Date:", &long_date(*event_date)),
                        row("Amount Paid:", &format_peso(*total_price)),
                    ],
                    "<p>We look forward to serving you.</p>",
                ),
            },
            NotificationDetails::Cancellation { reason } => RenderedEmail {
                subject: format!("❌ Booking Cancelled - {BRAND}"),
                html: layout(
                    "Booking Cancelled",
                    &format!("Hi {name}, your booking has been cancelled."),
                    &[
                        row("Booking ID:", &booking_id),
                        row("Reason:", &escape(reason)),
                    ],
                    "<p>If you still want to book, please submit a new request.</p>",
                ),
            },
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use catering_core::Recipient;
        use chrono::TimeZone;
        use rust_decimal::Decimal;
        use uuid::Uuid;

        fn notification(details: NotificationDetails) -> Notification {
            Notification {
                booking_id: Uuid::nil(),
                recipient: Recipient {
                    email: "ana@example.com".to_string(),
                    name: "Ana <Reyes>".to_string(),
                },
                details,
            }
        }

        #[test]
        fn test_approval_mentions_amount_and_window() {
            let email = render(&notification(NotificationDetails::Approval {
                total_price: Decimal::new(1_250_000, 2),
                event_date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
                payment_deadline: Utc.with_ymd_and_hms(2025, 11, 2, 6, 0, 0).unwrap(),
            }));
            assert_eq!(email.subject, "🎉 Your Booking Has Been Approved! - Zaf's Kitchen");
            assert!(email.html.contains("₱12,500.00"));
            assert!(email.html.contains("December 5, 2025"));
            assert!(email.html.contains("20 hours"));
            assert!(email.html.contains("Ana &lt;Reyes&gt;"));
        }

        #[test]
        fn test_subjects_per_kind() {
            let rejection = render(&notification(NotificationDetails::Rejection {
                reason: "Fully booked".to_string(),
            }));
            assert_eq!(rejection.subject, "❌ Booking Request Declined - Zaf's Kitchen");
            assert!(rejection.html.contains("Fully booked"));

            let paid = render(&notification(NotificationDetails::PaymentReceived {
                total_price: Decimal::new(500_000, 2),
                event_date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            }));
            assert_eq!(paid.subject, "✅ Payment Received - Booking Confirmed! - Zaf's Kitchen");

            let cancelled = render(&notification(NotificationDetails::Cancellation {
                reason: "Payment not received within 20-hour deadline".to_string(),
            }));
            assert_eq!(cancelled.subject, "❌ Booking Cancelled - Zaf's Kitchen");
        }
    }
}

#[derive(Serialize)]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Contact<'a>,
    to: [Contact<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

/// Brevo transactional email client
#[derive(Clone)]
pub struct BrevoDispatcher {
    client: Client,
    config: BrevoConfig,
}

impl BrevoDispatcher {
    pub fn new(config: BrevoConfig) -> Result<Self, NotificationError> {
        if config.api_key.trim().is_empty() {
            return Err(NotificationError::Configuration(
                "Brevo API key is not set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotificationError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl NotificationDispatcher for BrevoDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let email = templates::render(notification);
        let request = SendEmailRequest {
            sender: Contact {
                email: &self.config.sender_email,
                name: &self.config.sender_name,
            },
            to: [Contact {
                email: &notification.recipient.email,
                name: &notification.recipient.name,
            }],
            subject: &email.subject,
            html_content: &email.html,
        };

        let response = self
            .client
            .post(format!("{}/smtp/email", self.config.api_url.trim_end_matches('/')))
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(NotificationError::Rejected {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}

/// Logs emails instead of sending them. Development only.
#[derive(Clone, Debug, Default)]
pub struct ConsoleDispatcher;

impl ConsoleDispatcher {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for ConsoleDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let email = templates::render(notification);
        info!(
            booking_id = %notification.booking_id,
            kind = %notification.kind(),
            to = %mask_email(&notification.recipient.email),
            subject = %email.subject,
            "📧 Email (console mode, not sent)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catering_core::{NotificationDetails, Recipient};
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_url: String) -> BrevoConfig {
        BrevoConfig {
            api_key: "xkeysib-test".to_string(),
            sender_email: "bookings@example.com".to_string(),
            sender_name: "Kitchen".to_string(),
            api_url,
        }
    }

    fn rejection() -> Notification {
        Notification {
            booking_id: Uuid::new_v4(),
            recipient: Recipient {
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
            },
            details: NotificationDetails::Rejection {
                reason: "Date unavailable".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_brevo_created_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .and(header("api-key", "xkeysib-test"))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"messageId":"<1@x>"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = BrevoDispatcher::new(config(server.uri())).unwrap();
        dispatcher.send(&rejection()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["to"][0]["email"], "ana@example.com");
        assert_eq!(body["sender"]["name"], "Kitchen");
        assert_eq!(body["subject"], "❌ Booking Request Declined - Zaf's Kitchen");
        assert!(body["htmlContent"].as_str().unwrap().contains("Date unavailable"));
    }

    #[tokio::test]
    async fn test_brevo_non_201_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let dispatcher = BrevoDispatcher::new(config(server.uri())).unwrap();
        let err = dispatcher.send(&rejection()).await.unwrap_err();
        match err {
            NotificationError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let mut cfg = config("http://localhost".to_string());
        cfg.api_key = "  ".to_string();
        assert!(matches!(
            BrevoDispatcher::new(cfg),
            Err(NotificationError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_console_dispatcher_always_succeeds() {
        assert!(ConsoleDispatcher::new().send(&rejection()).await.is_ok());
    }
}
