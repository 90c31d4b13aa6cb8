//! Email notification service.
//!
//! Notifications are best-effort: delivery failures are logged and never
//! reach the caller. When no SMTP settings are configured every send is
//! skipped.

use std::sync::Arc;

use estate_common::config::EmailSettings;
use estate_common::{AppError, AppResult};
use estate_db::entities::{expertise_inquiry, inquiry, property_review};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// A rendered email with plain text and HTML alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Site details used by the templates.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

/// Outgoing mail transport.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one email to `to`.
    async fn send(&self, to: &str, email: &RenderedEmail) -> AppResult<()>;
}

/// SMTP transport backed by lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build an SMTP transport from settings. Port 465 style implicit TLS is
    /// used when `smtp_secure` is set, STARTTLS otherwise.
    pub fn new(settings: &EmailSettings) -> AppResult<Self> {
        let builder = if settings.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
        }
        .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
        .port(settings.smtp_port);

        let builder = match (&settings.username, &settings.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        let address: Address = settings
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(settings.from_name.clone()), address),
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> AppResult<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient {to}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}

/// Email notification service.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<Arc<dyn Mailer>>,
    site: SiteInfo,
    admin_address: Option<String>,
}

impl EmailService {
    /// Create the service from optional SMTP settings.
    pub fn new(settings: Option<&EmailSettings>, site_url: &str) -> AppResult<Self> {
        let Some(settings) = settings else {
            return Ok(Self::disabled(site_url));
        };

        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(settings)?);
        Ok(Self::with_mailer(
            mailer,
            SiteInfo {
                name: settings.site_name.clone(),
                url: site_url.trim_end_matches('/').to_string(),
            },
            Some(settings.admin_address.clone()),
        ))
    }

    /// Create a service using a custom transport.
    #[must_use]
    pub fn with_mailer(
        mailer: Arc<dyn Mailer>,
        site: SiteInfo,
        admin_address: Option<String>,
    ) -> Self {
        Self {
            mailer: Some(mailer),
            site,
            admin_address,
        }
    }

    /// A service that skips every send.
    #[must_use]
    pub fn disabled(site_url: &str) -> Self {
        Self {
            mailer: None,
            site: SiteInfo {
                name: "Estate".to_string(),
                url: site_url.trim_end_matches('/').to_string(),
            },
            admin_address: None,
        }
    }

    /// Check if email delivery is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    async fn deliver(&self, to: &str, email: RenderedEmail) {
        let Some(mailer) = &self.mailer else {
            tracing::debug!(to = %to, subject = %email.subject, "Email disabled, skipping send");
            return;
        };

        match mailer.send(to, &email).await {
            Ok(()) => tracing::debug!(to = %to, subject = %email.subject, "Email sent"),
            Err(e) => tracing::warn!(to = %to, subject = %email.subject, error = %e, "Failed to send email"),
        }
    }

    async fn deliver_to_admin(&self, email: RenderedEmail) {
        match &self.admin_address {
            Some(admin) => self.deliver(admin, email).await,
            None => tracing::debug!(subject = %email.subject, "No admin address, skipping notification"),
        }
    }

    /// Notify the admin of a new inquiry and acknowledge it to the customer.
    pub async fn inquiry_received(&self, inquiry: &inquiry::Model, property_title: Option<&str>) {
        self.deliver_to_admin(inquiry_admin_notification(&self.site, inquiry, property_title))
            .await;
        self.deliver(
            &inquiry.email,
            inquiry_acknowledgment(&self.site, inquiry, property_title),
        )
        .await;
    }

    /// Send the admin's response to the customer.
    pub async fn inquiry_responded(&self, inquiry: &inquiry::Model) {
        if inquiry.admin_response.is_none() {
            return;
        }
        self.deliver(&inquiry.email, inquiry_response(&self.site, inquiry))
            .await;
    }

    /// Notify the admin of a consultation request and acknowledge it.
    pub async fn expertise_received(&self, request: &expertise_inquiry::Model) {
        self.deliver_to_admin(expertise_admin_notification(&self.site, request))
            .await;
        self.deliver(&request.email, expertise_acknowledgment(&self.site, request))
            .await;
    }

    /// Notify the admin of a review awaiting moderation.
    pub async fn review_received(&self, review: &property_review::Model, property_title: &str) {
        self.deliver_to_admin(review_admin_notification(&self.site, review, property_title))
            .await;
    }
}

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn wrap_html(content: &str, site: &SiteInfo) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        table {{ border-collapse: collapse; }}
        td {{ padding: 4px 12px 4px 0; vertical-align: top; }}
        blockquote {{ margin: 10px 0; padding: 10px 20px; border-left: 4px solid #e9ecef; background: #f8f9fa; }}
    </style>
</head>
<body>
    {}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        Sent by <a href="{}">{}</a>.
    </p>
</body>
</html>"#,
        content,
        escape_html(&site.url),
        escape_html(&site.name)
    )
}

/// Render `(label, value)` rows as an HTML table, escaping values.
fn detail_rows(rows: &[(&str, Option<&str>)]) -> String {
    let body: String = rows
        .iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .map(|(label, value)| {
            format!(
                "<tr><td><strong>{label}</strong></td><td>{}</td></tr>",
                escape_html(value)
            )
        })
        .collect();
    format!("<table>{body}</table>")
}

fn detail_text(rows: &[(&str, Option<&str>)]) -> String {
    rows.iter()
        .filter_map(|(label, value)| value.map(|v| format!("{label}: {v}\n")))
        .collect()
}

/// Admin notification for a new inquiry.
#[must_use]
pub fn inquiry_admin_notification(
    site: &SiteInfo,
    inquiry: &inquiry::Model,
    property_title: Option<&str>,
) -> RenderedEmail {
    let rows = [
        ("Name", Some(inquiry.name.as_str())),
        ("Email", Some(inquiry.email.as_str())),
        ("Phone", Some(inquiry.phone.as_str())),
        ("Property", property_title),
        ("Subject", inquiry.subject.as_deref()),
        ("Source", inquiry.source.as_deref()),
    ];

    let subject = property_title.map_or_else(
        || format!("New inquiry from {}", inquiry.name),
        |title| format!("New inquiry for {title}"),
    );
    let text = format!("{}\nMessage:\n{}\n", detail_text(&rows), inquiry.message);
    let html = wrap_html(
        &format!(
            "<h2>New inquiry</h2>{}<blockquote>{}</blockquote>",
            detail_rows(&rows),
            escape_html(&inquiry.message)
        ),
        site,
    );

    RenderedEmail { subject, text, html }
}

/// Acknowledgment sent to the customer after an inquiry.
#[must_use]
pub fn inquiry_acknowledgment(
    site: &SiteInfo,
    inquiry: &inquiry::Model,
    property_title: Option<&str>,
) -> RenderedEmail {
    let about = property_title.map_or_else(String::new, |t| format!(" about {t}"));
    let subject = format!("We received your inquiry - {}", site.name);
    let text = format!(
        "Hi {},\n\nThank you for your inquiry{about}. Our team will get back to you shortly.\n\n{}\n{}",
        inquiry.name, site.name, site.url
    );
    let html = wrap_html(
        &format!(
            "<p>Hi {},</p><p>Thank you for your inquiry{}. Our team will get back to you shortly.</p>",
            escape_html(&inquiry.name),
            escape_html(&about)
        ),
        site,
    );

    RenderedEmail { subject, text, html }
}

/// The admin's response to an inquiry.
#[must_use]
pub fn inquiry_response(site: &SiteInfo, inquiry: &inquiry::Model) -> RenderedEmail {
    let response = inquiry.admin_response.as_deref().unwrap_or_default();
    let subject = format!("Response to your inquiry - {}", site.name);
    let text = format!(
        "Hi {},\n\n{response}\n\nYour message:\n{}\n\n{}\n{}",
        inquiry.name, inquiry.message, site.name, site.url
    );
    let html = wrap_html(
        &format!(
            "<p>Hi {},</p><p>{}</p><p>Your message:</p><blockquote>{}</blockquote>",
            escape_html(&inquiry.name),
            escape_html(response),
            escape_html(&inquiry.message)
        ),
        site,
    );

    RenderedEmail { subject, text, html }
}

/// Admin notification for a consultation request.
#[must_use]
pub fn expertise_admin_notification(
    site: &SiteInfo,
    request: &expertise_inquiry::Model,
) -> RenderedEmail {
    let rows = [
        ("Name", Some(request.full_name.as_str())),
        ("Email", Some(request.email.as_str())),
        ("Phone", Some(request.phone.as_str())),
        ("Consultation", Some(request.consultation_type.as_str())),
        ("Service", request.service_type.as_deref()),
        ("Preferred time", request.preferred_time_slot.as_deref()),
        ("Message", request.message.as_deref()),
    ];

    let subject = format!("New consultation request from {}", request.full_name);
    let text = detail_text(&rows);
    let html = wrap_html(
        &format!("<h2>New consultation request</h2>{}", detail_rows(&rows)),
        site,
    );

    RenderedEmail { subject, text, html }
}

/// Acknowledgment sent after a consultation request.
#[must_use]
pub fn expertise_acknowledgment(
    site: &SiteInfo,
    request: &expertise_inquiry::Model,
) -> RenderedEmail {
    let subject = format!("Your consultation request - {}", site.name);
    let slot = request
        .preferred_time_slot
        .as_deref()
        .map_or_else(String::new, |s| format!(" We will try to reach you in your preferred slot ({s})."));
    let text = format!(
        "Hi {},\n\nThank you for requesting a {} consultation.{slot}\n\n{}\n{}",
        request.full_name, request.consultation_type, site.name, site.url
    );
    let html = wrap_html(
        &format!(
            "<p>Hi {},</p><p>Thank you for requesting a <strong>{}</strong> consultation.{}</p>",
            escape_html(&request.full_name),
            escape_html(&request.consultation_type),
            escape_html(&slot)
        ),
        site,
    );

    RenderedEmail { subject, text, html }
}

/// Admin notification for a new review.
#[must_use]
pub fn review_admin_notification(
    site: &SiteInfo,
    review: &property_review::Model,
    property_title: &str,
) -> RenderedEmail {
    let rating = review.rating.to_string();
    let rows = [
        ("Property", Some(property_title)),
        ("Reviewer", Some(review.reviewer_name.as_str())),
        ("Email", Some(review.reviewer_email.as_str())),
        ("Rating", Some(rating.as_str())),
        ("Title", review.title.as_deref()),
    ];

    let subject = format!("New {rating}-star review for {property_title}");
    let text = format!(
        "{}\n{}\n\nThe review is pending moderation.",
        detail_text(&rows),
        review.comment
    );
    let html = wrap_html(
        &format!(
            "<h2>New review awaiting moderation</h2>{}<blockquote>{}</blockquote>",
            detail_rows(&rows),
            escape_html(&review.comment)
        ),
        site,
    );

    RenderedEmail { subject, text, html }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use estate_db::entities::inquiry::{InquiryStatus, InquiryType};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, email: &RenderedEmail) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), email.subject.clone()));
            Ok(())
        }
    }

    fn site() -> SiteInfo {
        SiteInfo {
            name: "Estate".to_string(),
            url: "https://estate.example".to_string(),
        }
    }

    fn test_inquiry() -> inquiry::Model {
        inquiry::Model {
            id: "i1".to_string(),
            property_id: None,
            name: "<b>Asha</b>".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            message: "Hello & welcome <script>".to_string(),
            subject: None,
            inquiry_type: InquiryType::General,
            source: None,
            status: InquiryStatus::Pending,
            admin_response: None,
            responded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_inquiry_notification_escapes_user_input() {
        let email = inquiry_admin_notification(&site(), &test_inquiry(), Some("Sea View Flat"));

        assert_eq!(email.subject, "New inquiry for Sea View Flat");
        assert!(email.html.contains("&lt;b&gt;Asha&lt;/b&gt;"));
        assert!(email.html.contains("Hello &amp; welcome &lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert!(email.text.contains("Name: <b>Asha</b>"));
    }

    #[test]
    fn test_general_inquiry_subject() {
        let email = inquiry_admin_notification(&site(), &test_inquiry(), None);
        assert_eq!(email.subject, "New inquiry from <b>Asha</b>");
        assert!(!email.text.contains("Property:"));
    }

    #[tokio::test]
    async fn test_inquiry_received_sends_admin_and_customer_mail() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = EmailService::with_mailer(
            mailer.clone(),
            site(),
            Some("admin@estate.example".to_string()),
        );

        service.inquiry_received(&test_inquiry(), None).await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "admin@estate.example");
        assert_eq!(sent[1].0, "asha@example.com");
    }

    #[tokio::test]
    async fn test_inquiry_responded_requires_response() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = EmailService::with_mailer(mailer.clone(), site(), None);

        let mut inquiry = test_inquiry();
        service.inquiry_responded(&inquiry).await;
        inquiry.admin_response = Some("Yes, still available".to_string());
        service.inquiry_responded(&inquiry).await;

        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_service_skips_sends() {
        let service = EmailService::disabled("https://estate.example");
        assert!(!service.is_enabled());
        service.inquiry_received(&test_inquiry(), None).await;
    }
}
