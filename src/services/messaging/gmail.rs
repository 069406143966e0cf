use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;

use super::{Attachment, EmailProvider};

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

pub struct GmailProvider {
    access_token: String,
    from_address: String,
    client: reqwest::Client,
}

impl GmailProvider {
    pub fn new(access_token: String, from_address: String) -> Self {
        Self {
            access_token,
            from_address,
            client: reqwest::Client::new(),
        }
    }
}

/// Builds an RFC 822 message: plain text, or multipart/mixed when an
/// attachment is present.
pub fn build_mime(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
    attachment: Option<&Attachment>,
    boundary: &str,
) -> String {
    let mut headers = String::new();
    if !from.is_empty() {
        headers.push_str(&format!("From: {from}\r\n"));
    }
    headers.push_str(&format!("To: {to}\r\nSubject: {subject}\r\nMIME-Version: 1.0\r\n"));

    let Some(attachment) = attachment else {
        return format!(
            "{headers}Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}\r\n"
        );
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(attachment.body.as_bytes());
    format!(
        "{headers}Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n\
         --{boundary}\r\n\
         Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n\
         {body}\r\n\
         --{boundary}\r\n\
         Content-Type: {content_type}; name=\"{filename}\"\r\n\
         Content-Disposition: attachment; filename=\"{filename}\"\r\n\
         Content-Transfer-Encoding: base64\r\n\r\n\
         {encoded}\r\n\
         --{boundary}--\r\n",
        content_type = attachment.content_type,
        filename = attachment.filename,
    )
}

#[async_trait]
impl EmailProvider for GmailProvider {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Attachment>,
    ) -> anyhow::Result<()> {
        let boundary = format!("callbook-{}", uuid::Uuid::new_v4().simple());
        let mime = build_mime(&self.from_address, to, subject, body, attachment, &boundary);
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mime.as_bytes());

        self.client
            .post(SEND_URL)
            .bearer_auth(&self.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .context("failed to call Gmail send API")?
            .error_for_status()
            .context("Gmail API returned error")?;

        tracing::info!(to, "confirmation email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        let mime = build_mime(
            "desk@example.com",
            "dana@example.com",
            "Your appointment",
            "See you then.",
            None,
            "b1",
        );
        assert!(mime.starts_with("From: desk@example.com\r\nTo: dana@example.com\r\n"));
        assert!(mime.contains("Subject: Your appointment\r\n"));
        assert!(mime.contains("Content-Type: text/plain"));
        assert!(mime.ends_with("See you then.\r\n"));
        assert!(!mime.contains("multipart"));
    }

    #[test]
    fn test_message_with_attachment() {
        let attachment = Attachment {
            filename: "appointment.ics".to_string(),
            content_type: "text/calendar".to_string(),
            body: "BEGIN:VCALENDAR".to_string(),
        };
        let mime = build_mime("", "dana@example.com", "Hi", "Body", Some(&attachment), "b1");
        assert!(!mime.contains("From:"));
        assert!(mime.contains("multipart/mixed; boundary=\"b1\""));
        assert!(mime.contains("filename=\"appointment.ics\""));
        let encoded = base64::engine::general_purpose::STANDARD.encode("BEGIN:VCALENDAR");
        assert!(mime.contains(&encoded));
        assert!(mime.trim_end().ends_with("--b1--"));
    }
}
