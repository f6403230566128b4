use anyhow::{Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Serialize;
use tracing::{error, info, warn};

const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    html_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<Vec<BrevoAttachment>>,
}

#[derive(Debug, Serialize)]
struct BrevoAttachment {
    content: String,
    name: String,
}

/// Transactional-email client over the Brevo HTTP API. With no API key
/// configured every send degrades to a logged skip; callers never fail on
/// email problems.
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from_name: String,
    from_email: Option<String>,
}

impl Mailer {
    /// `smtp_from` follows the classic "Name <email@example.com>" shape.
    pub fn new(api_key: Option<String>, smtp_from: &str) -> Self {
        let (from_name, from_email) = parse_sender(smtp_from);
        Self {
            client: reqwest::Client::new(),
            api_key,
            from_name,
            from_email,
        }
    }

    pub async fn send(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        html: String,
        attachment: Option<(String, Vec<u8>)>,
    ) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            warn!("BREVO_API_KEY not set, skipping email.");
            return Ok(());
        };
        let Some(from_email) = &self.from_email else {
            error!("SMTP_FROM format is invalid. Should be 'Name <email@example.com>'");
            return Ok(());
        };

        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: from_email.clone(),
                name: (!self.from_name.is_empty()).then(|| self.from_name.clone()),
            },
            to: vec![BrevoEmailAddress {
                email: to_email.to_string(),
                name: Some(to_name.to_string()),
            }],
            subject: subject.to_string(),
            html_content: html,
            attachment: attachment.map(|(name, bytes)| {
                vec![BrevoAttachment {
                    content: B64.encode(bytes),
                    name,
                }]
            }),
        };

        let resp = self
            .client
            .post(BREVO_API_URL)
            .header("api-key", api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("Brevo send failed (status={status}): {detail}");
        }

        info!("Email sent to {} via Brevo API", to_email);
        Ok(())
    }

    /// Post-registration email: event summary plus the check-in QR attached,
    /// and the confirmation link when a public base URL is configured.
    pub async fn send_confirmation(
        &self,
        to_email: &str,
        full_name: &str,
        event_choice: &str,
        event_date_label: &str,
        confirm_url: Option<&str>,
        qr_png: Vec<u8>,
    ) -> Result<()> {
        let confirm_block = confirm_url
            .map(|url| {
                format!(
                    "<p>Veuillez confirmer votre adresse e-mail : \
                     <a href=\"{url}\">confirmer mon inscription</a></p>"
                )
            })
            .unwrap_or_default();

        let html = format!(
            "<div style=\"font-family:Arial,sans-serif\">\
               <h2>Pharmathon &amp; marchathon — Confirmation d'inscription</h2>\
               <p>Bonjour {full_name},</p>\
               <p>Merci pour votre inscription à l'événement de la Faculté de Pharmacie de Monastir.</p>\
               <ul>\
                 <li><strong>Épreuve :</strong> {event_choice}</li>\
                 <li><strong>Date :</strong> {event_date_label}</li>\
                 <li><strong>Départ :</strong> FPHM</li>\
               </ul>\
               {confirm_block}\
               <p>Votre code de présence (QR) est joint. Présentez-le le jour J au pointage.</p>\
               <p>À bientôt !</p>\
             </div>"
        );

        self.send(
            to_email,
            full_name,
            "Confirmation d'inscription — Pharmathon & marchathon (FPHM)",
            html,
            Some(("qr-checkin.png".to_string(), qr_png)),
        )
        .await
    }

    pub async fn send_reminder(
        &self,
        to_email: &str,
        full_name: &str,
        event_choice: &str,
        event_date_label: &str,
        days_left: i64,
    ) -> Result<()> {
        let html = format!(
            "<div style=\"font-family:Arial,sans-serif\">\
               <h2>Pharmathon &amp; marchathon — Rappel (J-{days_left})</h2>\
               <p>Bonjour {full_name},</p>\
               <p>L'événement approche ! Nous vous attendons le <strong>{event_date_label}</strong> \
                  à la <em>Faculté de Pharmacie de Monastir</em>.</p>\
               <p>Épreuve : <strong>{event_choice}</strong></p>\
               <p>Merci d'apporter votre QR code de pointage reçu par email lors de votre inscription.</p>\
               <p>À très vite !</p>\
             </div>"
        );

        self.send(
            to_email,
            full_name,
            &format!("Rappel — Pharmathon & marchathon (J-{days_left})"),
            html,
            None,
        )
        .await
    }
}

/// Split "Name <email@example.com>" into its parts. No angle brackets means
/// there is no usable sender address.
fn parse_sender(smtp_from: &str) -> (String, Option<String>) {
    let Some(start) = smtp_from.find('<') else {
        return (smtp_from.trim().to_string(), None);
    };
    let Some(end) = smtp_from[start..].find('>') else {
        return (smtp_from.trim().to_string(), None);
    };

    let email = smtp_from[start + 1..start + end].trim().to_string();
    let name = smtp_from[..start].trim().to_string();
    if email.is_empty() {
        return (name, None);
    }
    (name, Some(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_parsing() {
        assert_eq!(
            parse_sender("FPHM <noreply@fphm.tn>"),
            ("FPHM".to_string(), Some("noreply@fphm.tn".to_string()))
        );
        assert_eq!(
            parse_sender("<noreply@fphm.tn>"),
            (String::new(), Some("noreply@fphm.tn".to_string()))
        );
        assert_eq!(parse_sender("noreply@fphm.tn"), ("noreply@fphm.tn".to_string(), None));
        assert_eq!(parse_sender(""), (String::new(), None));
    }

    #[tokio::test]
    async fn missing_api_key_skips_without_error() {
        let mailer = Mailer::new(None, "FPHM <noreply@fphm.tn>");
        mailer
            .send("jo@x.com", "Jo", "sujet", "<p>corps</p>".into(), None)
            .await
            .unwrap();
    }
}
