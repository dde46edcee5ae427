//! SMTP delivery of generated files.

use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::state::SmtpSettings;

/// Send one email with a plain-text body and a single file attachment.
pub async fn send_with_attachment(
    settings: &SmtpSettings,
    to: Mailbox,
    subject: &str,
    body: &str,
    attachment_name: &str,
    attachment: Vec<u8>,
    content_type: &str,
) -> anyhow::Result<()> {
    let from: Mailbox = settings
        .from
        .parse()
        .context("invalid SMTP_FROM address")?;

    let attachment_type =
        ContentType::parse(content_type).context("invalid attachment content type")?;

    let email = Message::builder()
        .from(from)
        .to(to.clone())
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(body.to_string()),
                )
                .singlepart(
                    Attachment::new(attachment_name.to_string()).body(attachment, attachment_type),
                ),
        )
        .context("failed to build email message")?;

    let creds = Credentials::new(settings.username.clone(), settings.password.clone());
    let mailer: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .context("failed to create SMTP transport")?
            .port(settings.port)
            .credentials(creds)
            .build();

    mailer
        .send(email)
        .await
        .context("failed to send email via SMTP")?;

    tracing::info!(to = %to, subject, attachment = attachment_name, "email sent");
    Ok(())
}
