use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::EmailReportConfig;
use crate::model::NotifyError;

pub struct EmailNotifier {
    config: EmailReportConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailReportConfig) -> Self {
        Self { config }
    }

    /// Sends the report to the configured recipient (the sending address
    /// itself when no recipient is set), STARTTLS with an app password.
    pub fn notify_report(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let from: Mailbox = self.config.user.parse()?;
        let to: Mailbox = self
            .config
            .to
            .as_deref()
            .unwrap_or(&self.config.user)
            .parse()?;
        let recipient = to.to_string();

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body.to_string())?;

        let mailer = SmtpTransport::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.app_password.clone(),
            ))
            .build();

        mailer.send(&message)?;
        info!("Report emailed to {recipient}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(user: &str, to: Option<&str>) -> EmailReportConfig {
        EmailReportConfig {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            user: user.to_string(),
            app_password: "secret".to_string(),
            to: to.map(str::to_string),
        }
    }

    #[test]
    fn recipient_defaults_to_sender() {
        let cfg = config("me@example.com", None);
        let to: Mailbox = cfg
            .to
            .as_deref()
            .unwrap_or(&cfg.user)
            .parse()
            .expect("mailbox");
        assert_eq!(to.email.to_string(), "me@example.com");
    }

    #[test]
    fn invalid_address_is_reported() {
        let notifier = EmailNotifier::new(config("not an address", None));
        assert!(matches!(
            notifier.notify_report("subject", "body"),
            Err(NotifyError::Address(_))
        ));
    }
}
