use crate::config::{Config, EmailConfig};
use crate::error::{AppError, Result};
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    fn from_config(email: &EmailConfig) -> Result<Self> {
        let (Some(host), Some(port), Some(from_email)) =
            (&email.smtp_host, email.smtp_port, &email.from_email)
        else {
            return Err(AppError::Internal("SMTP settings are incomplete".into()));
        };

        let address = from_email
            .parse::<Address>()
            .map_err(|e| AppError::Internal(format!("Invalid EMAILS_FROM_EMAIL address: {}", e)))?;
        let from = Mailbox::new(Some(email.from_name.clone()), address);

        let builder = if email.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).map_err(|e| {
                AppError::Internal(format!("Failed to configure SMTP transport: {}", e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        }
        .port(port);

        let builder = match (&email.smtp_user, &email.smtp_password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.to_string(), password.to_string()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Outgoing account emails. Without SMTP settings it runs in no-op mode
/// and only logs what would have been sent.
#[derive(Clone)]
pub struct EmailService {
    sender: Option<Arc<SmtpSender>>,
    project_name: String,
    server_host: String,
    reset_valid_hours: i64,
}

/// Subject, HTML body and plain-text body of one message
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self> {
        let email = &config.email;

        let sender = if email.emails_enabled() {
            Some(Arc::new(SmtpSender::from_config(email)?))
        } else {
            warn!("SMTP not configured; email service will operate in no-op mode");
            None
        };

        Ok(Self {
            sender,
            project_name: config.app.project_name.clone(),
            server_host: config.app.server_host.clone(),
            reset_valid_hours: config.jwt.reset_token_lifetime().num_hours(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn render_new_account(&self, username: &str) -> RenderedEmail {
        let project = &self.project_name;
        let link = &self.server_host;
        let subject = format!("{project} - New account for user {username}");

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <h2>{project}</h2>
    <p>Welcome, <strong>{username}</strong>! Your account has been created.</p>
    <p style="margin: 30px 0;">
        <a href="{link}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 25px; display: inline-block;">Go to {project}</a>
    </p>
</body>
</html>"#
        );
        let text = format!(
            "Welcome to {project}, {username}!\n\n\
            Your account has been created. Sign in at:\n{link}\n"
        );

        RenderedEmail {
            subject,
            html,
            text,
        }
    }

    pub fn render_reset_password(&self, username: &str, token: &str) -> RenderedEmail {
        let project = &self.project_name;
        let hours = self.reset_valid_hours;
        let link = format!("{}/reset-password?token={}", self.server_host, token);
        let subject = format!("{project} - Password recovery for user {username}");

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <h2>{project}</h2>
    <p>We received a request to recover the password for user <strong>{username}</strong>.</p>
    <p style="margin: 30px 0;">
        <a href="{link}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 25px; display: inline-block;">Reset password</a>
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">
        This link will expire in {hours} hours.<br>
        If you did not request a password recovery you can ignore this email.
    </p>
</body>
</html>"#
        );
        let text = format!(
            "We received a request to recover the password for user {username}.\n\n\
            Reset it here:\n{link}\n\n\
            This link will expire in {hours} hours.\n\
            If you did not request a password recovery you can ignore this email."
        );

        RenderedEmail {
            subject,
            html,
            text,
        }
    }

    pub async fn send_new_account_email(&self, recipient: &str, username: &str) -> Result<()> {
        let email = self.render_new_account(username);
        self.send_html_email(recipient, &email).await
    }

    pub async fn send_reset_password_email(
        &self,
        recipient: &str,
        username: &str,
        token: &str,
    ) -> Result<()> {
        let email = self.render_reset_password(username, token);
        self.send_html_email(recipient, &email).await
    }

    /// Send in the background; failures are logged.
    pub fn dispatch_new_account_email(&self, recipient: String, username: String) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send_new_account_email(&recipient, &username).await {
                warn!(username = %username, "new account email failed: {}", e);
            }
        });
    }

    /// Send in the background; failures are logged.
    pub fn dispatch_reset_password_email(&self, recipient: String, username: String, token: String) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service
                .send_reset_password_email(&recipient, &username, &token)
                .await
            {
                warn!(username = %username, "password recovery email failed: {}", e);
            }
        });
    }

    async fn send_html_email(&self, recipient: &str, email: &RenderedEmail) -> Result<()> {
        let Some(sender) = &self.sender else {
            info!(
                subject = %email.subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid recipient email address: {}", e)))?;

        let message = Message::builder()
            .from(sender.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )
            .map_err(|e| AppError::Email(format!("Failed to build email message: {}", e)))?;

        sender
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;

        info!(subject = %email.subject, "email sent successfully");
        Ok(())
    }
}
