//! Notification dispatch
//!
//! The circulation core only ever fires notifications and forgets them; the
//! dispatcher is a trait so services can be tested with a mock and so the
//! transport can be swapped without touching circulation logic.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{edition::Edition, user::User},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    ReservationAvailable,
    Circulation,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::ReservationAvailable => "reservation-available",
            NotificationCategory::Circulation => "circulation",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(
        &self,
        user: &User,
        title: &str,
        message: &str,
        category: NotificationCategory,
    ) -> AppResult<()>;
}

/// Tell a reservation holder their edition is ready to borrow
pub async fn send_availability_notice(
    dispatcher: &dyn NotificationDispatcher,
    user: &User,
    edition: &Edition,
) -> AppResult<()> {
    let title = format!("\"{}\" is now available", edition.work_title);
    let message = format!(
        "Hello {},\n\nA copy of \"{}\" you reserved is now available. \
         You are first in line: borrow it at your branch to claim it.\n",
        user.full_name(),
        edition.work_title,
    );
    dispatcher
        .notify(user, &title, &message, NotificationCategory::ReservationAvailable)
        .await
}

/// SMTP-backed dispatcher
#[derive(Clone)]
pub struct EmailDispatcher {
    config: EmailConfig,
}

impl EmailDispatcher {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let builder = if self.config.smtp_use_tls {
            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("SMTP relay error: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        };

        let mut builder = builder.port(self.config.smtp_port);
        if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationDispatcher for EmailDispatcher {
    async fn notify(
        &self,
        user: &User,
        title: &str,
        message: &str,
        category: NotificationCategory,
    ) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Tessera Circulation");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        let to_mailbox = Mailbox::from_str(&user.email)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport()?
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::debug!(
            user_id = user.id,
            category = category.as_str(),
            "notification sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::MembershipTier;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn user() -> User {
        User {
            id: 7,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            tier: MembershipTier::Standard,
            borrow_limit: 5,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    fn edition() -> Edition {
        Edition {
            id: 3,
            work_title: "1984".to_string(),
            author: Some("George Orwell".to_string()),
            isbn: None,
            format: None,
            replacement_cost: dec!(25.00),
        }
    }

    #[tokio::test]
    async fn test_availability_notice_targets_reservation_holder() {
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher
            .expect_notify()
            .withf(|user, title, message, category| {
                user.id == 7
                    && title.contains("1984")
                    && message.contains("Ada Lovelace")
                    && *category == NotificationCategory::ReservationAvailable
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        send_availability_notice(&dispatcher, &user(), &edition())
            .await
            .unwrap();
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(
            NotificationCategory::ReservationAvailable.as_str(),
            "reservation-available"
        );
        assert_eq!(NotificationCategory::Circulation.as_str(), "circulation");
    }
}
