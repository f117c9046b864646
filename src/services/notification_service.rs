//! Notifications
//!
//! Expiry e-mails go through a `Mailer`. With `MAIL_API_URL` set they are
//! POSTed as JSON to an HTTP mail relay, otherwise they are only logged.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::MailConfig;
use crate::models::{Document, Vendor};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self.client.post(&self.api_url).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Mail relay answered {}: {}", status, body);
            return Err(anyhow!("mail relay returned {}", status));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Writes messages to the log instead of delivering them
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!("📧 [mail:log] to={} subject={}", message.to, message.subject);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Pick the relay mailer when one is configured
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    match &config.api_url {
        Some(url) => Ok(Arc::new(HttpMailer::new(url.clone(), config.api_key.clone())?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, from: String) -> Self {
        Self { mailer, from }
    }

    pub fn mailer_name(&self) -> &'static str {
        self.mailer.name()
    }

    pub fn expiry_message(&self, vendor: &Vendor, document: &Document, now: DateTime<Utc>) -> EmailMessage {
        let (subject, when) = match document.expiry_date {
            Some(date) if date < now => (
                format!("{} has expired", document.document_type.label()),
                format!("expired on {}", date.format("%Y-%m-%d")),
            ),
            Some(date) => (
                format!("{} expires soon", document.document_type.label()),
                format!("expires on {} ({} days left)", date.format("%Y-%m-%d"), (date - now).num_days()),
            ),
            None => (
                format!("{} needs attention", document.document_type.label()),
                "has no expiry date on record".to_string(),
            ),
        };

        let text = format!(
            "Hello {},\n\n{} {} for {} {} {}.\nPlease upload a renewed document to keep the entity compliant.\n",
            vendor.name,
            document.document_type.label(),
            document.document_number,
            document.entity_type.as_str().to_lowercase(),
            document.entity_id,
            when,
        );

        EmailMessage {
            from: self.from.clone(),
            to: vendor.email.clone(),
            subject,
            text,
        }
    }

    pub async fn send_expiry_notification(&self, vendor: &Vendor, document: &Document) -> Result<()> {
        let message = self.expiry_message(vendor, document, Utc::now());
        self.mailer.send(&message).await
    }
}
