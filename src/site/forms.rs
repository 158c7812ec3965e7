//! Contact and application form submission.
//!
//! A submission is always logged. When an SMTP relay is configured the
//! fields are also mailed to the site owner.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport, message::SinglePart,
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::error::SubmitError;

pub const SENT_LABEL: &str = "Message Sent!";

/// How long the submit button shows the sent state
pub const RESET_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Application,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormKind::Contact => write!(f, "Contact"),
            FormKind::Application => write!(f, "Application"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    original_text: String,
    pub text: String,
    pub disabled: bool,
    /// Accent background while showing the sent state
    pub highlighted: bool,
}

impl SubmitButton {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            original_text: text.clone(),
            text,
            disabled: false,
            highlighted: false,
        }
    }

    pub fn mark_sent(&mut self) {
        self.text = SENT_LABEL.to_string();
        self.highlighted = true;
        self.disabled = true;
    }

    pub fn restore(&mut self) {
        self.text = self.original_text.clone();
        self.highlighted = false;
        self.disabled = false;
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub fields: BTreeMap<String, String>,
    pub button: SubmitButton,
}

impl Form {
    pub fn new(kind: FormKind, button_text: impl Into<String>) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
            button: SubmitButton::new(button_text),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn reset(&mut self) {
        self.fields.clear();
    }
}

/// Field values captured at submit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub kind: FormKind,
    pub fields: BTreeMap<String, String>,
}

impl FormSubmission {
    pub fn subject(&self) -> String {
        format!("New {} form submission", self.kind)
    }

    pub fn body(&self) -> String {
        let mut content = String::new();
        for (name, value) in &self.fields {
            content.push_str(&format!("{}: {}\n", name, value));
        }
        content
    }
}

/// Forwards submissions somewhere outside the page
#[async_trait]
pub trait SubmissionRelay: Send + Sync {
    async fn relay(&self, submission: &FormSubmission) -> Result<(), SubmitError>;
}

pub struct SmtpRelay {
    config: SmtpConfig,
}

impl SmtpRelay {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, submission: &FormSubmission) -> Result<Message, SubmitError> {
        let email = Message::builder()
            .from(self.config.from.parse()?)
            .to(self.config.to.parse()?)
            .subject(submission.subject())
            .singlepart(SinglePart::plain(submission.body()))?;
        Ok(email)
    }
}

#[async_trait]
impl SubmissionRelay for SmtpRelay {
    async fn relay(&self, submission: &FormSubmission) -> Result<(), SubmitError> {
        let email = self.build_message(submission)?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mailer = SmtpTransport::relay(&self.config.server)?
            .credentials(creds)
            .build();

        // The SMTP transport blocks
        tokio::task::spawn_blocking(move || mailer.send(&email)).await??;
        Ok(())
    }
}

#[derive(Default)]
pub struct FormHandler {
    relay: Option<Box<dyn SubmissionRelay>>,
}

impl FormHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relay(relay: Box<dyn SubmissionRelay>) -> Self {
        Self { relay: Some(relay) }
    }

    /// Log and relay the form's fields, then clear the form and show the sent state.
    ///
    /// On a relay failure the form keeps its fields and the button is untouched.
    pub async fn submit(&self, form: &mut Form) -> Result<FormSubmission, SubmitError> {
        let submission = FormSubmission {
            kind: form.kind,
            fields: form.fields.clone(),
        };

        info!(form = %submission.kind, fields = ?submission.fields, "form submitted");

        if let Some(relay) = &self.relay {
            if let Err(err) = relay.relay(&submission).await {
                error!(form = %submission.kind, error = %err, "failed to relay form submission");
                return Err(err);
            }
        }

        form.button.mark_sent();
        form.reset();
        Ok(submission)
    }

    /// Submit, then put the button back after [`RESET_AFTER`]
    pub async fn submit_and_restore(&self, form: &mut Form) -> Result<FormSubmission, SubmitError> {
        let submission = self.submit(form).await?;
        tokio::time::sleep(RESET_AFTER).await;
        form.button.restore();
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording {
        seen: Arc<Mutex<Vec<FormSubmission>>>,
        fail: bool,
    }

    #[async_trait]
    impl SubmissionRelay for Recording {
        async fn relay(&self, submission: &FormSubmission) -> Result<(), SubmitError> {
            if self.fail {
                let bad: Result<lettre::Address, _> = "not an address".parse();
                return Err(bad.unwrap_err().into());
            }
            self.seen.lock().unwrap().push(submission.clone());
            Ok(())
        }
    }

    fn contact_form() -> Form {
        let mut form = Form::new(FormKind::Contact, "Send Message");
        form.set("name", "Ada");
        form.set("email", "ada@example.com");
        form
    }

    #[tokio::test]
    async fn submit_clears_form_and_marks_button() {
        let mut form = contact_form();
        let submission = FormHandler::new().submit(&mut form).await.unwrap();

        assert_eq!(submission.fields.get("name").map(String::as_str), Some("Ada"));
        assert!(form.fields.is_empty());
        assert_eq!(form.button.text, SENT_LABEL);
        assert!(form.button.disabled);
        assert!(form.button.highlighted);
    }

    #[tokio::test(start_paused = true)]
    async fn button_restores_after_delay() {
        let mut form = contact_form();
        FormHandler::new().submit_and_restore(&mut form).await.unwrap();

        assert_eq!(form.button.text, "Send Message");
        assert!(!form.button.disabled);
        assert!(!form.button.highlighted);
    }

    #[tokio::test]
    async fn relay_receives_the_fields() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = FormHandler::with_relay(Box::new(Recording {
            seen: Arc::clone(&seen),
            fail: false,
        }));
        let mut form = contact_form();
        handler.submit(&mut form).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].subject(), "New Contact form submission");
        assert_eq!(seen[0].body(), "email: ada@example.com\nname: Ada\n");
    }

    #[tokio::test]
    async fn relay_failure_keeps_the_form() {
        let handler = FormHandler::with_relay(Box::new(Recording {
            seen: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }));
        let mut form = contact_form();
        assert!(handler.submit(&mut form).await.is_err());
        assert_eq!(form.fields.len(), 2);
        assert_eq!(form.button.text, "Send Message");
    }

    #[test]
    fn smtp_message_builds() {
        let relay = SmtpRelay::new(SmtpConfig {
            server: "smtp.example.com".to_string(),
            username: "user".to_string(),
            password: "secret".to_string(),
            from: "site@example.com".to_string(),
            to: "owner@example.com".to_string(),
        });
        let submission = FormSubmission {
            kind: FormKind::Application,
            fields: BTreeMap::from([("position".to_string(), "Installer".to_string())]),
        };
        assert!(relay.build_message(&submission).is_ok());
    }
}
