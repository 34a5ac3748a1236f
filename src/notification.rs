use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::document::{FormInput, RenderedDocument};
use crate::error::ContextError;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);
const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(15);

/// What the notification channel is told about a rendered request.
#[derive(Debug, Clone, Copy)]
pub struct NotificationPayload<'a> {
    pub applicant_name: &'a str,
    pub periods: &'a [String],
    pub continuous: bool,
    pub document: &'a RenderedDocument,
}

impl<'a> NotificationPayload<'a> {
    pub fn new(form_input: &'a FormInput, document: &'a RenderedDocument) -> Self {
        NotificationPayload {
            applicant_name: &form_input.applicant_name,
            periods: &form_input.periods,
            continuous: form_input.continuous,
            document,
        }
    }

    /// The announcement of the new request, formatted as Telegram HTML.
    pub fn message(&self) -> String {
        let periods_text = if self.continuous {
            "SERVICIO CONTINUO".to_string()
        } else {
            self.periods
                .iter()
                .map(|period| period.to_uppercase())
                .collect::<Vec<_>>()
                .join(" Y ")
        };

        format!(
            "🎉 <b>¡Tenemos nuevos Precursores Auxiliares!</b> 🎉\n\n\
             👤 <b>{}</b>\n\
             🗓️ <b>{}</b>\n\n\
             {}",
            escape_html(self.applicant_name),
            escape_html(&periods_text),
            self.hashtags()
        )
    }

    pub fn hashtags(&self) -> String {
        if self.continuous {
            return "#PA_CONTINUO".to_string();
        }
        self.periods
            .iter()
            .map(|period| format!("#PA_{}", period.trim().to_uppercase()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Escapes the characters that Telegram would otherwise read as HTML markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A destination for the announcements of new requests. The two transmissions are independent:
/// the document is sent even if the summary could not be.
pub trait NotificationChannel {
    fn send_summary(&self, message: &str) -> Result<(), ContextError>;

    fn send_document(&self, file_name: &str, bytes: &[u8]) -> Result<(), ContextError>;
}

/// The outcome of a notification, which is only ever informative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    pub summary_delivered: bool,
    pub document_delivered: bool,
    pub warnings: Vec<String>,
}

impl NotificationReport {
    pub fn is_complete(&self) -> bool {
        self.summary_delivered && self.document_delivered
    }
}

/// Sends the summary and then the document, collecting the failures as warnings.
pub fn notify(channel: &dyn NotificationChannel, payload: &NotificationPayload) -> NotificationReport {
    let mut report = NotificationReport::default();

    match channel.send_summary(&payload.message()) {
        Ok(()) => report.summary_delivered = true,
        Err(error) => {
            log::warn!("The summary of the request was not delivered: {}", error);
            report.warnings.push(error.to_string());
        }
    }

    match channel.send_document(payload.document.file_name(), payload.document.bytes()) {
        Ok(()) => report.document_delivered = true,
        Err(error) => {
            log::warn!("The document {:?} was not delivered: {}", payload.document.file_name(), error);
            report.warnings.push(error.to_string());
        }
    }

    report
}

/// Notifies a Telegram chat through the Bot API.
pub struct TelegramChannel {
    client: reqwest::blocking::Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TelegramChannel")
            .field("api_url", &self.api_url)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramChannel {
    pub fn new(token: &str, chat_id: &str) -> Result<Self, ContextError> {
        let (token, chat_id) = (token.trim(), chat_id.trim());
        if token.is_empty() || chat_id.is_empty() {
            return Err(ContextError::with_context(
                "The Telegram token and chat identifier must not be empty",
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|error| ContextError::with_error("Failed to create the HTTP client", &error))?;

        Ok(TelegramChannel {
            client,
            api_url: TELEGRAM_API_URL.to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Reads the credentials from the `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID` variables.
    pub fn from_env() -> Result<Self, ContextError> {
        let token = std::env::var("TELEGRAM_TOKEN").map_err(|error| {
            ContextError::with_error("Unable to read the variable TELEGRAM_TOKEN", &error)
        })?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").map_err(|error| {
            ContextError::with_error("Unable to read the variable TELEGRAM_CHAT_ID", &error)
        })?;

        TelegramChannel::new(&token, &chat_id)
    }

    /// Sends the requests to another server implementing the Bot API.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

fn check_status(method: &str, response: reqwest::blocking::Response) -> Result<(), ContextError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().unwrap_or_default();

    Err(ContextError::with_context(format!(
        "Telegram answered {} to {}: {}",
        status, method, body
    )))
}

impl NotificationChannel for TelegramChannel {
    fn send_summary(&self, message: &str) -> Result<(), ContextError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(MESSAGE_TIMEOUT)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
                parse_mode: "HTML",
            })
            .send()
            // The error is stripped of the URL, which contains the token
            .map_err(|error| ContextError::with_error("Failed to send the summary", &error.without_url()))?;

        check_status("sendMessage", response)
    }

    fn send_document(&self, file_name: &str, bytes: &[u8]) -> Result<(), ContextError> {
        let document_part = reqwest::blocking::multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|error| ContextError::with_error("Invalid document type", &error))?;
        let form = reqwest::blocking::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", document_part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .timeout(DOCUMENT_TIMEOUT)
            .multipart(form)
            .send()
            .map_err(|error| {
                ContextError::with_error("Failed to send the document", &error.without_url())
            })?;

        check_status("sendDocument", response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{PixelBuffer, Signature};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingChannel {
        fail_summary: bool,
        fail_document: bool,
        messages: RefCell<Vec<String>>,
        documents: RefCell<Vec<(String, usize)>>,
    }

    impl NotificationChannel for RecordingChannel {
        fn send_summary(&self, message: &str) -> Result<(), ContextError> {
            if self.fail_summary {
                return Err(ContextError::with_context("Summary rejected"));
            }
            self.messages.borrow_mut().push(message.to_string());
            Ok(())
        }

        fn send_document(&self, file_name: &str, bytes: &[u8]) -> Result<(), ContextError> {
            if self.fail_document {
                return Err(ContextError::with_context("Document rejected"));
            }
            self.documents
                .borrow_mut()
                .push((file_name.to_string(), bytes.len()));
            Ok(())
        }
    }

    fn form_input(periods: &[&str], continuous: bool) -> FormInput {
        FormInput::new(
            periods.iter().map(|period| period.to_string()).collect(),
            continuous,
            "1 de junio de 2026",
            "Juan Pérez",
            [None, None, None],
            Signature::Present(PixelBuffer {
                width: 1,
                height: 1,
                data: vec![0; 4],
            }),
        )
    }

    fn rendered() -> RenderedDocument {
        crate::document::DocumentAssembler::new(Default::default())
            .assemble(&form_input(&["Junio"], false))
            .unwrap()
    }

    #[test]
    fn message_lists_the_months_and_their_hashtags() {
        let input = form_input(&["Junio", "Julio"], false);
        let document = rendered();
        let payload = NotificationPayload::new(&input, &document);

        similar_asserts::assert_eq!(
            payload.message(),
            "🎉 <b>¡Tenemos nuevos Precursores Auxiliares!</b> 🎉\n\n\
             👤 <b>JUAN PÉREZ</b>\n\
             🗓️ <b>JUNIO Y JULIO</b>\n\n\
             #PA_JUNIO #PA_JULIO"
        );
    }

    #[test]
    fn continuous_service_has_its_own_hashtag() {
        let input = form_input(&[], true);
        let document = rendered();
        let payload = NotificationPayload::new(&input, &document);

        assert_eq!(payload.hashtags(), "#PA_CONTINUO");
        assert!(payload.message().contains("<b>SERVICIO CONTINUO</b>"));
    }

    #[test]
    fn names_are_escaped_for_html() {
        assert_eq!(escape_html("A&B <C>"), "A&amp;B &lt;C&gt;");
    }

    #[test]
    fn both_transmissions_are_attempted_independently() {
        let input = form_input(&["Junio"], false);
        let document = rendered();
        let payload = NotificationPayload::new(&input, &document);
        let channel = RecordingChannel {
            fail_summary: true,
            ..Default::default()
        };

        let report = notify(&channel, &payload);

        assert!(!report.summary_delivered);
        assert!(report.document_delivered);
        assert!(!report.is_complete());
        assert_eq!(report.warnings, ["Summary rejected"]);
        assert_eq!(
            channel.documents.borrow().as_slice(),
            [("JUNIO-JUAN_PÉREZ.pdf".to_string(), document.bytes().len())]
        );
    }

    #[test]
    fn successful_notification_is_complete() {
        let input = form_input(&["Junio"], false);
        let document = rendered();
        let channel = RecordingChannel::default();

        let report = notify(&channel, &NotificationPayload::new(&input, &document));

        assert!(report.is_complete());
        assert!(report.warnings.is_empty());
        assert_eq!(channel.messages.borrow().len(), 1);
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(TelegramChannel::new(" ", "1234").is_err());

        let channel = TelegramChannel::new("123:abc", "-100")
            .unwrap()
            .with_api_url("http://localhost:8081/");
        assert_eq!(
            channel.method_url("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }
}
