use crate::{
    error::Error,
    models::{
        Contact, CreateContactParams, RemoveContactsParams, RemoveContactsResponse,
        SendBulkEmailParams, SendBulkEmailResponse, SendEmailParams, SendEmailResponse,
        UpsertContactParams,
    },
    Result,
};
use hyper::ext::ReasonPhrase;
use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// The public AutoSend API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.autosend.com/v1";

const DEFAULT_FAILURE_MESSAGE: &str = "AutoSend request failed";

/// The remote operations exposed by AutoSend. Every one of them is a `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    SendEmail,
    SendBulkEmail,
    CreateContact,
    UpsertContact,
    RemoveContacts,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::SendEmail => "mails/send",
            Endpoint::SendBulkEmail => "mails/bulk",
            Endpoint::CreateContact => "contacts",
            Endpoint::UpsertContact => "contacts/email",
            Endpoint::RemoveContacts => "contacts/remove",
        }
    }

    /// Used when AutoSend reports a failure without a message of its own.
    fn failure_message(self) -> &'static str {
        match self {
            Endpoint::SendBulkEmail => "Bulk email request failed",
            _ => DEFAULT_FAILURE_MESSAGE,
        }
    }
}

/// An async client for the AutoSend API.
///
/// The client only holds read-only configuration and a `reqwest::Client`, so it
/// is cheap to clone and can be shared between tasks. Calls are independent:
/// nothing is retried, cached or queued.
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Client {
    /// Creates a client for the public AutoSend endpoint.
    ///
    /// ## Example
    ///
    /// ```no_run
    /// use autosend::{Client, SendEmailParams};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), autosend::Error> {
    ///     let client = Client::new("as_live_1234");
    ///     let params = SendEmailParams::new("ada@example.com", "hello@example.com")
    ///         .subject("Welcome")
    ///         .html("<p>Hi Ada</p>");
    ///
    ///     let sent = client.send_email(&params).await?;
    ///     println!("{} is {}", sent.email_id, sent.status);
    ///     Ok(())
    /// }
    /// ```
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            // Safe to unwrap because the default URL is a hardcoded constant
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Starts a [`ClientBuilder`] for overriding the base URL or the HTTP client.
    pub fn builder<S: Into<String>>(api_key: S) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a single email. `POST /mails/send`
    pub async fn send_email(&self, params: &SendEmailParams) -> Result<SendEmailResponse> {
        self.call(Endpoint::SendEmail, params).await
    }

    /// Sends the same email to many recipients. `POST /mails/bulk`
    ///
    /// Only the aggregate counts reported by AutoSend are returned.
    pub async fn send_bulk_email(
        &self,
        params: &SendBulkEmailParams,
    ) -> Result<SendBulkEmailResponse> {
        self.call(Endpoint::SendBulkEmail, params).await
    }

    /// Creates a new contact. `POST /contacts`
    pub async fn create_contact(&self, params: &CreateContactParams) -> Result<Contact> {
        self.call(Endpoint::CreateContact, params).await
    }

    /// Creates the contact, or updates the one that already has this email.
    /// `POST /contacts/email`
    pub async fn upsert_contact(&self, params: &UpsertContactParams) -> Result<Contact> {
        self.call(Endpoint::UpsertContact, params).await
    }

    /// Removes contacts by email. `POST /contacts/remove`
    ///
    /// Any `data` in the response is discarded; only the success flag is reported.
    pub async fn remove_contacts(
        &self,
        params: &RemoveContactsParams,
    ) -> Result<RemoveContactsResponse> {
        self.post(Endpoint::RemoveContacts, params).await?;
        Ok(RemoveContactsResponse { success: true })
    }

    /// Posts `params` and decodes the envelope's `data` into `T`.
    async fn call<P, T>(&self, endpoint: Endpoint, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut body = self.post(endpoint, params).await?;
        let data = body.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Posts `params` and returns the response body once both the HTTP status
    /// and the envelope's `success` flag say the call succeeded.
    async fn post<P>(&self, endpoint: Endpoint, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint);
        debug!(endpoint = endpoint.path(), "sending AutoSend request");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(params)
            .send()
            .await?;

        let status = resp.status();
        let reason = status_text(status, resp.extensions().get::<ReasonPhrase>());
        debug!(
            endpoint = endpoint.path(),
            status = status.as_u16(),
            "received AutoSend response"
        );

        // An unreadable or non-JSON body is reported as an empty object.
        let body = resp
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
            .unwrap_or_else(|| Value::Object(Map::new()));

        if !status.is_success() {
            let message = envelope_message(&body).unwrap_or_else(|| match reason {
                Some(text) => format!("HTTP {}: {}", status.as_u16(), text),
                None => format!("HTTP {}", status.as_u16()),
            });
            return Err(Error::http(status.as_u16(), message, body));
        }

        if !envelope_succeeded(&body) {
            let message = envelope_message(&body)
                .unwrap_or_else(|| endpoint.failure_message().to_string());
            return Err(Error::api(message, body));
        }

        Ok(body)
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.path()
        )
    }
}

/// The reason phrase the server sent, or the canonical one for the status.
///
/// hyper only records the phrase when it differs from the canonical reason.
fn status_text(status: StatusCode, reason: Option<&ReasonPhrase>) -> Option<String> {
    reason
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .filter(|text| !text.is_empty())
}

/// JSON truthiness: `false`, `null`, `0`, `""` and missing values are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn envelope_succeeded(body: &Value) -> bool {
    body.get("success").is_some_and(is_truthy)
}

fn envelope_message(body: &Value) -> Option<String> {
    body.get("message")
        .filter(|message| is_truthy(message))
        .map(|message| match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

/// Builder for a [`Client`] with a custom base URL or `reqwest::Client`.
///
/// ```
/// let client = autosend::Client::builder("as_test_1234")
///     .base_url("http://localhost:8080/v1/")
///     .build()
///     .unwrap();
///
/// assert_eq!(client.base_url().as_str(), "http://localhost:8080/v1/");
/// ```
pub struct ClientBuilder {
    api_key: String,
    base_url: Option<String>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            http: None,
        }
    }

    /// Overrides [`DEFAULT_BASE_URL`]. The URL is validated by [`build`](Self::build).
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Uses a pre-configured `reqwest::Client`, e.g. one with a timeout or a proxy.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client> {
        let base_url = Url::parse(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
            .map_err(Error::wrap)?;

        Ok(Client {
            base_url,
            api_key: self.api_key,
            http: self.http.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_urls_are_joined_onto_the_base_path() {
        let client = Client::new("key");
        assert_eq!(
            client.endpoint_url(Endpoint::UpsertContact),
            "https://api.autosend.com/v1/contacts/email"
        );

        let client = Client::builder("key")
            .base_url("http://localhost:9000/api/")
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint_url(Endpoint::SendBulkEmail),
            "http://localhost:9000/api/mails/bulk"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected_at_build_time() {
        let err = Client::builder("key")
            .base_url("not a url")
            .build()
            .unwrap_err();

        assert!(err.status_code().is_none());
        assert!(err.response().is_none());
        assert!(!err.message().is_empty());
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let client = Client::new("as_live_secret");
        let debug = format!("{client:?}");

        assert!(!debug.contains("as_live_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn any_truthy_success_flag_counts_as_success() {
        assert!(envelope_succeeded(&json!({ "success": true })));
        assert!(envelope_succeeded(&json!({ "success": 1 })));
        assert!(envelope_succeeded(&json!({ "success": "yes" })));
        assert!(envelope_succeeded(&json!({ "success": {} })));
        assert!(!envelope_succeeded(&json!({ "success": false })));
        assert!(!envelope_succeeded(&json!({ "success": 0 })));
        assert!(!envelope_succeeded(&json!({ "success": "" })));
        assert!(!envelope_succeeded(&json!({ "success": null })));
        assert!(!envelope_succeeded(&json!({})));
        assert!(!envelope_succeeded(&json!([])));
    }

    #[test]
    fn falsy_messages_are_ignored_and_scalars_are_stringified() {
        assert_eq!(envelope_message(&json!({ "message": "nope" })).as_deref(), Some("nope"));
        assert_eq!(envelope_message(&json!({ "message": 42 })).as_deref(), Some("42"));
        assert_eq!(envelope_message(&json!({ "message": true })).as_deref(), Some("true"));
        assert_eq!(envelope_message(&json!({ "message": "" })), None);
        assert_eq!(envelope_message(&json!({ "message": 0 })), None);
        assert_eq!(envelope_message(&json!({ "message": null })), None);
        assert_eq!(envelope_message(&json!([])), None);
    }

    #[test]
    fn status_text_falls_back_to_the_canonical_reason() {
        assert_eq!(
            status_text(StatusCode::NOT_FOUND, None).as_deref(),
            Some("Not Found")
        );
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap(), None), None);
    }

    #[test]
    fn bulk_send_has_its_own_failure_message() {
        assert_eq!(
            Endpoint::SendBulkEmail.failure_message(),
            "Bulk email request failed"
        );
        assert_eq!(
            Endpoint::RemoveContacts.failure_message(),
            DEFAULT_FAILURE_MESSAGE
        );
    }
}
