use serde_json::Value;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error returned by every [`Client`](crate::Client) operation.
///
/// There is a single error type for all failure modes. They are told apart by
/// which fields are populated:
///
/// - HTTP failure (non-2xx status): [`status_code`](Error::status_code) and
///   [`response`](Error::response) are both set.
/// - AutoSend failure (2xx status but the envelope reports `success: false`):
///   only [`response`](Error::response) is set.
/// - Anything else (network error, invalid base URL, undecodable payload):
///   neither is set, and the underlying error is available through
///   [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    status_code: Option<u16>,
    response: Option<Value>,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error carrying only a message.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            response: None,
            source: None,
        }
    }

    pub(crate) fn http(status_code: u16, message: String, response: Value) -> Self {
        Self {
            message,
            status_code: Some(status_code),
            response: Some(response),
            source: None,
        }
    }

    pub(crate) fn api(message: String, response: Value) -> Self {
        Self {
            message,
            status_code: None,
            response: Some(response),
            source: None,
        }
    }

    pub(crate) fn wrap<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            status_code: None,
            response: None,
            source: Some(Box::new(err)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The HTTP status of the response, when the service answered with a non-2xx status.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// The parsed response body, when the service answered at all.
    ///
    /// A body that could not be parsed as JSON is reported as an empty object.
    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::wrap(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::wrap(err)
    }
}
