use crate::head::HeadError;
use crate::Response;

/// Wire-level failures on one connection.
///
/// These never leave the connection driver.
/// Each one becomes an error response to the client, or a dropped connection.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialOrd, PartialEq)]
pub enum HttpError {
    BodyTooLong,
    Disconnected,
    HeadTooLong,
    InvalidContentLength,
    MalformedHeaderLine,
    MalformedPath,
    MalformedRequestLine,
    MissingRequestLine,
    Truncated,
    UnsupportedProtocol,
    UnsupportedTransferEncoding,
}
impl HttpError {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            HttpError::BodyTooLong => "HttpError::BodyTooLong".to_string(),
            HttpError::Disconnected => "HttpError::Disconnected".to_string(),
            HttpError::HeadTooLong => "HttpError::HeadTooLong".to_string(),
            HttpError::InvalidContentLength => "HttpError::InvalidContentLength".to_string(),
            HttpError::MalformedHeaderLine => "HttpError::MalformedHeaderLine".to_string(),
            HttpError::MalformedPath => "HttpError::MalformedPath".to_string(),
            HttpError::MalformedRequestLine => "HttpError::MalformedRequestLine".to_string(),
            HttpError::MissingRequestLine => "HttpError::MissingRequestLine".to_string(),
            HttpError::Truncated => "HttpError::Truncated".to_string(),
            HttpError::UnsupportedProtocol => "HttpError::UnsupportedProtocol".to_string(),
            HttpError::UnsupportedTransferEncoding => {
                "HttpError::UnsupportedTransferEncoding".to_string()
            }
        }
    }

    /// The response to send before closing the connection.
    /// Returns `None` when the client is gone.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            HttpError::InvalidContentLength
            | HttpError::MalformedHeaderLine
            | HttpError::MalformedPath
            | HttpError::MalformedRequestLine
            | HttpError::MissingRequestLine
            | HttpError::Truncated
            | HttpError::UnsupportedTransferEncoding => {
                Some(Response::text(400, self.description()))
            }
            HttpError::Disconnected => None,
            HttpError::BodyTooLong => Some(Response::payload_too_large_413()),
            HttpError::HeadTooLong => Some(Response::text(431, self.description())),
            HttpError::UnsupportedProtocol => Some(Response::text(505, self.description())),
        }
    }
}
impl From<HeadError> for HttpError {
    fn from(e: HeadError) -> Self {
        match e {
            HeadError::Truncated => HttpError::Truncated,
            HeadError::MissingRequestLine => HttpError::MissingRequestLine,
            HeadError::MalformedRequestLine => HttpError::MalformedRequestLine,
            HeadError::MalformedPath => HttpError::MalformedPath,
            HeadError::UnsupportedProtocol => HttpError::UnsupportedProtocol,
            HeadError::MalformedHeader => HttpError::MalformedHeaderLine,
        }
    }
}
