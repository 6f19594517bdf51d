use thiserror::Error;

/// Everything that can go wrong between reading the input field and
/// appending the assistant's reply.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The input field was empty or whitespace only.
    #[error("message is empty")]
    EmptyInput,

    /// The server answered with something other than 200 OK.
    #[error("server responded with status {status}")]
    Server { status: u16 },

    /// The server could not be reached, or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// A 200 response whose body is not `{"message": "<string>"}`.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ChatError {
    /// Classify a reqwest failure that happened while sending or reading.
    pub fn from_transport(err: reqwest::Error) -> Self {
        ChatError::Network(err.to_string())
    }
}
