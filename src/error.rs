use thiserror::Error;

/// Failure to obtain a response body from a DoH endpoint.
///
/// Every variant is retryable: the resolver makes another attempt until its
/// attempt budget is spent.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A response body was fetched but is not a usable DoH JSON document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`Answer` field is not an array")]
    AnswerNotArray,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no host given (-h/--host)")]
    MissingHost,

    #[error("no readable input file given (-i/--input)")]
    MissingInput,
}
