use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("search request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned {actual} embeddings for {expected} inputs")]
    CountMismatch {
        provider: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("embedding dimension {actual} != {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{model} returned {status}: {body}")]
    Api {
        model: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {model}: {details}")]
    MalformedResponse { model: String, details: String },

    #[error("missing api key for {0}")]
    MissingApiKey(String),
}

impl LlmError {
    // Quota and throttling failures surface with different shapes depending on
    // where they were raised (HTTP status, error body, transport), so the
    // match runs over the rendered message.
    pub fn is_rate_limited(&self) -> bool {
        const MARKERS: [&str; 4] = ["429", "quota", "rate", "resource_exhausted"];
        let rendered = self.to_string().to_lowercase();
        MARKERS.iter().any(|marker| rendered.contains(marker))
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::LlmError;

    #[test]
    fn quota_errors_are_rate_limited() {
        let error = LlmError::Api {
            model: "gemini-2.0-flash".to_string(),
            status: 429,
            body: "{\"error\":{\"status\":\"RESOURCE_EXHAUSTED\"}}".to_string(),
        };
        assert!(error.is_rate_limited());

        let error = LlmError::Api {
            model: "gemini-2.0-flash".to_string(),
            status: 400,
            body: "You exceeded your current quota".to_string(),
        };
        assert!(error.is_rate_limited());
    }

    #[test]
    fn other_errors_are_not_rate_limited() {
        let error = LlmError::Api {
            model: "gemini-2.0-flash".to_string(),
            status: 500,
            body: "internal".to_string(),
        };
        assert!(!error.is_rate_limited());
        assert!(!LlmError::MissingApiKey("gemini".to_string()).is_rate_limited());
    }
}
