/// Failure to acquire one of the external inputs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}
