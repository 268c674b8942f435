#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("profile JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("profile YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid profile: {message}")]
    InvalidProfile { message: String },
    #[error("section {hash_code} layout failed: {source}")]
    Layout {
        hash_code: i32,
        #[source]
        source: narwhal::Error,
    },
    #[error("section {hash_code} layout panicked")]
    LayoutPanicked { hash_code: i32 },
}

pub type Result<T> = std::result::Result<T, Error>;
