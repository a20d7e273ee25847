use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("user {user} is missing the '{capability}' capability")]
    Forbidden { user: String, capability: String },

    #[error("host call {namespace}/{operation} failed: {message}")]
    Host {
        namespace: String,
        operation: String,
        message: String,
    },

    #[error("cannot decode payload: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("cannot render page: {0}")]
    Template(#[from] handlebars::RenderError),
}

pub type Result<T> = std::result::Result<T, Error>;
