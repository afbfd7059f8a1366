use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize page record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse scan config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A `<page>` chunk without one of the elements every export page has.
    #[error("Page {page_id} has no <{element}> element")]
    MissingElement { page_id: usize, element: &'static str },

    #[error("Page title is empty")]
    EmptyTitle,

    #[error("{0}")]
    InvalidOptions(String),
}
