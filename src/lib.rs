//! Lead-section fact extraction for Wikipedia articles.
//!
//! [`markup`] holds the scanners that turn raw wiki markup into category,
//! citation and anchor terms plus a plain-text lead; [`page`] wraps the
//! results per article. The remaining modules read export dumps and write
//! page records.

pub mod config;
pub mod error;
pub mod export;
pub mod markup;
pub mod output;
pub mod page;
pub mod parallel;
pub mod word_count;

pub use error::{Error, Result};
pub use markup::{classify, extract_links, normalize, LinkKind};
pub use page::{Page, PageBuilder};
pub use word_count::WordCounter;
