//! Extracted facts for one article.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::markup::{extract_links, normalize, LinkKind};

/// One article's title, normalized lead text and link terms.
///
/// A `Page` has no mutators. Pages parsed from markup are final; pages
/// assembled by hand go through [`PageBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    title: String,
    lead_text: String,
    categories: Vec<String>,
    citations: Vec<String>,
    anchors: Vec<String>,
}

impl Page {
    /// Parse raw article markup. The title is trimmed and must not be empty.
    pub fn parse(title: &str, text: &str) -> Result<Page> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        Ok(Page {
            title: title.to_string(),
            categories: extract_links(text, LinkKind::Category),
            citations: extract_links(text, LinkKind::Citation),
            anchors: extract_links(text, LinkKind::Anchor),
            lead_text: normalize(text),
        })
    }

    /// Start an empty page to be populated term by term.
    pub fn builder(title: impl Into<String>) -> PageBuilder {
        PageBuilder::new(title)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lead_text(&self) -> &str {
        &self.lead_text
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    pub fn terms(&self, kind: LinkKind) -> &[String] {
        match kind {
            LinkKind::Category => &self.categories,
            LinkKind::Citation => &self.citations,
            LinkKind::Anchor => &self.anchors,
        }
    }

    /// Terms of `kind` flattened into one space-separated string.
    pub fn joined(&self, kind: LinkKind) -> String {
        self.terms(kind).join(" ")
    }

    pub fn term_count(&self) -> usize {
        self.categories.len() + self.citations.len() + self.anchors.len()
    }
}

/// Incremental construction path for [`Page`].
#[derive(Debug, Clone)]
pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        PageBuilder {
            page: Page {
                title: title.into(),
                lead_text: String::new(),
                categories: Vec::new(),
                citations: Vec::new(),
                anchors: Vec::new(),
            },
        }
    }

    pub fn lead_text(mut self, text: impl Into<String>) -> Self {
        self.page.lead_text = text.into();
        self
    }

    /// Append a term of `kind`. Empty terms are ignored.
    pub fn add(mut self, kind: LinkKind, term: impl Into<String>) -> Self {
        let term = term.into();
        if !term.is_empty() {
            match kind {
                LinkKind::Category => self.page.categories.push(term),
                LinkKind::Citation => self.page.citations.push(term),
                LinkKind::Anchor => self.page.anchors.push(term),
            }
        }
        self
    }

    pub fn add_category(self, term: impl Into<String>) -> Self {
        self.add(LinkKind::Category, term)
    }

    pub fn add_citation(self, term: impl Into<String>) -> Self {
        self.add(LinkKind::Citation, term)
    }

    pub fn add_anchor(self, term: impl Into<String>) -> Self {
        self.add(LinkKind::Anchor, term)
    }

    /// Finish the page. Fails if the trimmed title is empty.
    pub fn build(mut self) -> Result<Page> {
        let trimmed = self.page.title.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyTitle);
        }
        if trimmed.len() != self.page.title.len() {
            self.page.title = trimmed.to_string();
        }
        Ok(self.page)
    }
}
