//! Reading MediaWiki export dumps (`Special:Export` files and full
//! `pages-articles` dumps, optionally bzip2-compressed).
//!
//! Pages are located with plain substring scanning and a few regexes; the
//! dump is never parsed as a full XML document.

use bzip2::read::BzDecoder;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::page::Page;

const READ_CHUNK: usize = 1024 * 1024;
const PAGE_OPEN: &str = "<page>";
const PAGE_CLOSE: &str = "</page>";

lazy_static! {
    static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]*)</title>").unwrap();
    static ref NS_PATTERN: Regex = Regex::new(r"<ns>(\d+)</ns>").unwrap();
    static ref EMPTY_TEXT_PATTERN: Regex = Regex::new(r"<text[^>]*/>").unwrap();
    static ref TEXT_PATTERN: Regex = Regex::new(r"(?s)<text[^>]*>(.*?)</text>").unwrap();
    static ref REDIRECT_PATTERN: Regex = Regex::new(r#"<redirect\s+title="[^"]*""#).unwrap();
    static ref REDIRECT_MARKUP: Regex = Regex::new(r"(?i)^\s*#redirect\b").unwrap();
}

/// Title and markup of one export page, before any extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub text: String,
    pub page_id: usize,
    pub namespace: Option<u32>,
    pub is_redirect: bool,
}

/// What happened to one `<page>` chunk.
#[derive(Debug)]
pub enum PageOutcome {
    Kept(Page),
    Special,
    Redirect,
    TooShort,
    Malformed(Error),
}

/// Open an export file, decompressing `.bz2` on the fly.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead + Send> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    };
    Ok(reader)
}

/// Stream every complete `<page>...</page>` chunk to `callback`. Returning
/// `false` from the callback stops the scan.
pub fn scan_pages(reader: impl BufRead, callback: impl FnMut(String) -> bool) -> std::io::Result<()> {
    scan_pages_chunked(reader, READ_CHUNK, callback)
}

pub(crate) fn scan_pages_chunked(
    mut reader: impl BufRead,
    chunk_size: usize,
    mut callback: impl FnMut(String) -> bool,
) -> std::io::Result<()> {
    let mut buffer = String::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = reader.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }

        // Hold back a multi-byte character split across reads
        pending.extend_from_slice(&chunk[..bytes_read]);
        let valid = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        buffer.push_str(&String::from_utf8_lossy(&pending[..valid]));
        pending.drain(..valid);

        while let Some(start) = buffer.find(PAGE_OPEN) {
            if let Some(end_offset) = buffer[start..].find(PAGE_CLOSE) {
                let end = start + end_offset + PAGE_CLOSE.len();
                let page_xml = buffer[start..end].to_string();
                buffer.drain(..end);

                if !callback(page_xml) {
                    return Ok(());
                }
            } else {
                buffer.drain(..start);
                break;
            }
        }

        // Keep only a tail that could still be the start of "<page>"
        if buffer.len() > PAGE_OPEN.len() && !buffer.contains(PAGE_OPEN) {
            let mut cut = buffer.len() - PAGE_OPEN.len();
            while !buffer.is_char_boundary(cut) {
                cut -= 1;
            }
            buffer.drain(..cut);
        }
    }

    Ok(())
}

fn decode(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Pull title, namespace, redirect flag and text out of one page chunk.
/// Entities are decoded; the title is also NFC-normalized.
pub fn parse_page_xml(page_xml: &str, page_id: usize) -> Result<RawArticle> {
    let title = TITLE_PATTERN
        .captures(page_xml)
        .map(|cap| decode(&cap[1]).nfc().collect::<String>())
        .ok_or(Error::MissingElement { page_id, element: "title" })?;

    let text = if EMPTY_TEXT_PATTERN.is_match(page_xml) {
        String::new()
    } else {
        TEXT_PATTERN
            .captures(page_xml)
            .map(|cap| decode(&cap[1]).into_owned())
            .ok_or(Error::MissingElement { page_id, element: "text" })?
    };

    let namespace = NS_PATTERN
        .captures(page_xml)
        .and_then(|cap| cap[1].parse::<u32>().ok());

    let is_redirect = REDIRECT_PATTERN.is_match(page_xml) || REDIRECT_MARKUP.is_match(&text);

    Ok(RawArticle { title, text, page_id, namespace, is_redirect })
}

/// Turn one page chunk into a [`Page`], or say why it was not kept.
pub fn process_page_xml(page_xml: &str, page_id: usize, config: &ScanConfig) -> PageOutcome {
    let raw = match parse_page_xml(page_xml, page_id) {
        Ok(raw) => raw,
        Err(e) => return PageOutcome::Malformed(e),
    };
    process_raw_article(&raw, config)
}

pub fn process_raw_article(raw: &RawArticle, config: &ScanConfig) -> PageOutcome {
    if config.main_namespace_only && raw.namespace.is_some_and(|ns| ns != 0) {
        return PageOutcome::Special;
    }

    if config.is_special_title(&raw.title) {
        return PageOutcome::Special;
    }

    if config.skip_redirects && raw.is_redirect {
        return PageOutcome::Redirect;
    }

    match Page::parse(&raw.title, &raw.text) {
        Ok(page) => {
            if page.lead_text().trim().chars().count() < config.min_lead_chars {
                PageOutcome::TooShort
            } else {
                PageOutcome::Kept(page)
            }
        }
        Err(e) => PageOutcome::Malformed(e),
    }
}
