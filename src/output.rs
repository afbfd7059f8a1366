//! JSON Lines output for page records.

use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::markup::LinkKind;
use crate::page::Page;

/// Shape of each output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Term fields as JSON arrays
    Lists,
    /// Term fields flattened into single space-joined strings
    Joined,
}

#[derive(Serialize)]
struct JoinedRecord<'a> {
    title: &'a str,
    text: &'a str,
    categories: String,
    citations: String,
    anchors: String,
}

impl<'a> From<&'a Page> for JoinedRecord<'a> {
    fn from(page: &'a Page) -> Self {
        JoinedRecord {
            title: page.title(),
            text: page.lead_text(),
            categories: page.joined(LinkKind::Category),
            citations: page.joined(LinkKind::Citation),
            anchors: page.joined(LinkKind::Anchor),
        }
    }
}

/// Writes one JSON object per page, one page per line.
pub struct PageWriter<W: Write> {
    writer: W,
    layout: Layout,
    written: usize,
}

impl<W: Write> PageWriter<W> {
    pub fn new(writer: W, layout: Layout) -> Self {
        PageWriter { writer, layout, written: 0 }
    }

    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        let json = match self.layout {
            Layout::Lists => serde_json::to_string(page)?,
            Layout::Joined => serde_json::to_string(&JoinedRecord::from(page))?,
        };
        writeln!(self.writer, "{}", json)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> Page {
        Page::builder("Rob Roy")
            .lead_text("Rob Roy was an outlaw ")
            .add_category("Scottish outlaws")
            .add_anchor("Scotland")
            .add_anchor("Clan Gregor")
            .build()
            .unwrap()
    }

    fn lines(writer: PageWriter<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(writer.into_inner())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn lists_layout_round_trips_page() {
        let mut writer = PageWriter::new(Vec::new(), Layout::Lists);
        writer.write_page(&sample()).unwrap();
        writer.write_page(&sample()).unwrap();
        assert_eq!(writer.written(), 2);

        let records = lines(writer);
        assert_eq!(records.len(), 2);
        let page: Page = serde_json::from_value(records[0].clone()).unwrap();
        assert_eq!(page, sample());
    }

    #[test]
    fn joined_layout_flattens_terms() {
        let mut writer = PageWriter::new(Vec::new(), Layout::Joined);
        writer.write_page(&sample()).unwrap();

        let record = &lines(writer)[0];
        assert_eq!(record["title"], "Rob Roy");
        assert_eq!(record["text"], "Rob Roy was an outlaw ");
        assert_eq!(record["categories"], "Scottish outlaws");
        assert_eq!(record["citations"], "");
        assert_eq!(record["anchors"], "Scotland Clan Gregor");
    }
}
