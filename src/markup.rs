//! Wiki-markup scanning for article lead sections.
//!
//! Three routines share this module:
//! - [`extract_links`] harvests classified bracket-link terms (categories,
//!   citations, anchors) in source order
//! - [`classify`] decides what a single captured body means for a kind
//! - [`normalize`] renders the lead section as letters, digits and spaces
//!
//! All of them are total over arbitrary input: unterminated links and
//! templates are dropped silently and the worst case is an empty result.

use std::iter::Peekable;
use std::str::Chars;

const CATEGORY_PREFIX: &str = "Category:";
const CITATION_PREFIX: &str = "cite";
const CITATION_TITLE: &str = "title";

/// What a bracket-link body can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Category,
    Citation,
    Anchor,
}

impl LinkKind {
    /// All kinds, in the order a page is populated.
    pub const ALL: [LinkKind; 3] = [LinkKind::Category, LinkKind::Citation, LinkKind::Anchor];
}

// ─────────────────────────────────────────────────────────────────────────────
// Fragment scanner
// ─────────────────────────────────────────────────────────────────────────────

/// A closed region of markup found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Body of a `[[...]]` link, brackets excluded.
    Link(String),
    /// Body of a top-level `{{...}}` template, outer braces excluded.
    /// Nested templates are kept verbatim inside the body.
    Template(String),
}

impl Fragment {
    pub fn body(&self) -> &str {
        match self {
            Fragment::Link(body) | Fragment::Template(body) => body,
        }
    }
}

enum State {
    Outside,
    InTemplate { depth: usize, body: String },
    InLink { body: String },
}

/// Single-pass scanner over wiki markup with one character of lookahead.
///
/// Transitions:
///
/// | state        | input | next state                                   |
/// |--------------|-------|----------------------------------------------|
/// | `Outside`    | `{{`  | `InTemplate(1)`                              |
/// | `Outside`    | `[[`  | `InLink`                                     |
/// | `InTemplate` | `{{`  | `InTemplate(depth + 1)`                      |
/// | `InTemplate` | `}}`  | `InTemplate(depth - 1)`, or `Outside` at 0   |
/// | `InLink`     | `[[`  | `InLink` with the body discarded             |
/// | `InLink`     | `]]`  | `Outside`, emitting the link body            |
///
/// Everything else stays in the current state. Braces inside a link are
/// plain body text, a stray `}}` outside a template is ignored, and
/// `[[` inside a template does not open a link.
pub struct Fragments<'a> {
    chars: Peekable<Chars<'a>>,
    state: State,
    templates: bool,
}

impl<'a> Fragments<'a> {
    pub fn new(text: &'a str) -> Self {
        Fragments {
            chars: text.chars().peekable(),
            state: State::Outside,
            templates: true,
        }
    }

    /// Whether closed templates are yielded. When off, template bodies
    /// are skipped without being buffered.
    pub fn with_templates(mut self, templates: bool) -> Self {
        self.templates = templates;
        self
    }

    fn next_is(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }
}

impl Iterator for Fragments<'_> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        while let Some(c) = self.chars.next() {
            let state = std::mem::replace(&mut self.state, State::Outside);
            self.state = match state {
                State::Outside => match c {
                    '{' if self.next_is('{') => State::InTemplate { depth: 1, body: String::new() },
                    '[' if self.next_is('[') => State::InLink { body: String::new() },
                    _ => State::Outside,
                },
                State::InTemplate { depth, mut body } => match c {
                    '{' if self.next_is('{') => {
                        if self.templates {
                            body.push_str("{{");
                        }
                        State::InTemplate { depth: depth + 1, body }
                    }
                    '}' if self.next_is('}') => {
                        if depth == 1 {
                            if self.templates {
                                return Some(Fragment::Template(body));
                            }
                            State::Outside
                        } else {
                            if self.templates {
                                body.push_str("}}");
                            }
                            State::InTemplate { depth: depth - 1, body }
                        }
                    }
                    _ => {
                        if self.templates {
                            body.push(c);
                        }
                        State::InTemplate { depth, body }
                    }
                },
                State::InLink { mut body } => match c {
                    '[' if self.next_is('[') => State::InLink { body: String::new() },
                    ']' if self.next_is(']') => return Some(Fragment::Link(body)),
                    _ => {
                        body.push(c);
                        State::InLink { body }
                    }
                },
            };
        }
        None
    }
}

/// Scan `text` and return every closed link and top-level template body.
pub fn scan_fragments(text: &str) -> Vec<Fragment> {
    Fragments::new(text).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Link extraction and classification
// ─────────────────────────────────────────────────────────────────────────────

/// Extract all terms of `kind` from `text`, in order of appearance.
///
/// Link bodies are classified for every kind. Template bodies are only
/// considered for [`LinkKind::Citation`], since citations are written as
/// `{{cite ...}}` templates; for the other kinds templates are opaque.
/// Duplicates are kept and the result never contains empty strings.
pub fn extract_links(text: &str, kind: LinkKind) -> Vec<String> {
    Fragments::new(text)
        .with_templates(kind == LinkKind::Citation)
        .filter_map(|fragment| classify(fragment.body(), kind))
        .collect()
}

/// Classify one captured body. Returns `None` when the body is not a
/// term of `kind`; a returned term is never empty.
pub fn classify(body: &str, kind: LinkKind) -> Option<String> {
    let term = match kind {
        LinkKind::Category => body.strip_prefix(CATEGORY_PREFIX)?,
        LinkKind::Citation => citation_title(body)?,
        LinkKind::Anchor => {
            if body.starts_with(CATEGORY_PREFIX) {
                return None;
            }
            // [[target|label]] -> target
            body.find('|').map_or(body, |bar| &body[..bar])
        }
    };
    (!term.is_empty()).then(|| term.to_string())
}

/// `cite web|title=Example|url=...` -> `Example`.
///
/// The value runs from just after the first `title` marker (skipping a
/// `=` separator and the spaces around it) to the next `|`.
fn citation_title(body: &str) -> Option<&str> {
    let rest = body.strip_prefix(CITATION_PREFIX)?;
    let marker = rest.find(CITATION_TITLE)?;
    let after = &rest[marker + CITATION_TITLE.len()..];
    let value = match after.trim_start().strip_prefix('=') {
        Some(value) => value.trim_start(),
        None => after,
    };
    let end = value.find('|')?;
    Some(&value[..end])
}

// ─────────────────────────────────────────────────────────────────────────────
// Lead text normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Render the lead section of `text` as plain text for tagging.
///
/// Stops at the first `==`. Every `{` and `}` moves a brace depth (never
/// below zero) and characters at positive depth are skipped. Letters and
/// numeric characters (including superscripts and fractions) are copied,
/// each breaking whitespace character becomes one space, and everything
/// else is dropped, no-break spaces included.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '=' && chars.peek() == Some(&'=') {
            break;
        }
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth > 0 {
            continue;
        }
        if c.is_alphanumeric() {
            out.push(c);
        } else if is_breaking_whitespace(c) {
            out.push(' ');
        }
    }

    out
}

/// Whitespace other than the no-break spaces (U+00A0, U+2007, U+202F),
/// which `&nbsp;` and friends decode to and which are dropped instead.
fn is_breaking_whitespace(c: char) -> bool {
    c.is_whitespace() && !matches!(c, '\u{a0}' | '\u{2007}' | '\u{202f}')
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Fragment scanner
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn scans_links_and_templates_in_order() {
        let fragments = scan_fragments("{{a|b}} x [[One]] y {{c}} [[Two|2]]");
        assert_eq!(
            fragments,
            vec![
                Fragment::Template("a|b".to_string()),
                Fragment::Link("One".to_string()),
                Fragment::Template("c".to_string()),
                Fragment::Link("Two|2".to_string()),
            ]
        );
    }

    #[test]
    fn nested_templates_stay_in_outer_body() {
        let fragments = scan_fragments("{{outer|{{inner|x}}|y}}");
        assert_eq!(fragments, vec![Fragment::Template("outer|{{inner|x}}|y".to_string())]);
    }

    #[test]
    fn links_inside_templates_are_not_captured() {
        let fragments: Vec<_> = Fragments::new("{{infobox|place=[[London]]}}")
            .with_templates(false)
            .collect();
        assert!(fragments.is_empty());
    }

    #[test]
    fn braces_inside_link_are_body_text() {
        let fragments = scan_fragments("[[File:a.jpg|{{x}}]] [[B]]");
        assert_eq!(
            fragments,
            vec![
                Fragment::Link("File:a.jpg|{{x}}".to_string()),
                Fragment::Link("B".to_string()),
            ]
        );
    }

    #[test]
    fn stray_closing_braces_do_not_hide_later_links() {
        let fragments = scan_fragments("}} }} [[After]]");
        assert_eq!(fragments, vec![Fragment::Link("After".to_string())]);
    }

    #[test]
    fn reopened_link_discards_outer_body() {
        let fragments = scan_fragments("[[File:x.jpg|a [[cat]] here]]");
        assert_eq!(fragments, vec![Fragment::Link("cat".to_string())]);
    }

    #[test]
    fn unterminated_link_is_swallowed() {
        assert!(scan_fragments("[[Never closed").is_empty());
        assert_eq!(scan_fragments("[[Done]] [[Never closed").len(), 1);
    }

    #[test]
    fn unterminated_template_is_swallowed() {
        assert!(scan_fragments("{{cite web|title=X|").is_empty());
    }

    #[test]
    fn link_closing_on_last_characters() {
        assert_eq!(scan_fragments("[[End]]"), vec![Fragment::Link("End".to_string())]);
    }

    // ─────────────────────────────────────────────────────────────
    // extract_links
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn category_link() {
        assert_eq!(extract_links("[[Category:Battles]]", LinkKind::Category), vec!["Battles"]);
    }

    #[test]
    fn categories_excluded_from_anchors() {
        assert!(extract_links("[[Category:Battles]]", LinkKind::Anchor).is_empty());
    }

    #[test]
    fn anchor_alias_discarded() {
        let text = "[[Category:Battles]]text[[London|the city]]";
        assert_eq!(extract_links(text, LinkKind::Anchor), vec!["London"]);
    }

    #[test]
    fn bare_anchor() {
        assert_eq!(extract_links("[[Edinburgh]]", LinkKind::Anchor), vec!["Edinburgh"]);
    }

    #[test]
    fn citation_template() {
        let text = "{{cite web|title=Example Page|url=x}}";
        assert_eq!(extract_links(text, LinkKind::Citation), vec!["Example Page"]);
    }

    #[test]
    fn citation_templates_are_opaque_to_other_kinds() {
        let text = "{{cite web|title=Example Page|url=[[Somewhere]]}}";
        assert!(extract_links(text, LinkKind::Anchor).is_empty());
        assert!(extract_links(text, LinkKind::Category).is_empty());
    }

    #[test]
    fn citation_inside_ref_tags() {
        let text = "Born 1671.<ref>{{cite book |title = Rob Roy |year=1817}}</ref> More.";
        assert_eq!(extract_links(text, LinkKind::Citation), vec!["Rob Roy "]);
    }

    #[test]
    fn non_citation_templates_ignored_for_citations() {
        let text = "{{Infobox person|title=Outlaw|born=1671}} {{cite news|title=A|x}}";
        assert_eq!(extract_links(text, LinkKind::Citation), vec!["A"]);
    }

    #[test]
    fn duplicates_preserved_in_source_order() {
        let text = "[[B]] [[A]] [[B]] [[Category:X]] [[Category:X]]";
        assert_eq!(extract_links(text, LinkKind::Anchor), vec!["B", "A", "B"]);
        assert_eq!(extract_links(text, LinkKind::Category), vec!["X", "X"]);
    }

    #[test]
    fn empty_results_are_dropped() {
        let text = "[[]] [[|alias]] [[Category:]] {{cite web|title=|}}";
        for kind in LinkKind::ALL {
            assert!(extract_links(text, kind).iter().all(|t| !t.is_empty()), "{kind:?}");
        }
        assert!(extract_links(text, LinkKind::Anchor).is_empty());
    }

    #[test]
    fn plain_text_has_no_links() {
        let text = "Rob Roy MacGregor was a Scottish outlaw, born 1671.";
        for kind in LinkKind::ALL {
            assert!(extract_links(text, kind).is_empty());
        }
    }

    #[test]
    fn terms_are_not_trimmed() {
        assert_eq!(extract_links("[[Category: Outlaws ]]", LinkKind::Category), vec![" Outlaws "]);
        assert_eq!(extract_links("[[ London |city]]", LinkKind::Anchor), vec![" London "]);
    }

    #[test]
    fn multibyte_text_is_scanned_by_character() {
        let text = "Über [[Zürich|die Stadt]] und [[Category:Städte]]";
        assert_eq!(extract_links(text, LinkKind::Anchor), vec!["Zürich"]);
        assert_eq!(extract_links(text, LinkKind::Category), vec!["Städte"]);
    }

    // ─────────────────────────────────────────────────────────────
    // classify
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn classify_category_requires_exact_prefix() {
        assert_eq!(classify("Category:Battles", LinkKind::Category), Some("Battles".to_string()));
        assert_eq!(classify("category:Battles", LinkKind::Category), None);
        assert_eq!(classify("London", LinkKind::Category), None);
    }

    #[test]
    fn classify_citation_needs_title_and_bar() {
        assert_eq!(classify("cite web|url=x", LinkKind::Citation), None);
        assert_eq!(classify("cite web|url=x|title=Last", LinkKind::Citation), None);
        assert_eq!(classify("Cite web|title=Upper|", LinkKind::Citation), None);
        assert_eq!(classify("web|title=X|", LinkKind::Citation), None);
    }

    #[test]
    fn classify_citation_takes_first_title_marker() {
        assert_eq!(
            classify("cite book|subtitle=Sub|title=Main|", LinkKind::Citation),
            Some("Sub".to_string())
        );
    }

    #[test]
    fn classify_citation_without_separator() {
        assert_eq!(classify("cite web|titleX|", LinkKind::Citation), Some("X".to_string()));
    }

    #[test]
    fn classify_anchor_with_leading_bar_is_no_match() {
        assert_eq!(classify("|alias", LinkKind::Anchor), None);
    }

    #[test]
    fn classify_anchor_keeps_section() {
        assert_eq!(
            classify("Clan Gregor#History|clan", LinkKind::Anchor),
            Some("Clan Gregor#History".to_string())
        );
    }

    // ─────────────────────────────────────────────────────────────
    // normalize
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn normalize_lead_section() {
        let text = "Rob Roy was a [[Scottish]] {{outlaw}} figure == Early life ==";
        assert_eq!(normalize(text), "Rob Roy was a Scottish  figure ");
    }

    #[test]
    fn normalize_plain_text_strips_punctuation_only() {
        assert_eq!(normalize("Hello, world! 42 times."), "Hello world 42 times");
    }

    #[test]
    fn normalize_whitespace_is_per_character() {
        assert_eq!(normalize("a\n\n\tb"), "a   b");
    }

    #[test]
    fn normalize_nested_templates() {
        assert_eq!(normalize("a{{b|{{c}}|d}}e"), "ae");
    }

    #[test]
    fn normalize_depth_never_negative() {
        assert_eq!(normalize("a}}b{c}d"), "abd");
    }

    #[test]
    fn normalize_unterminated_template_drops_rest() {
        assert_eq!(normalize("keep {{drop everything"), "keep ");
    }

    #[test]
    fn normalize_keeps_last_character() {
        assert_eq!(normalize("ends with x"), "ends with x");
    }

    #[test]
    fn normalize_single_equals_is_not_heading() {
        assert_eq!(normalize("x = y"), "x  y");
    }

    #[test]
    fn normalize_unicode_letters_and_digits() {
        assert_eq!(normalize("Ōsaka – ٣ cafés"), "Ōsaka  ٣ cafés");
    }

    #[test]
    fn normalize_drops_no_break_spaces() {
        assert_eq!(normalize("a\u{a0}b c\u{202f}d"), "ab cd");
    }

    #[test]
    fn normalize_keeps_every_numeric_character() {
        // Superscripts and other non-decimal numerics count as digits
        assert_eq!(normalize("E = mc² x ½"), "E  mc² x ½");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "Rob Roy was a [[Scottish]] {{outlaw}} figure == Early life ==",
            "'''Bold''' and ''italic''\n\n<ref>x</ref>",
            "",
            "a}}b",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }
}
