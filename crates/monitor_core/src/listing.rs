//! Listing page extraction.
//!
//! The listing markup comes in several layouts. Extraction is an ordered list of
//! tiers, each a pure function from the page body to items; the first tier that
//! yields anything decides the result for the whole page.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use monitor_logging::{monitor_debug, monitor_warn};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::{ContentItem, PublishTime, UNTITLED};

/// Bytes of page text kept before an id occurrence in the context-window tier.
pub const WINDOW_BEFORE: usize = 200;
/// Bytes of page text kept after an id occurrence in the context-window tier.
pub const WINDOW_AFTER: usize = 300;

const DETAIL_PATH: &str = "/details.php?id=";

// Both `details.php?id=123` and the short `/t/123/` form point at the same item.
static DETAIL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:details\.php\?id=|/t/)(\d+)").expect("valid detail id regex")
});

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})\s*(\d{2}:\d{2}:\d{2})").expect("valid timestamp regex")
});

static TEXT_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">([^<>]{5,100})<").expect("valid fragment regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    StructuredRows,
    AnchorFallback,
    ContextWindow,
    /// No tier found anything.
    Empty,
}

impl fmt::Display for ParseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTier::StructuredRows => write!(f, "structured rows"),
            ParseTier::AnchorFallback => write!(f, "anchor fallback"),
            ParseTier::ContextWindow => write!(f, "context window"),
            ParseTier::Empty => write!(f, "no match"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedListing {
    pub items: Vec<ContentItem>,
    pub tier: ParseTier,
}

impl ParsedListing {
    /// A fallback tier was needed, or some item carries a placeholder field.
    pub fn is_degraded(&self) -> bool {
        self.tier != ParseTier::StructuredRows
            || self.items.iter().any(ContentItem::has_placeholder_fields)
    }
}

type TierFn = fn(&ListingParser, &str) -> Option<Vec<ContentItem>>;

const TIERS: [(ParseTier, TierFn); 3] = [
    (ParseTier::StructuredRows, ListingParser::structured_rows),
    (ParseTier::AnchorFallback, ListingParser::anchor_fallback),
    (ParseTier::ContextWindow, ListingParser::context_window),
];

/// Extracts items from a listing page of the site rooted at `site`.
#[derive(Debug, Clone)]
pub struct ListingParser {
    site: Url,
}

impl ListingParser {
    pub fn new(site: Url) -> Self {
        Self { site }
    }

    pub fn parse(&self, body: &str) -> ParsedListing {
        for (tier, extract) in TIERS {
            if let Some(items) = extract(self, body) {
                if tier == ParseTier::StructuredRows {
                    monitor_debug!("Parsed {} items from structured rows", items.len());
                } else {
                    monitor_warn!("Listing parsed with {} tier ({} items)", tier, items.len());
                }
                return ParsedListing { items, tier };
            }
        }
        monitor_warn!("No listing tier matched; page layout may have changed");
        ParsedListing {
            items: Vec::new(),
            tier: ParseTier::Empty,
        }
    }

    /// Canonical detail link for an item id.
    pub fn detail_url(&self, id: &str) -> String {
        let path = format!("{DETAIL_PATH}{id}");
        match self.site.join(&path) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.site.as_str().trim_end_matches('/'), path),
        }
    }

    /// Rows (`<tr id=NNN>`) whose anchor points at the detail page of the same id.
    pub fn structured_rows(&self, body: &str) -> Option<Vec<ContentItem>> {
        let doc = Html::parse_document(body);
        let row_sel = Selector::parse("tr[id]").ok()?;
        let anchor_sel = Selector::parse("a[href]").ok()?;

        let mut items = UniqueItems::default();
        for row in doc.select(&row_sel) {
            let Some(id) = row.value().attr("id").map(str::trim) else {
                continue;
            };
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let Some(anchor) = row
                .select(&anchor_sel)
                .find(|a| a.value().attr("href").and_then(detail_id) == Some(id))
            else {
                continue;
            };

            // Date and time are often split by <br>; joining text nodes with a
            // space keeps them matchable.
            let row_text = row.text().collect::<Vec<_>>().join(" ");
            items.push(ContentItem {
                id: id.to_string(),
                title: title_or_placeholder(&collapse_whitespace(&anchor.text().collect::<String>())),
                url: self.detail_url(id),
                publish_time: find_timestamp(&row_text),
            });
        }
        items.into_non_empty()
    }

    /// Any anchor pointing at a detail page. Publish time is not available here.
    pub fn anchor_fallback(&self, body: &str) -> Option<Vec<ContentItem>> {
        let doc = Html::parse_document(body);
        let anchor_sel = Selector::parse("a[href]").ok()?;

        let mut items = UniqueItems::default();
        for anchor in doc.select(&anchor_sel) {
            let Some(id) = anchor.value().attr("href").and_then(detail_id) else {
                continue;
            };
            items.push(ContentItem {
                id: id.to_string(),
                title: title_or_placeholder(&collapse_whitespace(&anchor.text().collect::<String>())),
                url: self.detail_url(id),
                publish_time: PublishTime::Unknown,
            });
        }
        items.into_non_empty()
    }

    /// Raw id occurrences anywhere in the text, with a best-effort look around each.
    pub fn context_window(&self, body: &str) -> Option<Vec<ContentItem>> {
        let mut items = UniqueItems::default();
        for caps in DETAIL_ID.captures_iter(body) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = floor_boundary(body, whole.start().saturating_sub(WINDOW_BEFORE));
            let end = floor_boundary(body, (whole.end() + WINDOW_AFTER).min(body.len()));
            let window = &body[start..end];
            let after = &body[whole.end()..end];

            let title = first_fragment(after)
                .or_else(|| first_fragment(window))
                .unwrap_or_else(|| UNTITLED.to_string());
            items.push(ContentItem {
                id: id.as_str().to_string(),
                title,
                url: self.detail_url(id.as_str()),
                publish_time: find_timestamp(window),
            });
        }
        items.into_non_empty()
    }
}

/// Item id referenced by a link target, if it is a detail link.
pub fn detail_id(href: &str) -> Option<&str> {
    DETAIL_ID
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Collapse every whitespace run to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_or_placeholder(title: &str) -> String {
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

fn find_timestamp(text: &str) -> PublishTime {
    TIMESTAMP
        .captures(text)
        .and_then(|caps| Some(format!("{} {}", caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .map_or(PublishTime::Unknown, PublishTime::At)
}

fn first_fragment(text: &str) -> Option<String> {
    TEXT_FRAGMENT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
        .find(|fragment| !fragment.is_empty())
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Items in first-seen order, one per id.
#[derive(Default)]
struct UniqueItems {
    seen: HashSet<String>,
    items: Vec<ContentItem>,
}

impl UniqueItems {
    fn push(&mut self, item: ContentItem) {
        if self.seen.insert(item.id.clone()) {
            self.items.push(item);
        }
    }

    fn into_non_empty(self) -> Option<Vec<ContentItem>> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_id_accepts_both_link_forms() {
        assert_eq!(detail_id("/details.php?id=792001&hit=1"), Some("792001"));
        assert_eq!(detail_id("/t/792002/"), Some("792002"));
        assert_eq!(detail_id("/dl/792003/"), None);
    }

    #[test]
    fn timestamp_split_by_line_break_is_joined() {
        assert_eq!(
            find_timestamp("2024-03-01 \n 08:15:00"),
            PublishTime::At("2024-03-01 08:15:00".to_string())
        );
        assert_eq!(find_timestamp("yesterday"), PublishTime::Unknown);
    }

    #[test]
    fn window_boundary_never_splits_a_char() {
        let text = "ab影c";
        assert_eq!(floor_boundary(text, 3), 2);
        assert_eq!(floor_boundary(text, 5), 5);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(collapse_whitespace("  A \n\t B  "), "A B");
    }
}
