use std::collections::BTreeSet;

use crate::{ContentItem, Delta};

/// Ids of every item ever reported.
///
/// Only grows; there is no removal API. Iteration is sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownItemSet {
    ids: BTreeSet<String>,
}

impl KnownItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the id was not known before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Walks `items` in page order, marking unseen ids as known and returning them.
    pub fn absorb(&mut self, items: &[ContentItem]) -> Delta {
        let new_items = items
            .iter()
            .filter(|item| self.ids.insert(item.id.clone()))
            .cloned()
            .collect();
        Delta { new_items }
    }
}

impl<S: Into<String>> FromIterator<S> for KnownItemSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PublishTime;

    fn item(id: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: format!("title {id}"),
            url: format!("https://example.test/details.php?id={id}"),
            publish_time: PublishTime::Unknown,
        }
    }

    #[test]
    fn iteration_is_sorted() {
        let set: KnownItemSet = ["30", "10", "20"].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["10", "20", "30"]);
    }

    #[test]
    fn absorb_keeps_page_order_and_skips_repeats() {
        let mut set = KnownItemSet::new();
        let delta = set.absorb(&[item("5"), item("2"), item("5")]);
        let ids: Vec<_> = delta.new_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "2"]);
        assert_eq!(set.len(), 2);
    }
}
