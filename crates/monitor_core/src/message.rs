use std::fmt;

use crate::{ContentItem, Delta};

/// Where one copy of the notification goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelTarget {
    pub channel: String,
    pub recipient: String,
}

impl ChannelTarget {
    pub fn new(channel: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            recipient: recipient.into(),
        }
    }
}

impl fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.recipient)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub summary_line: String,
    pub items: Vec<ContentItem>,
}

impl NotificationMessage {
    pub fn from_delta(delta: &Delta) -> Self {
        let count = delta.len();
        let noun = if count == 1 { "item" } else { "items" };
        Self {
            summary_line: format!("🎬 {count} new {noun} found:"),
            items: delta.new_items.clone(),
        }
    }

    /// Plain-text body: the summary, then a title line and a link line per item.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(1 + self.items.len() * 2);
        lines.push(self.summary_line.clone());
        for item in &self.items {
            match item.publish_time.as_known() {
                Some(time) => lines.push(format!("• {} [{}]", item.title, time)),
                None => lines.push(format!("• {}", item.title)),
            }
            lines.push(format!("  {}", item.url));
        }
        lines.join("\n")
    }
}
