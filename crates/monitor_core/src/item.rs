use std::fmt;

/// Title used when a listing entry carries no readable title.
pub const UNTITLED: &str = "untitled";

/// Rendering of an unknown publish time.
pub const UNKNOWN_TIME: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishTime {
    /// `YYYY-MM-DD HH:MM:SS` as shown by the site.
    At(String),
    Unknown,
}

impl PublishTime {
    pub fn as_known(&self) -> Option<&str> {
        match self {
            PublishTime::At(value) => Some(value),
            PublishTime::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, PublishTime::At(_))
    }
}

impl fmt::Display for PublishTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishTime::At(value) => write!(f, "{value}"),
            PublishTime::Unknown => write!(f, "{UNKNOWN_TIME}"),
        }
    }
}

/// One entry of the listing page. Identity is `id`; titles may drift between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub publish_time: PublishTime,
}

impl ContentItem {
    /// True when extraction had to fall back to a placeholder for any field.
    pub fn has_placeholder_fields(&self) -> bool {
        self.title == UNTITLED || !self.publish_time.is_known()
    }
}

/// Items seen for the first time in a run, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub new_items: Vec<ContentItem>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.new_items.len()
    }
}

/// Terminal status of a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Degraded,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Degraded => write!(f, "degraded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}
