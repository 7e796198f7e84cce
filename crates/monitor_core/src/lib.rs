//! Monitor core: pure domain logic, no IO.
mod credential;
mod form;
mod item;
mod known;
mod listing;
mod message;
mod schedule;

pub use credential::{Credential, CredentialError};
pub use form::{
    find_login_form, page_text, parse_forms, FormField, LoginFieldNames, LoginForm, SubmitControl,
    DEFAULT_SUBMIT_NAME, DEFAULT_SUBMIT_VALUE,
};
pub use item::{ContentItem, Delta, PublishTime, RunStatus, UNKNOWN_TIME, UNTITLED};
pub use known::KnownItemSet;
pub use listing::{
    collapse_whitespace, detail_id, ListingParser, ParseTier, ParsedListing, WINDOW_AFTER,
    WINDOW_BEFORE,
};
pub use message::{ChannelTarget, NotificationMessage};
pub use schedule::{DailySchedule, ScheduleError, TriggerPhrase};
