use chrono::{Days, NaiveDateTime, NaiveTime};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid schedule time `{0}`, expected HH:MM")]
    InvalidTime(String),
    #[error("schedule needs at least one time of day")]
    Empty,
}

/// Fixed wall-clock times at which a check fires every day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    times: Vec<NaiveTime>,
}

impl DailySchedule {
    pub fn new(mut times: Vec<NaiveTime>) -> Result<Self, ScheduleError> {
        if times.is_empty() {
            return Err(ScheduleError::Empty);
        }
        times.sort();
        times.dedup();
        Ok(Self { times })
    }

    /// Parse `HH:MM` entries such as `"08:00"`.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, ScheduleError> {
        let times = specs
            .iter()
            .map(|spec| {
                let spec = spec.as_ref().trim();
                NaiveTime::parse_from_str(spec, "%H:%M")
                    .map_err(|_| ScheduleError::InvalidTime(spec.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(times)
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// First firing strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = now.date();
        if let Some(time) = self.times.iter().find(|t| **t > now.time()) {
            return Some(today.and_time(*time));
        }
        let tomorrow = today.checked_add_days(Days::new(1))?;
        self.times.first().map(|time| tomorrow.and_time(*time))
    }
}

/// Free-text event payloads that should trigger an on-demand check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPhrase(String);

impl TriggerPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(phrase.into())
    }

    /// Case-insensitive substring match; an empty phrase never matches.
    pub fn matches(&self, event_text: &str) -> bool {
        let phrase = self.0.trim().to_lowercase();
        !phrase.is_empty() && event_text.to_lowercase().contains(&phrase)
    }
}
