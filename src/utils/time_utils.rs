use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub type AppInstant = std::time::Instant;

pub struct TimeUtils;

impl TimeUtils {
    pub const CLOCK_LABEL_FORMAT: &str = "%H:%M";
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";

    /// Accepts what the backend emits: RFC 3339, naive ISO-8601 (`isoformat()`), or a bare date.
    /// Offsets are folded into UTC.
    pub fn parse_backend_timestamp(text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_utc());
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Some(dt);
            }
        }
        NaiveDate::parse_from_str(text, Self::STANDARD_TIME_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    pub fn clock_label(ts: &NaiveDateTime) -> String {
        ts.format(Self::CLOCK_LABEL_FORMAT).to_string()
    }

    pub fn date_label(ts: &NaiveDateTime) -> String {
        ts.format(Self::STANDARD_TIME_FORMAT).to_string()
    }
}
