//! Device model to timezone mapping
//!
//! Camera clocks record wall time without an offset. The table tells the
//! resolver which zone a given device's clock was set to; anything not in
//! the table is read as local system time.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use tracing::trace;

/// Lowercased device model -> IANA timezone
#[derive(Debug, Clone, Default)]
pub struct TimezoneTable {
    zones: HashMap<String, Tz>,
}

impl TimezoneTable {
    /// Create an empty table (every model falls back to local time)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(model, timezone)` pairs, validating every id
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::new();
        for (model, timezone) in entries {
            table.insert(model.as_ref(), timezone.as_ref())?;
        }
        Ok(table)
    }

    /// Add or replace the zone for a device model
    pub fn insert(&mut self, model: &str, timezone: &str) -> Result<()> {
        let tz: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTimezone {
                model: model.to_string(),
                timezone: timezone.to_string(),
            })?;
        self.zones.insert(normalize_model(model), tz);
        Ok(())
    }

    /// Look up a device model, ignoring case
    pub fn lookup(&self, model: &str) -> Option<Tz> {
        self.zones.get(&normalize_model(model)).copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Interpret a naive capture time in the device's zone and convert to UTC
    pub fn localize_capture(&self, naive: &NaiveDateTime, model: Option<&str>) -> DateTime<Utc> {
        match model.and_then(|m| self.lookup(m)) {
            Some(tz) => {
                trace!(?model, %tz, "Using configured device timezone");
                to_utc(&tz, naive)
            }
            None => to_utc(&Local, naive),
        }
    }
}

fn normalize_model(model: &str) -> String {
    model.trim().to_lowercase()
}

/// Anchor a wall-clock reading in `zone`.
///
/// Ambiguous readings (clocks set back) take the earlier instant. Readings
/// that fall into a gap (clocks set forward) use the offset in effect just
/// before the jump.
pub fn to_utc<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // Walk back to the last valid wall-clock hour before the gap
            let offset = (1..=48)
                .find_map(|hours| {
                    zone.from_local_datetime(&(*naive - TimeDelta::hours(hours)))
                        .earliest()
                })
                .map(|before| before.offset().fix())
                .unwrap_or_else(|| zone.offset_from_utc_datetime(naive).fix());
            let shifted = *naive - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&shifted)
        }
    }
}
