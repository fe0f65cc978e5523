//! Job application records as returned by the portal's listing endpoint,
//! and the age rule that decides which of them get archived.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Portal id of one application. The listing returns it as a number or a string,
/// see [`ApplicationRecord::id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timestamp field as it appears on the wire: ISO text or epoch millis.
/// Values of any other JSON type are kept as [`RawTimestamp::Unrecognized`]
/// so one odd record never fails a whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    EpochMillis(i64),
    Unrecognized(Value),
}

impl<'de> Deserialize<'de> for RawTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Self::Text(text),
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(ms), _) => Self::EpochMillis(ms),
                #[allow(clippy::cast_possible_truncation)]
                (None, Some(ms)) if ms.is_finite() && ms.abs() < 9.0e15 => {
                    Self::EpochMillis(ms.trunc() as i64)
                }
                _ => Self::Unrecognized(Value::Number(number)),
            },
            other => Self::Unrecognized(other),
        })
    }
}

impl RawTimestamp {
    /// Empty strings, zero, `null` and `false` are treated like a missing field.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::EpochMillis(ms) => *ms != 0,
            Self::Unrecognized(value) => !matches!(value, Value::Null | Value::Bool(false)),
        }
    }

    /// Interprets the value as a UTC instant.
    ///
    /// Accepts RFC 3339, offset-less date-times (taken as UTC), plain dates
    /// (midnight UTC) and epoch milliseconds. Anything else yields `None`.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Unrecognized(_) => None,
            Self::Text(text) => {
                let text = text.trim();
                if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                    return Some(parsed.with_timezone(&Utc));
                }
                for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                        return Some(naive.and_utc());
                    }
                }
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCode {
    #[serde(default, rename = "uitvoeringsTijdstip")]
    pub executed_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentActivity {
    #[serde(default, rename = "aanmaakTijdstip")]
    pub created_at: Option<RawTimestamp>,
    #[serde(default, rename = "sollicitatieActiviteitCode")]
    pub activity_code: Option<ActivityCode>,
}

/// One entry of `results[]` on the listing endpoint. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<ApplicationId>,
    #[serde(default, rename = "laatsteWijzigingDatum")]
    pub last_changed: Option<RawTimestamp>,
    #[serde(default, rename = "huidigeActiviteit")]
    pub current_activity: Option<CurrentActivity>,
}

impl ApplicationRecord {
    /// First present of: last change, activity creation, activity-code execution.
    pub fn activity_timestamp(&self) -> Option<&RawTimestamp> {
        let activity = self.current_activity.as_ref();
        [
            self.last_changed.as_ref(),
            activity.and_then(|a| a.created_at.as_ref()),
            activity
                .and_then(|a| a.activity_code.as_ref())
                .and_then(|code| code.executed_at.as_ref()),
        ]
        .into_iter()
        .flatten()
        .find(|ts| ts.is_present())
    }
}

/// Ids that are neither text nor a number decode as a missing id.
fn lenient_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ApplicationId>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(ApplicationId(text)),
        Value::Number(number) => Some(ApplicationId(number.to_string())),
        _ => None,
    })
}

/// One page of the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationsPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<ApplicationRecord>,
    #[serde(default, rename = "aantalPaginas")]
    pub page_count: Option<u32>,
}

impl ApplicationsPage {
    /// Page count reported by the portal; missing or zero counts as one page.
    pub fn total_pages(&self) -> u32 {
        self.page_count.filter(|&count| count > 0).unwrap_or(1)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Classifies records as "old" relative to a fixed cutoff instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeFilter {
    cutoff: DateTime<Utc>,
}

impl AgeFilter {
    pub const fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// Cutoff `months` calendar months before `now`. Day overflow clamps to the
    /// end of the target month (31 March minus one month is 28/29 February).
    pub fn months_before(now: DateTime<Utc>, months: u32) -> Self {
        let cutoff = now
            .checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { cutoff }
    }

    pub const fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Strictly earlier than the cutoff. Records without a usable timestamp
    /// are never old.
    pub fn is_old(&self, record: &ApplicationRecord) -> bool {
        record
            .activity_timestamp()
            .and_then(RawTimestamp::to_utc)
            .is_some_and(|timestamp| timestamp < self.cutoff)
    }
}
