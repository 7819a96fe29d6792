use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a record as seen by callers.
///
/// Row stores hand out integers and document stores hand out string keys;
/// the fallback dataset always uses strings. Everything is normalized to the
/// string form so ids from any source compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => RecordId::from(n),
            Raw::Text(s) => RecordId(s),
        })
    }
}

/// The closed set of application states offered by the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    InProgress,
    Submitted,
    Corresponding,
    Interviewing,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::InProgress,
        ApplicationStatus::Submitted,
        ApplicationStatus::Corresponding,
        ApplicationStatus::Interviewing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::InProgress => "In Progress",
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::Corresponding => "Corresponding",
            ApplicationStatus::Interviewing => "Interviewing",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not one of: In Progress, Submitted, Corresponding, Interviewing")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusRejection {
    #[error("Status is required")]
    Missing,

    #[error(transparent)]
    Unknown(#[from] UnknownStatus),
}

/// Whether status writes must name one of the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusValidation {
    Strict,
    Permissive,
}

impl StatusValidation {
    pub fn check(self, status: &str) -> Result<(), StatusRejection> {
        if status.is_empty() {
            return Err(StatusRejection::Missing);
        }
        if self == StatusValidation::Strict {
            status.parse::<ApplicationStatus>()?;
        }
        Ok(())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One tracked application. Letter fields are only populated for records
/// that back a cover letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub company: String,
    #[serde(rename = "job-title")]
    pub job_title: String,
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub date: NaiveDate,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
}

impl Record {
    /// `January 10, 2024`
    pub fn display_date(&self) -> String {
        format_long_date(self.date)
    }
}

pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Accepts `YYYY-MM-DD` as well as full RFC 3339 timestamps, keeping the date.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn deserialize_calendar_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar date '{raw}'")))
}

/// Newest first. The sort is stable so equal dates keep their source order.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, date: &str) -> Record {
        Record {
            id: RecordId::new(id),
            company: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            date: parse_calendar_date(date).unwrap(),
            status: "Submitted".to_string(),
            color: None,
            greeting: None,
            body: None,
            salutation: None,
        }
    }

    #[test]
    fn test_numeric_and_string_ids_normalize_to_same_value() {
        let from_number: RecordId = serde_json::from_value(json!(7)).unwrap();
        let from_string: RecordId = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_value(&from_number).unwrap(), json!("7"));
    }

    #[test]
    fn test_record_uses_hyphenated_job_title_key() {
        let value = json!({
            "id": 1,
            "company": "Acme",
            "job-title": "Platform Engineer",
            "date": "2024-01-10",
            "status": "Submitted"
        });
        let rec: Record = serde_json::from_value(value).unwrap();
        assert_eq!(rec.job_title, "Platform Engineer");
        assert!(rec.greeting.is_none());

        let out = serde_json::to_value(&rec).unwrap();
        assert_eq!(out["job-title"], "Platform Engineer");
        assert!(out.get("greeting").is_none());
    }

    #[test]
    fn test_timestamp_dates_keep_calendar_day() {
        let value = json!({
            "id": "a1",
            "company": "Acme",
            "job-title": "Engineer",
            "date": "2024-01-10T00:00:00.000Z",
            "status": "Submitted"
        });
        let rec: Record = serde_json::from_value(value).unwrap();
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn test_garbage_date_is_rejected() {
        let value = json!({
            "id": "a1",
            "company": "Acme",
            "job-title": "Engineer",
            "date": "last tuesday",
            "status": "Submitted"
        });
        assert!(serde_json::from_value::<Record>(value).is_err());
    }

    #[test]
    fn test_status_labels_round_trip_through_from_str() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.label().parse::<ApplicationStatus>(), Ok(status));
        }
        assert!("Rejected".parse::<ApplicationStatus>().is_err());
        assert!("submitted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_validation_modes() {
        assert_eq!(StatusValidation::Strict.check(""), Err(StatusRejection::Missing));
        assert_eq!(StatusValidation::Permissive.check(""), Err(StatusRejection::Missing));
        assert!(StatusValidation::Strict.check("Interviewing").is_ok());
        assert!(matches!(
            StatusValidation::Strict.check("Ghosted"),
            Err(StatusRejection::Unknown(_))
        ));
        assert!(StatusValidation::Permissive.check("Ghosted").is_ok());
    }

    #[test]
    fn test_display_date_is_long_form() {
        assert_eq!(record("1", "2024-01-10").display_date(), "January 10, 2024");
    }

    #[test]
    fn test_sort_newest_first_is_stable_on_ties() {
        let mut records = vec![
            record("old", "2023-05-01"),
            record("tie-a", "2024-02-01"),
            record("new", "2024-03-01"),
            record("tie-b", "2024-02-01"),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "tie-a", "tie-b", "old"]);
    }
}
