//! Data models shared across the scrape pipeline.
//!
//! - [`WorkItem`] / [`Payload`]: one input record as delivered by the work
//!   item queue
//! - [`SearchCriteria`]: the read-only search derived from a payload
//! - [`NewsItem`]: one extracted search result, ready for the spreadsheet
//! - [`MissingDatePolicy`]: what to do with results lacking a usable date

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

pub const NO_TITLE: &str = "No Title Found";
pub const NO_DATE: &str = "No Date Found";
pub const NO_DESCRIPTION: &str = "No Description Found";
pub const NO_IMAGE: &str = "No Image Found";

/// Days counted per month of the requested period.
const DAYS_PER_MONTH: i64 = 30;

/// A single work item in the Robocorp local work item layout.
#[derive(Debug, Deserialize)]
pub struct WorkItem {
    pub payload: Payload,
}

/// The fields a work item carries, keyed the way the queue names them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payload {
    #[serde(rename = "search phrase")]
    pub search_phrase: String,
    #[serde(rename = "news category/section/topic", default)]
    pub news_category: Option<String>,
    #[serde(rename = "Period", deserialize_with = "months_from_number_or_string")]
    pub period: u32,
}

/// `Period` arrives as `1` from some producers and `"1"` from others.
fn months_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Months {
        Number(u32),
        Text(String),
    }

    match Months::deserialize(deserializer)? {
        Months::Number(n) => Ok(n),
        Months::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Treatment of a search result whose date is missing or unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingDatePolicy {
    /// Drop the result before any image is downloaded.
    #[default]
    Skip,
    /// Keep the result; a missing date is recorded as [`NO_DATE`].
    Sentinel,
}

/// The search one run performs.
///
/// Built once from a [`Payload`] and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// The phrase as typed into the site search box.
    pub phrase: String,
    /// Lowercased phrase used for counting.
    pub phrase_folded: String,
    pub category: Option<String>,
    pub period_months: u32,
    /// Results dated strictly before this end the pagination.
    pub cutoff: NaiveDateTime,
}

impl SearchCriteria {
    pub fn new(
        phrase: impl Into<String>,
        category: Option<String>,
        period_months: u32,
        now: NaiveDateTime,
    ) -> Self {
        let phrase = phrase.into();
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self {
            phrase_folded: phrase.to_lowercase(),
            phrase,
            category,
            period_months,
            cutoff: cutoff_before(now, period_months),
        }
    }

    pub fn from_payload(payload: &Payload, now: NaiveDateTime) -> Self {
        Self::new(
            payload.search_phrase.clone(),
            payload.news_category.clone(),
            payload.period,
            now,
        )
    }

    /// Whether a parsed article date falls before the requested period.
    pub fn precedes_cutoff(&self, published: NaiveDateTime) -> bool {
        published < self.cutoff
    }
}

/// `now` minus the period, clamped to the earliest representable time.
fn cutoff_before(now: NaiveDateTime, period_months: u32) -> NaiveDateTime {
    Duration::try_days(i64::from(period_months) * DAYS_PER_MONTH)
        .and_then(|period| now.checked_sub_signed(period))
        .unwrap_or(NaiveDateTime::MIN)
}

/// One search result as written to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    /// Date text exactly as the site displayed it.
    pub published_raw: String,
    /// `None` only under [`MissingDatePolicy::Sentinel`].
    pub published_at: Option<NaiveDateTime>,
    pub description: String,
    pub image_filename: String,
    pub phrase_count: usize,
    pub contains_money: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_work_item_deserialization() {
        let json = r#"[{
            "payload": {
                "search phrase": "Economy",
                "news category/section/topic": "Business",
                "Period": 2
            },
            "files": {}
        }]"#;

        let items: Vec<WorkItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].payload.search_phrase, "Economy");
        assert_eq!(items[0].payload.news_category.as_deref(), Some("Business"));
        assert_eq!(items[0].payload.period, 2);
    }

    #[test]
    fn test_period_as_string() {
        let json = r#"{"search phrase": "fire", "Period": " 3 "}"#;
        let payload: Payload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.period, 3);
        assert_eq!(payload.news_category, None);
    }

    #[test]
    fn test_period_rejects_garbage() {
        let json = r#"{"search phrase": "fire", "Period": "three"}"#;
        assert!(serde_json::from_str::<Payload>(json).is_err());
    }

    #[test]
    fn test_criteria_cutoff() {
        let now = noon(2024, 9, 15);
        let criteria = SearchCriteria::new("Economy", Some("Business".into()), 1, now);
        assert_eq!(criteria.cutoff, noon(2024, 8, 16));
        assert_eq!(criteria.phrase, "Economy");
        assert_eq!(criteria.phrase_folded, "economy");

        let zero = SearchCriteria::new("x", None, 0, now);
        assert_eq!(zero.cutoff, now);
    }

    #[test]
    fn test_huge_period_clamps_cutoff() {
        let payload: Payload =
            serde_json::from_str(r#"{"search phrase": "x", "Period": 4000000}"#).unwrap();
        let criteria = SearchCriteria::from_payload(&payload, noon(2024, 9, 15));
        assert_eq!(criteria.cutoff, NaiveDateTime::MIN);
        assert!(!criteria.precedes_cutoff(noon(1900, 1, 1)));

        let max = SearchCriteria::new("x", None, u32::MAX, noon(2024, 9, 15));
        assert_eq!(max.cutoff, NaiveDateTime::MIN);
    }

    #[test]
    fn test_criteria_blank_category_is_none() {
        let criteria = SearchCriteria::new("x", Some("  ".into()), 1, noon(2024, 1, 1));
        assert_eq!(criteria.category, None);
    }

    #[test]
    fn test_precedes_cutoff_is_strict() {
        let criteria = SearchCriteria::new("x", None, 1, noon(2024, 9, 15));
        assert!(criteria.precedes_cutoff(noon(2024, 8, 15)));
        assert!(!criteria.precedes_cutoff(noon(2024, 8, 16)));
        assert!(!criteria.precedes_cutoff(noon(2024, 9, 1)));
    }

    #[test]
    fn test_missing_date_policy_serde() {
        let p: MissingDatePolicy = serde_yaml::from_str("sentinel").unwrap();
        assert_eq!(p, MissingDatePolicy::Sentinel);
        assert_eq!(MissingDatePolicy::default(), MissingDatePolicy::Skip);
    }
}
