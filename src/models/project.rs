use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One entry of the projects document
///
/// Text fields accept null and scalar values so one odd record cannot
/// blank the whole gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(deserialize_with = "lenient_image")]
    pub image: Option<String>,
    /// ISO 8601 date, compared as a plain string when ordering
    #[serde(deserialize_with = "lenient_text")]
    pub date: String,
}

// null becomes empty text, numbers and booleans their JSON spelling
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

// Anything that is not a non-blank string has no image to load
fn lenient_image<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(src) if !src.trim().is_empty() => Some(src),
        _ => None,
    })
}

impl ProjectRecord {
    /// Whether `date` is an ISO 8601 date or date-time
    ///
    /// Only ISO dates order correctly under string comparison.
    pub fn has_iso_date(&self) -> bool {
        let date = self.date.trim();
        NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
            // year-month only; chrono needs a day to build a date
            || NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d").is_ok()
            || NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            || NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M").is_ok()
            || DateTime::parse_from_rfc3339(date).is_ok()
    }
}

/// The document shape: `{ "projects": [...] }`
#[derive(Debug, Default, Deserialize)]
pub struct ProjectsDocument {
    #[serde(default)]
    pub projects: Option<Vec<ProjectRecord>>,
}

impl ProjectsDocument {
    pub fn into_list(self) -> ProjectList {
        ProjectList::new(self.projects.unwrap_or_default())
    }
}

/// Records loaded for one page view, newest first once sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectList {
    records: Vec<ProjectRecord>,
}

impl ProjectList {
    pub fn new(records: Vec<ProjectRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    /// Order by `date` descending; equal dates keep their input order
    pub fn sorted_newest_first(mut self) -> Self {
        // sort_by is stable
        self.records.sort_by(|a, b| b.date.cmp(&a.date));
        self
    }

    /// Records whose dates will not order correctly
    pub fn non_iso_dates(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.records.iter().filter(|r| !r.has_iso_date())
    }
}

impl IntoIterator for ProjectList {
    type Item = ProjectRecord;
    type IntoIter = std::vec::IntoIter<ProjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
