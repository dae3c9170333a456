use crate::utils::path::expand_home;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleFrequency {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl ScheduleFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Unknown or empty values fall back to daily.
    pub fn normalize(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::Day,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    None,
    #[default]
    Size,
    Hash,
}

impl VerifyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Size => "size",
            Self::Hash => "hash",
        }
    }

    pub fn normalize(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "size" => Self::Size,
            "hash" => Self::Hash,
            _ => Self::None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub exclude_patterns: Vec<String>,
    pub schedule_time: Option<String>,
    pub schedule_frequency: ScheduleFrequency,
    pub schedule_enabled: bool,
    pub retention_count: u32,
    pub verify_mode: VerifyMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        dest_path: impl Into<PathBuf>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            exclude_patterns: Vec::new(),
            schedule_time: None,
            schedule_frequency: ScheduleFrequency::Day,
            schedule_enabled: false,
            retention_count: 7,
            verify_mode: VerifyMode::Size,
            created_at: now,
            updated_at: now,
        }
    }

    /// Every run of the profile lands in its own timestamped directory below this one.
    pub fn destination_base(&self) -> PathBuf {
        expand_home(&self.dest_path).join(&self.name)
    }
}

/// Decodes the stored exclude list. Anything that is not a JSON array is read
/// as one pattern per non-empty line.
pub fn parse_exclude_patterns(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .filter(|pattern| !pattern.trim().is_empty())
            .collect(),
        _ => raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_exclude_patterns, Profile, ScheduleFrequency, VerifyMode};
    use std::path::Path;

    #[test]
    fn destination_base_is_named_after_the_profile() {
        let profile = Profile::new("docs", "/srv/docs", "/mnt/backup");
        assert_eq!(profile.destination_base(), Path::new("/mnt/backup/docs"));
        if let Some(home) = std::env::var_os("HOME") {
            let profile = Profile::new("docs", "/srv/docs", "~/backup");
            assert_eq!(profile.destination_base(), Path::new(&home).join("backup/docs"));
        }
    }

    #[test]
    fn json_list_is_decoded_in_order() {
        let patterns = parse_exclude_patterns(r#"["*.tmp", "logs", "  "]"#);
        assert_eq!(patterns, vec!["*.tmp".to_string(), "logs".to_string()]);
    }

    #[test]
    fn malformed_list_falls_back_to_lines() {
        let patterns = parse_exclude_patterns("*.tmp\n\n  cache/*  \n");
        assert_eq!(patterns, vec!["*.tmp".to_string(), "cache/*".to_string()]);
    }

    #[test]
    fn unknown_frequency_is_daily() {
        assert_eq!(ScheduleFrequency::normalize("Month"), ScheduleFrequency::Month);
        assert_eq!(ScheduleFrequency::normalize(""), ScheduleFrequency::Day);
        assert_eq!(ScheduleFrequency::normalize("fortnight"), ScheduleFrequency::Day);
    }

    #[test]
    fn unknown_verify_mode_disables_verification() {
        assert_eq!(VerifyMode::normalize("hash"), VerifyMode::Hash);
        assert_eq!(VerifyMode::normalize("crc"), VerifyMode::None);
    }
}
