use crate::tally::*;

use log::debug;
use snafu::prelude::*;
use std::fs;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "utcOffsetHours")]
    pub utc_offset_hours: Option<i32>,
}

impl OutputSettings {
    /// The offset used to report the hours of the votes. None means UTC.
    pub fn utc_offset(&self) -> TallyResult<Option<FixedOffset>> {
        match self.utc_offset_hours {
            None => Ok(None),
            Some(h) if (-12..=14).contains(&h) => match FixedOffset::east_opt(h * 3600) {
                Some(offset) => Ok(Some(offset)),
                None => whatever!("utcOffsetHours out of range: {}", h),
            },
            Some(h) => whatever!("utcOffsetHours out of range: {}", h),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "voteSources", default)]
    pub vote_sources: Vec<VoteSource>,
    #[serde(rename = "candidatesFile")]
    pub candidates_file: Option<String>,
    #[serde(rename = "locationsFile")]
    pub locations_file: Option<String>,
}

impl TallyConfig {
    /// The configuration used when only command line arguments are given.
    pub fn empty() -> TallyConfig {
        TallyConfig {
            output_settings: OutputSettings {
                contest_name: "unnamed".to_string(),
                output_directory: None,
                contest_date: None,
                utc_offset_hours: None,
            },
            vote_sources: vec![],
            candidates_file: None,
            locations_file: None,
        }
    }
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: TallyConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
