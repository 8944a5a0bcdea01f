// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered electoral option.
///
/// Candidates are owned by the vote store. The tabulation only reads them,
/// and keeps the order in which they are given.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party: String,
    #[serde(default, alias = "proposal")]
    pub proposals: String,
    /// Only used to order the candidates as they were registered.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(id: &str, name: &str, party: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            party: party.to_string(),
            proposals: String::new(),
            created_at: None,
        }
    }
}

/// A vote, as returned by the vote store.
///
/// All the voter attributes are optional: the store may hold records that
/// predate the current form, or that were partially cleaned.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    #[serde(default)]
    pub candidate_id: Option<String>,
    pub voted_at: DateTime<Utc>,
    #[serde(default)]
    pub voter_name: Option<String>,
    #[serde(default)]
    pub voter_email: Option<String>,
    #[serde(default)]
    pub voter_dni: Option<String>,
    #[serde(default, alias = "celular")]
    pub voter_phone: Option<String>,
    #[serde(default)]
    pub voter_location: Option<String>,
    #[serde(default, alias = "departamento")]
    pub department: Option<String>,
    #[serde(default, alias = "provincia")]
    pub province: Option<String>,
    #[serde(default, alias = "distrito")]
    pub district: Option<String>,
}

impl Vote {
    /// A vote with only the mandatory fields filled.
    pub fn new(id: &str, candidate_id: Option<&str>, voted_at: DateTime<Utc>) -> Vote {
        Vote {
            id: id.to_string(),
            candidate_id: candidate_id.map(|s| s.to_string()),
            voted_at,
            voter_name: None,
            voter_email: None,
            voter_dni: None,
            voter_phone: None,
            voter_location: None,
            department: None,
            province: None,
            district: None,
        }
    }

    /// The location this vote is reported under.
    ///
    /// The free-text location wins when it is filled. Otherwise the structured
    /// fields are joined, most specific first. Blank values count as missing.
    pub fn location(&self) -> Option<String> {
        if let Some(loc) = non_blank(&self.voter_location) {
            return Some(loc.to_string());
        }
        let parts: Vec<&str> = [&self.district, &self.province, &self.department]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// The candidate reference, if it is set to something.
    pub fn candidate_ref(&self) -> Option<&str> {
        self.candidate_id.as_deref().filter(|s| !s.is_empty())
    }

    /// The email, if it is set to something.
    pub fn email(&self) -> Option<&str> {
        self.voter_email.as_deref().filter(|s| !s.is_empty())
    }
}

pub(crate) fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// The content of the public voting form.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteSubmission {
    pub voter_name: String,
    pub voter_email: String,
    pub candidate_id: String,
    #[serde(default)]
    pub voter_dni: Option<String>,
    #[serde(default)]
    pub voter_phone: Option<String>,
    #[serde(default)]
    pub voter_location: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

// ******** Output data structures *********

/// The tally of one candidate.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct CandidateResult {
    pub candidate_id: String,
    pub name: String,
    pub party: String,
    pub count: u64,
    /// Share of all the votes, including the unassigned ones, with 2 decimals.
    pub percentage: f64,
}

/// Number of votes cast during one hour of the day.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub count: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct LocationBucket {
    pub location: String,
    pub count: u64,
}

/// Headline numbers of a snapshot.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct TallySummary {
    pub total_votes: u64,
    pub candidate_count: u64,
    /// Votes that do not resolve to any of the candidates.
    pub unassigned_votes: u64,
    /// The id of the candidate strictly ahead of all the others.
    pub leader: Option<String>,
    pub location_count: u64,
    pub peak_hour: Option<u32>,
}

/// Errors for the few operations that validate their input.
///
/// The computations on snapshots never fail.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    MissingField(&'static str),
    UnknownCandidate(String),
    AlreadyVoted,
    InvalidLocation(String),
    InvalidLocationTable(String),
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::MissingField(field) => write!(f, "missing required field {}", field),
            TallyErrors::UnknownCandidate(cid) => write!(f, "unknown candidate {:?}", cid),
            TallyErrors::AlreadyVoted => write!(f, "this voter has already voted"),
            TallyErrors::InvalidLocation(loc) => write!(f, "location not in the table: {}", loc),
            TallyErrors::InvalidLocationTable(msg) => write!(f, "invalid location table: {}", msg),
        }
    }
}
