//! Data quality checks over a snapshot of votes.
//!
//! The report is used to decide on and to measure the cleaning operations
//! run by the vote store (removing null records, duplicates, normalizing).
//! Nothing here modifies the votes: after a cleaning, the caller runs
//! [analyze] again on a fresh snapshot.

use log::{debug, info};

use std::collections::HashMap;
use std::fmt::Display;

use serde::Serialize;

use crate::config::non_blank;
use crate::{percentage, Vote};

/// The quality of a snapshot of votes.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct QualityReport {
    pub total_records: u64,
    /// Records with a name, a valid email and a candidate.
    pub complete_records: u64,
    /// Records without any location.
    pub missing_data: u64,
    /// Records sharing their email with at least one other record.
    pub duplicates: u64,
    pub valid_emails: u64,
    /// Share of complete records, with 1 decimal.
    pub quality_score: f64,
}

impl QualityReport {
    pub fn complete_percentage(&self) -> f64 {
        self.share(self.complete_records)
    }

    pub fn valid_email_percentage(&self) -> f64 {
        self.share(self.valid_emails)
    }

    // An empty snapshot has nothing wrong with it.
    fn share(&self, part: u64) -> f64 {
        if self.total_records == 0 {
            100.0
        } else {
            percentage(part, self.total_records, 1)
        }
    }
}

/// A problem found on a single record.
///
/// The declaration order is the order in which the issues are reported.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    MissingName,
    InvalidEmail,
    MissingLocation,
    MissingCandidate,
    Duplicate,
}

impl Issue {
    pub fn label(&self) -> &'static str {
        match self {
            Issue::MissingName => "missing name",
            Issue::InvalidEmail => "invalid email",
            Issue::MissingLocation => "missing location",
            Issue::MissingCandidate => "missing candidate",
            Issue::Duplicate => "duplicate",
        }
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The email check used throughout: an `@`, and a `.` somewhere after it.
///
/// This is deliberately not an RFC validator.
pub fn is_valid_email(email: &str) -> bool {
    match email.find('@') {
        Some(idx) => email[idx + 1..].contains('.'),
        None => false,
    }
}

fn has_valid_email(v: &Vote) -> bool {
    v.voter_email.as_deref().map(is_valid_email).unwrap_or(false)
}

fn has_name(v: &Vote) -> bool {
    v.voter_name.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
}

fn is_complete(v: &Vote) -> bool {
    has_name(v) && has_valid_email(v) && v.candidate_ref().is_some()
}

fn email_counts(votes: &[Vote]) -> HashMap<&str, u64> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for v in votes.iter() {
        if let Some(email) = v.email() {
            *counts.entry(email).or_insert(0) += 1;
        }
    }
    counts
}

/// Computes the quality report of a snapshot.
///
/// All the members of a group of records sharing the same email are
/// counted as duplicates, not only the extra ones. Records without email are
/// never duplicates.
pub fn analyze(votes: &[Vote]) -> QualityReport {
    info!("analyze: Processing {:?} votes", votes.len());
    let emails = email_counts(votes);

    let mut complete_records = 0;
    let mut missing_data = 0;
    let mut duplicates = 0;
    let mut valid_emails = 0;
    for v in votes.iter() {
        if is_complete(v) {
            complete_records += 1;
        }
        if v.location().is_none() {
            missing_data += 1;
        }
        if v.email().and_then(|e| emails.get(e)).map(|c| *c > 1).unwrap_or(false) {
            duplicates += 1;
        }
        if has_valid_email(v) {
            valid_emails += 1;
        }
    }

    let total_records = votes.len() as u64;
    let quality_score = if total_records == 0 {
        100.0
    } else {
        percentage(complete_records, total_records, 1)
    };
    let report = QualityReport {
        total_records,
        complete_records,
        missing_data,
        duplicates,
        valid_emails,
        quality_score,
    };
    debug!("analyze: report: {:?}", report);
    report
}

/// The issues of one record, in a fixed order.
///
/// Duplicates are looked up in `all_votes`: the record is a duplicate if
/// any other element of the slice has the same email. Records are told
/// apart by position, so two identical copies of a row are both
/// duplicates, as in [analyze]. A record that is not itself an element of
/// `all_votes` is a duplicate as soon as one record shares its email.
pub fn issues_for(vote: &Vote, all_votes: &[Vote]) -> Vec<Issue> {
    let mut res: Vec<Issue> = Vec::new();
    if !has_name(vote) {
        res.push(Issue::MissingName);
    }
    if !has_valid_email(vote) {
        res.push(Issue::InvalidEmail);
    }
    if vote.location().is_none() {
        res.push(Issue::MissingLocation);
    }
    if vote.candidate_ref().is_none() {
        res.push(Issue::MissingCandidate);
    }
    if let Some(email) = vote.email() {
        let shared = all_votes
            .iter()
            .any(|other| !std::ptr::eq(other, vote) && other.email() == Some(email));
        if shared {
            res.push(Issue::Duplicate);
        }
    }
    res
}

/// Tells if a voter with this national id or this email is already in the
/// snapshot. Blank identifiers never match.
pub fn has_voted(votes: &[Vote], dni: Option<&str>, email: Option<&str>) -> bool {
    let dni = dni.map(|s| s.trim()).filter(|s| !s.is_empty());
    let email = email.map(|s| s.trim()).filter(|s| !s.is_empty());
    if dni.is_none() && email.is_none() {
        return false;
    }
    votes.iter().any(|v| {
        let same_dni = dni.is_some() && non_blank(&v.voter_dni) == dni;
        let same_email = email.is_some() && v.email() == email;
        same_dni || same_email
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn voter(id: &str, name: &str, email: &str, location: Option<&str>) -> Vote {
        let mut v = Vote::new(
            id,
            Some("a"),
            Utc.with_ymd_and_hms(2025, 4, 13, 10, 0, 0).unwrap(),
        );
        v.voter_name = Some(name.to_string());
        v.voter_email = Some(email.to_string());
        v.voter_location = location.map(|s| s.to_string());
        v
    }

    #[test]
    fn empty_snapshot() {
        let r = analyze(&[]);
        assert_eq!(
            r,
            QualityReport {
                total_records: 0,
                complete_records: 0,
                missing_data: 0,
                duplicates: 0,
                valid_emails: 0,
                quality_score: 100.0,
            }
        );
        assert_eq!(r.complete_percentage(), 100.0);
    }

    #[test]
    fn duplicates_count_the_whole_group() {
        let votes = vec![
            voter("1", "Ana", "a@b.com", Some("Lima")),
            voter("2", "Beto", "a@b.com", Some("Lima")),
            voter("3", "Carla", "c@d.com", Some("Lima")),
        ];
        assert_eq!(analyze(&votes).duplicates, 2);
    }

    #[test]
    fn duplicates_group_of_three() {
        let votes = vec![
            voter("1", "Ana", "a@b.com", None),
            voter("2", "Ana", "a@b.com", None),
            voter("3", "Ana", "a@b.com", None),
            voter("4", "Ana", "A@b.com", None),
            voter("5", "Ana", "", None),
            voter("6", "Ana", "", None),
        ];
        let r = analyze(&votes);
        assert_eq!(r.duplicates, 3);
        assert_eq!(r.missing_data, 6);
    }

    #[test]
    fn report_counts() {
        let mut no_candidate = voter("4", "Dora", "d@e.org", None);
        no_candidate.candidate_id = None;
        let votes = vec![
            voter("1", "Ana", "ana@mail.pe", Some("Lima")),
            voter("2", "", "beto@mail.pe", Some("Cusco")),
            voter("3", "Carla", "carla@localhost", Some("Puno")),
            no_candidate,
        ];
        let r = analyze(&votes);
        assert_eq!(r.total_records, 4);
        assert_eq!(r.complete_records, 1);
        assert_eq!(r.missing_data, 1);
        assert_eq!(r.duplicates, 0);
        assert_eq!(r.valid_emails, 3);
        assert_eq!(r.quality_score, 25.0);
        assert_eq!(r.valid_email_percentage(), 75.0);
    }

    #[test]
    fn score_is_rounded() {
        let votes = vec![
            voter("1", "Ana", "ana@mail.pe", None),
            voter("2", "", "beto@mail.pe", None),
            voter("3", "", "carla@mail.pe", None),
        ];
        assert_eq!(analyze(&votes).quality_score, 33.3);
    }

    #[test]
    fn email_rule() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("a@b@c.d"));
        assert!(!is_valid_email("a.b@com"));
        assert!(!is_valid_email("ab.com"));
        assert!(!is_valid_email("a@b"));
        assert!(is_valid_email("@."));
    }

    #[test]
    fn issues_invalid_email_and_no_location() {
        let votes = vec![
            voter("1", "Ana", "not-an-email", None),
            voter("2", "Beto", "beto@mail.pe", Some("Lima")),
        ];
        let issues = issues_for(&votes[0], &votes);
        assert_eq!(issues, vec![Issue::InvalidEmail, Issue::MissingLocation]);
        let labels: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        assert_eq!(labels, vec!["invalid email", "missing location"]);
        assert!(issues_for(&votes[1], &votes).is_empty());
    }

    #[test]
    fn issues_all_at_once() {
        let mut v = voter("1", "", "x", None);
        v.candidate_id = None;
        let other = voter("2", "Beto", "x", Some("Lima"));
        let issues = issues_for(&v, &[v.clone(), other]);
        assert_eq!(
            issues,
            vec![
                Issue::MissingName,
                Issue::InvalidEmail,
                Issue::MissingLocation,
                Issue::MissingCandidate,
                Issue::Duplicate,
            ]
        );
    }

    #[test]
    fn issues_not_duplicate_of_itself() {
        let votes = vec![voter("1", "Ana", "a@b.com", Some("Lima"))];
        assert!(issues_for(&votes[0], &votes).is_empty());
        // A record outside the snapshot is checked against all of it.
        let w = voter("9", "Ana", "a@b.com", Some("Lima"));
        assert_eq!(issues_for(&w, &votes), vec![Issue::Duplicate]);
    }

    #[test]
    fn repeated_rows_are_duplicates() {
        let v = voter("1", "Ana", "a@b.com", Some("Lima"));
        let votes = vec![v.clone(), v.clone(), voter("2", "Beto", "b@c.com", Some("Lima"))];
        let flagged = votes
            .iter()
            .filter(|x| issues_for(x, &votes).contains(&Issue::Duplicate))
            .count() as u64;
        assert_eq!(flagged, 2);
        assert_eq!(flagged, analyze(&votes).duplicates);
    }

    #[test]
    fn voted_already() {
        let mut v = voter("1", "Ana", "a@b.com", Some("Lima"));
        v.voter_dni = Some("12345678".to_string());
        let votes = vec![v];
        assert!(has_voted(&votes, Some("12345678"), None));
        assert!(has_voted(&votes, None, Some("a@b.com")));
        assert!(has_voted(&votes, Some("87654321"), Some("a@b.com")));
        assert!(!has_voted(&votes, Some("87654321"), Some("z@b.com")));
        assert!(!has_voted(&votes, Some(" "), Some("")));
    }
}
