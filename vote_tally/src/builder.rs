use chrono::{DateTime, Utc};
use log::debug;

pub use crate::config::*;
use crate::locations::LocationTable;
use crate::quality::has_voted;

/// A consistent view of the candidates and the votes, ready to be tabulated.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Snapshot {
    pub candidates: Vec<Candidate>,
    pub votes: Vec<Vote>,
}

/// A builder for assembling a snapshot from form submissions.
///
/// Submissions go through the same checks as the voting form: the name,
/// email and candidate are required, the candidate must be registered, and
/// a voter may only vote once.
///
/// ```
/// use vote_tally::builder::Builder;
/// use vote_tally::{compute_results, Candidate, TallyErrors, VoteSubmission};
/// use chrono::Utc;
///
/// let mut builder = Builder::new()
///     .candidates(&[Candidate::new("a", "Ana", "P1"), Candidate::new("b", "Beto", "P2")]);
///
/// builder.add_submission(
///     &VoteSubmission {
///         voter_name: "Carla".to_string(),
///         voter_email: "carla@mail.pe".to_string(),
///         candidate_id: "a".to_string(),
///         ..Default::default()
///     },
///     Utc::now(),
/// )?;
///
/// let snapshot = builder.build();
/// let results = compute_results(&snapshot.votes, &snapshot.candidates);
/// assert_eq!(results[0].count, 1);
///
/// # Ok::<(), TallyErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _votes: Vec<Vote>,
    pub(crate) _locations: Option<LocationTable>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn candidates(self, cands: &[Candidate]) -> Builder {
        Builder {
            _candidates: cands.to_vec(),
            ..self
        }
    }

    /// Attaches a location table: submissions with a department are then
    /// checked against it.
    pub fn locations(self, table: LocationTable) -> Builder {
        Builder {
            _locations: Some(table),
            ..self
        }
    }

    /// Adds a vote coming from the voting form.
    ///
    /// Returns the id given to the new vote.
    pub fn add_submission(
        &mut self,
        sub: &VoteSubmission,
        voted_at: DateTime<Utc>,
    ) -> Result<String, TallyErrors> {
        let voter_name = sub.voter_name.trim();
        let voter_email = sub.voter_email.trim();
        if voter_name.is_empty() {
            return Err(TallyErrors::MissingField("voter_name"));
        }
        if voter_email.is_empty() {
            return Err(TallyErrors::MissingField("voter_email"));
        }
        if sub.candidate_id.is_empty() {
            return Err(TallyErrors::MissingField("candidate_id"));
        }
        if !self._candidates.iter().any(|c| c.id == sub.candidate_id) {
            return Err(TallyErrors::UnknownCandidate(sub.candidate_id.clone()));
        }
        if has_voted(&self._votes, sub.voter_dni.as_deref(), Some(voter_email)) {
            return Err(TallyErrors::AlreadyVoted);
        }
        self.check_location(sub)?;

        let id = self.next_id();
        debug!("add_submission: accepted {} for {}", id, sub.candidate_id);
        self._votes.push(Vote {
            id: id.clone(),
            candidate_id: Some(sub.candidate_id.clone()),
            voted_at,
            voter_name: Some(voter_name.to_string()),
            voter_email: Some(voter_email.to_string()),
            voter_dni: sub.voter_dni.clone(),
            voter_phone: sub.voter_phone.clone(),
            voter_location: sub.voter_location.clone(),
            department: sub.department.clone(),
            province: sub.province.clone(),
            district: sub.district.clone(),
        });
        Ok(id)
    }

    // Replayed votes may already use the ids of the form.
    fn next_id(&self) -> String {
        let mut n = self._votes.len() + 1;
        loop {
            let id = format!("vote-{:08}", n);
            if !self._votes.iter().any(|v| v.id == id) {
                return id;
            }
            n += 1;
        }
    }

    // The structured location must be either absent or fully in the table.
    fn check_location(&self, sub: &VoteSubmission) -> Result<(), TallyErrors> {
        let table = match &self._locations {
            Some(t) => t,
            None => return Ok(()),
        };
        let department = match sub.department.as_deref().filter(|s| !s.is_empty()) {
            Some(d) => d,
            None => return Ok(()),
        };
        let province = sub.province.as_deref().unwrap_or("");
        let district = sub.district.as_deref().unwrap_or("");
        if table.contains(department, province, district) {
            Ok(())
        } else {
            Err(TallyErrors::InvalidLocation(format!(
                "{} / {} / {}",
                department, province, district
            )))
        }
    }

    /// Adds a vote record as the store returned it, without any check.
    pub fn add_vote(&mut self, vote: &Vote) {
        self._votes.push(vote.clone());
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            candidates: self._candidates,
            votes: self._votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 13, 10, 30, 0).unwrap()
    }

    fn builder() -> Builder {
        Builder::new().candidates(&[
            Candidate::new("a", "Ana", "P1"),
            Candidate::new("b", "Beto", "P2"),
        ])
    }

    fn sub(name: &str, email: &str, cid: &str) -> VoteSubmission {
        VoteSubmission {
            voter_name: name.to_string(),
            voter_email: email.to_string(),
            candidate_id: cid.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn required_fields() {
        let mut b = builder();
        assert_eq!(
            b.add_submission(&sub(" ", "x@y.pe", "a"), now()),
            Err(TallyErrors::MissingField("voter_name"))
        );
        assert_eq!(
            b.add_submission(&sub("Ana", "", "a"), now()),
            Err(TallyErrors::MissingField("voter_email"))
        );
        assert_eq!(
            b.add_submission(&sub("Ana", "x@y.pe", ""), now()),
            Err(TallyErrors::MissingField("candidate_id"))
        );
        assert_eq!(
            b.add_submission(&sub("Ana", "x@y.pe", "c"), now()),
            Err(TallyErrors::UnknownCandidate("c".to_string()))
        );
        assert!(b.build().votes.is_empty());
    }

    #[test]
    fn one_vote_per_voter() {
        let mut b = builder();
        let mut first = sub("Ana", "ana@mail.pe", "a");
        first.voter_dni = Some("12345678".to_string());
        assert_eq!(b.add_submission(&first, now()), Ok("vote-00000001".to_string()));
        assert_eq!(
            b.add_submission(&sub("Ana", "ana@mail.pe", "b"), now()),
            Err(TallyErrors::AlreadyVoted)
        );
        let mut same_dni = sub("Ana", "other@mail.pe", "b");
        same_dni.voter_dni = Some("12345678".to_string());
        assert_eq!(b.add_submission(&same_dni, now()), Err(TallyErrors::AlreadyVoted));
        assert_eq!(
            b.add_submission(&sub("Beto", "beto@mail.pe", "b"), now()),
            Ok("vote-00000002".to_string())
        );
        let snapshot = b.build();
        assert_eq!(snapshot.votes.len(), 2);
        assert_eq!(snapshot.votes[0].voter_dni.as_deref(), Some("12345678"));
    }

    #[test]
    fn padded_email_is_the_same_voter() {
        let mut b = builder();
        assert!(b.add_submission(&sub(" Ana ", "ana@mail.pe", "a"), now()).is_ok());
        assert_eq!(
            b.add_submission(&sub("Ana", "ana@mail.pe ", "b"), now()),
            Err(TallyErrors::AlreadyVoted)
        );
        let snapshot = b.build();
        assert_eq!(snapshot.votes[0].voter_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn ids_do_not_clash_with_replayed_votes() {
        let mut b = builder();
        b.add_vote(&Vote::new("vote-00000002", Some("a"), now()));
        assert_eq!(
            b.add_submission(&sub("Ana", "ana@mail.pe", "a"), now()),
            Ok("vote-00000003".to_string())
        );
        assert_eq!(
            b.add_submission(&sub("Beto", "beto@mail.pe", "b"), now()),
            Ok("vote-00000004".to_string())
        );
    }

    #[test]
    fn locations_checked_against_table() {
        let mut b = builder().locations(LocationTable::builtin().unwrap());
        let mut good = sub("Ana", "ana@mail.pe", "a");
        good.department = Some("Lima".to_string());
        good.province = Some("Lima".to_string());
        good.district = Some("Miraflores".to_string());
        assert!(b.add_submission(&good, now()).is_ok());

        let mut partial = sub("Beto", "beto@mail.pe", "a");
        partial.department = Some("Lima".to_string());
        assert!(matches!(
            b.add_submission(&partial, now()),
            Err(TallyErrors::InvalidLocation(_))
        ));

        // Free-text locations are not checked.
        let mut free = sub("Carla", "carla@mail.pe", "b");
        free.voter_location = Some("Ciudad, Estado".to_string());
        assert!(b.add_submission(&free, now()).is_ok());
    }

    #[test]
    fn replayed_votes_are_kept_as_is() {
        let mut b = builder();
        b.add_vote(&Vote::new("x1", None, now()));
        let snapshot = b.build();
        assert_eq!(snapshot.votes[0].id, "x1");
        assert_eq!(snapshot.candidates.len(), 2);
    }
}
