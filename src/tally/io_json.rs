// Primitives for reading the JSON exports of the vote store.

use crate::tally::*;

use log::debug;
use snafu::prelude::*;
use std::fs;

pub fn read_json_votes(path: &str) -> TallyResult<Vec<Vote>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let votes: Vec<Vote> = serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_json_votes: {} votes in {}", votes.len(), path);
    Ok(votes)
}

/// The candidates, in registration order.
pub fn read_candidates(path: &str) -> TallyResult<Vec<Candidate>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let mut candidates: Vec<Candidate> =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    sort_candidates_by_creation(&mut candidates);
    debug!("read_candidates: {:?}", candidates);
    Ok(candidates)
}

pub fn read_locations(path: Option<&str>) -> TallyResult<LocationTable> {
    match path {
        Some(p) => {
            let contents = fs::read_to_string(p).context(OpeningFileSnafu { path: p })?;
            LocationTable::from_json(&contents).context(LocationTableSnafu {})
        }
        None => LocationTable::builtin().context(LocationTableSnafu {}),
    }
}
