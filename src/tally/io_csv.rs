// Primitives for reading CSV exports of the votes.

use std::collections::HashMap;

use csv::StringRecord;

use crate::tally::{
    io_common::{cell_value, make_default_id, parse_timestamp},
    *,
};

use log::debug;
use snafu::prelude::*;

// Maps the column names to their position. The first name of each group is
// the one exported by the store, the others are the form field names.
struct Columns {
    positions: HashMap<String, usize>,
}

impl Columns {
    fn new(header: &StringRecord) -> Columns {
        Columns {
            positions: header
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.trim().to_string(), idx))
                .collect(),
        }
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.positions.get(*n).cloned())
    }

    fn get(&self, line: &StringRecord, names: &[&str]) -> Option<String> {
        self.find(names).and_then(|idx| cell_value(line.get(idx)))
    }
}

pub fn read_csv_votes(source: usize, path: &str) -> TallyResult<Vec<Vote>> {
    let default_id = make_default_id(source, path);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .clone();
    let cols = Columns::new(&header);
    if cols.find(&["voted_at"]).is_none() {
        return CsvMissingColumnSnafu {
            path,
            column: "voted_at",
        }
        .fail();
    }

    let mut res: Vec<Vote> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_votes: lineno: {:?} row: {:?}", lineno, line);

        let voted_at_s = cols.get(&line, &["voted_at"]).unwrap_or_default();
        let voted_at = parse_timestamp(&voted_at_s).context(BadTimestampSnafu {
            value: voted_at_s.clone(),
            lineno,
        })?;
        let id = cols
            .get(&line, &["id"])
            .unwrap_or_else(|| default_id(lineno));

        res.push(Vote {
            id,
            candidate_id: cols.get(&line, &["candidate_id"]),
            voted_at,
            voter_name: cols.get(&line, &["voter_name", "nombre"]),
            voter_email: cols.get(&line, &["voter_email", "email"]),
            voter_dni: cols.get(&line, &["voter_dni", "dni"]),
            voter_phone: cols.get(&line, &["voter_phone", "celular"]),
            voter_location: cols.get(&line, &["voter_location"]),
            department: cols.get(&line, &["department", "departamento"]),
            province: cols.get(&line, &["province", "provincia"]),
            district: cols.get(&line, &["district", "distrito"]),
        });
    }
    Ok(res)
}
