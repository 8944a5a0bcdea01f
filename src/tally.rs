use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_tally::locations::LocationTable;
use vote_tally::quality::{analyze, issues_for};
use vote_tally::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum TallyCliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Column {column} is missing in {path}"))]
    CsvMissingColumn { path: String, column: String },
    #[snafu(display("Invalid timestamp {value:?} on line {lineno}"))]
    BadTimestamp {
        source: chrono::ParseError,
        value: String,
        lineno: usize,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No vote source: use --input or voteSources in the configuration"))]
    MissingVoteSources {},
    #[snafu(display("No candidates: use --candidates or candidatesFile in the configuration"))]
    MissingCandidates {},
    #[snafu(display("Input type {provider:?} is not supported"))]
    UnknownProvider { provider: String },
    #[snafu(display("Could not load the location table"))]
    LocationTable { source: TallyErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyCliError>;

/// The files to read, with all the paths resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
struct Sources {
    votes: Vec<(String, String)>,
    candidates: String,
    locations: Option<String>,
}

fn resolve(root: &Path, p: &str) -> String {
    let pb: PathBuf = [root, Path::new(p)].iter().collect();
    pb.as_path().display().to_string()
}

// The command line wins over the configuration file. The paths of the
// configuration are relative to its directory, the others to the current
// directory.
fn resolve_sources(args: &Args, config: &TallyConfig, root: &Path) -> TallyResult<Sources> {
    let votes: Vec<(String, String)> = if let Some(input) = args.input.clone() {
        let provider = args.input_type.clone().unwrap_or_else(|| "json".to_string());
        vec![(provider, input)]
    } else {
        config
            .vote_sources
            .iter()
            .map(|vs| (vs.provider.clone(), resolve(root, &vs.file_path)))
            .collect()
    };
    ensure!(!votes.is_empty(), MissingVoteSourcesSnafu {});

    let candidates = match (&args.candidates, &config.candidates_file) {
        (Some(c), _) => c.clone(),
        (None, Some(c)) => resolve(root, c),
        (None, None) => return MissingCandidatesSnafu {}.fail(),
    };

    let locations = match (&args.locations, &config.locations_file) {
        (Some(l), _) => Some(l.clone()),
        (None, Some(l)) => Some(resolve(root, l)),
        (None, None) => None,
    };

    Ok(Sources {
        votes,
        candidates,
        locations,
    })
}

fn read_votes(source: usize, provider: &str, path: &str) -> TallyResult<Vec<Vote>> {
    info!("Attempting to read vote file {:?} ({})", path, provider);
    match provider {
        "json" => io_json::read_json_votes(path),
        "csv" => io_csv::read_csv_votes(source, path),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

// Votes with a department must point to a known place.
fn count_unknown_locations(votes: &[Vote], table: &LocationTable) -> u64 {
    votes
        .iter()
        .filter(|v| v.department.as_deref().map(|d| !d.is_empty()).unwrap_or(false))
        .filter(|v| {
            let known = table.contains(
                v.department.as_deref().unwrap_or(""),
                v.province.as_deref().unwrap_or(""),
                v.district.as_deref().unwrap_or(""),
            );
            if !known {
                warn!(
                    "Vote {} has an unknown location: {:?} / {:?} / {:?}",
                    v.id, v.department, v.province, v.district
                );
            }
            !known
        })
        .count() as u64
}

fn build_summary_js(
    config: &TallyConfig,
    snapshot: &builder::Snapshot,
    table: &LocationTable,
    with_issues: bool,
) -> TallyResult<JSValue> {
    let votes = &snapshot.votes;
    let candidates = &snapshot.candidates;
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
    };

    let (hourly, summary) = match config.output_settings.utc_offset()? {
        Some(offset) => (
            compute_hourly_histogram_in(votes, &offset),
            compute_summary_in(votes, candidates, &offset),
        ),
        None => (
            compute_hourly_histogram(votes),
            compute_summary(votes, candidates),
        ),
    };
    let quality = analyze(votes);
    let mut js = json!({
        "config": c,
        "results": compute_results(votes, candidates),
        "hourly": hourly,
        "locations": compute_location_histogram(votes),
        "summary": summary,
        "quality": quality,
        "unknownLocations": count_unknown_locations(votes, table),
    });

    if with_issues {
        let issues: Vec<JSValue> = votes
            .iter()
            .map(|v| {
                let labels: Vec<&str> = issues_for(v, votes).iter().map(|i| i.label()).collect();
                json!({"id": v.id, "issues": labels})
            })
            .filter(|x| x["issues"].as_array().map(|a| !a.is_empty()).unwrap_or(false))
            .collect();
        js["issues"] = JSValue::Array(issues);
    }
    Ok(js)
}

/// Reads all the inputs and computes the summary of the election.
pub fn compute_summary_js(args: &Args) -> TallyResult<(TallyConfig, JSValue)> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (TallyConfig::empty(), PathBuf::new()),
    };
    info!("config: {:?}", config);

    let sources = resolve_sources(args, &config, &root)?;
    debug!("sources: {:?}", sources);

    // Everything is read before any computation: the tally never runs on a
    // partial snapshot.
    let candidates = io_json::read_candidates(&sources.candidates)?;
    let table = io_json::read_locations(sources.locations.as_deref())?;
    let mut builder = builder::Builder::new().candidates(&candidates);
    for (source, (provider, path)) in sources.votes.iter().enumerate() {
        let file_votes = read_votes(source, provider, path)?;
        info!("Read {} votes from {}", file_votes.len(), path);
        for v in file_votes.iter() {
            builder.add_vote(v);
        }
    }
    let snapshot = builder.build();

    let js = build_summary_js(&config, &snapshot, &table, args.issues)?;
    Ok((config, js))
}

// Where to write the summary, if not to the standard output.
fn output_path(args: &Args, config: &TallyConfig) -> Option<String> {
    match (&args.out, &config.output_settings.output_directory) {
        (Some(o), _) if o == "stdout" => None,
        (Some(o), _) => Some(o.clone()),
        (None, Some(dir)) => {
            let root = args
                .config
                .as_deref()
                .and_then(|p| Path::new(p).parent())
                .unwrap_or_else(|| Path::new(""));
            let pb: PathBuf = [root, Path::new(dir), Path::new("summary.json")]
                .iter()
                .collect();
            Some(pb.as_path().display().to_string())
        }
        (None, None) => None,
    }
}

pub fn run_tally(args: &Args) -> TallyResult<()> {
    let (config, result_js) = compute_summary_js(args)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;

    match output_path(args, &config) {
        Some(p) => {
            info!("Writing summary to {}", p);
            if let Some(parent) = Path::new(&p).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingSummarySnafu { path: p.clone() })?;
                }
            }
            fs::write(&p, &pretty_js_stats).context(WritingSummarySnafu { path: p.clone() })?;
        }
        None => println!("{}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        check_reference(summary_p, &result_js)?;
    }
    Ok(())
}

fn check_reference(summary_p: &str, result_js: &JSValue) -> TallyResult<()> {
    let summary_ref = read_summary(summary_p)?;
    debug!("summary: {:?}", summary_ref);
    if summary_ref != *result_js {
        warn!("Found differences with the reference summary");
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        let pretty_js_stats = serde_json::to_string_pretty(result_js).context(WritingJsonSnafu {})?;
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_stats.as_str(),
            "\n",
        );
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("The summary matches the reference {}", summary_p);
    Ok(())
}
