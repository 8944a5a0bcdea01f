use clap::Parser;

/// This is a vote tabulation and data quality program for electoral snapshots.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the contest and where to find the votes and the candidates.
    /// For more information about the file format, read the manual of the vote_tally library.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of a tally in JSON format. If provided, tally will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the votes are read from this file. Setting this option overrides
    /// the vote sources of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path or empty) The JSON file with the candidates. Overrides the one of the --config option.
    #[clap(long, value_parser)]
    pub candidates: Option<String>,

    /// (file path or empty) The JSON file with the departments, provinces and districts. The built-in table
    /// is used if neither this option nor the configuration specify one.
    #[clap(long, value_parser)]
    pub locations: Option<String>,

    /// If passed as an argument, every record with a data quality issue is listed in the summary.
    #[clap(long, takes_value = false)]
    pub issues: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
