use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use legal_speeds::{Certitude, LegalDefaultSpeeds, SpeedLimits, SpeedLimitsData, Tags};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Rule table (.json, .yaml)
    #[arg(short, long, env = "LEGAL_SPEEDS_RULES")]
    pub rules: PathBuf,

    /// Country or subdivision code, e.g. DE or US-TX
    #[arg(short, long)]
    pub country: Option<String>,

    /// Tag of the road (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Tags of a relation the road is a member of (repeatable)
    #[arg(long = "relation", value_name = "KEY=VALUE,...", value_parser = parse_relation)]
    pub relations: Vec<Tags>,

    /// Use this result for a road type filter instead of evaluating it (repeatable)
    #[arg(long = "assume", value_name = "ROAD_TYPE=BOOL", value_parser = parse_assumption)]
    pub assumptions: Vec<(String, bool)>,

    /// JSON lines of {"country", "tags", "relations"} to resolve, "-" for stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only load and validate the rule table
    #[arg(long)]
    pub check: bool,
}

fn parse_tag(value: &str) -> Result<(String, String), String> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {value:?}"))?;
    if key.is_empty() {
        return Err("tag key must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_relation(value: &str) -> Result<Tags, String> {
    value.split(',').map(parse_tag).collect()
}

fn parse_assumption(value: &str) -> Result<(String, bool), String> {
    let (name, assumed) = parse_tag(value)?;
    let assumed = assumed
        .parse::<bool>()
        .map_err(|_| format!("expected true or false for {name:?}, got {assumed:?}"))?;
    Ok((name, assumed))
}

/// One line of batch input.
#[derive(Debug, Deserialize)]
struct Query {
    country: String,
    #[serde(default)]
    tags: Tags,
    #[serde(default)]
    relations: Vec<Tags>,
}

/// Output record, `null` if nothing was found.
#[derive(Debug, Serialize)]
struct Record<'a> {
    road_type: Option<&'a str>,
    tags: BTreeMap<&'a str, &'a str>,
    certitude: Certitude,
}

impl<'a> From<&'a SpeedLimits> for Record<'a> {
    fn from(result: &'a SpeedLimits) -> Self {
        Record {
            road_type: result.road_type_name.as_deref(),
            tags: result
                .tags
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            certitude: result.certitude,
        }
    }
}

fn to_json(result: Option<&SpeedLimits>) -> Result<String> {
    serde_json::to_string(&result.map(Record::from)).context("Output: Failed to serialize result")
}

pub struct RulesSummary {
    pub road_types: usize,
    pub countries: usize,
    pub filters: usize,
    pub warnings: usize,
}

pub fn summarize_rules(data: &SpeedLimitsData) -> RulesSummary {
    RulesSummary {
        road_types: data.road_types_by_name.len(),
        countries: data.speed_limits_by_country_code.len(),
        filters: data.filter_count(),
        warnings: data.warnings.len(),
    }
}

pub fn print_summary(summary: &RulesSummary, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Road types: {}", summary.road_types)?;
    writeln!(out, "Countries: {}", summary.countries)?;
    writeln!(out, "Filters: {}", summary.filters)?;
    writeln!(out, "Warnings: {}", summary.warnings)?;
    Ok(())
}

pub fn init_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path != Path::new("-") => {
            tracing::info!("Output: {:?}", path);
            let file = File::create(path)
                .with_context(|| format!("Output: Failed to create {:?}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Answers the assumed road types from `--assume` and evaluates all others.
pub fn assumption_replacer(
    assumptions: &HashMap<String, bool>,
) -> impl Fn(&str, &dyn Fn() -> bool) -> bool + Sync + '_ {
    move |name: &str, evaluate: &dyn Fn() -> bool| match assumptions.get(name) {
        Some(&assumed) => assumed,
        None => evaluate(),
    }
}

/// Resolves the road given on the command line.
pub fn process_single(
    cli: &Cli,
    speeds: &LegalDefaultSpeeds,
    assumptions: &HashMap<String, bool>,
    out: &mut dyn Write,
) -> Result<()> {
    let country = cli
        .country
        .as_deref()
        .context("CLI: --country is required unless --input or --check is given")?;
    let tags: Tags = cli.tags.iter().cloned().collect();
    let replacer = assumption_replacer(assumptions);

    let result = speeds.speed_limits_with(country, &tags, &cli.relations, &replacer);
    if result.is_none() {
        tracing::info!("No speed limits found for {}", country);
    }
    writeln!(out, "{}", to_json(result.as_ref())?)?;
    Ok(())
}

/// Resolves every line of `input` in parallel and writes one result line each, in input order.
/// Returns the number of queries.
pub fn process_batch(
    input: &Path,
    speeds: &LegalDefaultSpeeds,
    assumptions: &HashMap<String, bool>,
    out: &mut dyn Write,
) -> Result<usize> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file =
            File::open(input).with_context(|| format!("Batch: Failed to open {:?}", input))?;
        Box::new(BufReader::new(file))
    };

    let queries = read_queries(reader)?;
    tracing::info!("Batch: {} queries", queries.len());

    let replacer = assumption_replacer(assumptions);
    let lines: Vec<String> = queries
        .par_iter()
        .map(|query| {
            let result =
                speeds.speed_limits_with(&query.country, &query.tags, &query.relations, &replacer);
            to_json(result.as_ref())
        })
        .collect::<Result<_>>()?;

    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    Ok(lines.len())
}

/// Blank lines are skipped. Line numbers in errors are 1-based.
fn read_queries(reader: impl BufRead) -> Result<Vec<Query>> {
    let mut queries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("Batch: Failed to read line {}", line_number))?;
        if line.trim().is_empty() {
            continue;
        }
        let query: Query = serde_json::from_str(&line)
            .map_err(|e| anyhow!("Batch: Invalid query on line {}: {}", line_number, e))?;
        queries.push(query);
    }
    Ok(queries)
}
