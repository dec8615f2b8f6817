use anyhow::{bail, Context, Result};
use clap::{builder::EnumValueParser, Arg, ArgAction, Command};
use std::ffi::OsString;

use crate::network::{Event, InferenceConfig, InferenceMode};

/// Where the network to query comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum NetworkSource {
    /// A JSON network document on disk
    File(String),
    /// A network stored under `title` in the SQLite database at `db_path`
    Database { db_path: String, title: String },
    /// One of the bundled example networks
    Scenario(String),
}

/// These options define the inputs from the user.
#[derive(Clone, Debug)]
pub struct CommandLineOptions {
    pub source: NetworkSource,
    pub query: String,
    pub evidence: Event,
    pub mode: InferenceMode,
    pub samples: usize,
    pub burn_in: usize,
    pub seed: Option<u64>,
    /// Database to store the loaded network (and log the query) in.
    pub db_path: Option<String>,
    pub save: bool,
}

impl CommandLineOptions {
    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            mode: self.mode,
            samples: self.samples,
            burn_in: self.burn_in,
            seed: self.seed,
            ..InferenceConfig::default()
        }
    }
}

fn command() -> Command {
    Command::new("BELIEFNET")
        .version("0.1")
        .about("Approximate posterior queries over discrete Bayesian networks.")
        .arg(
            Arg::new("network")
                .long("network")
                .value_name("FILE")
                .help("JSON network document to load"),
        )
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .value_name("NAME")
                .help("Bundled example network: 'grass_wetness' or 'burglary'"),
        )
        .arg(
            Arg::new("db_path")
                .long("db_path")
                .value_name("PATH")
                .help("SQLite database holding stored networks"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .value_name("STRING")
                .help("Title of the stored network to load from --db_path"),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .value_name("NODE")
                .help("Node whose posterior is computed")
                .required(true),
        )
        .arg(
            Arg::new("evidence")
                .long("evidence")
                .value_name("NAME=STATE")
                .help("Observed node state (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("samples")
                .long("samples")
                .value_name("NUMBER")
                .help("Number of samples per query")
                .default_value("1000"),
        )
        .arg(
            Arg::new("burn_in")
                .long("burn_in")
                .value_name("NUMBER")
                .help("Gibbs sweeps discarded before tallying (mcmc only)")
                .default_value("100"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(EnumValueParser::<InferenceMode>::new())
                .help("Sampling strategy: 'mcmc', 'rejection' or 'likelihood'")
                .default_value("mcmc"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("NUMBER")
                .help("Seed for reproducible sampling (optional)"),
        )
        .arg(
            Arg::new("save")
                .long("save")
                .help("Store the loaded network and log the query in --db_path")
                .action(ArgAction::SetTrue),
        )
}

/// Splits `NAME=STATE` pairs into an evidence event.
pub fn parse_evidence<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Event> {
    let mut evidence = Event::new();
    for pair in pairs {
        let Some((name, state)) = pair.split_once('=') else {
            bail!("evidence '{}' is not of the form NAME=STATE", pair);
        };
        let (name, state) = (name.trim(), state.trim());
        if name.is_empty() || state.is_empty() {
            bail!("evidence '{}' is not of the form NAME=STATE", pair);
        }
        evidence.set(name, state);
    }
    Ok(evidence)
}

fn parse_number<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .get_one::<String>(name)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("{} needs to be a non-negative integer", name))
        })
        .transpose()
}

/// Parses options from an explicit argument list (the first item is the
/// program name).
pub fn options_from_args<I, T>(args: I) -> Result<CommandLineOptions>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;

    let network = matches.get_one::<String>("network").cloned();
    let db_path = matches.get_one::<String>("db_path").cloned();
    let title = matches.get_one::<String>("title").cloned();
    let scenario = matches.get_one::<String>("scenario").cloned();
    let source = match (network, scenario, &db_path, title) {
        (Some(file), None, _, None) => NetworkSource::File(file),
        (None, Some(name), _, None) => NetworkSource::Scenario(name),
        (None, None, Some(db_path), Some(title)) => NetworkSource::Database {
            db_path: db_path.clone(),
            title,
        },
        (Some(_), Some(_), _, _) => bail!("--network and --scenario cannot be combined"),
        (Some(_), _, _, Some(_)) | (_, Some(_), _, Some(_)) => {
            bail!("--title only selects a network stored in --db_path")
        }
        _ => bail!("one of --network FILE, --scenario NAME or --db_path PATH with --title is required"),
    };

    let save = matches.get_flag("save");
    if save && db_path.is_none() {
        bail!("--save needs --db_path");
    }

    let evidence = parse_evidence(
        matches
            .get_many::<String>("evidence")
            .into_iter()
            .flatten()
            .map(String::as_str),
    )?;

    let defaults = InferenceConfig::default();
    let samples = parse_number(&matches, "samples")?.unwrap_or(defaults.samples);
    if samples == 0 {
        bail!("--samples needs to be at least 1");
    }

    Ok(CommandLineOptions {
        source,
        query: matches
            .get_one::<String>("query")
            .cloned()
            .context("query is required")?,
        evidence,
        mode: matches
            .get_one::<InferenceMode>("mode")
            .copied()
            .unwrap_or_default(),
        samples,
        burn_in: parse_number(&matches, "burn_in")?.unwrap_or(defaults.burn_in),
        seed: parse_number(&matches, "seed")?,
        db_path,
        save,
    })
}

pub fn parse_configuration_options() -> Result<CommandLineOptions> {
    options_from_args(std::env::args_os())
}
