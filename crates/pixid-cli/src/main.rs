//! `pixid` command-line front end
//!
//! - `pixid process` fixes every contract of a document from an order file
//! - `pixid split` writes one document per contract

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use pixid_core::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.yaml";

fn cli() -> Command {
    Command::new("pixid")
        .version(pixid_core::VERSION)
        .about("Fix multi-contract PIXID HR-XML documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log filter (e.g. info, debug, pixid_core=trace)"),
        )
        .subcommand(
            Command::new("process")
                .about("Normalize and map every contract, then write the corrected document")
                .arg(path_arg("xml").required(true).help("Input HR-XML document"))
                .arg(path_arg("orders").help("Order records (.json, .csv or .txt)"))
                .arg(path_arg("config").help("Mapping configuration (default: ./config.yaml when present)"))
                .arg(path_arg("out").help("Corrected document (default: <input>_fixed.xml)"))
                .arg(path_arg("summary-csv").help("Write the per-contract summary as CSV"))
                .arg(path_arg("diff").help("Write the unified diff"))
                .arg(path_arg("split-dir").help("Also write one document per contract into this directory")),
        )
        .subcommand(
            Command::new("split")
                .about("Write one document per contract")
                .arg(path_arg("xml").required(true).help("Input HR-XML document"))
                .arg(path_arg("out-dir").required(true).help("Output directory")),
        )
}

fn path_arg(name: &'static str) -> Arg {
    Arg::new(name).long(name).value_parser(value_parser!(PathBuf))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match matches.subcommand() {
        Some(("process", args)) => run_process(args),
        Some(("split", args)) => run_split(args),
        _ => anyhow::bail!("unknown subcommand"),
    }
}

fn run_process(args: &ArgMatches) -> Result<()> {
    let xml_path = required_path(args, "xml")?;
    let xml = fs::read(xml_path).with_context(|| format!("failed to read {}", xml_path.display()))?;

    let config = load_config(args.get_one::<PathBuf>("config"))?;
    let ruleset = config.compile().context("invalid mapping configuration")?;

    let orders = match args.get_one::<PathBuf>("orders") {
        Some(path) => {
            OrderBook::from_path(path).with_context(|| format!("failed to load orders from {}", path.display()))?
        }
        None => OrderBook::new(),
    };
    tracing::info!(orders = orders.len(), "loaded order records");

    let output = ContractProcessor::new(ruleset)
        .process_all(&xml, &orders)
        .with_context(|| format!("failed to parse {}", xml_path.display()))?;

    let out_path = args
        .get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or_else(|| fixed_path(xml_path));
    fs::write(&out_path, &output.xml).with_context(|| format!("failed to write {}", out_path.display()))?;
    tracing::info!(path = %out_path.display(), "wrote corrected document");

    if let Some(path) = args.get_one::<PathBuf>("summary-csv") {
        let file = fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        pixid_core::write_csv(&output.summaries, file).context("failed to write summary")?;
    }

    if let Some(path) = args.get_one::<PathBuf>("diff") {
        fs::write(path, &output.diff).with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(dir) = args.get_one::<PathBuf>("split-dir") {
        write_parts(&output.xml, dir)?;
    }

    println!("{}", output.report());
    Ok(())
}

fn run_split(args: &ArgMatches) -> Result<()> {
    let xml_path = required_path(args, "xml")?;
    let out_dir = required_path(args, "out-dir")?;
    let xml = fs::read(xml_path).with_context(|| format!("failed to read {}", xml_path.display()))?;

    let count = write_parts(&xml, out_dir)?;
    println!("{count} contract(s) written to {}", out_dir.display());
    Ok(())
}

fn write_parts(xml: &[u8], dir: &Path) -> Result<usize> {
    let parts = split_by_contract(xml).context("failed to parse document for split")?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for (part, name) in parts.iter().zip(pixid_core::unique_file_names(&parts)) {
        let path = dir.join(name);
        fs::write(&path, &part.xml).with_context(|| format!("failed to write {}", path.display()))?;
    }
    tracing::info!(parts = parts.len(), dir = %dir.display(), "wrote split documents");
    Ok(parts.len())
}

fn load_config(explicit: Option<&PathBuf>) -> Result<MappingConfig> {
    let path = match explicit {
        Some(path) => path.clone(),
        None if Path::new(DEFAULT_CONFIG).is_file() => PathBuf::from(DEFAULT_CONFIG),
        None => {
            tracing::info!("no configuration file, using defaults");
            return Ok(MappingConfig::default());
        }
    };
    let config = MappingConfig::from_path(&path).with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(path = %path.display(), mappings = config.mappings.len(), "loaded configuration");
    Ok(config)
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))
}

/// `dir/name.xml` → `dir/name_fixed.xml`
fn fixed_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map_or_else(|| "output".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_fixed.xml"))
}
