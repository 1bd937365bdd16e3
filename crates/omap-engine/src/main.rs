//! `omap` command line: map JSON documents between catalog-described types

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use omap_engine::{MappingProfile, ObjectMapper};
use omap_types::{json, TypeCatalog, TypeIntrospector};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn cli() -> Command {
    Command::new("omap")
        .version(omap_engine::VERSION)
        .about("Map JSON documents between catalog-described types")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("map")
                .about("Map one document from the source type to the target type")
                .arg(path_arg("catalog", true).help("Type catalog (.yaml, .yml or .json)"))
                .arg(path_arg("profile", false).help("Mapping profile to bind first"))
                .arg(
                    Arg::new("source")
                        .long("source")
                        .required(true)
                        .help("Source type expression"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .required(true)
                        .help("Target type expression"),
                )
                .arg(
                    Arg::new("input")
                        .long("input")
                        .default_value("-")
                        .help("Input JSON file, or - for stdin"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Bind every pair of a profile and report graph sizes")
                .arg(path_arg("catalog", true).help("Type catalog (.yaml, .yml or .json)"))
                .arg(path_arg("profile", true).help("Mapping profile"))
                .arg(
                    Arg::new("dump")
                        .long("dump")
                        .action(ArgAction::SetTrue)
                        .help("Print the program of every compiled class mapper"),
                ),
        )
}

fn path_arg(name: &'static str, required: bool) -> Arg {
    Arg::new(name)
        .long(name)
        .required(required)
        .value_parser(clap::value_parser!(PathBuf))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing --{name}"))
}

fn load_catalog(args: &ArgMatches) -> Result<Arc<TypeCatalog>> {
    let path = args
        .get_one::<PathBuf>("catalog")
        .context("missing --catalog")?;
    let catalog = TypeCatalog::load(path)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;
    tracing::debug!("loaded {} types from {}", catalog.len(), path.display());
    Ok(Arc::new(catalog))
}

fn load_profile(path: &Path) -> Result<MappingProfile> {
    MappingProfile::load(path).with_context(|| format!("failed to load profile {}", path.display()))
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
    }
}

fn run_map(args: &ArgMatches) -> Result<()> {
    let catalog = load_catalog(args)?;
    let source = catalog.parse_ty(required(args, "source")?)?;
    let target = catalog.parse_ty(required(args, "target")?)?;
    let introspector: Arc<dyn TypeIntrospector> = catalog.clone();

    let mapper = match args.get_one::<PathBuf>("profile") {
        Some(path) => load_profile(path)?.build_mapper(introspector)?.0,
        None => ObjectMapper::new(introspector),
    };
    if !mapper.is_bound(&source, &target) {
        mapper.bind(source.clone(), target.clone(), None)?;
    }

    let text = read_input(required(args, "input")?)?;
    let document: serde_json::Value = serde_json::from_str(&text).context("input is not JSON")?;
    let value = json::from_json(&document, &source, catalog.as_ref())?;
    let mapped = mapper.map(&source, &target, value, None)?;
    let output = json::to_json(&mapped, catalog.as_ref());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_check(args: &ArgMatches) -> Result<()> {
    let catalog = load_catalog(args)?;
    let path = args
        .get_one::<PathBuf>("profile")
        .context("missing --profile")?;
    let profile = load_profile(path)?;
    if profile.bindings.is_empty() {
        bail!("profile {} binds no pairs", path.display());
    }

    let (_, bound) = profile.build_mapper(catalog)?;
    let dump = args.get_flag("dump");
    for mapper in &bound {
        println!("{}: {} mappers", mapper.pair(), mapper.len());
        if dump {
            for node in mapper.graph().nodes() {
                if let Some(program) = &node.program {
                    println!("{program}");
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("map", args)) => run_map(args),
        Some(("check", args)) => run_check(args),
        _ => unreachable!("subcommand_required"),
    }
}
