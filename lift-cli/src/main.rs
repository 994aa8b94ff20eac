//! Command-line interface for LIFT lexicons
//! This binary inspects, queries and converts `.lift` files.
//!
//! Usage:
//!   lift show `<path>` [--lang `<lang>`]                  - Header summary and one line per entry
//!   lift check `<path>` [--json]                        - Load diagnostics and dangling references
//!   lift get `<path>` `<id>` [--parent]                   - The item with an id, as markup
//!   lift find `<path>` `<text>` [--field] [--match] [--all] - Search entries and senses
//!   lift convert `<path>` --output `<out>` [--to-version]   - Rewrite a file
//!   lift schema `<element>` [--version `<version>`]         - Fields of an element type
//!
//! Configuration layers, lowest first: the built-in defaults, `lift.toml` in the working
//! directory when present, `--config <file>`, then each `--set key=value`. `-v` (repeatable)
//! turns on log output on stderr; `RUST_LOG` overrides it.

mod commands;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lift_config::{LiftConfig, Loader};
use lift_parser::lift::version::set_default_version;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const PROJECT_CONFIG: &str = "lift.toml";

fn path_arg(help: &'static str) -> Arg {
    Arg::new("path")
        .help(help)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .index(1)
}

fn lang_arg() -> Arg {
    Arg::new("lang")
        .long("lang")
        .short('l')
        .help("Analysis language for glosses (default: display.gloss_language)")
}

fn build_cli() -> Command {
    Command::new("lift")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting and converting LIFT lexicon files")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .global(true)
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("Override one setting, e.g. display.gloss_language=pt"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log more (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("show")
                .about("Print the header summary and one line per entry")
                .arg(path_arg("Path to the .lift file"))
                .arg(lang_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Report load diagnostics and unresolved references")
                .arg(path_arg("Path to the .lift file"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print findings as a JSON array")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Print the item with the given id")
                .arg(path_arg("Path to the .lift file"))
                .arg(Arg::new("id").help("Item id").required(true).index(2))
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .help("Print the item's owner instead")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("find")
                .about("Search entries and senses")
                .arg(path_arg("Path to the .lift file"))
                .arg(Arg::new("text").help("Search term").required(true).index(2))
                .arg(
                    Arg::new("field")
                        .long("field")
                        .short('f')
                        .help("lexical-unit, variant, gloss, definition, grammatical-info or a custom field"),
                )
                .arg(
                    Arg::new("match")
                        .long("match")
                        .short('m')
                        .help("contains, exact or regex"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .short('a')
                        .help("Print every match, not just the first")
                        .action(ArgAction::SetTrue),
                )
                .arg(lang_arg()),
        )
        .subcommand(
            Command::new("convert")
                .about("Load a file and write it back out")
                .arg(path_arg("Path to the .lift file"))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Output path (the .lift extension is enforced)"),
                )
                .arg(
                    Arg::new("to-version")
                        .long("to-version")
                        .help("Write with the schemas of another format version"),
                ),
        )
        .subcommand(
            Command::new("schema")
                .about("Describe the fields of an element type")
                .arg(
                    Arg::new("element")
                        .help("Element tag, e.g. entry or sense")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("version")
                        .long("version")
                        .help("Format version (default: format.default_version)"),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config<'a>(
    path: Option<&PathBuf>,
    settings: impl IntoIterator<Item = &'a String>,
) -> Result<LiftConfig, String> {
    let mut loader = Loader::new().with_optional_file(PROJECT_CONFIG);
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    for setting in settings {
        let (key, value) = setting
            .split_once('=')
            .ok_or_else(|| format!("Invalid setting '{}': expected KEY=VALUE", setting))?;
        loader = loader
            .set_override(key.trim(), value.trim())
            .map_err(|e| format!("Configuration error: {}", e))?;
    }
    loader.build().map_err(|e| format!("Configuration error: {}", e))
}

fn text<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn path(matches: &ArgMatches) -> &Path {
    matches
        .get_one::<PathBuf>("path")
        .map(PathBuf::as_path)
        .unwrap_or(Path::new(""))
}

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let settings = matches.get_many::<String>("set").into_iter().flatten();
    let config = load_config(matches.get_one::<PathBuf>("config"), settings).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    set_default_version(config.default_version());

    let result = match matches.subcommand() {
        Some(("show", sub)) => commands::show(path(sub), text(sub, "lang"), &config),
        Some(("check", sub)) => commands::check(path(sub), sub.get_flag("json"), &config),
        Some(("get", sub)) => commands::get(
            path(sub),
            text(sub, "id").unwrap_or_default(),
            sub.get_flag("parent"),
            &config,
        ),
        Some(("find", sub)) => commands::find(
            path(sub),
            &commands::FindRequest {
                text: text(sub, "text").unwrap_or_default(),
                field: text(sub, "field"),
                kind: text(sub, "match"),
                all: sub.get_flag("all"),
                lang: text(sub, "lang"),
            },
            &config,
        ),
        Some(("convert", sub)) => commands::convert(
            path(sub),
            sub.get_one::<PathBuf>("output")
                .map(PathBuf::as_path)
                .unwrap_or(Path::new("")),
            text(sub, "to-version"),
            &config,
        ),
        Some(("schema", sub)) => commands::schema(
            text(sub, "element").unwrap_or_default(),
            text(sub, "version"),
            &config,
        ),
        Some((other, _)) => Err(format!("Unknown command: {}", other)),
        None => Err("No command given".to_string()),
    };

    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
