//! Command-line interface for storyscript
//!
//! Usage:
//!   storyscript lex `<path>`       - Print the token stream, block markers included
//!   storyscript parse `<path>`     - Print the story tree
//!   storyscript compile `<path>`   - Print the compiled story
//!   storyscript grammar            - Print the grammar description
//!
//! A `storyscript.toml` next to the story is layered over the defaults.
//! Global options: `--config <file>` layers a TOML file over both,
//! `--format json|yaml` overrides `output.format`. Logging goes to stderr and is
//! controlled by `STORYSCRIPT_LOG` (falling back to `RUST_LOG`).

use clap::{Arg, ArgMatches, Command};
use serde::Serialize;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use storyscript::story::config::{Loader, OutputConfig, OutputFormat, StoryConfig};
use storyscript::story::parsing::ParseError;
use storyscript::{CompileError, Compiler, Parser};

fn main() {
    let filter = EnvFilter::try_from_env("STORYSCRIPT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path_arg = || {
        Arg::new("path")
            .help("Path to the story file")
            .required(true)
            .index(1)
    };

    let matches = Command::new("storyscript")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse and compile story files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .global(true)
                .value_parser(["json", "yaml"])
                .help("Output format"),
        )
        .subcommand(
            Command::new("lex")
                .about("Print the tokens of a story")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("parse")
                .about("Print the tree of a story")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("compile")
                .about("Compile a story")
                .arg(path_arg()),
        )
        .subcommand(Command::new("grammar").about("Print the story grammar"))
        .get_matches();

    let config = load_config(&matches);
    let parser = Parser::from_config(&config.parser);

    match matches.subcommand() {
        Some(("lex", sub)) => {
            let source = read_source(sub);
            let tokens = parser.lex(&source).unwrap_or_else(|e| parse_failure(e));
            emit(&tokens, &config.output);
        }
        Some(("parse", sub)) => {
            let source = read_source(sub);
            let tree = parser.try_parse(&source).unwrap_or_else(|e| parse_failure(e));
            emit(&tree, &config.output);
        }
        Some(("compile", sub)) => {
            let source = read_source(sub);
            let tree = parser.try_parse(&source).unwrap_or_else(|e| parse_failure(e));
            let story = Compiler::new()
                .compile(&tree)
                .unwrap_or_else(|e| compile_failure(e));
            emit(&story, &config.output);
        }
        Some(("grammar", _)) => println!("{}", parser.grammar()),
        _ => unreachable!(),
    }
}

fn load_config(matches: &ArgMatches) -> StoryConfig {
    let mut loader = Loader::new();
    let story = matches
        .subcommand()
        .and_then(|(_, sub)| sub.try_get_one::<String>("path").ok().flatten());
    if let Some(story) = story {
        loader = loader.with_project_file(story);
    }
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader
            .set_override("output.format", format.as_str())
            .unwrap_or_else(|e| fail(format!("Invalid format: {}", e)));
    }
    let config = loader
        .build()
        .unwrap_or_else(|e| fail(format!("Error loading configuration: {}", e)));
    debug!(?config, "loaded configuration");
    config
}

fn read_source(matches: &ArgMatches) -> String {
    let Some(path) = matches.get_one::<String>("path") else {
        fail("Missing story path".to_string())
    };
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("Error reading file {}: {}", path, e)))
}

fn emit<T: Serialize>(value: &T, output: &OutputConfig) {
    let rendered = match (output.format, output.pretty) {
        (OutputFormat::Json, true) => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        (OutputFormat::Json, false) => serde_json::to_string(value).map_err(|e| e.to_string()),
        (OutputFormat::Yaml, _) => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => fail(format!("Serialization error: {}", e)),
    }
}

fn parse_failure(error: ParseError) -> ! {
    match error.diagnostic() {
        Some(diagnostic) => fail(diagnostic.to_string()),
        None => fail(format!("Error: {}", error)),
    }
}

fn compile_failure(error: CompileError) -> ! {
    match error.diagnostic() {
        Some(diagnostic) => fail(diagnostic.to_string()),
        None => fail(format!("Compilation error: {}", error)),
    }
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
