// Command-line interface for draftmd
//
// Converts documents between the flat draft JSON schema and Markdown. The heavy lifting
// lives in draftmd-babel; this binary only wires files, configuration and the format
// registry together.
//
// Usage:
//  draftmd <input> --to <format> [--from <format>] [--output <file>] [--config <path>]
//  draftmd - --from markdown --to json    - Read from stdin (requires --from)
//  draftmd --list-formats                 - List available formats
//
// Configuration overrides:
//
// Any key of the configuration can be overridden with --extra-<section>.<key> <value>.
// Dashes in the key are accepted in place of underscores, and a bare flag means "true".
// Example:
//  draftmd notes.json --to markdown --extra-render.preserve-newlines

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use draftmd_babel::formats::{JsonFormat, MarkdownFormat};
use draftmd_babel::FormatRegistry;
use draftmd_config::{DraftConfig, Loader, LOCAL_CONFIG_FILE};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

const STDIN_MARKER: &str = "-";
const LOG_ENV: &str = "DRAFTMD_LOG";

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(key) = arg.strip_prefix("--extra-") {
            let has_value = args
                .get(i + 1)
                .is_some_and(|next| !next.starts_with('-'));

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("draftmd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between draft documents and Markdown")
        .long_about(
            "draftmd converts flat draft documents (blocks with inline style and entity\n\
            ranges) to Markdown and back.\n\n\
            Supported formats:\n  \
            - json:     Draft JSON schema (.json)\n  \
            - markdown: CommonMark Markdown (.md, .markdown)\n\n\
            The source format is auto-detected from the file extension.\n\
            Output goes to stdout by default, or use -o to specify a file.\n\n\
            Examples:\n  \
            draftmd notes.json --to markdown              # Render to stdout\n  \
            draftmd notes.md --to json -o notes.json      # Import into a file\n  \
            cat notes.md | draftmd - --from markdown --to json",
        )
        .arg_required_else_help(true)
        .arg(
            Arg::new("input")
                .help("Input file path, or '-' for stdin")
                .required_unless_present("list-formats")
                .index(1)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .help("Source format (auto-detected from file extension if not specified)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .help("Target format")
                .required_unless_present("list-formats")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output file path (defaults to stdout)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a draftmd.toml configuration file")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, extra_params) = parse_extra_args(&args);

    let matches = build_cli().get_matches_from(&cleaned_args);

    let config = load_cli_config(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        &extra_params,
    );
    let registry = build_registry(&config);

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&registry);
        return;
    }

    handle_convert_command(&matches, &registry);
}

/// Logs go to stderr so they never mix with converted output on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn handle_convert_command(matches: &ArgMatches, registry: &FormatRegistry) {
    let input = matches
        .get_one::<String>("input")
        .expect("input is required");
    let to = matches.get_one::<String>("to").expect("to is required");
    let output = matches.get_one::<String>("output").map(|s| s.as_str());

    let from = match matches.get_one::<String>("from") {
        Some(from) => from.to_string(),
        None => detect_source_format(registry, input),
    };

    if let Err(e) = registry.get(&from) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = registry.get(to) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let source = read_input(input).unwrap_or_else(|e| {
        eprintln!("Error reading '{input}': {e}");
        std::process::exit(1);
    });

    tracing::debug!(from = %from, to = %to, bytes = source.len(), "converting");

    let doc = registry.parse(&source, &from).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let result = registry.serialize(&doc, to).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    match output {
        Some(path) => {
            fs::write(path, result).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => println!("{result}"),
    }
}

fn detect_source_format(registry: &FormatRegistry, input: &str) -> String {
    if input == STDIN_MARKER {
        eprintln!("Error: Reading from stdin requires --from");
        std::process::exit(1);
    }
    registry
        .detect_format_from_filename(input)
        .unwrap_or_else(|| {
            eprintln!("Error: Could not detect format from filename '{input}'");
            eprintln!("Please specify --from explicitly");
            std::process::exit(1);
        })
}

fn read_input(input: &str) -> io::Result<String> {
    if input == STDIN_MARKER {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(input)
    }
}

fn handle_list_formats_command(registry: &FormatRegistry) {
    println!("Available formats:\n");
    for name in registry.list_formats() {
        if let Ok(format) = registry.get(&name) {
            let extensions = format
                .file_extensions()
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {name:<10} {}  ({extensions})", format.description());
        }
    }
}

/// Register the built-in formats with options taken from the configuration.
fn build_registry(config: &DraftConfig) -> FormatRegistry {
    let mut registry = FormatRegistry::new();
    registry.register(MarkdownFormat::new(
        (&config.parse).into(),
        (&config.render).into(),
    ));
    registry.register(JsonFormat::new(config.json.pretty));
    registry
}

fn load_cli_config(explicit_path: Option<&str>, extra_params: &HashMap<String, String>) -> DraftConfig {
    let loader = Loader::new().with_optional_file(LOCAL_CONFIG_FILE);
    let mut loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    let mut overrides: Vec<_> = extra_params.iter().collect();
    overrides.sort();
    for (key, raw) in overrides {
        let key = config_key(key);
        loader = loader
            .set_override(&key, parse_bool_arg(&key, raw))
            .unwrap_or_else(|err| {
                eprintln!("Invalid override '{key}': {err}");
                std::process::exit(1);
            });
    }

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn config_key(extra: &str) -> String {
    extra.replace('-', "_")
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => {
            eprintln!("Invalid boolean value '{other}' for --extra-{flag}");
            std::process::exit(1);
        }
    }
}
