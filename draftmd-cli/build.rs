use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of build_cli() in src/main.rs, kept to the arguments completions care about.
// Build scripts can't access src/ modules.
fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("draftmd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between draft documents and Markdown")
        .arg(
            Arg::new("input")
                .help("Input file path, or '-' for stdin")
                .index(1)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .help("Source format")
                .value_parser(["json", "markdown"]),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .help("Target format")
                .value_parser(["json", "markdown"]),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .action(ArgAction::SetTrue),
        );

    generate_to(Bash, &mut cmd, "draftmd", &outdir)?;
    generate_to(Zsh, &mut cmd, "draftmd", &outdir)?;
    generate_to(Fish, &mut cmd, "draftmd", &outdir)?;

    Ok(())
}
