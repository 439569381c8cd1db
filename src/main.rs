use std::fs;
use std::io::{self, Read};
use std::process::exit;

use clap::{Arg, ArgAction, Command};
use serde::Serialize;

use luatab::{entity_rows, extract_tables_with_diagnostics, Extraction};

mod options {
    pub(crate) const FILE: &str = "FILE";
    pub(crate) const ROWS: &str = "rows";
    pub(crate) const DIAGNOSTICS: &str = "diagnostics";
    pub(crate) const PRETTY: &str = "pretty";
}

fn main() {
    init_tracing();
    let matches = app().get_matches();

    let file = matches
        .get_one::<String>(options::FILE)
        .map_or("-", String::as_str);
    let entity_type = matches.get_one::<String>(options::ROWS);
    let show_diagnostics = matches.get_flag(options::DIAGNOSTICS);
    let pretty = matches.get_flag(options::PRETTY);

    if let Err(e) = run_file(file, entity_type.map(String::as_str), show_diagnostics, pretty) {
        eprintln!("{}: {}", file, e);
        exit(1);
    }
}

fn run_file(
    file: &str,
    entity_type: Option<&str>,
    show_diagnostics: bool,
    pretty: bool,
) -> luatab::Result<()> {
    let bytes = read_input(file)?;
    let text = std::str::from_utf8(&bytes)?;
    let Extraction {
        tables,
        diagnostics,
    } = extract_tables_with_diagnostics(text);

    if show_diagnostics {
        for diagnostic in &diagnostics {
            eprintln!("{}:{}", file, diagnostic);
        }
    }

    match entity_type {
        Some(entity_type) => print_json(&entity_rows(entity_type, &tables)?, pretty),
        None => print_json(&tables, pretty),
    }
}

fn read_input(file: &str) -> io::Result<Vec<u8>> {
    if file == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read(file)
    }
}

fn print_json(value: &impl Serialize, pretty: bool) -> luatab::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

/// Logs go to stderr, and only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn app() -> Command {
    Command::new("luatab")
        .version(clap::crate_version!())
        .about("Extract the data tables from a Lua module as JSON")
        .arg(
            Arg::new(options::FILE)
                .help("The Lua module to read, or - for stdin")
                .value_name("FILE")
                .default_value("-")
                .index(1),
        )
        .arg(
            Arg::new(options::ROWS)
                .long("rows")
                .help("Print one row per table, tagged with this entity type")
                .value_name("ENTITY_TYPE")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(options::DIAGNOSTICS)
                .short('d')
                .long("diagnostics")
                .help("Report skipped statements and entries on stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::PRETTY)
                .long("pretty")
                .help("Pretty-print JSON output")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app() {
        app().debug_assert();
        let matches = app().get_matches_from(["luatab", "--rows", "guns", "-d", "mod.lua"]);
        assert_eq!(
            matches.get_one::<String>(options::ROWS).map(String::as_str),
            Some("guns")
        );
        assert_eq!(
            matches.get_one::<String>(options::FILE).map(String::as_str),
            Some("mod.lua")
        );
        assert!(matches.get_flag(options::DIAGNOSTICS));
        assert!(!matches.get_flag(options::PRETTY));
    }
}
