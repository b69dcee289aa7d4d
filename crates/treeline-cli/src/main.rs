use std::{env, path::PathBuf, process};

use anyhow::{Context, Result, bail};
use treeline_config::{Config, known_dialects};
use treeline_engine::{CollectedWarnings, Outline, ParseOrigin};

struct Args {
    file: PathBuf,
    dialect: Option<String>,
    json: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Option<Args>> {
    let mut dialect: Option<String> = None;
    let mut json = false;
    let mut file: Option<PathBuf> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dialect" | "-d" => {
                let value = iter.next().context("--dialect needs a value")?;
                dialect = Some(value);
            }
            "--json" => json = true,
            "--help" | "-h" => return Ok(None),
            _ if arg.starts_with('-') => bail!("unknown option: {arg}"),
            _ => {
                if file.is_some() {
                    bail!("expected exactly one file");
                }
                file = Some(PathBuf::from(arg));
            }
        }
    }

    match file {
        Some(file) => Ok(Some(Args {
            file,
            dialect,
            json,
        })),
        None => bail!("missing input file"),
    }
}

fn print_usage() {
    eprintln!("Usage: treeline [--dialect NAME] [--json] FILE");
    eprintln!();
    eprintln!("Derive the outline of FILE and print the tree pane.");
    eprintln!("Dialects: {}", known_dialects().join(", "));
}

fn run(args: &Args) -> Result<(Outline, Vec<String>, String)> {
    let config = Config::load()?.unwrap_or_default();
    let name = args
        .dialect
        .clone()
        .unwrap_or_else(|| config.dialect_for_path(&args.file).to_string());
    let mut dialect = config.build_dialect(&name)?;

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let lines: Vec<String> = content.lines().map(str::to_string).collect();

    let mut warnings = CollectedWarnings::new();
    let outline = dialect.make_outline(&lines, ParseOrigin::Document, &mut warnings);
    Ok((outline, warnings.drain(), name))
}

fn main() -> Result<()> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("error: {err}");
            print_usage();
            process::exit(2);
        }
    };

    let (outline, warnings, dialect) = run(&args)?;

    if args.json {
        let payload = serde_json::json!({
            "dialect": dialect,
            "outline": outline,
            "warnings": warnings,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for warning in &warnings {
            eprintln!("warning: {warning}");
        }
        for (tree_line, lnum) in outline.tree_lines.iter().zip(&outline.node_lines) {
            println!("{lnum:>5} {tree_line}");
        }
    }
    Ok(())
}
