//! arbre - GeneWeb .gw genealogy file converter

use std::process::ExitCode;

use clap::Parser;

use arbre::{EntitySet, extract_entities, parse, read_gw, serialize, serialize_entities};

#[derive(Parser)]
#[command(name = "arbre")]
#[command(version, about = "GeneWeb .gw genealogy file converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    arbre base.gw entities.json    Export flat entities as JSON
    arbre entities.json base.gw    Rebuild a .gw file from JSON entities
    arbre -i base.gw               Show file statistics
    arbre -c base.gw               Verify the file round-trips")]
struct Cli {
    /// Input file (.gw or .json)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (.gw or .json)
    #[arg(value_name = "OUTPUT", required_unless_present_any = ["info", "check"])]
    output: Option<String>,

    /// Show file statistics without converting
    #[arg(short, long)]
    info: bool,

    /// Parse, serialize and re-parse, then verify entity-level equality
    #[arg(short, long)]
    check: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = if cli.info {
        show_info(&cli.input)
    } else if cli.check {
        check_roundtrip(&cli.input, cli.quiet)
    } else {
        let output = cli.output.expect("output required");
        convert(&cli.input, &output, cli.quiet)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn show_info(path: &str) -> Result<(), String> {
    let doc = read_gw(path).map_err(|e| e.to_string())?;
    let entities = extract_entities(&doc);

    println!("File: {path}");
    if let Some(encoding) = &doc.header.encoding {
        println!("Encoding: {encoding}");
    }
    println!("Families: {}", doc.families.len());
    println!("Persons: {}", entities.persons.len());
    println!("Children: {}", entities.children.len());
    println!("Events: {}", entities.events.len());
    println!("Notes: {}", doc.notes.len());
    if !doc.pages.is_empty() {
        println!("Extended pages: {}", doc.pages.len());
    }

    Ok(())
}

fn check_roundtrip(path: &str, quiet: bool) -> Result<(), String> {
    let doc = read_gw(path).map_err(|e| e.to_string())?;
    let out = serialize(&doc);
    let reparsed = parse(&out).map_err(|e| format!("round-trip re-parse failed: {e}"))?;

    let before = extract_entities(&doc);
    let after = extract_entities(&reparsed);
    if before != after {
        return Err("round-trip changed the extracted entities".to_string());
    }

    if !quiet {
        println!(
            "OK: {} ({} persons, {} families)",
            path,
            before.persons.len(),
            before.families.len()
        );
    }
    Ok(())
}

fn convert(input: &str, output: &str, quiet: bool) -> Result<(), String> {
    if input.ends_with(".json") {
        // JSON entities -> .gw
        let json = std::fs::read_to_string(input).map_err(|e| e.to_string())?;
        let entities: EntitySet = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        let text = serialize_entities(&entities).map_err(|e| e.to_string())?;
        std::fs::write(output, text).map_err(|e| e.to_string())?;
        if !quiet {
            println!("Wrote {output}");
        }
        return Ok(());
    }

    // .gw -> JSON entities
    let doc = read_gw(input).map_err(|e| e.to_string())?;
    let entities = extract_entities(&doc);
    let json = serde_json::to_string_pretty(&entities).map_err(|e| e.to_string())?;
    std::fs::write(output, json).map_err(|e| e.to_string())?;
    if !quiet {
        println!(
            "Wrote {} ({} persons, {} families)",
            output,
            entities.persons.len(),
            entities.families.len()
        );
    }
    Ok(())
}
