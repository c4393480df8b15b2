//! Command-line interface for ocil-rs

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use ocil::model::{Question, TestAction};
#[cfg(feature = "cli")]
use ocil::{Ocil, ReadOptions, VersionPolicy, WriteOptions, XsdDateTime};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "ocil")]
#[command(author, version, about = "OCIL 2.0 document tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a minimal OCIL document stamped with the current time
    Skeleton {
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decode an OCIL document and summarize its contents
    Inspect {
        /// Path to the OCIL document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dump the decoded records as JSON
        #[arg(short, long)]
        json: bool,

        /// Accept unknown schema versions and sections
        #[arg(long)]
        lax: bool,
    },

    /// Decode an OCIL document and write it back out
    Normalize {
        /// Path to the OCIL document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indentation width, 0 for a single line
        #[arg(short, long, default_value_t = 2)]
        indent: usize,

        /// Accept unknown schema versions and sections
        #[arg(long)]
        lax: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Skeleton { output } => cmd_skeleton(output),
        Commands::Inspect { file, json, lax } => cmd_inspect(file, json, lax),
        Commands::Normalize {
            file,
            output,
            indent,
            lax,
        } => cmd_normalize(file, output, indent, lax),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn read_options(lax: bool) -> ReadOptions {
    let policy = if lax {
        VersionPolicy::Lax
    } else {
        VersionPolicy::Strict
    };
    ReadOptions::new().with_version_policy(policy)
}

#[cfg(feature = "cli")]
fn load(path: &Path, lax: bool) -> Result<Ocil, Box<dyn std::error::Error>> {
    let xml = fs::read_to_string(path)?;
    Ok(Ocil::from_xml_with(&xml, &read_options(lax))?)
}

#[cfg(feature = "cli")]
fn cmd_skeleton(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let xml = Ocil::skeleton(XsdDateTime::now()).to_xml()?;
    fs::write(&output, xml)?;
    println!("Wrote {}", output.display());
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_inspect(file: PathBuf, json: bool, lax: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ocil = load(&file, lax)?;

    if json {
        println!("{}", ocil.to_json()?);
        return Ok(());
    }

    print_summary(&ocil);
    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(ocil: &Ocil) {
    let generator = &ocil.generator;
    println!("ocil-rs v{}", ocil::VERSION);
    println!();
    println!("Generator:");
    println!("  Schema Version: {}", generator.schema_version);
    if let Some(ref name) = generator.product_name {
        match generator.product_version {
            Some(ref version) => println!("  Product: {} {}", name, version),
            None => println!("  Product: {}", name),
        }
    }
    match generator.timestamp.format() {
        Some(ts) => println!("  Timestamp: {}", ts),
        None => println!("  Timestamp: (none)"),
    }
    for author in &generator.authors {
        println!("  Author: {}", author.name);
    }
    if let Some(ref document) = ocil.document {
        println!("  Title: {}", document.title);
    }

    let mut compound = 0;
    let mut question_actions = 0;
    for action in &ocil.test_actions {
        match action {
            TestAction::Compound(_) => compound += 1,
            TestAction::Question(_) => question_actions += 1,
        }
    }
    let (mut boolean, mut choice, mut numeric, mut string) = (0, 0, 0, 0);
    for question in &ocil.questions.questions {
        match question {
            Question::Boolean(_) => boolean += 1,
            Question::Choice(_) => choice += 1,
            Question::Numeric(_) => numeric += 1,
            Question::String(_) => string += 1,
        }
    }

    println!();
    println!("Contents:");
    println!("  Questionnaires: {}", ocil.questionnaires.len());
    println!(
        "  Test Actions: {} ({} compound, {} question)",
        ocil.test_actions.len(),
        compound,
        question_actions
    );
    println!(
        "  Questions: {} ({} boolean, {} choice, {} numeric, {} string)",
        ocil.questions.questions.len(),
        boolean,
        choice,
        numeric,
        string
    );
    println!("  Choice Groups: {}", ocil.questions.choice_groups.len());
    println!(
        "  Artifacts: {}",
        ocil.artifacts.as_ref().map_or(0, Vec::len)
    );
    println!(
        "  Variables: {}",
        ocil.variables.as_ref().map_or(0, Vec::len)
    );

    if let Some(ref results) = ocil.results {
        println!();
        println!("Results:");
        if let Some(start) = results.start_time.format() {
            println!("  Start: {}", start);
        }
        if let Some(end) = results.end_time.format() {
            println!("  End: {}", end);
        }
        for result in &results.questionnaire_results {
            println!("  {} : {}", result.questionnaire_ref, result.result);
        }
        println!("  Answered Questions: {}", results.question_results.len());
        println!("  Artifact Results: {}", results.artifact_results.len());
    }
}

#[cfg(feature = "cli")]
fn cmd_normalize(
    file: PathBuf,
    output: Option<PathBuf>,
    indent: usize,
    lax: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ocil = load(&file, lax)?;
    let xml = ocil.to_xml_with(&WriteOptions::new().with_indent(indent))?;

    if let Some(output_path) = output {
        fs::write(&output_path, xml)?;
        println!("Wrote {}", output_path.display());
    } else {
        print!("{}", xml);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
