//! Sheetpack CLI - validate spreadsheets and package them as XML
//!
//! # Commands
//!
//! ```bash
//! sheetpack validate pages.xlsx -s structural.yml          # Check headers and cells
//! sheetpack extract pages.xlsx -s structural.yml           # Records as JSON
//! sheetpack structural pages.xlsx -s structural.yml \
//!     --media images/ --identifier ark:/12345/abc          # Page sequence XML
//! sheetpack descriptive items.csv -s descriptive.yml       # Descriptive XML
//! sheetpack types -s descriptive.yml                       # Registered data types
//! ```

use clap::{Args, Parser, Subcommand};
use sheetpack::pipeline::{
    extract_sheet, package_descriptive, package_structural, validate_sheet, PackageOptions,
};
use sheetpack::{ExtractMode, PipelineError, Schema, TypeRegistry, LOG_BROADCASTER};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetpack")]
#[command(about = "Validate spreadsheets against a schema and package them as XML", long_about = None)]
struct Cli {
    /// Do not echo progress logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by every sheet command.
#[derive(Args)]
struct SheetArgs {
    /// Input sheet (.csv, .tsv, .xlsx, .xls, .ods)
    input: PathBuf,

    /// Schema file (.json, .yml, .yaml)
    #[arg(short, long)]
    schema: PathBuf,

    /// Worksheet name (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a sheet and print the error report as JSON
    Validate {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract records as JSON
    Extract {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Skip validation and recover whatever data the sheet holds
        #[arg(long)]
        data_only: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the structural (page sequence) XML
    Structural {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Directory holding the page images
        #[arg(short, long)]
        media: PathBuf,

        /// Package identifier written in the record
        #[arg(short, long)]
        identifier: String,

        /// Media filename pattern (default: TIFF files)
        #[arg(long)]
        pattern: Option<String>,

        /// Skip validation
        #[arg(long)]
        data_only: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the descriptive XML
    Descriptive {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Skip validation
        #[arg(long)]
        data_only: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered data types
    Types {
        /// Include the custom types declared by this schema
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let result = match cli.command {
        Commands::Validate { sheet, output } => cmd_validate(&sheet, output.as_deref()),

        Commands::Extract { sheet, data_only, output } => cmd_extract(&sheet, data_only, output.as_deref()),

        Commands::Structural {
            sheet,
            media,
            identifier,
            pattern,
            data_only,
            output,
        } => cmd_structural(&sheet, &media, &identifier, pattern, data_only, output.as_deref()),

        Commands::Descriptive { sheet, data_only, output } => {
            cmd_descriptive(&sheet, data_only, output.as_deref())
        }

        Commands::Types { schema } => cmd_types(schema.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        if let Some(PipelineError::InvalidSheet(report)) = e.downcast_ref::<PipelineError>() {
            for error in report.iter().take(10) {
                eprintln!("   - {}", error);
            }
        }
        std::process::exit(1);
    }
}

fn load(sheet: &SheetArgs, data_only: bool) -> Result<(Schema, PackageOptions), Box<dyn std::error::Error>> {
    eprintln!("📐 Schema: {}", sheet.schema.display());
    let schema = Schema::load(&sheet.schema)?;
    eprintln!("   {} attributes, {} orientation", schema.attributes().len(), orientation_name(&schema));

    let options = PackageOptions {
        mode: if data_only { ExtractMode::DataOnly } else { ExtractMode::Full },
        sheet: sheet.sheet.clone(),
        media_pattern: None,
    };
    Ok((schema, options))
}

fn orientation_name(schema: &Schema) -> &'static str {
    match schema.orientation() {
        sheetpack::Orientation::Row => "row",
        sheetpack::Orientation::Column => "column",
    }
}

fn cmd_validate(sheet: &SheetArgs, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (schema, options) = load(sheet, false)?;

    eprintln!("✔️  Validating: {}", sheet.input.display());
    let summary = validate_sheet(&sheet.input, &schema, &options)?;

    let json = serde_json::to_string_pretty(&summary)?;
    write_output(&json, output)?;

    eprintln!(
        "\n📊 Results: {} lines, {} error(s)",
        summary.line_count, summary.error_count
    );
    if !summary.valid {
        std::process::exit(1);
    }
    eprintln!("✅ Sheet is valid");
    Ok(())
}

fn cmd_extract(sheet: &SheetArgs, data_only: bool, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (schema, options) = load(sheet, data_only)?;

    eprintln!("📄 Extracting: {}", sheet.input.display());
    let extraction = extract_sheet(&sheet.input, &schema, &options)?;

    let json = serde_json::to_string_pretty(&extraction.records)?;
    write_output(&json, output)?;

    eprintln!("✅ Extracted {} records", extraction.records.len());
    Ok(())
}

fn cmd_structural(
    sheet: &SheetArgs,
    media: &Path,
    identifier: &str,
    pattern: Option<String>,
    data_only: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (schema, mut options) = load(sheet, data_only)?;
    options.media_pattern = pattern;

    eprintln!("📄 Packaging structure: {}", sheet.input.display());
    let xml = package_structural(&sheet.input, &schema, media, identifier, &options)?;
    write_output(&xml, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_descriptive(sheet: &SheetArgs, data_only: bool, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (schema, options) = load(sheet, data_only)?;

    eprintln!("📄 Packaging description: {}", sheet.input.display());
    let xml = package_descriptive(&sheet.input, &schema, &options)?;
    write_output(&xml, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_types(schema: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let registry = match schema {
        Some(path) => Schema::load(path)?.types().clone(),
        None => TypeRegistry::with_defaults(),
    };

    eprintln!("📋 Registered data types:\n");
    for tag in registry.tags() {
        println!("  {}", tag);
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
