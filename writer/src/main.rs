//! gdwriter CLI - Translate project definitions to GoodData project models
//!
//! # Commands
//!
//! ```bash
//! gdwriter build config.json -o model.json      # Definition → project model
//! gdwriter read model.json --bucket out.c-main  # Project model → definition
//! gdwriter validate config.json                 # Schema + model checks
//! gdwriter identifiers products name            # Show derived identifiers
//! ```

use clap::{Parser, Subcommand};
use gdwriter::config::{parse_input, InputDocument};
use gdwriter::ldm::identifiers::{date_dimension_id, IdentifierRole};
use gdwriter::logs::{log_error, log_info, log_success};
use gdwriter::{
    build_project_model, derive_identifier, load_project_definition, load_project_model,
    read_project_model_with, DateDimensionLookup, NoTemplates, ReadOptions, StaticTemplates,
    WriterResult,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the default table id prefix for `read`
const BUCKET_ENV: &str = "GDWRITER_BUCKET";

#[derive(Parser)]
#[command(name = "gdwriter")]
#[command(about = "Translate project definitions to GoodData project models and back", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project model from a project definition
    Build {
        /// Project definition JSON (bare or wrapped in "parameters")
        config: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read a project model back into a project definition
    Read {
        /// Project model JSON
        model: PathBuf,

        /// JSON file mapping date dimension titles to templates or upload URNs
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Prefix of generated table ids (default: $GDWRITER_BUCKET)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a project definition or a project model
    Validate {
        /// Input JSON file
        input: PathBuf,
    },

    /// Show the identifiers derived for a table column
    Identifiers {
        /// Table id
        table: String,

        /// Column name
        column: String,

        /// Date dimension template, for the dimension identifier
        #[arg(long)]
        template: Option<String>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { config, output } => cmd_build(&config, output.as_deref()),

        Commands::Read {
            model,
            templates,
            bucket,
            output,
        } => cmd_read(&model, templates.as_deref(), bucket, output.as_deref()),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Identifiers {
            table,
            column,
            template,
        } => cmd_identifiers(&table, &column, template.as_deref()),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_build(config: &Path, output: Option<&Path>) -> WriterResult<()> {
    let definition = load_project_definition(config)?;
    log_info(format!(
        "{} tables, {} date dimensions",
        definition.tables.len(),
        definition.dimensions.len()
    ));

    let document = build_project_model(&definition)?;
    write_json(&document, output)
}

fn cmd_read(
    model: &Path,
    templates: Option<&Path>,
    bucket: Option<String>,
    output: Option<&Path>,
) -> WriterResult<()> {
    let document = load_project_model(model)?;

    let lookup: Box<dyn DateDimensionLookup> = match templates {
        Some(path) => Box::new(StaticTemplates::from_file(path)?),
        None => Box::new(NoTemplates),
    };
    let options = ReadOptions {
        table_prefix: bucket.or_else(|| std::env::var(BUCKET_ENV).ok()),
    };

    let outcome = read_project_model_with(&document, lookup.as_ref(), &options)?;
    if !outcome.warnings.is_empty() {
        log_info(format!("{} warnings while reading", outcome.warnings.len()));
    }
    write_json(&outcome.definition, output)
}

fn cmd_validate(input: &Path) -> WriterResult<()> {
    let content = fs::read_to_string(input)?;
    match parse_input(&content)? {
        InputDocument::Model(_) => {
            log_success(format!("{} is a valid project model", input.display()));
        }
        InputDocument::Definition(definition) => {
            // Building catches reference and grain errors the schema cannot
            build_project_model(&definition)?;
            log_success(format!("{} is a valid project definition", input.display()));
        }
    }
    Ok(())
}

fn cmd_identifiers(table: &str, column: &str, template: Option<&str>) -> WriterResult<()> {
    let roles = [
        ("dataset", IdentifierRole::Dataset),
        ("anchor", IdentifierRole::ImplicitAnchor),
        ("attribute", IdentifierRole::Attribute),
        ("label", IdentifierRole::Label),
        ("fact", IdentifierRole::Fact),
        ("timeFact", IdentifierRole::TimeFact),
    ];
    let mut identifiers = serde_json::Map::new();
    for (name, role) in roles {
        identifiers.insert(
            name.to_string(),
            Value::String(derive_identifier(role, table, column)),
        );
    }
    identifiers.insert(
        "dateDimension".to_string(),
        Value::String(date_dimension_id(column, template)),
    );
    write_json(&identifiers, None)
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> WriterResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(format!("Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
