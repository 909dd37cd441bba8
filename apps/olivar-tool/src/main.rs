//! CLI tool for inspecting and editing the farm workbook.
//!
//! Provides commands for:
//! - Listing tables and records
//! - Adding, editing and deleting records
//! - Column totals
//! - Persisting load-time migrations
//! - Plain-text dumps of the whole workbook

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use olivar_core::config::DEFAULT_WORKBOOK_FILE;
use olivar_core::{farm_registry, Record, RecordRef, Session, StoreConfig, Table, Value};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the workbook tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workbook file
    #[arg(short, long, default_value = DEFAULT_WORKBOOK_FILE)]
    file: PathBuf,

    /// Retry attempts for transient I/O errors
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tables with their record counts
    Tables,
    /// Print every record of a table
    List {
        table: String,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a record: COL=VALUE pairs
    Add {
        table: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Edit a record: COL=VALUE pairs replace only the named fields
    Edit {
        table: String,
        /// Record identifier, or 1-based row with --position
        reference: String,
        #[arg(required = true)]
        fields: Vec<String>,
        /// Treat the reference as a row number
        #[arg(long)]
        position: bool,
    },
    /// Delete a record
    Delete {
        table: String,
        /// Record identifier, or 1-based row with --position
        reference: String,
        /// Treat the reference as a row number
        #[arg(long)]
        position: bool,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Total a column; non-numeric cells count as zero
    Sum {
        table: String,
        column: String,
        /// Only records where COL equals VALUE (case-insensitive)
        #[arg(long = "where")]
        filter: Option<String>,
    },
    /// Show the identifier the next record will get
    NextId { table: String },
    /// Load and save the workbook, writing migrated sheets back
    Migrate,
    /// Print every table as plain text
    Dump,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber for logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig {
        persistence_max_retries: args.max_retries,
        ..StoreConfig::new(&args.file)
    };
    let registry = Arc::new(farm_registry().context("Failed to build table registry")?);
    let mut session = Session::open(&config, registry)
        .with_context(|| format!("Failed to open workbook {:?}", args.file))?;

    match args.command {
        Command::Tables => {
            for table in session.workbook().tables() {
                println!("{}\t{}", table.name(), table.len());
            }
        }
        Command::List { table, json } => {
            let records = session.list(&table)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_table(session.workbook().table(&table)?, &records);
            }
        }
        Command::Add { table, fields } => {
            let fields = parse_fields(&fields)?;
            let record = session.create(&table, &as_pairs(&fields))?;
            print_record(&record);
        }
        Command::Edit {
            table,
            reference,
            fields,
            position,
        } => {
            let reference = parse_reference(&reference, position)?;
            let fields = parse_fields(&fields)?;
            let record = session.update(&table, &reference, &as_pairs(&fields))?;
            print_record(&record);
        }
        Command::Delete {
            table,
            reference,
            position,
            yes,
        } => {
            let reference = parse_reference(&reference, position)?;
            let record = session.find(&table, &reference)?;
            if !yes {
                print_record(&record);
                bail!("Refusing to delete without --yes");
            }
            session.delete(&table, &reference)?;
            println!("Deleted record {} from {}", reference, table);
        }
        Command::Sum {
            table,
            column,
            filter,
        } => {
            let total = match filter {
                Some(filter) => {
                    let (filter_column, expected) = split_field(&filter)?;
                    session.sum_where(&table, &column, |record| {
                        record.matches(filter_column, expected)
                    })?
                }
                None => session.sum(&table, &column)?,
            };
            println!("{}", Value::Number(total));
        }
        Command::NextId { table } => match session.next_id(&table)? {
            Some(id) => println!("{}", id),
            None => println!("(table '{}' is addressed by position)", table),
        },
        Command::Migrate => {
            session.save()?;
            println!("Wrote {:?}", session.path());
        }
        Command::Dump => print!("{}", session.workbook().render_text()),
    }

    Ok(())
}

/// Splits `COL=VALUE`.
fn split_field(field: &str) -> Result<(&str, &str)> {
    match field.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => Ok((column.trim(), value)),
        _ => bail!("Expected COL=VALUE, got '{}'", field),
    }
}

fn parse_fields(fields: &[String]) -> Result<Vec<(String, Value)>> {
    fields
        .iter()
        .map(|field| {
            let (column, value) = split_field(field)?;
            Ok((column.to_string(), Value::from(value)))
        })
        .collect()
}

fn as_pairs(fields: &[(String, Value)]) -> Vec<(&str, Value)> {
    fields
        .iter()
        .map(|(column, value)| (column.as_str(), value.clone()))
        .collect()
}

fn parse_reference(reference: &str, position: bool) -> Result<RecordRef> {
    if position {
        let row: usize = reference
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a row number", reference))?;
        if row == 0 {
            bail!("Row numbers start at 1");
        }
        Ok(RecordRef::position(row - 1))
    } else {
        let id = reference.parse().map_err(anyhow::Error::msg)?;
        Ok(RecordRef::Id(id))
    }
}

fn print_table(table: &Table, records: &[Record]) {
    println!("{}", table.schema().column_names().join("\t"));
    for record in records {
        let cells: Vec<String> = record.values().map(ToString::to_string).collect();
        println!("{}", cells.join("\t"));
    }
}

fn print_record(record: &Record) {
    for (column, value) in record.iter() {
        println!("{}: {}", column, value);
    }
}
