//! Formwork command line
//!
//! Runs the headless form engine over JSON files:
//! 1. `render` prints the view tree and the hidden paths of a form
//! 2. `eval` evaluates a condition expression against data
//! 3. `merge` merges a type variant into a base form
//! 4. `validate` reports validation errors
//! 5. `submit` validates and writes the saved data to a file
//!
//! Usage:
//!   formwork render --schema page.json --data page-data.json --locale en

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use formwork_cli::{FileApi, eval, load_data, load_schema, merge, read_json, render, submit, validate};
use formwork_render::EngineConfig;
use formwork_schema::Form;
use formwork_types::Locale;
use serde_json::Value;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "formwork")]
#[command(about = "Schema-driven form engine")]
struct Args {
    /// Path to the engine config file
    #[arg(short, long, global = true, default_value = "formwork.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a form to its view tree
    Render {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Form data (defaults to an empty object)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Content locale
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Evaluate a condition expression
    Eval {
        expression: String,

        /// Data the expression is evaluated against
        #[arg(long)]
        context: Option<PathBuf>,

        /// Path of the object the expression is evaluated in
        #[arg(long)]
        scope: Option<String>,

        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Merge a type variant into a base form
    Merge { base: PathBuf, overlay: PathBuf },

    /// Validate data against a form
    Validate {
        #[command(flatten)]
        schema: SchemaArgs,

        #[arg(short, long)]
        data: PathBuf,
    },

    /// Validate and save data to a file
    Submit {
        #[command(flatten)]
        schema: SchemaArgs,

        #[arg(short, long)]
        data: PathBuf,

        /// Where the saved data is written
        #[arg(short, long)]
        out: PathBuf,

        #[arg(short, long)]
        locale: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct SchemaArgs {
    /// Schema file
    #[arg(short, long)]
    schema: PathBuf,

    /// Read the schema file as a metadata form
    #[arg(long)]
    metadata: bool,

    /// Read the schema file as a typed form and resolve this type
    #[arg(long = "type", value_name = "TYPE")]
    type_key: Option<String>,
}

impl SchemaArgs {
    fn load(&self) -> Result<formwork_schema::Schema> {
        load_schema(&self.schema, self.metadata, self.type_key.as_deref())
    }
}

fn parse_locale(locale: Option<String>) -> Result<Option<Locale>> {
    locale
        .map(|code| Locale::new(code).context("Invalid locale"))
        .transpose()
}

fn print(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = EngineConfig::load_from(&args.config);

    match args.command {
        Command::Render { schema, data, locale } => {
            let output = render(schema.load()?, load_data(data.as_deref())?, parse_locale(locale)?, &config)?;
            print(&output)?;
        }
        Command::Eval {
            expression,
            context,
            scope,
            locale,
        } => {
            let data = load_data(context.as_deref())?;
            let locale = parse_locale(locale)?;
            let result = eval(&expression, &data, scope.as_deref(), locale.as_ref())?;
            println!("{result}");
        }
        Command::Merge { base, overlay } => {
            let base: Form = read_json(&base)?;
            let overlay: Form = read_json(&overlay)?;
            let merged = merge(&base, &overlay)?;
            print(&serde_json::to_value(merged)?)?;
        }
        Command::Validate { schema, data } => {
            let errors = validate(&schema.load()?, &read_json(&data)?);
            if !errors.is_empty() {
                for error in &errors {
                    warn!("{error}");
                }
                print(&serde_json::to_value(&errors)?)?;
                bail!("{} validation error(s)", errors.len());
            }
            info!("Data is valid");
        }
        Command::Submit {
            schema,
            data,
            out,
            locale,
        } => {
            let api = FileApi::new(out);
            let saved = submit(schema.load()?, read_json(&data)?, parse_locale(locale)?, &config, &api).await?;
            info!(out = %api.path().display(), "Saved");
            print(&saved)?;
        }
    }

    Ok(())
}
