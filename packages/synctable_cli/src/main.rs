//! Synctable command line
//!
//! Run with: cargo run --bin synctable -- <command>

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use synctable::intent::{load_script, replay, EditorPayload, IntentOutcome};
use synctable::order_key;
use synctable::templates::{self, Note};
use synctable::{TableStore, Versions};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Inspect and replay edits on an ordered table")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON array of edit intents to a fresh table and print it
    Replay {
        /// Intent script path
        script: PathBuf,

        /// Acting user id (a random one when omitted)
        #[clap(short, long, env = "SYNCTABLE_USER")]
        user: Option<String>,

        /// Start from a built-in template instead of an empty table
        #[clap(short, long)]
        template: Option<String>,

        /// Pretty-print the resulting table
        #[clap(long)]
        pretty: bool,
    },

    /// Mint order keys between two neighbours
    Keys {
        /// How many keys to mint
        #[clap(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Key the new keys sort after
        #[clap(long)]
        before: Option<String>,

        /// Key the new keys sort before
        #[clap(long)]
        after: Option<String>,
    },

    /// Print a template schema, or `list` to show them all
    Template {
        /// Template slug, `default` or `list`
        slug: String,
    },

    /// Build a table from a JSON array of notes and print it
    Import {
        /// Notes file path
        notes: PathBuf,

        #[clap(long)]
        pretty: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    user_id: String,
    applied: usize,
    skipped: usize,
    versions: Versions,
    table: EditorPayload,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn run_replay(
    script: PathBuf,
    user: Option<String>,
    template: Option<String>,
    pretty: bool,
) -> Result<()> {
    let user_id = user.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let intents = load_script(&script)
        .with_context(|| format!("Failed to load intents from {}", script.display()))?;

    let mut store = TableStore::in_memory();
    if let Some(slug) = template {
        let Some(template) = templates::template(&slug) else {
            bail!("Unknown template {:?}", slug);
        };
        templates::apply_template(&mut store, &template)?;
    }

    info!("Replaying {} intents as {}", intents.len(), user_id);
    let outcomes = replay(&mut store, &user_id, intents)?;
    let skipped = outcomes
        .iter()
        .filter(|o| **o == IntentOutcome::Skipped)
        .count();

    let report = ReplayReport {
        user_id,
        applied: outcomes.len() - skipped,
        skipped,
        versions: store.versions(),
        table: EditorPayload::from_store(&store),
    };
    print_json(&report, pretty)
}

fn run_keys(count: usize, before: Option<String>, after: Option<String>) -> Result<()> {
    let keys = order_key::generate_n(before.as_deref(), after.as_deref(), count)?;
    for key in keys {
        println!("{}", key);
    }
    Ok(())
}

fn run_template(slug: &str) -> Result<()> {
    match slug {
        "list" => {
            for template in templates::templates() {
                println!("{:<10} {} - {}", template.slug, template.title, template.description);
            }
            Ok(())
        }
        "default" => print_json(&templates::default_schema(), true),
        slug => match templates::template(slug) {
            Some(template) => print_json(&template.schema, true),
            None => bail!("Unknown template {:?}, try `template list`", slug),
        },
    }
}

fn run_import(notes: PathBuf, pretty: bool) -> Result<()> {
    let raw = std::fs::read(&notes)
        .with_context(|| format!("Failed to read {}", notes.display()))?;
    let notes: Vec<Note> = serde_json::from_slice(&raw).context("Malformed notes file")?;

    let mut store = TableStore::in_memory();
    let ids = templates::import_notes(&mut store, &notes)?;
    info!("Imported {} notes", ids.len());
    print_json(&EditorPayload::from_store(&store), pretty)
}

fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );

    let args = Args::parse();
    match args.command {
        Command::Replay {
            script,
            user,
            template,
            pretty,
        } => run_replay(script, user, template, pretty),
        Command::Keys {
            count,
            before,
            after,
        } => run_keys(count, before, after),
        Command::Template { slug } => run_template(&slug),
        Command::Import { notes, pretty } => run_import(notes, pretty),
    }
}
