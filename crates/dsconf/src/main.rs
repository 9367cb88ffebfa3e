//! dsconf - edit and commit data-source connector configurations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dsconf_core::logging::{init_logging, log_dir, LogConfig};
use dsconf_core::services::storage::default_data_dir;
use dsconf_core::{Action, ConfigSession, RawRecord, RecordStore};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the record database and logs
    #[arg(long, env = "DSCONF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter directive
    #[arg(long, env = "DSCONF_LOG")]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "List stored records")]
    List,
    #[command(about = "Print a stored record")]
    Show { id: i64 },
    #[command(about = "Store a record read from a JSON file")]
    Import { file: PathBuf },
    #[command(about = "Delete a stored record")]
    Delete { id: i64 },
    #[command(about = "Replay actions against a record and print the committed result")]
    Edit(EditArgs),
}

#[derive(Parser, Debug)]
struct EditArgs {
    /// Start from a stored record
    #[arg(long, conflicts_with = "record")]
    id: Option<i64>,

    /// Start from a record JSON file
    #[arg(long)]
    record: Option<PathBuf>,

    /// JSON Lines file with one action per line
    #[arg(long)]
    actions: PathBuf,

    /// Store the committed record
    #[arg(long)]
    save: bool,

    /// Print the editing state instead of the committed record
    #[arg(long)]
    print_state: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

    let mut log_config = LogConfig::new(if cli.data_dir.is_some() {
        data_dir.join("logs")
    } else {
        log_dir()
    });
    if let Some(filter) = &cli.log_filter {
        log_config = log_config.with_filter(filter.as_str());
    }
    let _logging_guard = init_logging(log_config);

    tracing::debug!(data_dir = %data_dir.display(), command = ?cli.command, "Starting dsconf");

    let store = RecordStore::open(data_dir).context("Failed to open record store")?;
    run(&store, cli.command)
}

fn run(store: &RecordStore, command: Command) -> Result<()> {
    match command {
        Command::List => {
            for summary in store.list()? {
                println!(
                    "{}\t{}\t{}\t{}",
                    summary.id,
                    summary.database_name.as_deref().unwrap_or("-"),
                    summary.engine.as_deref().unwrap_or("-"),
                    summary.updated_at.to_rfc3339()
                );
            }
        }
        Command::Show { id } => {
            let record = load(store, id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Import { file } => {
            let record = read_record(&file)?;
            let id = store.save(&record)?;
            println!("{id}");
        }
        Command::Delete { id } => {
            if !store.delete(id)? {
                bail!("No record with id {id}");
            }
        }
        Command::Edit(args) => edit(store, args)?,
    }
    Ok(())
}

fn edit(store: &RecordStore, args: EditArgs) -> Result<()> {
    let mut session = match (args.id, &args.record) {
        (Some(id), _) => ConfigSession::from_record(load(store, id)?),
        (None, Some(path)) => ConfigSession::from_record(read_record(path)?),
        (None, None) => ConfigSession::new(),
    };

    let text = std::fs::read_to_string(&args.actions)
        .with_context(|| format!("Failed to read actions from {}", args.actions.display()))?;
    let actions = parse_actions(&text)?;
    tracing::info!(count = actions.len(), "Replaying actions");
    session.dispatch_all(actions);

    if args.print_state {
        println!("{}", serde_json::to_string_pretty(&session.state())?);
        return Ok(());
    }

    let mut record = session.commit().context("Failed to commit configuration")?;
    if args.save {
        let id = store.save(&record)?;
        record.set_id(id);
        tracing::info!(id, "Saved record");
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn load(store: &RecordStore, id: i64) -> Result<RawRecord> {
    store.load(id)?.with_context(|| format!("No record with id {id}"))
}

fn read_record(path: &Path) -> Result<RawRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid record in {}", path.display()))
}

/// Parse a JSON Lines action file. Blank lines and `#` comments are skipped.
fn parse_actions(text: &str) -> Result<Vec<Action>> {
    text.lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid action on line {line_no}"))
        })
        .collect()
}
