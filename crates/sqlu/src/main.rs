use clap::{Args, Parser, Subcommand};
use sqlu_core::{Context, NamedResultData, SQLITE, restore_table, snapshot_table};
use sqlu_ext_sqlx::DriverConfig;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "sqlu",
    version,
    about = "Dump and restore tables as JSON",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    conn: ConnArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ConnArgs {
    /// Driver name: sqlite3 or mysql
    #[arg(long, global = true, default_value = SQLITE)]
    driver: String,

    /// Data source: a SQLite file, `:memory:`, or a mysql:// URL
    #[arg(long, global = true, default_value = ":memory:")]
    dsn: String,

    /// Upper bound on pooled connections
    #[arg(long, global = true, value_name = "N")]
    max_connections: Option<u32>,

    /// Give up on the whole operation after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every row of a table as {"columns": [...], "rows": [[...]]}
    Snapshot {
        #[arg(long)]
        table: String,
    },
    /// Upsert rows from a snapshot document into a table
    Restore {
        #[arg(long)]
        table: String,

        /// Snapshot file; stdin when omitted
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

fn read_snapshot(input: Option<&PathBuf>) -> Result<NamedResultData, String> {
    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let data: NamedResultData =
        serde_json::from_reader(reader).map_err(|e| format!("invalid snapshot: {}", e))?;
    if !data.is_aligned() {
        return Err("invalid snapshot: row width differs from column count".to_string());
    }
    Ok(data)
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = DriverConfig::default();
    if let Some(n) = cli.conn.max_connections {
        config = config.set_max_connections(n);
    }
    sqlu_ext_sqlx::configure(config);

    let ctx = match cli.conn.timeout {
        Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };
    let (db, _) = sqlu_ext_sqlx::get_generic_db(&cli.conn.driver, &cli.conn.dsn)
        .map_err(|e| e.to_string())?;

    match cli.command {
        Command::Snapshot { table } => {
            let data = snapshot_table(&ctx, db.as_ref(), &table).map_err(|e| e.to_string())?;
            let mut out = io::stdout().lock();
            serde_json::to_writer(&mut out, &data).map_err(|e| e.to_string())?;
            writeln!(out).map_err(|e| e.to_string())?;
        }
        Command::Restore { table, input } => {
            let data = read_snapshot(input.as_ref())?;
            restore_table(&ctx, db.as_ref(), &table, &data).map_err(|e| e.to_string())?;
            tracing::info!(table = %table, rows = data.len(), "restored");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sqlu: {}", e);
            ExitCode::FAILURE
        }
    }
}
