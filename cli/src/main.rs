mod ingest;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use fancy_duration::FancyDuration;
use gedcore::{
    algebra, partition, validator, Database, DatabaseConfig, ErrorLog, RecordKey, Sequence,
};

#[derive(Parser)]
#[command(name = "gedcli", about = "Query and validate GEDCOM databases")]
struct GedcliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest and validate a GEDCOM file, printing the error log.
    Validate { path: PathBuf },
    /// Ingest, validate, and partition a GEDCOM file into connected components.
    Partition { path: PathBuf },
    /// Run a Sequence-algebra operator from a single seed key.
    Query {
        path: PathBuf,
        operator: QueryOperator,
        key: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryOperator {
    Ancestors,
    Descendants,
    Siblings,
    Spouses,
}

fn load(path: &PathBuf, log: &mut ErrorLog) -> miette::Result<Database> {
    let mut database = Database::new(DatabaseConfig::default());
    let count = ingest::ingest_file(&mut database, path, log)?;
    tracing::info!(record_count = count, path = %path.display(), "ingested records");
    validator::validate_database(&database, log);
    Ok(database)
}

fn print_keys(seq: &Sequence<'_>) {
    for key in seq.keys() {
        println!("{key}");
    }
}

fn main() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt::init();

    miette::set_hook(Box::new(|_| Box::new(miette::MietteHandlerOpts::default().with_syntax_highlighting(false).build())))?;

    let args = GedcliArgs::parse();
    let start_time = Instant::now();

    let exit_code = match args.command {
        Commands::Validate { path } => {
            let mut log = ErrorLog::new();
            load(&path, &mut log)?;
            print!("{log}");
            if log.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Partition { path } => {
            let mut log = ErrorLog::new();
            let database = load(&path, &mut log)?;
            let table = partition::reachability_table(&database);
            let components = partition::partition(&database, &mut log, None);
            for (index, component) in components.iter().enumerate() {
                let most_connected = component
                    .keys()
                    .max_by_key(|key| table.num_ancestors(key) + table.num_descendents(key));
                match most_connected {
                    Some(key) => println!("component {index}: {} persons, most-connected {key}", component.len()),
                    None => println!("component {index}: {} persons", component.len()),
                }
            }
            print!("{log}");
            ExitCode::SUCCESS
        }
        Commands::Query { path, operator, key } => {
            let mut log = ErrorLog::new();
            let database = load(&path, &mut log)?;
            let seed = Sequence::from_keys(&database, [RecordKey::new(key.as_str())]);

            let mut result = match operator {
                QueryOperator::Ancestors => algebra::ancestor_sequence(&database, &seed, false, None),
                QueryOperator::Descendants => algebra::descendent_sequence(&database, &seed, false, None),
                QueryOperator::Siblings => algebra::sibling_sequence(&database, &seed, false),
                QueryOperator::Spouses => algebra::spouse_sequence(&database, &seed),
            };
            result.key_sort();
            print_keys(&result);
            ExitCode::SUCCESS
        }
    };

    let elapsed = FancyDuration::new(start_time.elapsed());
    tracing::debug!(elapsed = %elapsed, "gedcli finished");

    Ok(exit_code)
}
