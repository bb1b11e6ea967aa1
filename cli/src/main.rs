use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fts_schema_core::{
    MaintenanceCommand, PartialTableDefinition, TableDefinition, TokenizerType, TriggerSource,
    TriggerSpec, compile_table_definition, decompile_table_definition, populate_from_definition,
    synthesize_triggers, validate_definition,
};
use fts_schema_db::{
    DefinitionSet, EngineConfig, IndexState, Manifest, load_definition_file_with,
};
use fts_schema_sqlite::{CreateOptions, FtsIndexManager, SqliteExecutor};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Structured output format.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "fts-schema")]
#[command(version, about = "Compile, apply, and search SQLite FTS5 indexes")]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate definition files.
    Validate(ValidateArgs),
    /// Compile a definition file into SQL.
    Compile(CompileArgs),
    /// Recover a definition from a CREATE VIRTUAL TABLE statement.
    Decompile(DecompileArgs),
    /// Run a ranked search against an index.
    Search(SearchArgs),
    /// Create or update indexes from a directory of definitions.
    Apply(ApplyArgs),
    /// Compare definitions with the indexes present in a database.
    Status(StatusArgs),
    /// Run a maintenance command on an index.
    Maintain(MaintainArgs),
    /// Drop an index and its synchronization triggers.
    Drop(DropArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Definition files and/or directories containing definition files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Engine configuration (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CompileArgs {
    /// Definition file (.yaml, .yml or .json).
    #[arg(long)]
    definition: PathBuf,
    /// Also emit synchronization triggers.
    #[arg(long)]
    triggers: bool,
    /// Also emit the backfill statement.
    #[arg(long)]
    populate: bool,
    /// Engine configuration (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit structured output instead of plain SQL.
    #[arg(long)]
    format: Option<CliOutputFormat>,
}

#[derive(Debug, Args)]
struct DecompileArgs {
    /// File containing the statement (stdin if omitted).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Index to search.
    #[arg(long)]
    table: String,
    /// Search text.
    #[arg(long)]
    query: String,
    /// Comma-separated columns to restrict matching to.
    #[arg(long)]
    columns: Option<String>,
    /// Maximum results (default from configuration).
    #[arg(long)]
    limit: Option<u32>,
    /// Results to skip.
    #[arg(long, default_value_t = 0)]
    offset: u32,
    /// Include a highlighted snippet per result.
    #[arg(long)]
    snippet: bool,
    /// BM25 k1 (enables custom ranking).
    #[arg(long, requires = "bm25_b")]
    bm25_k1: Option<f64>,
    /// BM25 b (enables custom ranking).
    #[arg(long, requires = "bm25_k1")]
    bm25_b: Option<f64>,
    /// Engine configuration (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Database file path (created if missing).
    #[arg(long)]
    db: PathBuf,
    /// Directory of definition files, or a definition bundle file.
    #[arg(long)]
    definitions: PathBuf,
    /// Path to the applied-index manifest.
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Engine configuration (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Do not create synchronization triggers.
    #[arg(long)]
    no_triggers: bool,
    /// Do not backfill new indexes.
    #[arg(long)]
    no_populate: bool,
    /// Recreate every index, even unchanged ones.
    #[arg(long)]
    force: bool,
    /// Print the plan without touching the database.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Directory of definition files, or a definition bundle file.
    #[arg(long)]
    definitions: PathBuf,
    /// Path to the applied-index manifest.
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Engine configuration (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct MaintainArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Index to maintain.
    #[arg(long)]
    table: String,
    /// rebuild, optimize, integrity-check, delete-all, merge=N or automerge=N.
    #[arg(long)]
    op: MaintenanceCommand,
}

#[derive(Debug, Args)]
struct DropArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Index to drop.
    #[arg(long)]
    table: String,
    /// Leave the synchronization triggers in place.
    #[arg(long)]
    keep_triggers: bool,
    /// Path to the applied-index manifest.
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Compile(args) => run_compile(args),
        Command::Decompile(args) => run_decompile(args),
        Command::Search(args) => run_search(args),
        Command::Apply(args) => run_apply(args),
        Command::Status(args) => run_status(args),
        Command::Maintain(args) => run_maintain(args),
        Command::Drop(args) => run_drop(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// validate / compile / decompile
// ---------------------------------------------------------------------------

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let config = load_config(args.config.as_deref())?;
    let tokenizer = config.index.default_tokenizer;
    let paths = collect_definition_paths(&args.inputs)?;
    if paths.is_empty() {
        return Err("No definition files found".to_string());
    }

    let mut outcomes: Vec<(usize, Result<String, String>)> = paths
        .par_iter()
        .enumerate()
        .map(|(i, path)| (i, check_definition_file(path, tokenizer)))
        .collect();
    outcomes.sort_by_key(|(i, _)| *i);

    let mut tables: Vec<String> = Vec::new();
    let mut failures = 0usize;
    for (i, outcome) in outcomes {
        match outcome {
            Ok(table) if tables.contains(&table) => {
                eprintln!("{}: duplicate definition for table '{table}'", paths[i].display());
                failures += 1;
            }
            Ok(table) => tables.push(table),
            Err(err) => {
                eprintln!("{}: {err}", paths[i].display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!(
            "{failures} of {} definition file(s) failed validation",
            paths.len()
        ));
    }
    println!("Validated {} definition file(s).", paths.len());
    Ok(())
}

/// Loads and validates one file, returning its table name.
fn check_definition_file(path: &Path, tokenizer: TokenizerType) -> Result<String, String> {
    let def = load_definition_file_with(path, tokenizer).map_err(|e| e.to_string())?;
    validate_definition(&def).map_err(|e| e.to_string())?;
    debug!(file = %path.display(), table = %def.table_name, "Definition is valid");
    Ok(def.table_name)
}

#[derive(Serialize)]
struct CompileOutput {
    table: String,
    ddl: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    triggers: Vec<TriggerSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    populate: Option<String>,
}

fn run_compile(args: CompileArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let def = load_definition_file_with(&args.definition, config.index.default_tokenizer)
        .map_err(|e| format!("Failed to load '{}': {e}", args.definition.display()))?;
    let invalid = |e: fts_schema_core::ConfigError| {
        format!("Invalid definition '{}': {e}", args.definition.display())
    };

    let ddl = compile_table_definition(&def).map_err(invalid)?;
    let triggers = if args.triggers {
        synthesize_triggers(&TriggerSource::from_definition(&def).map_err(invalid)?)
    } else {
        Vec::new()
    };
    let populate = if args.populate {
        Some(populate_from_definition(&def).map_err(invalid)?)
    } else {
        None
    };

    match args.format {
        None => {
            println!("{ddl}");
            for trigger in &triggers {
                println!("{}", trigger.sql);
            }
            if let Some(sql) = &populate {
                println!("{sql}");
            }
            Ok(())
        }
        Some(format) => print_structured(
            &CompileOutput {
                table: def.table_name,
                ddl,
                triggers,
                populate,
            },
            format,
        ),
    }
}

fn run_decompile(args: DecompileArgs) -> Result<(), String> {
    let sql = match &args.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
        None => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            sql
        }
    };

    let partial: PartialTableDefinition = decompile_table_definition(sql.as_str())
        .ok_or_else(|| "Input is not an FTS5 CREATE VIRTUAL TABLE statement".to_string())?;
    print_structured(&partial, args.format)
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

fn run_search(args: SearchArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let mut request = config.search_request(&args.query);
    if let Some(columns) = args.columns {
        request.columns = Some(parse_csv_list(&columns));
    }
    if let Some(limit) = args.limit {
        request.limit = limit;
    }
    request.offset = args.offset;
    if let (Some(k1), Some(b)) = (args.bm25_k1, args.bm25_b) {
        request = request.with_bm25(k1, b);
    }
    request.include_snippet |= args.snippet;
    config.apply_search_defaults(&mut request);

    let manager = open_manager(&args.db, false)?;
    let page = manager
        .search(&args.table, &request)
        .map_err(|e| format!("Search failed: {e}"))?;
    print_structured(&page, args.format)
}

// ---------------------------------------------------------------------------
// apply / status
// ---------------------------------------------------------------------------

/// What `apply` does with one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum IndexAction {
    Create,
    Recreate,
    Unchanged,
}

impl IndexAction {
    fn verb(self) -> &'static str {
        match self {
            IndexAction::Create => "create",
            IndexAction::Recreate => "recreate",
            IndexAction::Unchanged => "unchanged",
        }
    }
}

fn run_apply(args: ApplyArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let set = load_definitions(&args.definitions, config.index.default_tokenizer)?;
    ensure_valid(&set)?;

    let manager = open_manager(&args.db, true)?;
    let mut manifest = match &args.manifest {
        Some(path) => Some(
            Manifest::load_or_new(path, PACKAGE_VERSION)
                .map_err(|e| format!("Failed to load manifest '{}': {e}", path.display()))?,
        ),
        None => None,
    };
    let options = CreateOptions {
        create_triggers: config.index.create_triggers && !args.no_triggers,
        populate: config.index.populate && !args.no_populate,
    };

    let mut changed = 0usize;
    for entry in set.iter() {
        let def = &entry.definition;
        let ddl = compile_table_definition(def).map_err(|e| e.to_string())?;
        let action = if args.force && exists(&manager, &def.table_name)? {
            IndexAction::Recreate
        } else {
            plan_index(&manager, manifest.as_ref(), def, &ddl)?
        };

        if args.dry_run {
            println!("{:<9} {}", action.verb(), def.table_name);
            continue;
        }

        let triggers = match action {
            IndexAction::Unchanged => manifest
                .as_ref()
                .and_then(|m| m.get(&def.table_name))
                .is_some_and(|record| record.triggers),
            IndexAction::Create | IndexAction::Recreate => {
                let report = if action == IndexAction::Recreate {
                    manager.recreate(def, options)
                } else {
                    manager.create(def, options)
                }
                .map_err(|e| format!("Failed to {} '{}': {e}", action.verb(), def.table_name))?;
                println!(
                    "{}d {} ({} trigger(s), {} row(s) indexed)",
                    action.verb(),
                    report.table,
                    report.triggers.len(),
                    report.populated_rows
                );
                changed += 1;
                !report.triggers.is_empty()
            }
        };

        if let Some(manifest) = manifest.as_mut() {
            let source = entry.path.as_ref().map(|p| p.display().to_string());
            if action != IndexAction::Unchanged || !manifest.contains(&def.table_name) {
                manifest.record(&def.table_name, &ddl, source, triggers);
            }
        }
    }

    if args.dry_run {
        return Ok(());
    }
    if let (Some(manifest), Some(path)) = (&manifest, &args.manifest) {
        manifest
            .save(path)
            .map_err(|e| format!("Failed to write manifest '{}': {e}", path.display()))?;
    }
    info!(changed, total = set.len(), "Apply finished");
    println!(
        "Applied {} definition(s): {changed} changed, {} unchanged.",
        set.len(),
        set.len() - changed
    );
    Ok(())
}

/// Decides whether `def` must be created, recreated, or left alone.
///
/// A manifest record is authoritative when present. Otherwise the stored
/// statement is decompiled and compared with the definition.
fn plan_index(
    manager: &FtsIndexManager<SqliteExecutor>,
    manifest: Option<&Manifest>,
    def: &TableDefinition,
    ddl: &str,
) -> Result<IndexAction, String> {
    if !exists(manager, &def.table_name)? {
        return Ok(IndexAction::Create);
    }
    if let Some(manifest) = manifest
        && manifest.contains(&def.table_name)
    {
        return Ok(match manifest.state_of(&def.table_name, ddl) {
            IndexState::Current => IndexAction::Unchanged,
            IndexState::New | IndexState::Changed => IndexAction::Recreate,
        });
    }
    if matches_database(manager, def)? {
        Ok(IndexAction::Unchanged)
    } else {
        Ok(IndexAction::Recreate)
    }
}

#[derive(Serialize)]
struct IndexStatus {
    table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_file: Option<String>,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches_database: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest_state: Option<IndexState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<u64>,
}

#[derive(Serialize)]
struct StatusReport {
    indexes: Vec<IndexStatus>,
    /// FTS5 indexes in the database with no definition.
    untracked: Vec<String>,
}

fn run_status(args: StatusArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let set = load_definitions(&args.definitions, config.index.default_tokenizer)?;
    let manager = open_manager(&args.db, false)?;
    let manifest = match &args.manifest {
        Some(path) => Some(
            Manifest::load(path)
                .map_err(|e| format!("Failed to load manifest '{}': {e}", path.display()))?,
        ),
        None => None,
    };

    let mut indexes = Vec::with_capacity(set.len());
    for entry in set.iter() {
        let def = &entry.definition;
        let present = exists(&manager, &def.table_name)?;
        let (matches, rows) = if present {
            let rows = manager
                .count_rows(&def.table_name)
                .map_err(|e| format!("Failed to count rows of '{}': {e}", def.table_name))?;
            (Some(matches_database(&manager, def)?), Some(rows))
        } else {
            (None, None)
        };
        let manifest_state = match (&manifest, compile_table_definition(def)) {
            (Some(m), Ok(ddl)) => Some(m.state_of(&def.table_name, &ddl)),
            _ => None,
        };
        indexes.push(IndexStatus {
            table: def.table_name.clone(),
            source_file: entry.path.as_ref().map(|p| p.display().to_string()),
            exists: present,
            matches_database: matches,
            manifest_state,
            rows,
        });
    }

    let untracked = manager
        .list_indexes()
        .map_err(|e| format!("Failed to list indexes: {e}"))?
        .into_iter()
        .filter(|name| !set.contains(name))
        .collect();

    print_structured(&StatusReport { indexes, untracked }, args.format)
}

// ---------------------------------------------------------------------------
// maintain / drop
// ---------------------------------------------------------------------------

fn run_maintain(args: MaintainArgs) -> Result<(), String> {
    let manager = open_manager(&args.db, false)?;
    let meta = manager
        .maintain(&args.table, args.op)
        .map_err(|e| format!("{} failed on '{}': {e}", args.op, args.table))?;
    println!(
        "Ran {} on '{}' in {:.1} ms.",
        args.op, args.table, meta.elapsed_ms
    );
    Ok(())
}

fn run_drop(args: DropArgs) -> Result<(), String> {
    let manager = open_manager(&args.db, false)?;
    if !exists(&manager, &args.table)? {
        return Err(format!("Index '{}' does not exist", args.table));
    }
    manager
        .drop_index(&args.table, !args.keep_triggers)
        .map_err(|e| format!("Failed to drop '{}': {e}", args.table))?;

    if let Some(path) = &args.manifest
        && path.exists()
    {
        let mut manifest = Manifest::load(path)
            .map_err(|e| format!("Failed to load manifest '{}': {e}", path.display()))?;
        if manifest.remove(&args.table).is_some() {
            manifest
                .save(path)
                .map_err(|e| format!("Failed to write manifest '{}': {e}", path.display()))?;
        }
    }
    println!("Dropped index '{}'.", args.table);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    match path {
        Some(path) => EngineConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Loads a definition directory, or a bundle when `path` is a file.
fn load_definitions(path: &Path, tokenizer: TokenizerType) -> Result<DefinitionSet, String> {
    let result = if path.is_dir() {
        DefinitionSet::from_dir_with(path, tokenizer)
    } else {
        DefinitionSet::from_bundle_with(path, tokenizer)
    };
    result.map_err(|e| format!("Failed to load definitions '{}': {e}", path.display()))
}

fn ensure_valid(set: &DefinitionSet) -> Result<(), String> {
    let problems = set.validate();
    if problems.is_empty() {
        return Ok(());
    }
    for (table, err) in &problems {
        eprintln!("{table}: {err}");
    }
    Err(format!("{} invalid definition(s)", problems.len()))
}

fn open_manager(path: &Path, create: bool) -> Result<FtsIndexManager<SqliteExecutor>, String> {
    if !create && !path.exists() {
        return Err(format!("Database '{}' does not exist", path.display()));
    }
    let executor = SqliteExecutor::open(path)
        .map_err(|e| format!("Failed to open database '{}': {e}", path.display()))?;
    Ok(FtsIndexManager::new(executor))
}

fn exists(manager: &FtsIndexManager<SqliteExecutor>, table: &str) -> Result<bool, String> {
    manager
        .stored_sql(table)
        .map(|sql| sql.is_some())
        .map_err(|e| format!("Failed to inspect '{table}': {e}"))
}

/// Whether an existing index was built from a statement equivalent to `def`.
///
/// The stored definition and `def` are both compiled and the statements
/// compared, so spellings that compile identically (`unindexed` order,
/// empty tokenizer parameters, a disabled prefix index) match.
fn matches_database(
    manager: &FtsIndexManager<SqliteExecutor>,
    def: &TableDefinition,
) -> Result<bool, String> {
    let stored = manager
        .load_definition(&def.table_name)
        .map_err(|e| format!("Failed to read '{}': {e}", def.table_name))?;
    let Some(stored) = stored.into_definition() else {
        return Ok(false);
    };
    Ok(match (compile_table_definition(&stored), compile_table_definition(def)) {
        (Ok(current), Ok(desired)) => current == desired,
        _ => false,
    })
}

/// Expands directories into their `.json`, `.yaml` and `.yml` files, sorted.
fn collect_definition_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .map_err(|err| format!("Failed to read '{}': {err}", input.display()))?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    matches!(
                        path.extension().and_then(|e| e.to_str()),
                        Some("json" | "yaml" | "yml")
                    )
                })
                .collect();
            found.sort();
            paths.extend(found);
        } else if input.exists() {
            paths.push(input.clone());
        } else {
            return Err(format!("'{}' does not exist", input.display()));
        }
    }
    Ok(paths)
}

fn parse_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn print_structured<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    let raw = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("Failed to serialize output: {e}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|e| format!("Failed to serialize output: {e}"))?,
    };
    println!("{}", raw.trim_end());
    Ok(())
}
