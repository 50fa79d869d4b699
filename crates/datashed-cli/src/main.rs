// crates/datashed-cli/src/main.rs
// ============================================================================
// Module: Datashed CLI Entry Point
// Description: Command dispatcher for Datashed store administration and
//              operation execution.
// Purpose: Provide a safe CLI over the transactional store engine.
// Dependencies: clap, datashed-core, datashed-store, serde_json, thiserror, toml.
// ============================================================================

//! ## Overview
//! The Datashed CLI administers sandboxed `SQLite` store files and runs
//! engine operations from JSON payloads: transactions, bulk inserts, batch
//! queries, and the prepared statement lifecycle. All structured output is
//! pretty-printed JSON on stdout; errors go to stderr with a failure exit
//! code. Inputs are untrusted and size-capped before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use datashed_core::DatabaseName;
use datashed_core::IsolationLevel;
use datashed_core::Operation;
use datashed_core::Row;
use datashed_core::ScalarValue;
use datashed_core::SchemaDraft;
use datashed_core::StatementId;
use datashed_store::BatchQuery;
use datashed_store::BulkInsertOptions;
use datashed_store::Engine;
use datashed_store::StoreConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a JSON payload input.
const MAX_PAYLOAD_BYTES: u64 = 8 * 1024 * 1024;
/// Maximum size of a TOML config file.
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;
/// Environment variable naming the default sandbox root.
const ROOT_ENV: &str = "DATASHED_ROOT";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "datashed", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a database from a schema draft.
    Create(CreateCommand),
    /// List databases in the sandbox root.
    List(ListCommand),
    /// Show a database's stored contract and live schema.
    Info(InfoCommand),
    /// Show one table's schema, indexes, and foreign keys.
    TableInfo(TableInfoCommand),
    /// Delete a database (two-step confirmation).
    Delete(DeleteCommand),
    /// Insert rows into one table as a single transaction.
    Insert(InsertCommand),
    /// Run one read-only query.
    Query(QueryCommand),
    /// Run an ordered operation list in one transaction.
    Transaction(TransactionCommand),
    /// Insert records in batches with per-record failure reporting.
    BulkInsert(BulkInsertCommand),
    /// Run a batch of read-only queries.
    BatchQuery(BatchQueryCommand),
    /// Prepared statement lifecycle commands.
    Prepared {
        /// Selected prepared statement subcommand.
        #[command(subcommand)]
        command: PreparedCommand,
    },
    /// Show engine operation counters.
    Stats(StatsCommand),
}

/// Prepared statement subcommands.
#[derive(Subcommand, Debug)]
enum PreparedCommand {
    /// Register a statement under a caller-chosen identifier.
    Register(PreparedRegisterCommand),
    /// Execute a registered statement with positional parameters.
    Execute(PreparedExecuteCommand),
    /// Release a registered statement (idempotent).
    Close(PreparedCloseCommand),
    /// List registered statements.
    List(PreparedListCommand),
}

/// Store location inputs shared by every engine-backed command.
#[derive(Args, Debug, Clone)]
struct StoreRootArgs {
    /// Sandbox root directory holding the store files.
    #[arg(long, value_name = "DIR", conflicts_with = "config")]
    root: Option<PathBuf>,
    /// TOML config file path (overrides `DATASHED_ROOT`).
    #[arg(long, value_name = "PATH", conflicts_with = "root")]
    config: Option<PathBuf>,
}

/// JSON payload source: inline string or file path.
#[derive(Args, Debug, Clone)]
struct JsonInputArgs {
    /// JSON input string for the payload.
    #[arg(long, value_name = "JSON", conflicts_with = "input")]
    json: Option<String>,
    /// Path to a JSON file containing the payload.
    #[arg(long, value_name = "PATH", conflicts_with = "json")]
    input: Option<PathBuf>,
}

/// Transaction isolation selection.
#[derive(ValueEnum, Copy, Clone, Debug, Default)]
enum IsolationArg {
    /// No locks until the first read or write.
    #[default]
    Deferred,
    /// Reserved lock taken immediately.
    Immediate,
    /// Exclusive lock taken immediately.
    Exclusive,
}

impl From<IsolationArg> for IsolationLevel {
    fn from(arg: IsolationArg) -> Self {
        match arg {
            IsolationArg::Deferred => Self::Deferred,
            IsolationArg::Immediate => Self::Immediate,
            IsolationArg::Exclusive => Self::Exclusive,
        }
    }
}

/// Arguments for `create`.
#[derive(Args, Debug)]
struct CreateCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to create.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Schema draft payload (database description plus table definitions).
    #[command(flatten)]
    schema: JsonInputArgs,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
}

/// Arguments for `info`.
#[derive(Args, Debug)]
struct InfoCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to describe.
    #[arg(long, value_name = "NAME")]
    name: String,
}

/// Arguments for `table-info`.
#[derive(Args, Debug)]
struct TableInfoCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name holding the table.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Table name to describe.
    #[arg(long, value_name = "TABLE")]
    table: String,
}

/// Arguments for `delete`.
#[derive(Args, Debug)]
struct DeleteCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to delete.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Confirm the deletion; without it the command only reports the target.
    #[arg(long, action = ArgAction::SetTrue)]
    confirm: bool,
}

/// Arguments for `insert`.
#[derive(Args, Debug)]
struct InsertCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to run against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Target table name.
    #[arg(long, value_name = "TABLE")]
    table: String,
    /// Rows payload (JSON array of column/value objects).
    #[command(flatten)]
    rows: JsonInputArgs,
}

/// Arguments for `query`.
#[derive(Args, Debug)]
struct QueryCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to run against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Read-only SQL text to run.
    #[arg(long, value_name = "SQL")]
    sql: String,
    /// Positional parameters payload (JSON array of scalars).
    #[command(flatten)]
    params: JsonInputArgs,
}

/// Arguments for `transaction`.
#[derive(Args, Debug)]
struct TransactionCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to run against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Transaction isolation level.
    #[arg(long, value_enum, default_value_t = IsolationArg::Deferred)]
    isolation: IsolationArg,
    /// Operation list payload (JSON array of typed operations).
    #[command(flatten)]
    operations: JsonInputArgs,
}

/// Arguments for `bulk-insert`.
#[derive(Args, Debug)]
struct BulkInsertCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to run against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Target table name.
    #[arg(long, value_name = "TABLE")]
    table: String,
    /// Records payload (JSON array of column/value objects).
    #[command(flatten)]
    records: JsonInputArgs,
    /// Batch size override (clamped to the configured maximum).
    #[arg(long, value_name = "COUNT")]
    batch_size: Option<usize>,
    /// Report duplicate-key records as failures instead of skips.
    #[arg(long, action = ArgAction::SetTrue)]
    strict_duplicates: bool,
    /// Insert row by row in autocommit mode instead of per-batch transactions.
    #[arg(long, action = ArgAction::SetTrue)]
    no_transaction: bool,
}

/// Arguments for `batch-query`.
#[derive(Args, Debug)]
struct BatchQueryCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name to run against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Query list payload (JSON array of `{query_id, sql, params}`).
    #[command(flatten)]
    queries: JsonInputArgs,
    /// Stop at the first failure and mark the rest skipped.
    #[arg(long, action = ArgAction::SetTrue)]
    fail_fast: bool,
}

/// Arguments for `prepared register`.
#[derive(Args, Debug)]
struct PreparedRegisterCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name the statement targets.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Caller-chosen statement identifier.
    #[arg(long, value_name = "ID")]
    id: String,
    /// SQL text to compile and register.
    #[arg(long, value_name = "SQL")]
    sql: String,
}

/// Arguments for `prepared execute`.
#[derive(Args, Debug)]
struct PreparedExecuteCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name the statement was registered against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Registered statement identifier.
    #[arg(long, value_name = "ID")]
    id: String,
    /// Positional parameters payload (JSON array of scalars).
    #[command(flatten)]
    params: JsonInputArgs,
}

/// Arguments for `prepared close`.
#[derive(Args, Debug)]
struct PreparedCloseCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Database name the statement was registered against.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Registered statement identifier.
    #[arg(long, value_name = "ID")]
    id: String,
}

/// Arguments for `prepared list`.
#[derive(Args, Debug)]
struct PreparedListCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
}

/// Arguments for `stats`.
#[derive(Args, Debug)]
struct StatsCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreRootArgs,
    /// Reset counters to zero after reading them.
    #[arg(long, action = ArgAction::SetTrue)]
    reset: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Create(command) => command_create(&command),
        Commands::List(command) => command_list(&command),
        Commands::Info(command) => command_info(&command),
        Commands::TableInfo(command) => command_table_info(&command),
        Commands::Delete(command) => command_delete(&command),
        Commands::Insert(command) => command_insert(&command),
        Commands::Query(command) => command_query(&command),
        Commands::Transaction(command) => command_transaction(&command),
        Commands::BulkInsert(command) => command_bulk_insert(&command),
        Commands::BatchQuery(command) => command_batch_query(&command),
        Commands::Prepared {
            command,
        } => command_prepared(&command),
        Commands::Stats(command) => command_stats(&command),
    }
}

/// Prints top-level help when no subcommand is given.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Database Commands
// ============================================================================

/// Executes the `create` command.
fn command_create(command: &CreateCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let draft: SchemaDraft = load_json_payload(&command.schema)?;
    let report = engine
        .create_database(&name, &draft)
        .map_err(|err| CliError::new(format!("create failed: {err}")))?;
    emit_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `list` command.
fn command_list(command: &ListCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let summaries = engine
        .list_databases()
        .map_err(|err| CliError::new(format!("list failed: {err}")))?;
    emit_json(&summaries)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `info` command.
fn command_info(command: &InfoCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let info = engine
        .database_info(&name)
        .map_err(|err| CliError::new(format!("info failed: {err}")))?;
    emit_json(&info)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `table-info` command.
fn command_table_info(command: &TableInfoCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let info = engine
        .table_info(&name, &command.table)
        .map_err(|err| CliError::new(format!("table-info failed: {err}")))?;
    emit_json(&info)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `delete` command.
fn command_delete(command: &DeleteCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let outcome = engine
        .delete_database(&name, command.confirm)
        .map_err(|err| CliError::new(format!("delete failed: {err}")))?;
    emit_json(&outcome)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Operation Commands
// ============================================================================

/// Executes the `insert` command.
fn command_insert(command: &InsertCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let rows: Vec<Row> = load_json_payload(&command.rows)?;
    let inserted = engine
        .insert_rows(&name, &command.table, &rows)
        .map_err(|err| CliError::new(format!("insert failed: {err}")))?;
    emit_json(&InsertReport {
        table: command.table.clone(),
        rows_inserted: inserted,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Report emitted by `insert`.
#[derive(Debug, Serialize)]
struct InsertReport {
    /// Table the rows were written to.
    table: String,
    /// Number of rows durably inserted.
    rows_inserted: usize,
}

/// Executes the `query` command.
fn command_query(command: &QueryCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let params: Vec<ScalarValue> =
        if command.params.json.is_none() && command.params.input.is_none() {
            Vec::new()
        } else {
            load_json_payload(&command.params)?
        };
    let status = engine
        .query(&name, &command.sql, &params)
        .map_err(|err| CliError::new(format!("query failed: {err}")))?;
    emit_json(&status)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `transaction` command.
fn command_transaction(command: &TransactionCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let operations: Vec<Operation> = load_json_payload(&command.operations)?;
    let result = engine
        .run_transaction(&name, &operations, command.isolation.into())
        .map_err(|err| CliError::new(format!("transaction failed: {err}")))?;
    emit_json(&result)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `bulk-insert` command.
fn command_bulk_insert(command: &BulkInsertCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let records: Vec<Row> = load_json_payload(&command.records)?;
    let options = BulkInsertOptions {
        batch_size: command.batch_size,
        skip_duplicates: !command.strict_duplicates,
        use_transaction: !command.no_transaction,
    };
    let report = engine
        .bulk_insert(&name, &command.table, &records, &options)
        .map_err(|err| CliError::new(format!("bulk-insert failed: {err}")))?;
    emit_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `batch-query` command.
fn command_batch_query(command: &BatchQueryCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let queries: Vec<BatchQuery> = load_json_payload(&command.queries)?;
    let report = engine
        .run_batch_queries(&name, &queries, command.fail_fast)
        .map_err(|err| CliError::new(format!("batch-query failed: {err}")))?;
    emit_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Prepared Statement Commands
// ============================================================================

/// Dispatches prepared statement subcommands.
fn command_prepared(command: &PreparedCommand) -> CliResult<ExitCode> {
    match command {
        PreparedCommand::Register(register) => command_prepared_register(register),
        PreparedCommand::Execute(execute) => command_prepared_execute(execute),
        PreparedCommand::Close(close) => command_prepared_close(close),
        PreparedCommand::List(list) => command_prepared_list(list),
    }
}

/// Executes the `prepared register` command.
fn command_prepared_register(command: &PreparedRegisterCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let info = engine
        .prepare_statement(&name, StatementId::new(command.id.clone()), &command.sql)
        .map_err(|err| CliError::new(format!("prepared register failed: {err}")))?;
    emit_json(&info)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `prepared execute` command.
fn command_prepared_execute(command: &PreparedExecuteCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let params: Vec<ScalarValue> = if command.params.json.is_none()
        && command.params.input.is_none()
    {
        Vec::new()
    } else {
        load_json_payload(&command.params)?
    };
    let name = parse_database_name(&command.name)?;
    let status = engine
        .execute_prepared(&name, &StatementId::new(command.id.clone()), &params)
        .map_err(|err| CliError::new(format!("prepared execute failed: {err}")))?;
    emit_json(&status)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `prepared close` command.
fn command_prepared_close(command: &PreparedCloseCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let name = parse_database_name(&command.name)?;
    let released = engine.close_prepared(&name, &StatementId::new(command.id.clone()));
    emit_json(&CloseReport {
        statement_id: StatementId::new(command.id.clone()),
        released,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `prepared list` command.
fn command_prepared_list(command: &PreparedListCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    emit_json(&engine.list_prepared())?;
    Ok(ExitCode::SUCCESS)
}

/// Report emitted by `prepared close`.
#[derive(Debug, Serialize)]
struct CloseReport {
    /// Statement identifier the close targeted.
    statement_id: StatementId,
    /// Whether a registration was released by this call.
    released: bool,
}

// ============================================================================
// SECTION: Stats Command
// ============================================================================

/// Executes the `stats` command.
fn command_stats(command: &StatsCommand) -> CliResult<ExitCode> {
    let engine = open_engine(&command.location)?;
    let snapshot = engine.stats_snapshot();
    if command.reset {
        engine.reset_stats();
    }
    emit_json(&snapshot)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Engine Construction
// ============================================================================

/// Builds an engine from CLI location settings.
///
/// Precedence: `--config` file, then `--root`, then `DATASHED_ROOT`.
fn open_engine(location: &StoreRootArgs) -> CliResult<Engine> {
    let config = resolve_config(location)?;
    Engine::new(config).map_err(|err| CliError::new(format!("engine init failed: {err}")))
}

/// Resolves the store configuration from CLI arguments and the environment.
fn resolve_config(location: &StoreRootArgs) -> CliResult<StoreConfig> {
    if let Some(path) = &location.config {
        let text = read_capped(path, MAX_CONFIG_BYTES)?;
        return toml::from_str(&text)
            .map_err(|err| CliError::new(format!("invalid config '{}': {err}", path.display())));
    }
    if let Some(root) = &location.root {
        return Ok(StoreConfig::for_root(root.clone()));
    }
    if let Ok(root) = std::env::var(ROOT_ENV)
        && !root.is_empty()
    {
        return Ok(StoreConfig::for_root(root));
    }
    Err(CliError::new(format!("no store location: pass --root, --config, or set {ROOT_ENV}")))
}

/// Parses and validates a database name argument.
fn parse_database_name(raw: &str) -> CliResult<DatabaseName> {
    DatabaseName::parse(raw).map_err(|err| CliError::new(format!("invalid database name: {err}")))
}

// ============================================================================
// SECTION: Payload Loading
// ============================================================================

/// Loads a JSON payload from an inline string or a size-capped file.
fn load_json_payload<T: DeserializeOwned>(args: &JsonInputArgs) -> CliResult<T> {
    let text = match (&args.json, &args.input) {
        (Some(json), None) => json.clone(),
        (None, Some(path)) => read_capped(path, MAX_PAYLOAD_BYTES)?,
        (None, None) => {
            return Err(CliError::new("payload required: pass --json or --input".to_string()));
        }
        (Some(_), Some(_)) => {
            return Err(CliError::new("--json conflicts with --input".to_string()));
        }
    };
    serde_json::from_str(&text).map_err(|err| CliError::new(format!("invalid payload: {err}")))
}

/// Reads a file into a string, rejecting inputs over the byte cap.
fn read_capped(path: &std::path::Path, cap: u64) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|err| CliError::new(format!("cannot read '{}': {err}", path.display())))?;
    if metadata.len() > cap {
        return Err(CliError::new(format!(
            "input '{}' exceeds {cap} byte limit",
            path.display()
        )));
    }
    fs::read_to_string(path)
        .map_err(|err| CliError::new(format!("cannot read '{}': {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Serializes a value as pretty JSON on stdout.
fn emit_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("serialization failed: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
