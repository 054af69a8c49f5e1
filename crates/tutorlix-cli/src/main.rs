//! Tutorlix CLI
//!
//! Fetches one page of a list endpoint through the table adapter and prints
//! it as a table.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tutorlix_client::RestClient;
use tutorlix_render::{render, Column, OutputFormat};
use tutorlix_table::{
    Config, FilterValue, SortEntry, SortMap, TableAction, TablePreset, TableQuery, TableSnapshot,
    TableState,
};
use tracing_subscriber::EnvFilter;

/// Tutorlix - server-driven tables from the command line
///
/// Requests a page from a Django REST list endpoint using the same paging,
/// search, ordering and filter translation the dashboard tables use.
#[derive(Parser, Debug)]
#[command(name = "tutorlix")]
#[command(version, about, long_about = None)]
struct Args {
    /// Table preset from tutorlix.json
    #[arg(value_name = "TABLE")]
    table: Option<String>,

    /// List endpoint path, e.g. /api/notes/ (overrides the preset)
    #[arg(short, long, value_name = "PATH")]
    endpoint: Option<String>,

    /// Backend origin (overrides baseUrl)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Path to configuration file (default: tutorlix.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Page to show, starting at 1
    #[arg(short, long, default_value_t = 1, value_parser = parse_page)]
    page: usize,

    /// Rows per page (overrides pageSize)
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Free-text search
    #[arg(short, long, value_name = "TEXT")]
    search: Option<String>,

    /// Sort column, with an optional `:desc` suffix
    #[arg(long, value_name = "COLUMN[:desc]", value_parser = parse_sort)]
    sort: Option<SortEntry>,

    /// Map a column to a backend sort field (repeatable)
    #[arg(long = "sort-map", value_name = "COLUMN=FIELD", value_parser = parse_key_value)]
    sort_map: Vec<(String, String)>,

    /// Extra filter passed through to the backend (repeatable)
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    filters: Vec<(String, String)>,

    /// Output format: text, markdown or json
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Comma-separated columns as dotted paths, e.g. id,title,creator.first_name
    #[arg(long, value_name = "COLUMNS")]
    columns: Option<String>,

    /// Bearer token (overrides accessToken)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run_table(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, fetches the requested page, and prints it.
async fn run_table(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref base_url) = args.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(ref token) = args.token {
        config.access_token = Some(token.clone());
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }

    // Re-validate after overrides
    config.validate()?;

    let preset = resolve_preset(&config, &args)?;
    let query = build_query(&args, config.page_size);

    let client = RestClient::from_config(&config)?;
    let adapter = client.json_adapter(&preset.endpoint, preset.sort_map.clone());

    tracing::info!(
        endpoint = %preset.endpoint,
        page = args.page,
        page_size = query.page_size,
        "Fetching table"
    );

    let snapshot = fetch_snapshot(query, |query| {
        let adapter = &adapter;
        async move { adapter.try_fetch(&query).await }
    })
    .await?;

    tracing::debug!(
        rows = snapshot.rows.len(),
        total_count = snapshot.total_count,
        "Table fetched"
    );

    let columns = match args.columns.as_deref() {
        Some(list) => Column::parse_list(list),
        None => preset.columns.iter().map(Column::new).collect(),
    };

    print!("{}", render(&snapshot, &columns, args.format)?);
    Ok(())
}

/// Runs one mount-fetch-resolve cycle of the table state machine.
async fn fetch_snapshot<F, Fut>(query: TableQuery, fetch: F) -> anyhow::Result<TableSnapshot>
where
    F: FnOnce(TableQuery) -> Fut,
    Fut: std::future::Future<Output = tutorlix_table::Result<tutorlix_table::AdapterResult>>,
{
    let mut state = TableState::from_query(query);
    let ticket = state
        .dispatch(TableAction::Mount)
        .ok_or_else(|| anyhow::anyhow!("table did not request its first page"))?;

    let result = fetch(ticket.query).await?;
    state.resolve(ticket.generation, Ok(result));
    Ok(state.snapshot())
}

/// Loads configuration from the given path or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Combines the named preset with command-line overrides.
fn resolve_preset(config: &Config, args: &Args) -> anyhow::Result<TablePreset> {
    let mut preset = match args.table.as_deref() {
        Some(name) => config.preset(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = config.tables.keys().map(String::as_str).collect();
            anyhow::anyhow!(
                "Unknown table '{name}' (known: {})\n\nSuggestion: Add it under \"tables\" in tutorlix.json or pass --endpoint",
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            )
        })?,
        None => TablePreset::default(),
    };

    if let Some(ref endpoint) = args.endpoint {
        preset.endpoint.clone_from(endpoint);
    }
    if preset.endpoint.trim().is_empty() {
        anyhow::bail!(
            "No endpoint to fetch\n\nSuggestion: Pass --endpoint /api/notes/ or name a table preset"
        );
    }

    let mut sort_map: SortMap = preset.sort_map;
    for (column, field) in &args.sort_map {
        sort_map.insert(column, field);
    }
    preset.sort_map = sort_map;

    Ok(preset)
}

/// Builds the query for the requested page.
fn build_query(args: &Args, page_size: usize) -> TableQuery {
    let mut query = TableQuery::new(page_size).with_page_index(args.page - 1);
    if let Some(ref search) = args.search {
        query = query.with_search(search.trim());
    }
    if let Some(ref sort) = args.sort {
        query = query.with_sort(sort.clone());
    }
    for (key, value) in &args.filters {
        query = query.with_filter(key, parse_filter_value(value));
    }
    query
}

fn parse_page(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("pages start at 1".to_string()),
        Ok(page) => Ok(page),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_sort(s: &str) -> Result<SortEntry, String> {
    let (column, direction) = s.split_once(':').unwrap_or((s, "asc"));
    if column.is_empty() {
        return Err("sort column must not be empty".to_string());
    }
    match direction.to_lowercase().as_str() {
        "asc" => Ok(SortEntry::asc(column)),
        "desc" => Ok(SortEntry::desc(column)),
        other => Err(format!("unknown sort direction '{other}': expected 'asc' or 'desc'")),
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Reads `true`/`false` as booleans and whole numbers as integers.
fn parse_filter_value(s: &str) -> FilterValue {
    match s {
        "true" => FilterValue::Boolean(true),
        "false" => FilterValue::Boolean(false),
        _ => s
            .parse::<i64>()
            .map_or_else(|_| FilterValue::from(s), FilterValue::Integer),
    }
}
