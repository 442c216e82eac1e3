//! `notes`: a small JSON-file note book built on the `data` stores.
//!
//! Every invocation opens the store (loading the file), runs one command and
//! closes the store again. Results are printed as JSON on stdout; logs go to stderr.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::process::ExitCode;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};
use uuid::Uuid;

use configs::AppConfig;
use data::{
    DataError, DataPage, Filter, FilterParams, FilteredPageReader, FilteredReader, IdentifiableFileStore, Identifiable,
    PagingParams, QuerablePageReader, QuerableReader, SortField, SortFn, SortParams,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl Identifiable for Note {
    type Key = String;
    fn id(&self) -> Option<&String> { self.id.as_ref() }
    fn set_id(&mut self, id: String) { self.id = Some(id); }
}

/// Note persistence: translates filter params and queries into store predicates.
struct NotesPersistence {
    store: IdentifiableFileStore<Note>,
}

impl NotesPersistence {
    fn compose_filter(filter: &FilterParams) -> Filter<Note> {
        let mut composed = Filter::all();
        if let Some(tag) = filter.get("tag").map(str::to_string) {
            composed = composed.and(move |n: &Note| n.tags.iter().any(|t| *t == tag));
        }
        if let Some(title) = filter.get("title").map(str::to_lowercase) {
            composed = composed.and(move |n: &Note| n.title.to_lowercase().contains(&title));
        }
        if let Some(ids) = filter.get("ids") {
            let ids: Vec<String> = ids.split(',').map(|s| s.trim().to_string()).collect();
            composed = composed.and(move |n: &Note| n.id.as_ref().is_some_and(|id| ids.contains(id)));
        }
        composed
    }

    /// Every whitespace separated word must appear in the title or body.
    fn compose_query(query: Option<&str>) -> Filter<Note> {
        let words: Vec<String> = query
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if words.is_empty() {
            return Filter::all();
        }
        Filter::all().and(move |n: &Note| {
            let text = format!("{} {}", n.title, n.body).to_lowercase();
            words.iter().all(|w| text.contains(w))
        })
    }

    fn compose_sort(sort: Option<SortParams>) -> Option<Box<SortFn<Note>>> {
        let fields = sort?.0;
        if fields.is_empty() {
            return None;
        }
        Some(Box::new(move |a: &Note, b: &Note| {
            fields
                .iter()
                .map(|field| {
                    let ord = match field.name.as_str() {
                        "title" => a.title.cmp(&b.title),
                        "id" => a.id.cmp(&b.id),
                        _ => Ordering::Equal,
                    };
                    if field.ascending { ord } else { ord.reverse() }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }))
    }
}

#[async_trait]
impl FilteredReader<Note> for NotesPersistence {
    async fn get_list_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: FilterParams,
        sort: Option<SortParams>,
    ) -> Result<Vec<Note>, DataError> {
        let sort = Self::compose_sort(sort);
        self.store
            .get_list_by_filter(correlation_id, &Self::compose_filter(&filter), sort.as_deref())
            .await
    }
}

#[async_trait]
impl FilteredPageReader<Note> for NotesPersistence {
    async fn get_page_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: FilterParams,
        paging: PagingParams,
        sort: Option<SortParams>,
    ) -> Result<DataPage<Note>, DataError> {
        let sort = Self::compose_sort(sort);
        self.store
            .get_page_by_filter(correlation_id, &Self::compose_filter(&filter), paging, sort.as_deref())
            .await
    }
}

#[async_trait]
impl QuerableReader<Note> for NotesPersistence {
    async fn get_list_by_query(
        &self,
        correlation_id: Option<&str>,
        query: Option<&str>,
        sort: Option<SortParams>,
    ) -> Result<Vec<Note>, DataError> {
        let sort = Self::compose_sort(sort);
        self.store
            .get_list_by_filter(correlation_id, &Self::compose_query(query), sort.as_deref())
            .await
    }
}

#[async_trait]
impl QuerablePageReader<Note> for NotesPersistence {
    async fn get_page_by_query(
        &self,
        correlation_id: Option<&str>,
        query: Option<&str>,
        paging: PagingParams,
        sort: Option<SortParams>,
    ) -> Result<DataPage<Note>, DataError> {
        let sort = Self::compose_sort(sort);
        self.store
            .get_page_by_filter(correlation_id, &Self::compose_query(query), paging, sort.as_deref())
            .await
    }
}

#[derive(Parser, Debug)]
#[command(name = "notes", version, about = "Keep notes in a JSON file")]
struct Cli {
    /// TOML config file (defaults to $CONFIG_PATH, then ./config.toml)
    #[arg(long)]
    config: Option<String>,
    /// Data file, overrides `store.path`
    #[arg(long)]
    file: Option<PathBuf>,
    /// Overrides `store.max_page_size`
    #[arg(long)]
    max_page_size: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    skip: Option<usize>,
    #[arg(long)]
    take: Option<usize>,
    /// Include the total number of matches
    #[arg(long)]
    total: bool,
    /// Sort field: `title` or `id`
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
}

impl PageArgs {
    fn paging(&self) -> PagingParams {
        PagingParams::new(self.skip, self.take, self.total)
    }

    fn sort(&self) -> Option<SortParams> {
        let name = self.sort.clone()?;
        let field = if self.desc { SortField::desc(name) } else { SortField::asc(name) };
        Some(SortParams::by(field))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a note
    Add {
        title: String,
        #[arg(default_value = "")]
        body: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show one note
    Get { id: String },
    /// List notes, optionally filtered by tag or title
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Every match, ignoring skip/take
        #[arg(long, conflicts_with_all = ["skip", "take", "total"])]
        all: bool,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Full text search over title and body
    Search {
        query: Option<String>,
        /// Every match, ignoring skip/take
        #[arg(long, conflicts_with_all = ["skip", "take", "total"])]
        all: bool,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Pick a random note
    Random {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Change the title of a note
    Retitle { id: String, title: String },
    /// Remove notes by id
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove every note carrying a tag
    Prune {
        #[arg(long)]
        tag: String,
    },
    /// Remove all notes
    Clear,
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = match &cli.config {
        Some(path) => configs::load_from_file(path)?,
        // missing default config file is fine; flags and env can still supply the path
        None => configs::load_default().unwrap_or_default(),
    };
    if let Some(file) = &cli.file {
        cfg.store.path = Some(file.clone());
    }
    if cli.max_page_size.is_some() {
        cfg.store.max_page_size = cli.max_page_size;
    }
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(notes: &NotesPersistence, command: Command, cid: &str) -> anyhow::Result<()> {
    let cid = Some(cid);
    let store = &notes.store;
    match command {
        Command::Add { title, body, tags } => {
            let note = store.create(cid, Note { id: None, title, body, tags }).await?;
            print_json(&note)?;
        }
        Command::Get { id } => match store.get_one_by_id(cid, &id).await? {
            Some(note) => print_json(&note)?,
            None => anyhow::bail!("note {id} not found"),
        },
        Command::List { tag, title, all, page } => {
            let mut filter = FilterParams::new();
            if let Some(tag) = tag {
                filter.insert("tag", tag);
            }
            if let Some(title) = title {
                filter.insert("title", title);
            }
            if all {
                print_json(&notes.get_list_by_filter(cid, filter, page.sort()).await?)?;
            } else {
                print_json(&notes.get_page_by_filter(cid, filter, page.paging(), page.sort()).await?)?;
            }
        }
        Command::Search { query, all, page } => {
            if all {
                print_json(&notes.get_list_by_query(cid, query.as_deref(), page.sort()).await?)?;
            } else {
                print_json(&notes.get_page_by_query(cid, query.as_deref(), page.paging(), page.sort()).await?)?;
            }
        }
        Command::Random { tag } => {
            let mut filter = FilterParams::new();
            if let Some(tag) = tag {
                filter.insert("tag", tag);
            }
            match store.get_one_random(cid, &NotesPersistence::compose_filter(&filter)).await? {
                Some(note) => print_json(&note)?,
                None => anyhow::bail!("no matching notes"),
            }
        }
        Command::Retitle { id, title } => {
            let mut patch = Map::new();
            patch.insert("title".into(), Value::String(title));
            match store.update_partially(cid, &id, patch).await? {
                Some(note) => print_json(&note)?,
                None => anyhow::bail!("note {id} not found"),
            }
        }
        Command::Remove { ids } => {
            if let [id] = ids.as_slice() {
                match store.delete_by_id(cid, id).await? {
                    Some(note) => print_json(&note)?,
                    None => anyhow::bail!("note {id} not found"),
                }
            } else {
                let deleted = store.delete_by_ids(cid, &ids).await?;
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            }
        }
        Command::Prune { tag } => {
            let filter = FilterParams::from_pairs([("tag", tag)]);
            let deleted = store.delete_by_filter(cid, &NotesPersistence::compose_filter(&filter)).await?;
            info!(correlation_id = ?cid, deleted, "pruned notes");
            print_json(&serde_json::json!({ "deleted": deleted }))?;
        }
        Command::Clear => {
            let deleted = store.clear(cid).await?;
            print_json(&serde_json::json!({ "deleted": deleted }))?;
        }
    }
    Ok(())
}

async fn execute(cli: Cli, cfg: AppConfig) -> anyhow::Result<()> {
    let path = cfg
        .store
        .path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no data file: set store.path, DATA_FILE or --file"))?;
    common::env::ensure_data_dir(&path).await?;

    let notes = NotesPersistence { store: IdentifiableFileStore::from_config(&cfg.store)? };
    let cid = Uuid::new_v4().simple().to_string();

    notes.store.open(Some(cid.as_str())).await?;
    let outcome = run(&notes, cli.command, &cid).await;
    notes.store.close(Some(cid.as_str())).await?;
    outcome
}

fn main() -> ExitCode {
    // load .env early so RUST_LOG, CONFIG_PATH and DATA_FILE apply
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if cfg.logging.json {
        common::utils::logging::init_logging_json();
    } else {
        common::utils::logging::init_logging_default();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(execute(cli, cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(event = "command_failed", error = %e, "notes command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, title: &str, body: &str, tags: &[&str]) -> Note {
        Note {
            id: Some(id.into()),
            title: title.into(),
            body: body.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    async fn seeded() -> anyhow::Result<(NotesPersistence, PathBuf)> {
        let path = std::env::temp_dir().join(format!("notes_{}.json", Uuid::new_v4()));
        let notes = NotesPersistence { store: IdentifiableFileStore::new(&path) };
        notes.store.open(None).await?;
        notes.store.create(None, note("1", "Groceries", "milk and eggs", &["home"])).await?;
        notes.store.create(None, note("2", "Standup", "blockers: none", &["work"])).await?;
        notes.store.create(None, note("3", "Budget", "groceries limit", &["home", "money"])).await?;
        Ok((notes, path))
    }

    #[tokio::test]
    async fn filter_params_select_by_tag_and_title() -> anyhow::Result<()> {
        let (notes, path) = seeded().await?;
        let home = notes.get_list_by_filter(None, FilterParams::from_pairs([("tag", "home")]), None).await?;
        assert_eq!(home.len(), 2);

        let page = notes
            .get_page_by_filter(
                None,
                FilterParams::from_pairs([("tag", "home"), ("title", "bud")]),
                PagingParams::new(None, None, true),
                None,
            )
            .await?;
        assert_eq!(page.total, Some(1));
        assert_eq!(page.data[0].title, "Budget");

        let by_ids = notes.get_list_by_filter(None, FilterParams::from_pairs([("ids", "1, 3")]), None).await?;
        assert_eq!(by_ids.len(), 2);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn query_matches_all_words_and_sorts() -> anyhow::Result<()> {
        let (notes, path) = seeded().await?;
        let hits = notes
            .get_list_by_query(None, Some("groceries"), Some(SortParams::by(SortField::asc("title"))))
            .await?;
        let titles: Vec<_> = hits.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Budget", "Groceries"]);

        let none = notes.get_list_by_query(None, Some("groceries standup"), None).await?;
        assert!(none.is_empty());

        let page = notes
            .get_page_by_query(None, None, PagingParams::new(Some(1), Some(1), true), Some(SortParams::by(SortField::desc("id"))))
            .await?;
        assert_eq!(page.total, Some(3));
        assert_eq!(page.data[0].id.as_deref(), Some("2"));

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[test]
    fn cli_parses_list_paging() {
        let cli = Cli::parse_from(["notes", "--file", "n.json", "list", "--tag", "home", "--take", "5", "--total"]);
        assert_eq!(cli.file, Some(PathBuf::from("n.json")));
        match cli.command {
            Command::List { tag, page, .. } => {
                assert_eq!(tag.as_deref(), Some("home"));
                assert_eq!(page.paging(), PagingParams::new(None, Some(5), true));
                assert!(page.sort().is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_all_conflicts_with_paging() {
        let cli = Cli::parse_from(["notes", "search", "milk", "--all", "--sort", "title"]);
        match cli.command {
            Command::Search { query, all, page } => {
                assert_eq!(query.as_deref(), Some("milk"));
                assert!(all);
                assert_eq!(page.sort(), Some(SortParams::by(SortField::asc("title"))));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["notes", "list", "--all", "--take", "3"]).is_err());
    }

    #[tokio::test]
    async fn prune_and_clear_report_removed_counts() -> anyhow::Result<()> {
        let (notes, path) = seeded().await?;
        let home = NotesPersistence::compose_filter(&FilterParams::from_pairs([("tag", "home")]));
        assert_eq!(notes.store.delete_by_filter(None, &home).await?, 2);
        assert_eq!(notes.store.delete_by_filter(None, &home).await?, 0);
        assert_eq!(notes.store.clear(None).await?, 1);
        assert_eq!(notes.store.clear(None).await?, 0);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}
