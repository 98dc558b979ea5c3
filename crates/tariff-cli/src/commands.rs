use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tariff_catalog::{Catalog, load_catalog};
use tariff_cli::render::{code_list_table, hits_table, tree_table, view_status, view_table};
use tariff_cli::session::replay;
use tariff_model::empty_node_list;
use tariff_navigator::{
    ExpansionSet, JsonFileStore, Navigator, NavigatorConfig, NodeStore, SelectionHistory, flatten,
};
use tracing::{Instrument, info, info_span, warn};

use crate::cli::{FavoriteArgs, SearchArgs, SessionArgs, TreeArgs};

/// Settings shared by every command.
pub struct Context {
    pub config: NavigatorConfig,
    pub state_file: Option<PathBuf>,
}

impl Context {
    fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(JsonFileStore::default_path)
    }

    fn open_state(&self) -> Result<Arc<JsonFileStore>> {
        let path = self.state_path();
        let store = JsonFileStore::open(&path)
            .with_context(|| format!("open state file: {}", path.display()))?;
        Ok(Arc::new(store))
    }

    fn history(&self) -> Result<SelectionHistory> {
        Ok(SelectionHistory::load(self.open_state()?, &self.config))
    }
}

pub async fn run_tree(context: &Context, args: &TreeArgs) -> Result<()> {
    let catalog = Arc::new(load_catalog(&args.catalog)?);
    let store = NodeStore::new(catalog.clone());
    store.roots().await.context("load root nodes")?;

    let mut expansion = ExpansionSet::new();
    for code in &args.expand {
        for ancestor in lineage(&catalog, code)? {
            store
                .expand(&ancestor)
                .await
                .with_context(|| format!("expand {ancestor}"))?;
            expansion.expand(ancestor);
        }
    }

    let favorites = match context.history() {
        Ok(history) => history.favorites().to_vec(),
        Err(error) => {
            warn!("Favorites unavailable: {error:#}");
            Vec::new()
        }
    };
    let roots = store.cached_roots().unwrap_or_else(empty_node_list);
    let rows = flatten(&roots, &expansion);
    println!("{}", tree_table(&rows, &favorites));
    Ok(())
}

pub fn run_search(context: &Context, args: &SearchArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let limit = args.limit.unwrap_or(context.config.search_limit);
    let hits = catalog.search(&args.query, limit);
    if hits.is_empty() {
        println!("No classifications match {:?}.", args.query);
        return Ok(());
    }
    println!("{}", hits_table(&hits));
    Ok(())
}

pub async fn run_session(context: &Context, args: &SessionArgs) -> Result<()> {
    let span = info_span!("session", keys = args.keys.len());
    replay_session(context, args).instrument(span).await
}

async fn replay_session(context: &Context, args: &SessionArgs) -> Result<()> {
    let catalog = Arc::new(load_catalog(&args.catalog)?);
    let mut navigator = Navigator::new(
        &context.config,
        catalog.clone(),
        catalog,
        context.open_state()?,
    )
    .on_code_selected(|code| println!("Selected {code}"));

    let report = replay(&mut navigator, &args.keys).await;
    info!(
        committed = report.committed.len(),
        applied = report.searches_applied,
        stale = report.searches_stale,
        "session finished"
    );

    let view = navigator.view();
    println!("{}", view_status(&view));
    if !view.items.is_empty() {
        println!("{}", view_table(&view));
    }
    println!(
        "Searches: {} applied, {} discarded",
        report.searches_applied, report.searches_stale
    );
    if !view.recent.is_empty() {
        println!("Recent: {}", view.recent.join(", "));
    }
    Ok(())
}

pub fn run_recent(context: &Context) -> Result<()> {
    print_codes("Recent", context.history()?.recent());
    Ok(())
}

pub fn run_favorites(context: &Context) -> Result<()> {
    print_codes("Favorite", context.history()?.favorites());
    Ok(())
}

pub fn run_favorite(context: &Context, args: &FavoriteArgs) -> Result<()> {
    let mut history = context.history()?;
    if history.toggle_favorite(&args.code) {
        println!("Added {} to favorites", args.code);
    } else {
        println!("Removed {} from favorites", args.code);
    }
    Ok(())
}

fn print_codes(title: &str, codes: &[String]) {
    if codes.is_empty() {
        println!("No {} codes yet.", title.to_lowercase());
        return;
    }
    println!("{}", code_list_table(title, codes));
}

/// `code` and its ancestors, root first.
fn lineage(catalog: &Catalog, code: &str) -> Result<Vec<String>> {
    let mut chain = Vec::new();
    let mut current = Some(code.to_string());
    while let Some(code) = current {
        let node = catalog
            .get(&code)
            .with_context(|| format!("unknown classification code {code}"))?;
        current = node.parent_code.clone();
        chain.push(code);
    }
    chain.reverse();
    Ok(chain)
}
