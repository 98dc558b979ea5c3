//! Classification navigator core.
//!
//! Browse a lazily loaded section / chapter / heading / subheading tree or
//! full-text search it, pick a code with the keyboard or a click, and keep
//! recent and favorite picks across sessions.
//!
//! The remote tariff service and the durable key-value store are injected
//! through [`ClassificationSource`], [`SearchService`] and [`KeyValueStore`].

pub mod config;
pub mod history;
pub mod navigator;
pub mod query;
pub mod selection;
pub mod source;
pub mod storage;
pub mod store;
pub mod tree;

pub use config::NavigatorConfig;
pub use history::{CodeSet, FAVORITE_KEY, RECENT_KEY, SelectionHistory};
pub use navigator::{
    CodeSelected, EventOutcome, Navigator, NavigatorView, VisibleItem, execute_search,
};
pub use query::{
    QueryController, QueryMode, ResponseOutcome, SearchRequest, SearchResponse, SearchResults,
};
pub use selection::{NavigatorEvent, SelectionMachine, WidgetMode};
pub use source::{ClassificationSource, SearchService};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use store::NodeStore;
pub use tree::{ExpansionSet, TreeRow, flatten};
