pub mod batch;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod events;
pub mod fetcher;
pub mod report;
pub mod testing;
pub mod tracker;

pub use batch::{BatchError, BatchResult, BatchRunner};
pub use catalog::{
    load_work_items, open_store, Catalog, CatalogStore, CommitError, CsvCatalogStore,
    JsonCatalogStore, LoadError, WorkItem,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, SourceFormat,
};
pub use dispatcher::{Dispatcher, DispatcherConfig, Outcome, OutcomeStatus};
pub use events::{BatchEvent, ChannelSink, EventEnvelope, EventSink, Severity, TracingSink};
pub use fetcher::{FetchError, FetchRequest, FetchedArtifact, Fetcher, FetcherConfig, YtDlpFetcher};
pub use report::{BatchReport, FailedItem};
pub use tracker::{apply_outcomes, CommitFailure, CommitSummary, CompletionTracker, Migration};
