//! Fetcher module - the boundary to the external search/download/transcode engine.
//!
//! The batch core only needs one capability from the outside world: given a
//! search query, produce a local audio file with embedded metadata. That
//! capability is the [`Fetcher`] trait. [`YtDlpFetcher`] implements it by
//! driving the `yt-dlp` executable.
//!
//! # Example
//!
//! ```ignore
//! use songfetch_core::catalog::WorkItem;
//! use songfetch_core::fetcher::{FetchRequest, Fetcher, FetcherConfig, YtDlpFetcher};
//!
//! let fetcher = YtDlpFetcher::new(FetcherConfig::default());
//! fetcher.validate().await?;
//!
//! let item = WorkItem::new("周杰倫", "稻香");
//! let artifact = fetcher
//!     .fetch(FetchRequest::for_item(&item, "/home/me/Downloads/Music"))
//!     .await?;
//! println!("Saved to {:?}", artifact.path);
//! ```

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::Fetcher;
pub use types::{FetchRequest, FetchedArtifact};
pub use ytdlp::YtDlpFetcher;
