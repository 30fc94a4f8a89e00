//! # gitcache - Local cache of remote git branches
//!
//! gitcache keeps one local clone per remote/branch pair and keeps it in step
//! with the remote, taking only the actions that cannot lose work:
//! fast-forward when the remote is ahead, push when the local branch is ahead,
//! and report anything else (diverged history, dirty tree, network failure)
//! while still handing back the last known good repository.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gitcache::acquire::{open_locator, Opened};
//! use gitcache::backend::Git2Backend;
//! use gitcache::callbacks::TracingReporter;
//! use gitcache::config::{Config, Preferences};
//!
//! let prefs = Preferences::from_config(&Config::load(None)?);
//! match open_locator("https://example.com/dives.git[main]", &Git2Backend, &prefs, &TracingReporter)? {
//!     Opened::Cached { repo, outcome, .. } => { /* work on repo */ }
//!     Opened::Unavailable { error, .. } => eprintln!("{}", error),
//!     _ => {}
//! }
//! ```
//!
//! ## Locators
//!
//! A locator is `path[branch]`, where the path is a local directory or a
//! `git://`, `ssh://`, `http://`, `https://` or `file://` URL. See
//! [`locator`] for the parsing rules.

pub mod acquire;
pub mod address;
pub mod backend;
pub mod callbacks;
pub mod clean;
pub mod config;
pub mod credentials;
pub mod error;
pub mod locator;
pub mod lock;
pub mod logging;
pub mod sync;

// Re-export commonly used types and functions
pub use acquire::{acquire, open_locator, Acquired, Opened};
pub use address::{address, cache_key, CacheEntry};
pub use backend::{Backend, CommitId, Git2Backend};
pub use callbacks::{Report, Reporter, Severity};
pub use config::{Config, Preferences};
pub use error::{BackendError, CacheError, ConfigError, LocatorError, LockError, SyncError};
pub use locator::{Locator, Scheme};
pub use sync::{AbortReason, BranchPair, SyncDecision, SyncEngine, SyncOutcome};

// vim: ts=4
