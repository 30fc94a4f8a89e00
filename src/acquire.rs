//! Repository acquisition
//!
//! Turns a cache entry into an open repository: open and synchronize an
//! existing cache, or clone into an empty slot. [`open_locator`] is the entry
//! point for raw `path[branch]` strings.

use std::path::Path;

use crate::address::CacheEntry;
use crate::backend::Backend;
use crate::callbacks::{Report, Reporter};
use crate::config::Preferences;
use crate::credentials;
use crate::error::{CacheError, LocatorError};
use crate::locator::Locator;
use crate::logging::*;
use crate::sync::{SyncEngine, SyncOutcome};

/// An open cache repository
#[derive(Debug)]
pub struct Acquired<R> {
	pub repo: R,
	/// `None` after a fresh clone, which needs no sync
	pub outcome: Option<SyncOutcome>,
}

/// Open, synchronize or clone the cache for `entry`
///
/// Only structural failures are returned as errors; everything that goes
/// wrong during synchronization is reported and the handle is returned
/// anyway. Fatal errors are reported as well.
pub fn acquire<B: Backend>(
	backend: &B,
	entry: &CacheEntry,
	prefs: &Preferences,
	reporter: &dyn Reporter,
) -> Result<Acquired<B::Repo>, CacheError> {
	let result = acquire_entry(backend, entry, prefs, reporter);
	if let Err(e) = &result {
		reporter.report(Report::error(e.to_string()));
	}
	result
}

fn acquire_entry<B: Backend>(
	backend: &B,
	entry: &CacheEntry,
	prefs: &Preferences,
	reporter: &dyn Reporter,
) -> Result<Acquired<B::Repo>, CacheError> {
	let path = entry.local_path.as_path();
	match std::fs::metadata(path) {
		Ok(meta) if meta.is_dir() => {
			debug!("Opening cache {} for {}", path.display(), entry.remote);
			let repo = backend
				.open(path)
				.map_err(|source| CacheError::OpenFailed { path: path.to_path_buf(), source })?;
			let outcome = SyncEngine::new(backend, prefs, reporter).synchronize(&repo, &entry.remote);
			Ok(Acquired { repo, outcome: Some(outcome) })
		}
		Ok(_) => Err(CacheError::CorruptCache { path: path.to_path_buf() }),
		Err(_) => clone_entry(backend, entry, prefs),
	}
}

fn clone_entry<B: Backend>(
	backend: &B,
	entry: &CacheEntry,
	prefs: &Preferences,
) -> Result<Acquired<B::Repo>, CacheError> {
	let path = entry.local_path.as_path();
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.map_err(|source| CacheError::CacheRoot { path: parent.to_path_buf(), source })?;
	}

	let url = entry.remote.remote_url();
	let creds = credentials::resolve(&entry.remote, prefs);
	info!("Cloning {} into {}", entry.remote, path.display());
	let repo = backend
		.clone_branch(url, &entry.remote.branch, path, &creds)
		.map_err(|source| CacheError::CloneFailed { url: url.to_string(), source })?;
	Ok(Acquired { repo, outcome: None })
}

/// What a locator string resolved to
#[derive(Debug)]
pub enum Opened<R> {
	/// Remote locator with an open cache
	Cached { repo: R, branch: String, entry: CacheEntry, outcome: Option<SyncOutcome> },

	/// Remote locator whose cache could not be made available
	Unavailable { error: CacheError, branch: String },

	/// Plain local repository, used in place
	Direct { repo: R, branch: String },

	/// Looked like a locator but no repository lives at the path
	NotRepository { branch: String },
}

impl<R> Opened<R> {
	pub fn branch(&self) -> &str {
		match self {
			Opened::Cached { branch, .. }
			| Opened::Unavailable { branch, .. }
			| Opened::Direct { branch, .. }
			| Opened::NotRepository { branch } => branch,
		}
	}

	pub fn repo(&self) -> Option<&R> {
		match self {
			Opened::Cached { repo, .. } | Opened::Direct { repo, .. } => Some(repo),
			Opened::Unavailable { .. } | Opened::NotRepository { .. } => None,
		}
	}
}

/// Resolve a raw `path[branch]` string to a repository
///
/// A parse failure means the string is not a locator at all; the caller
/// should treat it as an ordinary file name. Remote locators go through the
/// cache. Plain local paths are opened where they are, without caching or
/// syncing.
pub fn open_locator<B: Backend>(
	raw: &str,
	backend: &B,
	prefs: &Preferences,
	reporter: &dyn Reporter,
) -> Result<Opened<B::Repo>, LocatorError> {
	let locator = Locator::parse(raw)?;
	let branch = locator.branch.clone();

	if !locator.scheme.is_remote() {
		return Ok(open_direct(backend, &locator, branch));
	}

	let entry = CacheEntry::new(&prefs.cache_root, locator);
	Ok(match acquire(backend, &entry, prefs, reporter) {
		Ok(Acquired { repo, outcome }) => Opened::Cached { repo, branch, entry, outcome },
		Err(error) => Opened::Unavailable { error, branch },
	})
}

fn open_direct<B: Backend>(backend: &B, locator: &Locator, branch: String) -> Opened<B::Repo> {
	let path = Path::new(&locator.raw_path);
	if !path.is_dir() {
		return Opened::NotRepository { branch };
	}
	match backend.open(path) {
		Ok(repo) => Opened::Direct { repo, branch },
		Err(e) => {
			debug!("{} is not a repository: {}", path.display(), e);
			Opened::NotRepository { branch }
		}
	}
}


// vim: ts=4
