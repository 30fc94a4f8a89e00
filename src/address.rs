//! Cache addressing
//!
//! Every `(remote, branch)` pair gets its own cache directory, named by a
//! digest of the pair. One remote with several branches therefore ends up in
//! several independent caches.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::locator::Locator;

/// Number of digest bytes used in the directory name
const KEY_BYTES: usize = 8;

/// Directory name for a remote/branch pair
///
/// The zero byte between the two parts keeps "repo1"+"branch" and
/// "repo"+"1branch" apart.
pub fn cache_key(remote: &str, branch: &str) -> String {
	let mut hasher = blake3::Hasher::new();
	hasher.update(remote.as_bytes());
	hasher.update(&[0u8]);
	hasher.update(branch.as_bytes());
	let digest = hasher.finalize();
	hex::encode(&digest.as_bytes()[..KEY_BYTES])
}

/// Cache directory for a remote/branch pair under `cache_root`
pub fn address(cache_root: &Path, remote: &str, branch: &str) -> PathBuf {
	cache_root.join(cache_key(remote, branch))
}

/// A remote locator together with its cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
	pub local_path: PathBuf,
	pub remote: Locator,
}

impl CacheEntry {
	pub fn new(cache_root: &Path, remote: Locator) -> Self {
		let local_path = address(cache_root, &remote.raw_path, &remote.branch);
		CacheEntry { local_path, remote }
	}
}


// vim: ts=4
