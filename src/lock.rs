//! Cross-process cache lock
//!
//! The acquire and sync paths assume nobody else touches the same cache
//! directory at the same time. Callers that may run concurrently (the CLI,
//! several processes sharing a cache root) take a [`CacheLock`] on the cache
//! path first.
//!
//! Locks live in a small redb database in the cache root. A record belongs to
//! a process id; records whose process is gone, or that are older than a day,
//! are purged before every acquisition.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::LockError;
use crate::logging::*;

/// Lock database file name inside the cache root
pub const LOCK_DB_NAME: &str = "locks.redb";

/// Locks older than this are considered abandoned
const MAX_LOCK_AGE_SECS: u64 = 24 * 60 * 60;

/// Key: locked cache path
/// Value: serialized LockInfo
const LOCKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("locks");

/// Owner of a locked cache path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
	#[serde(rename = "pid")]
	pub pid: u32,
	/// Unix timestamp of acquisition
	#[serde(rename = "str")]
	pub started: u64,
	/// Every path taken together with this one
	#[serde(rename = "pth")]
	pub paths: Vec<String>,
}

impl LockInfo {
	/// The owning process is gone
	pub fn is_stale(&self) -> bool {
		!is_process_alive(self.pid)
	}

	pub fn is_too_old(&self) -> bool {
		now_secs().map(|now| now.saturating_sub(self.started) > MAX_LOCK_AGE_SECS).unwrap_or(false)
	}
}

fn now_secs() -> Option<u64> {
	SystemTime::now().duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(target_os = "linux")]
fn is_process_alive(pid: u32) -> bool {
	Path::new(&format!("/proc/{}", pid)).exists()
}

// Without /proc there is no cheap check; keep the lock until it ages out
#[cfg(not(target_os = "linux"))]
fn is_process_alive(_pid: u32) -> bool {
	true
}

fn lock_key(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}

/// Attempts to open a database another handle is using
const OPEN_ATTEMPTS: u32 = 100;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(20);

fn is_database_already_open_error(error: &redb::DatabaseError) -> bool {
	matches!(error, redb::DatabaseError::DatabaseAlreadyOpen) || error.to_string().contains("already open")
}

/// Open the lock database for a single transaction
///
/// redb allows one open handle per file, so no operation keeps it past its
/// own transaction. A handle held elsewhere is waited out for up to 2 s.
fn with_db<T>(db_path: &Path, f: impl FnOnce(&Database) -> Result<T, LockError>) -> Result<T, LockError> {
	let mut attempt = 1;
	loop {
		match Database::create(db_path) {
			Ok(db) => return f(&db),
			Err(e) if is_database_already_open_error(&e) && attempt < OPEN_ATTEMPTS => {
				attempt += 1;
				std::thread::sleep(OPEN_RETRY_DELAY);
			}
			Err(e) => return Err(e.into()),
		}
	}
}

/// Lock database for one cache root
///
/// Holds only the database path. Any number of threads or processes may
/// share a root.
#[derive(Debug, Clone)]
pub struct CacheLock {
	db_path: PathBuf,
}

impl CacheLock {
	/// Create the lock database in `cache_root` if needed
	pub fn open(cache_root: &Path) -> Result<Self, LockError> {
		std::fs::create_dir_all(cache_root)
			.map_err(|e| LockError::Database { message: format!("{}: {}", cache_root.display(), e) })?;
		let db_path = cache_root.join(LOCK_DB_NAME);

		// Make sure the table exists so readers never see TableDoesNotExist
		with_db(&db_path, |db| {
			let write_txn = db.begin_write()?;
			write_txn.open_table(LOCKS_TABLE)?;
			write_txn.commit()?;
			Ok(())
		})?;

		Ok(CacheLock { db_path })
	}

	/// Lock every path in `paths` at once
	///
	/// Stale records are purged first. Fails without locking anything if any
	/// path is held by a live process.
	pub fn acquire<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CacheLockGuard, LockError> {
		let keys: Vec<String> = paths.iter().map(|p| lock_key(p.as_ref())).collect();
		with_db(&self.db_path, |db| {
			let removed = cleanup_in(db)?;
			if removed > 0 {
				debug!("Removed {} stale cache locks", removed);
			}

			let write_txn = db.begin_write()?;
			{
				let mut table = write_txn.open_table(LOCKS_TABLE)?;
				for key in &keys {
					if let Some(existing) = table.get(key.as_str())? {
						let pid = decode(existing.value()).map(|info| info.pid).unwrap_or(0);
						return Err(LockError::Held { path: key.clone(), pid });
					}
				}

				let info = LockInfo { pid: std::process::id(), started: now_secs().unwrap_or(0), paths: keys.clone() };
				let bytes = json5::to_string(&info)
					.map_err(|e| LockError::Database { message: e.to_string() })?
					.into_bytes();
				for key in &keys {
					table.insert(key.as_str(), bytes.as_slice())?;
				}
			}
			write_txn.commit()?;
			Ok(())
		})?;

		Ok(CacheLockGuard { db_path: self.db_path.clone(), paths: keys })
	}

	/// Remove records from dead processes and records older than a day
	pub fn cleanup_stale_locks(&self) -> Result<u32, LockError> {
		with_db(&self.db_path, cleanup_in)
	}
}

fn cleanup_in(db: &Database) -> Result<u32, LockError> {
	let mut stale_keys = Vec::new();
	{
		let read_txn = db.begin_read()?;
		let table = read_txn.open_table(LOCKS_TABLE)?;
		for item in table.iter()? {
			let (key, entry) = match item {
				Ok(item) => item,
				Err(_) => continue,
			};
			// Unreadable records are as good as abandoned
			let stale = decode(entry.value()).map(|i| i.is_stale() || i.is_too_old()).unwrap_or(true);
			if stale {
				stale_keys.push(key.value().to_string());
			}
		}
	}

	if stale_keys.is_empty() {
		return Ok(0);
	}

	let mut count = 0;
	let write_txn = db.begin_write()?;
	{
		let mut table = write_txn.open_table(LOCKS_TABLE)?;
		for key in &stale_keys {
			if table.remove(key.as_str())?.is_some() {
				count += 1;
			}
		}
	}
	write_txn.commit()?;
	Ok(count)
}

fn decode(bytes: &[u8]) -> Option<LockInfo> {
	std::str::from_utf8(bytes).ok().and_then(|s| json5::from_str(s).ok())
}

/// Releases its paths on drop
#[derive(Debug)]
pub struct CacheLockGuard {
	db_path: PathBuf,
	paths: Vec<String>,
}

impl CacheLockGuard {
	pub fn paths(&self) -> &[String] {
		&self.paths
	}

	fn release(&mut self) -> Result<(), LockError> {
		if self.paths.is_empty() {
			return Ok(());
		}
		let paths = &self.paths;
		with_db(&self.db_path, |db| {
			let write_txn = db.begin_write()?;
			{
				let mut table = write_txn.open_table(LOCKS_TABLE)?;
				for path in paths {
					table.remove(path.as_str())?;
				}
			}
			write_txn.commit()?;
			Ok(())
		})?;
		self.paths.clear();
		Ok(())
	}
}

impl Drop for CacheLockGuard {
	fn drop(&mut self) {
		if let Err(e) = self.release() {
			warn!("Failed to release cache lock: {}", e);
		}
	}
}


// vim: ts=4
