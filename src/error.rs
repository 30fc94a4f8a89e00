//! Error types for gitcache operations
//!
//! Failures fall in two classes. Structural failures ([`CacheError`]) leave the
//! caller without a usable repository. Everything that can go wrong while
//! synchronizing an already open cache ([`SyncError`]) is non-fatal: it is
//! reported, and the caller keeps its (possibly stale) repository handle.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// A locator string that does not follow the `path[branch]` rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
	/// The string does not end with `]`
	MissingBranch,

	/// A closing `]` without a matching `[`
	UnmatchedBracket,

	/// Nothing left of the path once trailing separators are stripped
	EmptyPath,

	/// `path[]`
	EmptyBranch,
}

impl fmt::Display for LocatorError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LocatorError::MissingBranch => write!(f, "Locator has no [branch] suffix"),
			LocatorError::UnmatchedBracket => write!(f, "Locator has no matching '[' for ']'"),
			LocatorError::EmptyPath => write!(f, "Locator path is empty"),
			LocatorError::EmptyBranch => write!(f, "Locator branch is empty"),
		}
	}
}

impl Error for LocatorError {}

/// Failure reported by the version-control backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
	/// Backend message, as reported by libgit2
	pub message: String,
}

impl BackendError {
	pub fn new(message: impl Into<String>) -> Self {
		BackendError { message: message.into() }
	}
}

impl fmt::Display for BackendError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.message)
	}
}

impl Error for BackendError {}

impl From<git2::Error> for BackendError {
	fn from(e: git2::Error) -> Self {
		BackendError { message: e.message().to_string() }
	}
}

/// Fatal errors: no repository handle is returned
#[derive(Debug)]
pub enum CacheError {
	/// The cache path exists but is not a directory
	CorruptCache { path: PathBuf },

	/// Cloning the remote into an empty cache slot failed
	CloneFailed { url: String, source: BackendError },

	/// The existing cache directory could not be opened as a repository
	OpenFailed { path: PathBuf, source: BackendError },

	/// The cache root could not be created
	CacheRoot { path: PathBuf, source: io::Error },
}

impl fmt::Display for CacheError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CacheError::CorruptCache { path } => {
				write!(f, "Local git cache at '{}' is corrupt", path.display())
			}
			CacheError::CloneFailed { url, source } => {
				write!(f, "git clone of {} failed ({})", url, source)
			}
			CacheError::OpenFailed { path, source } => {
				write!(f, "Unable to open git cache repository at {}: {}", path.display(), source)
			}
			CacheError::CacheRoot { path, source } => {
				write!(f, "Cannot create cache directory {}: {}", path.display(), source)
			}
		}
	}
}

impl Error for CacheError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			CacheError::CloneFailed { source, .. } | CacheError::OpenFailed { source, .. } => {
				Some(source)
			}
			CacheError::CacheRoot { source, .. } => Some(source),
			CacheError::CorruptCache { .. } => None,
		}
	}
}

/// Non-fatal synchronization failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
	/// Fetching from the remote failed
	FetchFailed { remote: String, source: BackendError },

	/// The local branch no longer exists
	BranchMissing { branch: String },

	/// The local branch has no remote-tracking branch
	UpstreamMissing { branch: String },

	/// The working tree has local modifications
	DirtyWorkingTree { paths: Vec<String> },

	/// No common ancestor could be computed
	MergeBaseFailed { source: BackendError },

	/// Moving the local branch (or resetting the work tree) failed
	UpdateFailed { source: BackendError },

	/// Pushing the local branch upstream failed
	PushFailed { source: BackendError },

	/// Histories diverged in a repository without a working tree
	DivergedBareRepo,

	/// Histories diverged and the branch is not checked out
	DivergedNotHead { branch: String },

	/// Histories diverged on a clean, checked-out branch
	DivergedNeedsMerge,
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::FetchFailed { remote, source } => {
				write!(f, "Unable to fetch remote '{}' ({})", remote, source)
			}
			SyncError::BranchMissing { branch } => {
				write!(f, "Git cache branch {} no longer exists", branch)
			}
			SyncError::UpstreamMissing { branch } => {
				write!(f, "Git cache branch {} no longer has an upstream branch", branch)
			}
			SyncError::DirtyWorkingTree { paths } => {
				write!(f, "Local cached copy is dirty, skipping update (modified: {})", paths.join(", "))
			}
			SyncError::MergeBaseFailed { source } => {
				write!(f, "Unable to find common commit of local and remote branches ({})", source)
			}
			SyncError::UpdateFailed { source } => {
				write!(f, "Could not update local branch to newer remote ({})", source)
			}
			SyncError::PushFailed { source } => {
				write!(f, "Unable to update remote with current local cache state ({})", source)
			}
			SyncError::DivergedBareRepo => {
				write!(f, "Local and remote have diverged, merge of bare branch needed")
			}
			SyncError::DivergedNotHead { branch } => write!(
				f,
				"Local and remote do not match, local branch {} not HEAD - cannot update",
				branch
			),
			SyncError::DivergedNeedsMerge => write!(f, "Local and remote have diverged, need to merge"),
		}
	}
}

impl Error for SyncError {}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
	/// Config file could not be read
	Read { path: PathBuf, source: io::Error },

	/// Config file could not be parsed
	Parse { path: PathBuf, message: String },

	/// A value is out of range
	Invalid { message: String },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::Read { path, source } => {
				write!(f, "Cannot read config {}: {}", path.display(), source)
			}
			ConfigError::Parse { path, message } => {
				write!(f, "Cannot parse config {}: {}", path.display(), message)
			}
			ConfigError::Invalid { message } => write!(f, "Invalid configuration: {}", message),
		}
	}
}

impl Error for ConfigError {}

/// Cache lock errors
#[derive(Debug)]
pub enum LockError {
	/// Another live process is working on the path
	Held { path: String, pid: u32 },

	/// The lock database failed
	Database { message: String },
}

impl fmt::Display for LockError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LockError::Held { path, pid } => {
				write!(f, "Cache {} is in use by process {}", path, pid)
			}
			LockError::Database { message } => write!(f, "Lock database error: {}", message),
		}
	}
}

impl Error for LockError {}

impl From<redb::Error> for LockError {
	fn from(e: redb::Error) -> Self {
		LockError::Database { message: e.to_string() }
	}
}

impl From<redb::DatabaseError> for LockError {
	fn from(e: redb::DatabaseError) -> Self {
		redb::Error::from(e).into()
	}
}

impl From<redb::TransactionError> for LockError {
	fn from(e: redb::TransactionError) -> Self {
		redb::Error::from(e).into()
	}
}

impl From<redb::TableError> for LockError {
	fn from(e: redb::TableError) -> Self {
		redb::Error::from(e).into()
	}
}

impl From<redb::StorageError> for LockError {
	fn from(e: redb::StorageError) -> Self {
		redb::Error::from(e).into()
	}
}

impl From<redb::CommitError> for LockError {
	fn from(e: redb::CommitError) -> Self {
		redb::Error::from(e).into()
	}
}


// vim: ts=4
