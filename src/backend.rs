//! Version-control backend capability
//!
//! The sync engine only talks to [`Backend`]. [`Git2Backend`] implements it
//! on top of libgit2, so backend API churn stays in this file.

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
	BranchType, Cred, FetchOptions, ObjectType, Oid, ProxyOptions, PushOptions, RemoteCallbacks,
	Repository, ResetType, Status, StatusOptions,
};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use crate::credentials::Credentials;
use crate::error::BackendError;
use crate::logging::*;

/// Commit identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId([u8; 20]);

impl CommitId {
	pub fn from_bytes(bytes: [u8; 20]) -> Self {
		CommitId(bytes)
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}

	/// Abbreviated id for messages
	pub fn short(&self) -> String {
		hex::encode(&self.0[..4])
	}
}

impl fmt::Display for CommitId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl fmt::Debug for CommitId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "CommitId({})", self.short())
	}
}

impl From<Oid> for CommitId {
	fn from(oid: Oid) -> Self {
		let mut bytes = [0u8; 20];
		let raw = oid.as_bytes();
		let n = raw.len().min(20);
		bytes[..n].copy_from_slice(&raw[..n]);
		CommitId(bytes)
	}
}

impl CommitId {
	fn to_oid(self) -> Result<Oid, BackendError> {
		Ok(Oid::from_bytes(&self.0)?)
	}
}

/// Working tree state of one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
	Current,
	Ignored,
	New,
	Modified,
	Deleted,
	Renamed,
	TypeChange,
	Conflicted,
}

/// One line of a status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
	pub path: String,
	pub state: EntryState,
}

impl StatusEntry {
	pub fn new(path: impl Into<String>, state: EntryState) -> Self {
		StatusEntry { path: path.into(), state }
	}
}

impl From<Status> for EntryState {
	fn from(status: Status) -> Self {
		if status.is_empty() {
			EntryState::Current
		} else if status.is_ignored() {
			EntryState::Ignored
		} else if status.is_conflicted() {
			EntryState::Conflicted
		} else if status.intersects(Status::INDEX_NEW | Status::WT_NEW) {
			EntryState::New
		} else if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
			EntryState::Deleted
		} else if status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
			EntryState::Renamed
		} else if status.intersects(Status::INDEX_TYPECHANGE | Status::WT_TYPECHANGE) {
			EntryState::TypeChange
		} else {
			EntryState::Modified
		}
	}
}

/// Operations the cache needs from a version-control system
///
/// Lookups that find nothing return `Ok(None)`; `Err` is reserved for the
/// backend itself failing.
pub trait Backend {
	/// Open repository handle, released on drop
	type Repo;

	fn open(&self, path: &Path) -> Result<Self::Repo, BackendError>;

	/// Clone `url` into `into`, checking out `branch`
	fn clone_branch(
		&self,
		url: &str,
		branch: &str,
		into: &Path,
		credentials: &Credentials,
	) -> Result<Self::Repo, BackendError>;

	/// Store the http proxy in the repository's transport configuration
	fn set_proxy(&self, repo: &Self::Repo, proxy: &str) -> Result<(), BackendError>;

	fn fetch(
		&self,
		repo: &Self::Repo,
		remote: &str,
		credentials: &Credentials,
	) -> Result<(), BackendError>;

	/// Working tree status, empty for bare repositories
	fn statuses(&self, repo: &Self::Repo) -> Result<Vec<StatusEntry>, BackendError>;

	/// Target of the local branch `branch`
	fn branch_target(&self, repo: &Self::Repo, branch: &str)
		-> Result<Option<CommitId>, BackendError>;

	/// Target of the remote-tracking branch configured for `branch`
	fn upstream_target(
		&self,
		repo: &Self::Repo,
		branch: &str,
	) -> Result<Option<CommitId>, BackendError>;

	fn merge_base(
		&self,
		repo: &Self::Repo,
		one: CommitId,
		two: CommitId,
	) -> Result<CommitId, BackendError>;

	fn is_bare(&self, repo: &Self::Repo) -> bool;

	/// Whether `branch` is the checked-out branch
	fn is_head(&self, repo: &Self::Repo, branch: &str) -> Result<bool, BackendError>;

	/// Hard reset the checked-out branch and work tree to `target`
	fn reset_hard(&self, repo: &Self::Repo, target: CommitId) -> Result<(), BackendError>;

	/// Point the local branch at `target` without touching the work tree
	fn set_branch_target(
		&self,
		repo: &Self::Repo,
		branch: &str,
		target: CommitId,
		log_message: &str,
	) -> Result<(), BackendError>;

	/// Push the local branch to the same name on `remote`
	fn push_branch(
		&self,
		repo: &Self::Repo,
		remote: &str,
		branch: &str,
		credentials: &Credentials,
	) -> Result<(), BackendError>;
}

/// libgit2 implementation of [`Backend`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Backend;

/// Credential callbacks that give up after the first rejected attempt
fn remote_callbacks(credentials: &Credentials) -> RemoteCallbacks<'_> {
	let mut callbacks = RemoteCallbacks::new();
	if matches!(credentials, Credentials::None) {
		return callbacks;
	}

	let mut attempts = 0u32;
	callbacks.credentials(move |_url, username_from_url, _allowed| {
		attempts += 1;
		if attempts > 1 {
			return Err(git2::Error::from_str("authentication rejected"));
		}
		match credentials {
			Credentials::SshKey { private_key, passphrase } => Cred::ssh_key(
				username_from_url.unwrap_or("git"),
				None,
				private_key,
				Some(passphrase.as_str()),
			),
			Credentials::UserPass { username, password } => {
				Cred::userpass_plaintext(username, password)
			}
			Credentials::None => Cred::default(),
		}
	});
	callbacks
}

fn proxy_options() -> ProxyOptions<'static> {
	let mut proxy = ProxyOptions::new();
	proxy.auto();
	proxy
}

impl Backend for Git2Backend {
	type Repo = Repository;

	fn open(&self, path: &Path) -> Result<Repository, BackendError> {
		Ok(Repository::open(path)?)
	}

	fn clone_branch(
		&self,
		url: &str,
		branch: &str,
		into: &Path,
		credentials: &Credentials,
	) -> Result<Repository, BackendError> {
		let mut fetch_options = FetchOptions::new();
		fetch_options.remote_callbacks(remote_callbacks(credentials));
		fetch_options.proxy_options(proxy_options());

		let mut builder = RepoBuilder::new();
		builder.branch(branch);
		builder.fetch_options(fetch_options);

		debug!("Cloning {} ({}) into {}", url, branch, into.display());
		Ok(builder.clone(url, into)?)
	}

	fn set_proxy(&self, repo: &Repository, proxy: &str) -> Result<(), BackendError> {
		let mut config = repo.config()?;
		config.set_str("http.proxy", proxy)?;
		Ok(())
	}

	fn fetch(
		&self,
		repo: &Repository,
		remote: &str,
		credentials: &Credentials,
	) -> Result<(), BackendError> {
		let mut origin = repo.find_remote(remote)?;
		let mut fetch_options = FetchOptions::new();
		fetch_options.remote_callbacks(remote_callbacks(credentials));
		fetch_options.proxy_options(proxy_options());
		origin.fetch(&[] as &[&str], Some(&mut fetch_options), None)?;
		Ok(())
	}

	fn statuses(&self, repo: &Repository) -> Result<Vec<StatusEntry>, BackendError> {
		if repo.is_bare() {
			return Ok(Vec::new());
		}

		let mut options = StatusOptions::new();
		options.include_untracked(true).recurse_untracked_dirs(true).include_ignored(false);

		let statuses = repo.statuses(Some(&mut options))?;
		Ok(statuses
			.iter()
			.map(|entry| {
				let path = entry.path().map(str::to_string).unwrap_or_else(|| {
					String::from_utf8_lossy(entry.path_bytes()).into_owned()
				});
				StatusEntry { path, state: entry.status().into() }
			})
			.collect())
	}

	fn branch_target(
		&self,
		repo: &Repository,
		branch: &str,
	) -> Result<Option<CommitId>, BackendError> {
		let local = match repo.find_branch(branch, BranchType::Local) {
			Ok(local) => local,
			Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		let resolved = local.get().resolve()?;
		Ok(resolved.target().map(CommitId::from))
	}

	fn upstream_target(
		&self,
		repo: &Repository,
		branch: &str,
	) -> Result<Option<CommitId>, BackendError> {
		let local = match repo.find_branch(branch, BranchType::Local) {
			Ok(local) => local,
			Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		let upstream = match local.upstream() {
			Ok(upstream) => upstream,
			Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		let resolved = upstream.get().resolve()?;
		Ok(resolved.target().map(CommitId::from))
	}

	fn merge_base(
		&self,
		repo: &Repository,
		one: CommitId,
		two: CommitId,
	) -> Result<CommitId, BackendError> {
		Ok(repo.merge_base(one.to_oid()?, two.to_oid()?)?.into())
	}

	fn is_bare(&self, repo: &Repository) -> bool {
		repo.is_bare()
	}

	fn is_head(&self, repo: &Repository, branch: &str) -> Result<bool, BackendError> {
		Ok(repo.find_branch(branch, BranchType::Local)?.is_head())
	}

	fn reset_hard(&self, repo: &Repository, target: CommitId) -> Result<(), BackendError> {
		let commit = repo.find_object(target.to_oid()?, Some(ObjectType::Commit))?;
		let mut checkout = CheckoutBuilder::new();
		checkout.safe();
		repo.reset(&commit, ResetType::Hard, Some(&mut checkout))?;
		Ok(())
	}

	fn set_branch_target(
		&self,
		repo: &Repository,
		branch: &str,
		target: CommitId,
		log_message: &str,
	) -> Result<(), BackendError> {
		let mut reference = repo.find_branch(branch, BranchType::Local)?.into_reference();
		reference.set_target(target.to_oid()?, log_message)?;
		Ok(())
	}

	fn push_branch(
		&self,
		repo: &Repository,
		remote: &str,
		branch: &str,
		credentials: &Credentials,
	) -> Result<(), BackendError> {
		let mut origin = repo.find_remote(remote)?;
		let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);

		// Per-ref rejections arrive through this callback, not as an Err
		let rejection: RefCell<Option<String>> = RefCell::new(None);
		{
			let mut callbacks = remote_callbacks(credentials);
			callbacks.push_update_reference(|_refname, status| {
				if let Some(message) = status {
					*rejection.borrow_mut() = Some(message.to_string());
				}
				Ok(())
			});

			let mut push_options = PushOptions::new();
			push_options.remote_callbacks(callbacks);
			push_options.proxy_options(proxy_options());
			origin.push(&[refspec.as_str()], Some(&mut push_options))?;
		}

		match rejection.into_inner() {
			Some(message) => Err(BackendError::new(format!("push rejected: {}", message))),
			None => Ok(()),
		}
	}
}


// vim: ts=4
