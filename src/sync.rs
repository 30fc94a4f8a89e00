//! Sync engine
//!
//! Brings an existing cache up to date with its remote, but only in the
//! cases that cannot lose work:
//!
//! - local and remote agree: nothing to do
//! - remote is strictly ahead: fast-forward the local branch
//! - local is strictly ahead: push it upstream
//! - anything else (diverged, dirty tree, missing refs): report and leave
//!   the cache exactly as it was
//!
//! Every failure here is non-fatal. The caller keeps the repository handle
//! and works on the last known good state.

use std::fmt;

use crate::backend::{Backend, CommitId};
use crate::callbacks::{Report, Reporter};
use crate::clean;
use crate::config::Preferences;
use crate::credentials::{self, Credentials};
use crate::error::SyncError;
use crate::locator::Locator;
use crate::logging::*;

/// Local and remote branch tips, recomputed on every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchPair {
	pub local: CommitId,
	pub remote: CommitId,
	/// Unset until the tips are known to differ
	pub merge_base: Option<CommitId>,
}

/// Why a sync attempt stopped before deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
	FetchFailed,
	BranchMissing,
	UpstreamMissing,
	DirtyTree,
	MergeBaseFailed,
}

/// What a sync attempt decided to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
	NoOp,
	FastForwardLocal,
	PushLocal,
	DivergedBareRepo,
	DivergedNotHead,
	DivergedNeedsMerge,
	Aborted(AbortReason),
}

impl fmt::Display for SyncDecision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncDecision::NoOp => write!(f, "up to date"),
			SyncDecision::FastForwardLocal => write!(f, "fast-forward"),
			SyncDecision::PushLocal => write!(f, "push"),
			SyncDecision::DivergedBareRepo => write!(f, "diverged (bare)"),
			SyncDecision::DivergedNotHead => write!(f, "diverged (not checked out)"),
			SyncDecision::DivergedNeedsMerge => write!(f, "diverged (needs merge)"),
			SyncDecision::Aborted(AbortReason::FetchFailed) => write!(f, "aborted: fetch failed"),
			SyncDecision::Aborted(AbortReason::BranchMissing) => write!(f, "aborted: branch missing"),
			SyncDecision::Aborted(AbortReason::UpstreamMissing) => {
				write!(f, "aborted: upstream missing")
			}
			SyncDecision::Aborted(AbortReason::DirtyTree) => write!(f, "aborted: dirty tree"),
			SyncDecision::Aborted(AbortReason::MergeBaseFailed) => {
				write!(f, "aborted: merge-base failed")
			}
		}
	}
}

/// Result of one sync attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
	pub decision: SyncDecision,
	pub pair: Option<BranchPair>,
	/// Set when the decision could not be carried out or needs user action
	pub error: Option<SyncError>,
}

impl SyncOutcome {
	fn done(decision: SyncDecision, pair: Option<BranchPair>) -> Self {
		SyncOutcome { decision, pair, error: None }
	}

	/// The cache matches the remote after this attempt
	pub fn is_synchronized(&self) -> bool {
		self.error.is_none()
	}
}

/// Decide what to do with a pair of tips whose merge base is known
///
/// Only the two ancestor cases are acted on; a diverged history always
/// needs a manual merge.
pub fn decide(pair: &BranchPair, bare: bool, head: bool) -> SyncDecision {
	if pair.local == pair.remote {
		return SyncDecision::NoOp;
	}
	match pair.merge_base {
		None => SyncDecision::Aborted(AbortReason::MergeBaseFailed),
		Some(base) if base == pair.local => SyncDecision::FastForwardLocal,
		Some(base) if base == pair.remote => SyncDecision::PushLocal,
		Some(_) if bare => SyncDecision::DivergedBareRepo,
		Some(_) if !head => SyncDecision::DivergedNotHead,
		Some(_) => SyncDecision::DivergedNeedsMerge,
	}
}

/// Runs the reconciliation protocol against one open cache
pub struct SyncEngine<'a, B: Backend> {
	backend: &'a B,
	prefs: &'a Preferences,
	reporter: &'a dyn Reporter,
}

impl<'a, B: Backend> SyncEngine<'a, B> {
	pub fn new(backend: &'a B, prefs: &'a Preferences, reporter: &'a dyn Reporter) -> Self {
		SyncEngine { backend, prefs, reporter }
	}

	/// Fetch, then reconcile `locator.branch` with its upstream
	pub fn synchronize(&self, repo: &B::Repo, locator: &Locator) -> SyncOutcome {
		let credentials = credentials::resolve(locator, self.prefs);

		if let Some(proxy) = credentials::proxy(locator, self.prefs) {
			if let Err(e) = self.backend.set_proxy(repo, &proxy) {
				self.reporter.report(Report::warning(format!(
					"Unable to configure proxy {} for {}: {}",
					proxy,
					locator.remote_url(),
					e
				)));
			}
		}

		if let Err(source) = self.backend.fetch(repo, &self.prefs.remote_name, &credentials) {
			let error = SyncError::FetchFailed { remote: locator.remote_url().to_string(), source };
			return self.abort(AbortReason::FetchFailed, None, error);
		}

		self.reconcile(repo, &locator.branch, &credentials)
	}

	/// Compare the branch with its remote-tracking branch and act on it
	///
	/// Assumes the remote-tracking branch is fresh.
	pub fn reconcile(&self, repo: &B::Repo, branch: &str, credentials: &Credentials) -> SyncOutcome {
		let local = match self.backend.branch_target(repo, branch) {
			Ok(Some(id)) => id,
			result => {
				if let Err(e) = result {
					debug!("Looking up branch {} failed: {}", branch, e);
				}
				let error = SyncError::BranchMissing { branch: branch.to_string() };
				return self.abort(AbortReason::BranchMissing, None, error);
			}
		};
		let remote = match self.backend.upstream_target(repo, branch) {
			Ok(Some(id)) => id,
			result => {
				if let Err(e) = result {
					debug!("Looking up upstream of {} failed: {}", branch, e);
				}
				let error = SyncError::UpstreamMissing { branch: branch.to_string() };
				return self.abort(AbortReason::UpstreamMissing, None, error);
			}
		};

		let mut pair = BranchPair { local, remote, merge_base: None };
		if local == remote {
			debug!("Branch {} up to date at {}", branch, local.short());
			return SyncOutcome::done(SyncDecision::NoOp, Some(pair));
		}

		// A dirty tree blocks every update, whichever side is ahead
		let dirty = match self.backend.statuses(repo) {
			Ok(entries) => clean::dirty_paths(&entries),
			Err(e) => vec![format!("<status unavailable: {}>", e)],
		};
		if !dirty.is_empty() {
			let error = SyncError::DirtyWorkingTree { paths: dirty };
			return self.abort(AbortReason::DirtyTree, Some(pair), error);
		}

		match self.backend.merge_base(repo, local, remote) {
			Ok(base) => pair.merge_base = Some(base),
			Err(source) => {
				let error = SyncError::MergeBaseFailed { source };
				return self.abort(AbortReason::MergeBaseFailed, Some(pair), error);
			}
		}

		let bare = self.backend.is_bare(repo);
		let head = if bare { Ok(false) } else { self.backend.is_head(repo, branch) };
		let decision = decide(&pair, bare, *head.as_ref().unwrap_or(&false));
		debug!(
			"Branch {}: local {} remote {} base {:?} -> {}",
			branch,
			local.short(),
			remote.short(),
			pair.merge_base,
			decision
		);

		match decision {
			SyncDecision::FastForwardLocal => match head {
				Ok(head) => self.fast_forward(repo, branch, pair, head),
				Err(source) => self.failed(decision, pair, SyncError::UpdateFailed { source }),
			},
			SyncDecision::PushLocal => self.push(repo, branch, pair, credentials),
			SyncDecision::DivergedBareRepo => {
				self.failed(decision, pair, SyncError::DivergedBareRepo)
			}
			SyncDecision::DivergedNotHead => self.failed(
				decision,
				pair,
				SyncError::DivergedNotHead { branch: branch.to_string() },
			),
			SyncDecision::DivergedNeedsMerge => {
				self.failed(decision, pair, SyncError::DivergedNeedsMerge)
			}
			SyncDecision::NoOp | SyncDecision::Aborted(_) => SyncOutcome::done(decision, Some(pair)),
		}
	}

	/// Remote is strictly ahead: move the branch, and the work tree with it
	/// when the branch is checked out
	fn fast_forward(&self, repo: &B::Repo, branch: &str, pair: BranchPair, head: bool) -> SyncOutcome {
		let decision = SyncDecision::FastForwardLocal;
		if self.backend.is_bare(repo) || !head {
			let message = format!("Update {} to remote {}", branch, pair.remote.short());
			if let Err(source) = self.backend.set_branch_target(repo, branch, pair.remote, &message) {
				return self.failed(decision, pair, SyncError::UpdateFailed { source });
			}
			self.reporter.report(Report::info(format!(
				"Updated local branch {} from remote ({} -> {})",
				branch,
				pair.local.short(),
				pair.remote.short()
			)));
		} else {
			if let Err(source) = self.backend.reset_hard(repo, pair.remote) {
				return self.failed(decision, pair, SyncError::UpdateFailed { source });
			}
			self.reporter.report(Report::info(format!(
				"Updated local information from remote ({} -> {})",
				pair.local.short(),
				pair.remote.short()
			)));
		}
		SyncOutcome::done(decision, Some(pair))
	}

	/// Local is strictly ahead: push it
	fn push(
		&self,
		repo: &B::Repo,
		branch: &str,
		pair: BranchPair,
		credentials: &Credentials,
	) -> SyncOutcome {
		let decision = SyncDecision::PushLocal;
		if let Err(source) =
			self.backend.push_branch(repo, &self.prefs.remote_name, branch, credentials)
		{
			return self.failed(decision, pair, SyncError::PushFailed { source });
		}
		self.reporter.report(Report::info(format!(
			"Local cache more recent than remote, pushed {} ({} -> {})",
			branch,
			pair.remote.short(),
			pair.local.short()
		)));
		SyncOutcome::done(decision, Some(pair))
	}

	fn abort(&self, reason: AbortReason, pair: Option<BranchPair>, error: SyncError) -> SyncOutcome {
		self.reporter.report(Report::warning(error.to_string()));
		SyncOutcome { decision: SyncDecision::Aborted(reason), pair, error: Some(error) }
	}

	fn failed(&self, decision: SyncDecision, pair: BranchPair, error: SyncError) -> SyncOutcome {
		self.reporter.report(Report::warning(error.to_string()));
		SyncOutcome { decision, pair: Some(pair), error: Some(error) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{EntryState, StatusEntry};
	use crate::callbacks::{CollectingReporter, NoReporter, Severity};
	use crate::error::BackendError;
	use std::cell::RefCell;
	use std::collections::{HashMap, HashSet, VecDeque};
	use std::path::Path;

	/// In-memory repository with a commit graph and two refs per branch
	#[derive(Default)]
	struct MemRepo {
		bare: bool,
		head: Option<String>,
		branches: HashMap<String, CommitId>,
		upstreams: HashMap<String, CommitId>,
		parents: HashMap<CommitId, Vec<CommitId>>,
		statuses: Vec<StatusEntry>,
		fail_fetch: bool,
		fail_push: bool,
		fail_merge_base: bool,
		fail_lookup: bool,
		fetched: usize,
		proxy: Option<String>,
		resets: Vec<CommitId>,
		pushed: Vec<String>,
	}

	impl MemRepo {
		fn commit(&mut self, child: u8, parents: &[u8]) {
			self.parents.insert(id(child), parents.iter().map(|p| id(*p)).collect());
		}

		fn ancestors(&self, start: CommitId) -> HashSet<CommitId> {
			let mut seen = HashSet::new();
			let mut queue = VecDeque::from(vec![start]);
			while let Some(c) = queue.pop_front() {
				if seen.insert(c) {
					queue.extend(self.parents.get(&c).cloned().unwrap_or_default());
				}
			}
			seen
		}
	}

	struct MemBackend;

	fn err(msg: &str) -> BackendError {
		BackendError::new(msg)
	}

	impl Backend for MemBackend {
		type Repo = RefCell<MemRepo>;

		fn open(&self, _path: &Path) -> Result<Self::Repo, BackendError> {
			Ok(RefCell::new(MemRepo::default()))
		}

		fn clone_branch(
			&self,
			_url: &str,
			_branch: &str,
			_into: &Path,
			_credentials: &Credentials,
		) -> Result<Self::Repo, BackendError> {
			Ok(RefCell::new(MemRepo::default()))
		}

		fn set_proxy(&self, repo: &Self::Repo, proxy: &str) -> Result<(), BackendError> {
			repo.borrow_mut().proxy = Some(proxy.to_string());
			Ok(())
		}

		fn fetch(&self, repo: &Self::Repo, _remote: &str, _c: &Credentials) -> Result<(), BackendError> {
			let mut repo = repo.borrow_mut();
			if repo.fail_fetch {
				return Err(err("network unreachable"));
			}
			repo.fetched += 1;
			Ok(())
		}

		fn statuses(&self, repo: &Self::Repo) -> Result<Vec<StatusEntry>, BackendError> {
			Ok(repo.borrow().statuses.clone())
		}

		fn branch_target(&self, repo: &Self::Repo, branch: &str) -> Result<Option<CommitId>, BackendError> {
			Ok(repo.borrow().branches.get(branch).copied())
		}

		fn upstream_target(&self, repo: &Self::Repo, branch: &str) -> Result<Option<CommitId>, BackendError> {
			if repo.borrow().fail_lookup {
				return Err(err("corrupt reference"));
			}
			Ok(repo.borrow().upstreams.get(branch).copied())
		}

		fn merge_base(&self, repo: &Self::Repo, one: CommitId, two: CommitId) -> Result<CommitId, BackendError> {
			let repo = repo.borrow();
			if repo.fail_merge_base {
				return Err(err("no merge base"));
			}
			let left = repo.ancestors(one);
			let mut queue = VecDeque::from(vec![two]);
			while let Some(c) = queue.pop_front() {
				if left.contains(&c) {
					return Ok(c);
				}
				queue.extend(repo.parents.get(&c).cloned().unwrap_or_default());
			}
			Err(err("no merge base"))
		}

		fn is_bare(&self, repo: &Self::Repo) -> bool {
			repo.borrow().bare
		}

		fn is_head(&self, repo: &Self::Repo, branch: &str) -> Result<bool, BackendError> {
			Ok(repo.borrow().head.as_deref() == Some(branch))
		}

		fn reset_hard(&self, repo: &Self::Repo, target: CommitId) -> Result<(), BackendError> {
			let mut repo = repo.borrow_mut();
			let head = repo.head.clone().ok_or_else(|| err("detached"))?;
			repo.branches.insert(head, target);
			repo.resets.push(target);
			Ok(())
		}

		fn set_branch_target(
			&self,
			repo: &Self::Repo,
			branch: &str,
			target: CommitId,
			_log_message: &str,
		) -> Result<(), BackendError> {
			repo.borrow_mut().branches.insert(branch.to_string(), target);
			Ok(())
		}

		fn push_branch(
			&self,
			repo: &Self::Repo,
			_remote: &str,
			branch: &str,
			_credentials: &Credentials,
		) -> Result<(), BackendError> {
			let mut repo = repo.borrow_mut();
			if repo.fail_push {
				return Err(err("push rejected: non-fast-forward"));
			}
			let local = repo.branches[branch];
			repo.upstreams.insert(branch.to_string(), local);
			repo.pushed.push(branch.to_string());
			Ok(())
		}
	}

	fn id(n: u8) -> CommitId {
		CommitId::from_bytes([n; 20])
	}

	/// History 1 <- 2 <- 3 and 2 <- 4, `main` checked out
	fn repo(local: u8, remote: u8) -> RefCell<MemRepo> {
		let mut repo = MemRepo::default();
		repo.commit(1, &[]);
		repo.commit(2, &[1]);
		repo.commit(3, &[2]);
		repo.commit(4, &[2]);
		repo.head = Some("main".to_string());
		repo.branches.insert("main".to_string(), id(local));
		repo.upstreams.insert("main".to_string(), id(remote));
		RefCell::new(repo)
	}

	fn locator() -> Locator {
		Locator::parse("git://host/repo[main]").unwrap()
	}

	fn run(repo: &RefCell<MemRepo>) -> (SyncOutcome, CollectingReporter) {
		let prefs = Preferences::new("/cache");
		let reporter = CollectingReporter::new();
		let outcome = SyncEngine::new(&MemBackend, &prefs, &reporter).synchronize(repo, &locator());
		(outcome, reporter)
	}

	#[test]
	fn test_decide_cases() {
		let pair = |l: u8, r: u8, b: u8| BranchPair { local: id(l), remote: id(r), merge_base: Some(id(b)) };
		assert_eq!(decide(&pair(3, 3, 3), false, true), SyncDecision::NoOp);
		assert_eq!(decide(&pair(2, 3, 2), false, true), SyncDecision::FastForwardLocal);
		assert_eq!(decide(&pair(3, 2, 2), true, false), SyncDecision::PushLocal);
		assert_eq!(decide(&pair(3, 4, 2), true, true), SyncDecision::DivergedBareRepo);
		assert_eq!(decide(&pair(3, 4, 2), false, false), SyncDecision::DivergedNotHead);
		assert_eq!(decide(&pair(3, 4, 2), false, true), SyncDecision::DivergedNeedsMerge);
	}

	#[test]
	fn test_equal_tips_are_noop_without_report() {
		let repo = repo(3, 3);
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::NoOp);
		assert!(outcome.is_synchronized());
		assert!(reporter.reports().is_empty());
		assert_eq!(repo.borrow().fetched, 1);
	}

	#[test]
	fn test_remote_ahead_resets_checked_out_branch() {
		let repo = repo(2, 3);
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::FastForwardLocal);
		assert!(outcome.is_synchronized());
		assert_eq!(repo.borrow().branches["main"], id(3));
		assert_eq!(repo.borrow().resets, vec![id(3)]);
		assert_eq!(reporter.worst(), Some(Severity::Info));
	}

	#[test]
	fn test_remote_ahead_moves_ref_when_not_checked_out() {
		let repo = repo(2, 3);
		repo.borrow_mut().head = Some("other".to_string());
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::FastForwardLocal);
		assert_eq!(repo.borrow().branches["main"], id(3));
		assert!(repo.borrow().resets.is_empty());
	}

	#[test]
	fn test_remote_ahead_moves_ref_in_bare_repo() {
		let repo = repo(2, 3);
		repo.borrow_mut().bare = true;
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::FastForwardLocal);
		assert_eq!(repo.borrow().branches["main"], id(3));
		assert!(repo.borrow().resets.is_empty());
	}

	#[test]
	fn test_local_ahead_pushes() {
		let repo = repo(3, 2);
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::PushLocal);
		assert!(outcome.is_synchronized());
		assert_eq!(repo.borrow().pushed, vec!["main".to_string()]);
		assert_eq!(repo.borrow().upstreams["main"], id(3));
		assert_eq!(reporter.worst(), Some(Severity::Info));
	}

	#[test]
	fn test_push_failure_leaves_local_ref() {
		let repo = repo(3, 2);
		repo.borrow_mut().fail_push = true;
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::PushLocal);
		assert!(matches!(outcome.error, Some(SyncError::PushFailed { .. })));
		assert_eq!(repo.borrow().branches["main"], id(3));
		assert_eq!(repo.borrow().upstreams["main"], id(2));
		assert_eq!(reporter.worst(), Some(Severity::Warning));
	}

	#[test]
	fn test_diverged_bare_repo_untouched() {
		let repo = repo(3, 4);
		repo.borrow_mut().bare = true;
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::DivergedBareRepo);
		assert_eq!(outcome.error, Some(SyncError::DivergedBareRepo));
		assert_eq!(outcome.pair.and_then(|p| p.merge_base), Some(id(2)));
		assert_eq!(repo.borrow().branches["main"], id(3));
		assert!(repo.borrow().pushed.is_empty());
		assert_eq!(reporter.worst(), Some(Severity::Warning));
	}

	#[test]
	fn test_diverged_not_head() {
		let repo = repo(3, 4);
		repo.borrow_mut().head = Some("other".to_string());
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::DivergedNotHead);
		assert_eq!(repo.borrow().branches["main"], id(3));
	}

	#[test]
	fn test_diverged_needs_merge() {
		let repo = repo(3, 4);
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::DivergedNeedsMerge);
		assert_eq!(repo.borrow().branches["main"], id(3));
		assert!(repo.borrow().resets.is_empty());
	}

	#[test]
	fn test_dirty_tree_blocks_every_direction() {
		for (local, remote) in [(2, 3), (3, 2), (3, 4)] {
			let repo = repo(local, remote);
			repo.borrow_mut().statuses = vec![
				StatusEntry::new("notes.txt", EntryState::Modified),
				StatusEntry::new("target", EntryState::Ignored),
			];
			let (outcome, reporter) = run(&repo);
			assert_eq!(outcome.decision, SyncDecision::Aborted(AbortReason::DirtyTree));
			assert_eq!(
				outcome.error,
				Some(SyncError::DirtyWorkingTree { paths: vec!["notes.txt".to_string()] })
			);
			assert_eq!(repo.borrow().branches["main"], id(local));
			assert_eq!(repo.borrow().upstreams["main"], id(remote));
			assert!(reporter.reports()[0].message.contains("notes.txt"));
		}
	}

	#[test]
	fn test_dirty_tree_ignored_when_tips_match() {
		let repo = repo(3, 3);
		repo.borrow_mut().statuses = vec![StatusEntry::new("notes.txt", EntryState::New)];
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::NoOp);
	}

	#[test]
	fn test_fetch_failure_aborts() {
		let repo = repo(2, 3);
		repo.borrow_mut().fail_fetch = true;
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::Aborted(AbortReason::FetchFailed));
		assert!(outcome.pair.is_none());
		assert_eq!(repo.borrow().branches["main"], id(2));
		assert_eq!(reporter.worst(), Some(Severity::Warning));
	}

	#[test]
	fn test_missing_refs_abort() {
		let repo = repo(2, 3);
		repo.borrow_mut().upstreams.clear();
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::Aborted(AbortReason::UpstreamMissing));

		repo.borrow_mut().branches.clear();
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::Aborted(AbortReason::BranchMissing));
		assert_eq!(outcome.error, Some(SyncError::BranchMissing { branch: "main".to_string() }));
	}

	#[test]
	fn test_unreadable_upstream_aborts_as_missing() {
		let repo = repo(2, 3);
		repo.borrow_mut().fail_lookup = true;
		let (outcome, reporter) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::Aborted(AbortReason::UpstreamMissing));
		assert_eq!(repo.borrow().branches["main"], id(2));
		assert_eq!(reporter.worst(), Some(Severity::Warning));
	}

	#[test]
	fn test_merge_base_failure_aborts() {
		let repo = repo(2, 3);
		repo.borrow_mut().fail_merge_base = true;
		let (outcome, _) = run(&repo);
		assert_eq!(outcome.decision, SyncDecision::Aborted(AbortReason::MergeBaseFailed));
		assert_eq!(repo.borrow().branches["main"], id(2));
	}

	#[test]
	fn test_proxy_configured_for_https_only() {
		let prefs = Preferences::new("/cache").with_proxy_lookup(|| Some("http://proxy:3128".into()));
		let engine_repo = repo(3, 3);
		let https = Locator::parse("https://host/repo[main]").unwrap();
		SyncEngine::new(&MemBackend, &prefs, &NoReporter).synchronize(&engine_repo, &https);
		assert_eq!(engine_repo.borrow().proxy.as_deref(), Some("http://proxy:3128"));

		let plain_repo = repo(3, 3);
		SyncEngine::new(&MemBackend, &prefs, &NoReporter).synchronize(&plain_repo, &locator());
		assert!(plain_repo.borrow().proxy.is_none());
	}
}

// vim: ts=4
