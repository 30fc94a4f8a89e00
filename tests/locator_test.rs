//! Locator parsing and cache addressing through the public API

use std::path::Path;

use gitcache::address::{address, CacheEntry};
use gitcache::error::LocatorError;
use gitcache::locator::{Locator, Scheme};

#[test]
fn test_local_path_with_branch() {
	let loc = Locator::parse("/a/b/c[mybranch]").unwrap();
	assert_eq!(loc.raw_path, "/a/b/c");
	assert_eq!(loc.branch, "mybranch");
	assert_eq!(loc.scheme, Scheme::None);
	assert!(!loc.scheme.is_remote());
}

#[test]
fn test_trailing_separators_ignored() {
	assert_eq!(Locator::parse("/a/b/c///[mybranch]").unwrap(), Locator::parse("/a/b/c[mybranch]").unwrap());
}

#[test]
fn test_plain_names_are_not_locators() {
	assert_eq!(Locator::parse("/a/b/c"), Err(LocatorError::MissingBranch));
	assert_eq!(Locator::parse("dive.xml]"), Err(LocatorError::UnmatchedBracket));
	assert_eq!(Locator::parse("///[main]"), Err(LocatorError::EmptyPath));
}

#[test]
fn test_https_identity_extracted() {
	let loc = Locator::parse("https://user%40host@example.com/repo[main]").unwrap();
	assert_eq!(loc.embedded_identity.as_deref(), Some("user%40host"));
	assert_eq!(loc.to_string(), "https://example.com/repo[main]");
}

#[test]
fn test_file_url_reduced_but_cached() {
	let loc = Locator::parse("file:///srv/git/dives[main]").unwrap();
	assert_eq!(loc.scheme, Scheme::File);
	assert_eq!(loc.remote_url(), "/srv/git/dives");
	assert!(loc.scheme.is_remote());
}

#[test]
fn test_unknown_scheme_routed_as_remote() {
	let loc = Locator::parse("svn+ssh://host/repo[trunk]").unwrap();
	assert_eq!(loc.scheme, Scheme::None, "'+' is not part of a scheme name");

	let loc = Locator::parse("hg://host/repo[default]").unwrap();
	assert_eq!(loc.scheme, Scheme::Other("hg".to_string()));
	assert!(loc.scheme.is_remote());
}

#[test]
fn test_address_separates_concatenations() {
	let root = Path::new("/cache");
	assert_ne!(address(root, "repo1", "branch"), address(root, "repo", "1branch"));
	assert_eq!(address(root, "repo", "main"), address(root, "repo", "main"));
	assert!(address(root, "repo", "main").starts_with(root));
}

#[test]
fn test_cache_entry_ignores_embedded_identity() {
	let root = Path::new("/cache");
	let with_identity = CacheEntry::new(root, Locator::parse("https://me@example.com/repo[main]").unwrap());
	let without = CacheEntry::new(root, Locator::parse("https://example.com/repo[main]").unwrap());
	assert_eq!(with_identity.local_path, without.local_path);
}

// vim: ts=4
