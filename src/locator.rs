//! Locator parsing
//!
//! A locator names one branch of a repository as `path[branch]`. The path is
//! either a local filesystem path or a `scheme://` URL:
//!
//! ```text
//! /home/me/dives[main]
//! git://host/repo[branch]
//! ssh://host/repo[branch]
//! https://user%40example.com@host/repo[branch]
//! file:///srv/repo[branch]
//! ```
//!
//! Brackets cannot be escaped, so neither the path nor the branch may contain
//! them.

use serde::Serialize;
use std::fmt;

use crate::error::LocatorError;

const HTTPS_PREFIX: &str = "https://";

/// URL scheme of a locator path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
	/// Plain local filesystem path
	None,
	/// `file://`, reduced to a local path but still cached
	File,
	Git,
	Ssh,
	Http,
	Https,
	/// Any other `letters://` prefix
	Other(String),
}

impl Scheme {
	fn from_name(name: &str) -> Scheme {
		match name {
			"file" => Scheme::File,
			"git" => Scheme::Git,
			"ssh" => Scheme::Ssh,
			"http" => Scheme::Http,
			"https" => Scheme::Https,
			other => Scheme::Other(other.to_string()),
		}
	}

	/// Whether the locator goes through the local cache
	pub fn is_remote(&self) -> bool {
		!matches!(self, Scheme::None)
	}
}

/// A parsed `path[branch]` locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Locator {
	/// Repository path or URL. `file://` is already stripped, and so is any
	/// account identity embedded in an https URL.
	pub raw_path: String,

	pub scheme: Scheme,

	/// Branch name, never empty
	pub branch: String,

	/// Encoded account identity taken out of an https URL
	#[serde(skip_serializing)]
	pub embedded_identity: Option<String>,
}

impl Locator {
	/// Parse a `path[branch]` string
	///
	/// Fails when there is no bracket suffix, when the `]` has no matching
	/// `[`, or when the path or branch is empty. Callers treat a failed parse
	/// as "this is not a repository locator".
	pub fn parse(input: &str) -> Result<Locator, LocatorError> {
		let (path, branch) = split_branch(input)?;

		let (scheme, raw_path, embedded_identity) = match scheme_name(path) {
			None => (Scheme::None, path.to_string(), None),
			Some(name) => {
				let scheme = Scheme::from_name(name);
				match scheme {
					Scheme::File => (scheme, path["file://".len()..].to_string(), None),
					Scheme::Https => {
						let (url, identity) = strip_identity(path);
						(scheme, url, identity)
					}
					_ => (scheme, path.to_string(), None),
				}
			}
		};

		Ok(Locator { raw_path, scheme, branch: branch.to_string(), embedded_identity })
	}

	/// URL or path handed to the backend for clone and fetch
	pub fn remote_url(&self) -> &str {
		&self.raw_path
	}
}

impl fmt::Display for Locator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.scheme {
			Scheme::File => write!(f, "file://{}[{}]", self.raw_path, self.branch),
			_ => write!(f, "{}[{}]", self.raw_path, self.branch),
		}
	}
}

/// Find the bracketed branch suffix and return `(path, branch)`
///
/// `close` is the final `]`; `open` walks back from it to the nearest `[`.
/// Path separators directly in front of `open` are not part of the path.
fn split_branch(input: &str) -> Result<(&str, &str), LocatorError> {
	let close = match input.len().checked_sub(1) {
		Some(idx) if input.as_bytes()[idx] == b']' => idx,
		_ => return Err(LocatorError::MissingBranch),
	};

	let open = input[..close].rfind('[').ok_or(LocatorError::UnmatchedBracket)?;

	let path = input[..open].trim_end_matches(std::path::is_separator);
	if path.is_empty() {
		return Err(LocatorError::EmptyPath);
	}

	let branch = &input[open + 1..close];
	if branch.is_empty() {
		return Err(LocatorError::EmptyBranch);
	}

	Ok((path, branch))
}

/// Return the scheme name if `path` starts with `[a-z]+://`
fn scheme_name(path: &str) -> Option<&str> {
	let end = path.find("://")?;
	let name = &path[..end];
	if !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase()) {
		Some(name)
	} else {
		None
	}
}

/// Split `https://identity@host/...` into `https://host/...` and `identity`
///
/// The `@` only delimits an account when it comes before the first `/` of
/// the URL body; later ones belong to the path.
fn strip_identity(url: &str) -> (String, Option<String>) {
	let body = &url[HTTPS_PREFIX.len()..];
	if let (Some(at), Some(slash)) = (body.find('@'), body.find('/')) {
		if at < slash {
			let stripped = [HTTPS_PREFIX, &body[at + 1..]].concat();
			return (stripped, Some(body[..at].to_string()));
		}
	}
	(url.to_string(), None)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_local_path() {
		let loc = Locator::parse("/a/b/c[mybranch]").unwrap();
		assert_eq!(loc.raw_path, "/a/b/c");
		assert_eq!(loc.branch, "mybranch");
		assert_eq!(loc.scheme, Scheme::None);
		assert!(loc.embedded_identity.is_none());
	}

	#[test]
	fn test_parse_strips_trailing_separators() {
		let plain = Locator::parse("/a/b/c[mybranch]").unwrap();
		let slashed = Locator::parse("/a/b/c///[mybranch]").unwrap();
		assert_eq!(plain, slashed);
	}

	#[test]
	fn test_parse_rejects_missing_suffix() {
		assert_eq!(Locator::parse("/a/b/c"), Err(LocatorError::MissingBranch));
		assert_eq!(Locator::parse(""), Err(LocatorError::MissingBranch));
		assert_eq!(Locator::parse("/a/b/c]"), Err(LocatorError::UnmatchedBracket));
	}

	#[test]
	fn test_parse_rejects_empty_parts() {
		assert_eq!(Locator::parse("[main]"), Err(LocatorError::EmptyPath));
		assert_eq!(Locator::parse("///[main]"), Err(LocatorError::EmptyPath));
		assert_eq!(Locator::parse("/repo[]"), Err(LocatorError::EmptyBranch));
	}

	#[test]
	fn test_parse_uses_last_open_bracket() {
		let loc = Locator::parse("/data/[old]/repo[main]").unwrap();
		assert_eq!(loc.raw_path, "/data/[old]/repo");
		assert_eq!(loc.branch, "main");
	}

	#[test]
	fn test_scheme_detection() {
		assert_eq!(Locator::parse("git://host/repo[b]").unwrap().scheme, Scheme::Git);
		assert_eq!(Locator::parse("ssh://host/repo[b]").unwrap().scheme, Scheme::Ssh);
		assert_eq!(Locator::parse("http://host/repo[b]").unwrap().scheme, Scheme::Http);
		assert_eq!(Locator::parse("https://host/repo[b]").unwrap().scheme, Scheme::Https);
		assert_eq!(
			Locator::parse("svn+ssh://host/repo[b]").unwrap().scheme,
			Scheme::None,
			"'+' is not a lowercase letter"
		);
		assert_eq!(
			Locator::parse("hg://host/repo[b]").unwrap().scheme,
			Scheme::Other("hg".to_string())
		);
		assert_eq!(Locator::parse("HTTPS://host/repo[b]").unwrap().scheme, Scheme::None);
		assert_eq!(Locator::parse("://host/repo[b]").unwrap().scheme, Scheme::None);
	}

	#[test]
	fn test_file_scheme_reduced_to_path() {
		let loc = Locator::parse("file:///srv/git/repo[main]").unwrap();
		assert_eq!(loc.scheme, Scheme::File);
		assert_eq!(loc.raw_path, "/srv/git/repo");
		assert_eq!(loc.remote_url(), "/srv/git/repo");
		assert_eq!(loc.to_string(), "file:///srv/git/repo[main]");
	}

	#[test]
	fn test_https_identity_extracted() {
		let loc = Locator::parse("https://user%40host@example.com/repo[main]").unwrap();
		assert_eq!(loc.embedded_identity.as_deref(), Some("user%40host"));
		assert_eq!(loc.raw_path, "https://example.com/repo");
		assert_eq!(loc.to_string(), "https://example.com/repo[main]");
	}

	#[test]
	fn test_https_at_in_path_left_alone() {
		let loc = Locator::parse("https://example.com/users/@me/repo[main]").unwrap();
		assert!(loc.embedded_identity.is_none());
		assert_eq!(loc.raw_path, "https://example.com/users/@me/repo");
	}

	#[test]
	fn test_identity_only_stripped_for_https() {
		let loc = Locator::parse("ssh://git@example.com/repo[main]").unwrap();
		assert!(loc.embedded_identity.is_none());
		assert_eq!(loc.raw_path, "ssh://git@example.com/repo");
	}
}

// vim: ts=4
