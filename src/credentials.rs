//! Transport credentials and proxy resolution

use std::path::PathBuf;

use crate::config::Preferences;
use crate::locator::{Locator, Scheme};

/// Credentials handed to the backend for clone, fetch and push
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
	/// Let the transport do without
	None,

	/// Key file for ssh remotes
	SshKey { private_key: PathBuf, passphrase: String },

	/// Basic credentials for https remotes
	UserPass { username: String, password: String },
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Credentials::None => write!(f, "None"),
			Credentials::SshKey { private_key, .. } => {
				write!(f, "SshKey({})", private_key.display())
			}
			Credentials::UserPass { username, .. } => write!(f, "UserPass({})", username),
		}
	}
}

/// Credentials for `locator`
///
/// ssh remotes use the key file in the cache root, protected by the stored
/// password. https remotes use the identity embedded in the URL, falling
/// back to the stored account. Without any identity nothing is supplied.
pub fn resolve(locator: &Locator, prefs: &Preferences) -> Credentials {
	let password = prefs.password.clone().unwrap_or_default();
	match locator.scheme {
		Scheme::Ssh => Credentials::SshKey { private_key: prefs.ssh_key_path(), passphrase: password },
		Scheme::Https => {
			match locator.embedded_identity.as_ref().or(prefs.account.as_ref()) {
				Some(username) => Credentials::UserPass { username: username.clone(), password },
				None => Credentials::None,
			}
		}
		_ => Credentials::None,
	}
}

/// Proxy to configure before fetching `locator`; only https remotes use one
pub fn proxy(locator: &Locator, prefs: &Preferences) -> Option<String> {
	match locator.scheme {
		Scheme::Https => prefs.proxy(),
		_ => None,
	}
}


// vim: ts=4
