//! Configuration for gitcache
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (~/.config/gitcache/config.toml, config.json or config.json5)
//! 3. Environment variables (GITCACHE_* prefix)
//! 4. CLI flags (highest priority)
//!
//! The engine never reads this directly. [`Preferences`] is derived from it
//! and passed into every call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;

/// Environment variables consulted by the default proxy lookup, in order
const PROXY_ENV: [&str; 4] = ["https_proxy", "HTTPS_PROXY", "http_proxy", "HTTP_PROXY"];

/// File configuration for gitcache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// CACHE
	// ========================================================================
	/// Base directory holding one repository per remote/branch pair
	pub cache_dir: PathBuf,

	/// Remote to fetch from and push to
	pub remote_name: String,

	// ========================================================================
	// CREDENTIALS
	// ========================================================================
	/// Encoded account identity for https remotes
	pub account: Option<String>,

	/// Password for https remotes, passphrase for the ssh key
	pub password: Option<String>,

	/// Private key file name for ssh remotes, relative to `cache_dir`
	pub ssh_key_name: String,

	// ========================================================================
	// PROXY
	// ========================================================================
	/// Explicit http proxy for https remotes
	pub proxy: Option<String>,

	/// Fall back to https_proxy / http_proxy from the environment
	pub use_env_proxy: bool,

	// ========================================================================
	// LOGGING
	// ========================================================================
	/// Log level (trace, debug, info, warn, error)
	pub log_level: String,

	/// Log format (Pretty, Compact, JSON)
	pub log_format: LogFormat,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			cache_dir: home_dir()
				.map(|h| h.join(".gitcache"))
				.unwrap_or_else(|| PathBuf::from(".gitcache")),
			remote_name: "origin".to_string(),
			account: None,
			password: None,
			ssh_key_name: "remote.key".to_string(),
			proxy: None,
			use_env_proxy: true,
			log_level: "info".to_string(),
			log_format: LogFormat::Pretty,
		}
	}
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
	Json,
	#[default]
	Pretty,
	Compact,
}

fn home_dir() -> Option<PathBuf> {
	std::env::var_os("HOME").map(PathBuf::from)
}

impl Config {
	/// Default config file location
	pub fn default_path() -> Option<PathBuf> {
		home_dir().map(|h| h.join(".config").join("gitcache").join("config.toml"))
	}

	/// Load configuration
	///
	/// An explicit `path` must exist. Without one the default location is
	/// used when present. Environment overrides are applied on top.
	pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
		let mut config = match path {
			Some(path) => Config::from_file(path)?,
			None => match Config::default_path() {
				Some(path) if path.is_file() => Config::from_file(&path)?,
				_ => Config::default(),
			},
		};
		config.apply_env(|key| std::env::var(key).ok());
		config.validate()?;
		Ok(config)
	}

	/// Parse a config file, TOML or JSON5 by extension
	pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
		let text = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
		let parsed = match path.extension().and_then(|e| e.to_str()) {
			Some("json") | Some("json5") => json5::from_str(&text).map_err(|e| e.to_string()),
			_ => toml::from_str(&text).map_err(|e| e.to_string()),
		};
		parsed.map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })
	}

	/// Apply `GITCACHE_*` overrides from `lookup`
	pub fn apply_env<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(dir) = lookup("GITCACHE_CACHE_DIR") {
			self.cache_dir = PathBuf::from(dir);
		}
		if let Some(remote) = lookup("GITCACHE_REMOTE") {
			self.remote_name = remote;
		}
		if let Some(account) = lookup("GITCACHE_ACCOUNT") {
			self.account = Some(account);
		}
		if let Some(password) = lookup("GITCACHE_PASSWORD") {
			self.password = Some(password);
		}
		if let Some(proxy) = lookup("GITCACHE_PROXY") {
			self.proxy = Some(proxy);
		}
		if let Some(level) = lookup("GITCACHE_LOG") {
			self.log_level = level;
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.cache_dir.as_os_str().is_empty() {
			return Err(ConfigError::Invalid { message: "cacheDir must not be empty".to_string() });
		}
		if self.remote_name.is_empty() {
			return Err(ConfigError::Invalid {
				message: "remoteName must not be empty".to_string(),
			});
		}
		if self.ssh_key_name.is_empty() {
			return Err(ConfigError::Invalid {
				message: "sshKeyName must not be empty".to_string(),
			});
		}
		Ok(())
	}
}

type ProxyLookup = dyn Fn() -> Option<String> + Send + Sync;

/// Explicit preferences passed into acquisition and sync
#[derive(Clone)]
pub struct Preferences {
	pub cache_root: PathBuf,
	pub remote_name: String,
	pub account: Option<String>,
	pub password: Option<String>,
	pub ssh_key_name: String,
	proxy_lookup: Arc<ProxyLookup>,
}

impl Preferences {
	/// Preferences rooted at `cache_root` with no credentials and no proxy
	pub fn new(cache_root: impl Into<PathBuf>) -> Self {
		Preferences {
			cache_root: cache_root.into(),
			remote_name: "origin".to_string(),
			account: None,
			password: None,
			ssh_key_name: "remote.key".to_string(),
			proxy_lookup: Arc::new(|| None),
		}
	}

	pub fn from_config(config: &Config) -> Self {
		let explicit = config.proxy.clone();
		let use_env = config.use_env_proxy;
		Preferences {
			cache_root: config.cache_dir.clone(),
			remote_name: config.remote_name.clone(),
			account: config.account.clone(),
			password: config.password.clone(),
			ssh_key_name: config.ssh_key_name.clone(),
			proxy_lookup: Arc::new(move || {
				explicit.clone().or_else(|| if use_env { env_proxy() } else { None })
			}),
		}
	}

	pub fn with_account(mut self, account: impl Into<String>) -> Self {
		self.account = Some(account.into());
		self
	}

	pub fn with_password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(password.into());
		self
	}

	pub fn with_remote_name(mut self, remote_name: impl Into<String>) -> Self {
		self.remote_name = remote_name.into();
		self
	}

	/// Replace the proxy discovery function
	pub fn with_proxy_lookup<F>(mut self, lookup: F) -> Self
	where
		F: Fn() -> Option<String> + Send + Sync + 'static,
	{
		self.proxy_lookup = Arc::new(lookup);
		self
	}

	/// Discover the http proxy to use, if any
	pub fn proxy(&self) -> Option<String> {
		(self.proxy_lookup)().filter(|p| !p.is_empty())
	}

	/// Private key used for ssh remotes
	pub fn ssh_key_path(&self) -> PathBuf {
		self.cache_root.join(&self.ssh_key_name)
	}
}

impl fmt::Debug for Preferences {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Preferences")
			.field("cache_root", &self.cache_root)
			.field("remote_name", &self.remote_name)
			.field("account", &self.account)
			.field("password", &self.password.as_ref().map(|_| "***"))
			.field("ssh_key_name", &self.ssh_key_name)
			.finish()
	}
}

fn env_proxy() -> Option<String> {
	PROXY_ENV.iter().find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}


// vim: ts=4
