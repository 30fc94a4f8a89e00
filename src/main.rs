use clap::{value_parser, Arg, ArgAction, Command};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gitcache::acquire::{open_locator, Opened};
use gitcache::address::CacheEntry;
use gitcache::backend::Git2Backend;
use gitcache::callbacks::{CollectingReporter, Severity};
use gitcache::config::{Config, Preferences};
use gitcache::lock::CacheLock;
use gitcache::locator::Locator;
use gitcache::logging::*;

fn cli() -> Command {
	Command::new("gitcache")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Local cache of remote git branches")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.value_parser(value_parser!(PathBuf))
				.help("Config file (default: ~/.config/gitcache/config.toml)"),
		)
		.arg(
			Arg::new("cache-dir")
				.long("cache-dir")
				.value_name("DIR")
				.value_parser(value_parser!(PathBuf))
				.help("Cache root directory"),
		)
		.arg(
			Arg::new("remote")
				.long("remote")
				.value_name("NAME")
				.help("Remote name used in cache clones (default: origin)"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::Count)
				.help("More logging (-v debug, -vv trace)"),
		)
		.subcommand(
			Command::new("parse")
				.about("Show how a locator is parsed")
				.arg(Arg::new("locator").required(true)),
		)
		.subcommand(
			Command::new("path")
				.about("Show the cache directory of a locator")
				.arg(Arg::new("locator").required(true)),
		)
		.subcommand(
			Command::new("sync")
				.about("Open, clone or synchronize caches")
				.arg(Arg::new("locator").required(true).action(ArgAction::Append).num_args(1..)),
		)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let matches = cli().get_matches();

	let mut config = Config::load(matches.get_one::<PathBuf>("config").map(|p| p.as_path()))?;
	if let Some(dir) = matches.get_one::<PathBuf>("cache-dir") {
		config.cache_dir = dir.clone();
	}
	match matches.get_count("verbose") {
		0 => {}
		1 => config.log_level = "debug".to_string(),
		_ => config.log_level = "trace".to_string(),
	}
	init_tracing(&config.log_level, config.log_format);
	let mut prefs = Preferences::from_config(&config);
	if let Some(remote) = matches.get_one::<String>("remote").filter(|r| !r.is_empty()) {
		prefs = prefs.with_remote_name(remote.as_str());
	}
	debug!("Using {:?}", prefs);

	match matches.subcommand() {
		Some(("parse", sub)) => {
			let raw = sub.get_one::<String>("locator").ok_or("parse: locator argument required")?;
			parse_command(raw)
		}
		Some(("path", sub)) => {
			let raw = sub.get_one::<String>("locator").ok_or("path: locator argument required")?;
			path_command(raw, &prefs)
		}
		Some(("sync", sub)) => {
			let raws: Vec<String> = sub
				.get_many::<String>("locator")
				.ok_or("sync: at least one locator argument required")?
				.cloned()
				.collect();
			sync_command(prefs, raws).await
		}
		_ => Ok(()),
	}
}

fn parse_command(raw: &str) -> Result<(), Box<dyn Error>> {
	let locator = Locator::parse(raw).map_err(|e| format!("{}: {}", raw, e))?;
	let cached = locator.scheme.is_remote();
	let out = serde_json::json!({
		"scheme": locator.scheme,
		"path": locator.raw_path,
		"branch": locator.branch,
		"identity": locator.embedded_identity.is_some(),
		"cached": cached,
	});
	println!("{}", serde_json::to_string_pretty(&out)?);
	Ok(())
}

fn path_command(raw: &str, prefs: &Preferences) -> Result<(), Box<dyn Error>> {
	let locator = Locator::parse(raw).map_err(|e| format!("{}: {}", raw, e))?;
	if !locator.scheme.is_remote() {
		println!("{} (local, not cached)", locator.raw_path);
		return Ok(());
	}
	println!("{}", CacheEntry::new(&prefs.cache_root, locator).local_path.display());
	Ok(())
}

/// Sync every locator; locators sharing a cache run in order under one lock
async fn sync_command(prefs: Preferences, raws: Vec<String>) -> Result<(), Box<dyn Error>> {
	let mut failures = 0usize;
	let mut groups: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
	let mut direct = Vec::new();

	for raw in raws {
		match Locator::parse(&raw) {
			Ok(locator) if locator.scheme.is_remote() => {
				let path = CacheEntry::new(&prefs.cache_root, locator).local_path;
				groups.entry(path).or_default().push(raw);
			}
			Ok(_) => direct.push(raw),
			Err(e) => {
				println!("{}: not a locator ({})", raw, e);
				failures += 1;
			}
		}
	}

	let prefs = Arc::new(prefs);
	let mut tasks = Vec::new();
	if !groups.is_empty() {
		let root = prefs.cache_root.clone();
		match tokio::task::spawn_blocking(move || CacheLock::open(&root)).await? {
			Ok(lock) => {
				for (path, raws) in groups {
					let lock = lock.clone();
					let prefs = Arc::clone(&prefs);
					tasks.push(tokio::task::spawn_blocking(move || sync_group(&lock, &path, &raws, &prefs)));
				}
			}
			Err(e) => {
				for raw in groups.values().flatten() {
					println!("{}: unavailable ({})", raw, e);
					failures += 1;
				}
			}
		}
	}

	if !direct.is_empty() {
		let prefs = Arc::clone(&prefs);
		tasks.push(tokio::task::spawn_blocking(move || {
			direct.iter().map(|raw| sync_one(raw, &prefs)).sum::<usize>()
		}));
	}

	for task in tasks {
		failures += task.await?;
	}

	if failures > 0 {
		return Err(format!("{} locator(s) unavailable", failures).into());
	}
	Ok(())
}

fn sync_group(lock: &CacheLock, path: &Path, raws: &[String], prefs: &Preferences) -> usize {
	let _guard = match lock.acquire(&[path]) {
		Ok(guard) => guard,
		Err(e) => {
			for raw in raws {
				println!("{}: unavailable ({})", raw, e);
			}
			return raws.len();
		}
	};
	raws.iter().map(|raw| sync_one(raw, prefs)).sum()
}

/// Returns 1 if the locator ended up without a usable repository
fn sync_one(raw: &str, prefs: &Preferences) -> usize {
	let reporter = CollectingReporter::forwarding();
	let opened = match open_locator(raw, &Git2Backend, prefs, &reporter) {
		Ok(opened) => opened,
		Err(e) => {
			println!("{}: not a locator ({})", raw, e);
			return 1;
		}
	};

	let warned = if reporter.worst() >= Some(Severity::Warning) { " (with warnings)" } else { "" };
	match opened {
		Opened::Cached { entry, outcome: Some(outcome), .. } => {
			println!("{}: {}{} [{}]", raw, outcome.decision, warned, entry.local_path.display());
			0
		}
		Opened::Cached { entry, outcome: None, .. } => {
			println!("{}: cloned [{}]", raw, entry.local_path.display());
			0
		}
		Opened::Direct { .. } => {
			println!("{}: local repository, not cached", raw);
			0
		}
		Opened::Unavailable { error, .. } => {
			println!("{}: unavailable ({})", raw, error);
			1
		}
		Opened::NotRepository { .. } => {
			println!("{}: no repository at this path", raw);
			1
		}
	}
}


// vim: ts=4
