//! Working tree cleanliness

use crate::backend::{EntryState, StatusEntry};

/// Paths that make the tree dirty: anything neither current nor ignored
pub fn dirty_paths(entries: &[StatusEntry]) -> Vec<String> {
	entries
		.iter()
		.filter(|e| !matches!(e.state, EntryState::Current | EntryState::Ignored))
		.map(|e| e.path.clone())
		.collect()
}

pub fn is_clean(entries: &[StatusEntry]) -> bool {
	dirty_paths(entries).is_empty()
}


// vim: ts=4
