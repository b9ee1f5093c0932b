//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axon::Environment;

/// Creates a unique scratch directory for one test.
pub fn unique_temp_dir(prefix: &str) -> PathBuf {
	let nanos = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.expect("system time should be after unix epoch")
		.as_nanos();
	let dir = std::env::temp_dir().join(format!("axon-{prefix}-{}-{nanos}", std::process::id()));
	std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
	dir
}

/// Writes one descriptor file at `root/<dir><point>`.
pub fn write_descriptor(root: &Path, dir: &str, point: &str, contents: &str) {
	let path = root.join(dir).join(point);
	std::fs::create_dir_all(path.parent().expect("descriptor path has a parent"))
		.expect("descriptor dir should be creatable");
	std::fs::write(&path, contents).expect("descriptor should be writable");
}

/// An environment rooted at a fresh temp dir holding one descriptor file in
/// the framework directory.
pub fn env_with_descriptor(prefix: &str, point: &str, contents: &str) -> (Arc<Environment>, PathBuf) {
	let root = unique_temp_dir(prefix);
	write_descriptor(&root, "META-INF/axon/", point, contents);
	let env = Environment::builder().search_root(&root).build();
	(env, root)
}
