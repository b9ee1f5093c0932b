//! Explicit process environment: the loader registry, the shared raw
//! instance table, and the descriptor search roots.
//!
//! The original system kept this state in process-wide statics; here it is
//! an explicit value so hosts (and tests) can build isolated environments.
//! [`Environment::global`] provides the conventional process default.

use std::any::{Any, TypeId};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::ExtensionError;
use crate::loader::{ErasedLoader, ExtensionLoader};
use crate::point::ExtensionPoint;
use crate::provider::{ErasedExtension, ProviderCtor, ProviderDef, RESOURCES, point_by_name};

/// Search roots in `AXON_PATH`, colon separated.
const PATH_VAR: &str = "AXON_PATH";

/// Shared state behind every loader of one process (or one test).
pub struct Environment {
	search_roots: Vec<PathBuf>,
	/// Loader singletons keyed by point type. Readers never block writers
	/// for long: entries are inserted once and then only read.
	loaders: RwLock<FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
	/// Raw instances keyed by provider path, shared across loaders.
	instances: RwLock<FxHashMap<&'static str, ErasedExtension>>,
}

impl Environment {
	/// Starts building an environment.
	pub fn builder() -> EnvironmentBuilder {
		EnvironmentBuilder { search_roots: Vec::new() }
	}

	/// The process-wide default environment: the current directory plus any
	/// roots listed in `AXON_PATH`.
	pub fn global() -> &'static Arc<Environment> {
		static GLOBAL: LazyLock<Arc<Environment>> = LazyLock::new(|| {
			let mut builder = Environment::builder();
			if let Ok(dir) = std::env::current_dir() {
				builder = builder.search_root(dir);
			}
			if let Ok(paths) = std::env::var(PATH_VAR) {
				for path in paths.split(':').filter(|path| !path.is_empty()) {
					builder = builder.search_root(path);
				}
			}
			builder.build()
		});
		&GLOBAL
	}

	/// The loader for extension point `P`, created and cached on first use.
	///
	/// Creating a loader resolves the adaptive extension factory first,
	/// except for the factory point itself.
	pub fn loader<P: ExtensionPoint + ?Sized>(
		self: &Arc<Self>,
	) -> Result<Arc<ExtensionLoader<P>>, ExtensionError> {
		let key = TypeId::of::<P>();
		if let Some(existing) = self.loaders.read().get(&key) {
			if let Ok(loader) = existing.clone().downcast::<ExtensionLoader<P>>() {
				return Ok(loader);
			}
		}

		// Built outside the lock: construction recursively resolves the
		// factory loader.
		let fresh = Arc::new(ExtensionLoader::<P>::new(self)?);
		let mut loaders = self.loaders.write();
		if let Some(existing) = loaders
			.get(&key)
			.and_then(|loader| loader.clone().downcast::<ExtensionLoader<P>>().ok())
		{
			return Ok(existing);
		}
		loaders.insert(key, fresh.clone());
		Ok(fresh)
	}

	/// The type-erased loader for a point NAME, if such a point is linked.
	pub fn loader_by_point_name(
		self: &Arc<Self>,
		name: &str,
	) -> Result<Option<Arc<dyn ErasedLoader>>, ExtensionError> {
		match point_by_name(name) {
			Some(def) => (def.loader)(self).map(Some),
			None => Ok(None),
		}
	}

	/// The raw (unwrapped) instance of a provider, constructed at most once
	/// per environment and shared across loaders.
	pub(crate) fn raw_instance(
		self: &Arc<Self>,
		def: &'static ProviderDef,
	) -> Result<ErasedExtension, ExtensionError> {
		if let Some(existing) = self.instances.read().get(def.path) {
			return Ok(existing.clone());
		}

		let ctor = match def.ctor {
			ProviderCtor::Ordinary(ctor) | ProviderCtor::Adaptive(ctor) => ctor,
			ProviderCtor::Wrapper(_) => {
				return Err(ExtensionError::PointMismatch { path: def.path, point: def.point });
			}
		};
		let built = ctor(self)?;

		let mut instances = self.instances.write();
		Ok(instances.entry(def.path).or_insert(built).clone())
	}

	/// Readable descriptor resources for a relative path: embedded resources
	/// first, then each search root in order. Unreadable files are logged
	/// and skipped.
	pub(crate) fn resources(&self, rel: &str) -> Vec<(String, String)> {
		let mut found = Vec::new();
		for resource in RESOURCES.iter() {
			if resource.path == rel {
				found.push((format!("embedded:{}", resource.path), resource.contents.to_owned()));
			}
		}
		for root in &self.search_roots {
			let path = root.join(rel);
			if !path.is_file() {
				continue;
			}
			match std::fs::read_to_string(&path) {
				Ok(contents) => found.push((path.display().to_string(), contents)),
				Err(err) => {
					warn!("failed to read descriptor resource {}: {err}", path.display());
				}
			}
		}
		found
	}
}

impl std::fmt::Debug for Environment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Environment")
			.field("search_roots", &self.search_roots)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Environment`].
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
	search_roots: Vec<PathBuf>,
}

impl EnvironmentBuilder {
	/// Adds a directory under which descriptor resources are searched.
	pub fn search_root(mut self, path: impl Into<PathBuf>) -> Self {
		self.search_roots.push(path.into());
		self
	}

	/// Finishes the environment.
	pub fn build(self) -> Arc<Environment> {
		Arc::new(Environment {
			search_roots: self.search_roots,
			loaders: RwLock::new(FxHashMap::default()),
			instances: RwLock::new(FxHashMap::default()),
		})
	}
}
