//! Per-point extension loaders.
//!
//! An [`ExtensionLoader`] owns every cache layer for one extension point:
//! the classified provider registry (populated once, swapped atomically),
//! per-name instance holders with publish-once cells, and the adaptive
//! singleton with its cached terminal error. Loaders are obtained from an
//! [`Environment`](crate::Environment) and live as long as it does.

use std::any::TypeId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::error;

use crate::adaptive::AdaptiveOutcome;
use crate::env::Environment;
use crate::error::ExtensionError;
use crate::factory::ExtensionFactory;
use crate::point::ExtensionPoint;
use crate::provider::{ErasedExtension, ProviderCtor, ProviderDef};
use crate::registry::{self, PointRegistry, split_names};

/// Lookup name that resolves to the point's declared default extension.
const TRUE_NAME: &str = "true";

/// Per-name instance holder. The cell publishes at most once; the lock only
/// guards the unset to constructed transition.
struct Holder<P: ExtensionPoint + ?Sized> {
	cell: OnceLock<Arc<P>>,
	lock: Mutex<()>,
}

impl<P: ExtensionPoint + ?Sized> Holder<P> {
	fn new() -> Self {
		Self { cell: OnceLock::new(), lock: Mutex::new(()) }
	}
}

/// Discovers, materializes, and caches implementations of one extension
/// point.
pub struct ExtensionLoader<P: ExtensionPoint + ?Sized> {
	env: Arc<Environment>,
	/// Published class registry; `None` until first population.
	registry: ArcSwapOption<PointRegistry>,
	/// Serializes registry population and the test-only mutations.
	registry_lock: Mutex<()>,
	holders: RwLock<FxHashMap<String, Arc<Holder<P>>>>,
	/// Adaptive singleton, or the cached terminal failure.
	adaptive: ArcSwapOption<AdaptiveOutcome<P>>,
	adaptive_lock: Mutex<()>,
	/// Object factory consulted during injection; absent for the factory
	/// point itself (the bootstrap hole).
	factory: Option<Arc<dyn ExtensionFactory>>,
}

impl<P: ExtensionPoint + ?Sized> ExtensionLoader<P> {
	/// Builds the loader for `P`, resolving its object factory first.
	pub(crate) fn new(env: &Arc<Environment>) -> Result<Self, ExtensionError> {
		let factory = if TypeId::of::<P>() == TypeId::of::<dyn ExtensionFactory>() {
			None
		} else {
			Some(env.loader::<dyn ExtensionFactory>()?.adaptive()?)
		};
		Ok(Self {
			env: env.clone(),
			registry: ArcSwapOption::empty(),
			registry_lock: Mutex::new(()),
			holders: RwLock::new(FxHashMap::default()),
			adaptive: ArcSwapOption::empty(),
			adaptive_lock: Mutex::new(()),
			factory,
		})
	}

	/// The environment this loader belongs to.
	#[inline]
	pub fn environment(&self) -> &Arc<Environment> {
		&self.env
	}

	/// The extension bound to `name`, materializing it on first request.
	///
	/// The literal `"true"` resolves to the declared default extension.
	/// Repeated calls return the same instance.
	pub fn by_name(&self, name: &str) -> Result<Arc<P>, ExtensionError> {
		if name.is_empty() {
			return Err(ExtensionError::EmptyName);
		}
		if name == TRUE_NAME {
			return self
				.default_instance()?
				.ok_or(ExtensionError::NoDefault { point: P::NAME });
		}

		let holder = self.holder(name);
		if let Some(instance) = holder.cell.get() {
			return Ok(instance.clone());
		}
		let _guard = holder.lock.lock();
		if let Some(instance) = holder.cell.get() {
			return Ok(instance.clone());
		}
		let instance = self.create(name)?;
		let _ = holder.cell.set(instance.clone());
		Ok(instance)
	}

	/// The already-materialized extension bound to `name`, without
	/// triggering construction.
	pub fn already_loaded(&self, name: &str) -> Result<Option<Arc<P>>, ExtensionError> {
		if name.is_empty() {
			return Err(ExtensionError::EmptyName);
		}
		Ok(self.holder(name).cell.get().cloned())
	}

	/// Whether `name` is bound to a provider.
	pub fn has_name(&self, name: &str) -> bool {
		!name.is_empty()
			&& self
				.registry()
				.map(|registry| registry.names.contains_key(name))
				.unwrap_or(false)
	}

	/// Default name declared on the point, if any.
	pub fn default_name(&self) -> Result<Option<&'static str>, ExtensionError> {
		Ok(self.registry()?.default_name)
	}

	/// The default extension, or `None` when the point declares no usable
	/// default.
	pub fn default_instance(&self) -> Result<Option<Arc<P>>, ExtensionError> {
		let registry = self.registry()?;
		match registry.default_name {
			Some(name) if name != TRUE_NAME => self.by_name(name).map(Some),
			_ => Ok(None),
		}
	}

	/// Every bound name, aliases included, sorted.
	pub fn supported_names(&self) -> Result<BTreeSet<String>, ExtensionError> {
		Ok(self.registry()?.names.keys().cloned().collect())
	}

	/// Names whose instances have been materialized, sorted.
	pub fn loaded_names(&self) -> BTreeSet<String> {
		self.holders
			.read()
			.iter()
			.filter(|(_, holder)| holder.cell.get().is_some())
			.map(|(name, _)| name.clone())
			.collect()
	}

	/// Canonical name of a previously materialized instance.
	///
	/// Matches by instance identity, so it also resolves wrapped instances.
	pub fn name_of(&self, instance: &Arc<P>) -> Option<String> {
		let registry = self.registry.load_full()?;
		let holders = self.holders.read();
		for (name, holder) in holders.iter() {
			let Some(published) = holder.cell.get() else { continue };
			if !Arc::ptr_eq(published, instance) {
				continue;
			}
			return match registry.names.get(name) {
				Some(def) => registry
					.canonical
					.get(def.path)
					.cloned()
					.or_else(|| Some(name.clone())),
				None => Some(name.clone()),
			};
		}
		None
	}

	/// The adaptive singleton for this point.
	///
	/// A hand-written adaptive provider wins; otherwise the dispatcher
	/// synthesized for the point is used. A construction failure is cached
	/// and re-raised on every later call.
	pub fn adaptive(&self) -> Result<Arc<P>, ExtensionError> {
		if let Some(outcome) = self.adaptive.load_full() {
			return outcome.to_result();
		}
		let _guard = self.adaptive_lock.lock();
		if let Some(outcome) = self.adaptive.load_full() {
			return outcome.to_result();
		}

		let result = self.create_adaptive();
		let outcome = match &result {
			Ok(instance) => AdaptiveOutcome::Ready(instance.clone()),
			Err(err) => AdaptiveOutcome::Failed(err.clone()),
		};
		self.adaptive.store(Some(Arc::new(outcome)));
		result
	}

	/// Registers a provider under `name` (test support).
	///
	/// Fails when the name is already bound, or for an adaptive provider
	/// when the adaptive slot is already filled.
	pub fn register(&self, name: &str, def: &'static ProviderDef) -> Result<(), ExtensionError> {
		self.mutate_registry(|registry| {
			if def.is_adaptive() {
				if let Some(existing) = registry.adaptive {
					return Err(ExtensionError::DuplicateAdaptive {
						point: P::NAME,
						existing: existing.path,
						duplicate: def.path,
					});
				}
				registry.adaptive = Some(def);
				return Ok(());
			}

			if split_names(name).is_empty() {
				return Err(ExtensionError::EmptyName);
			}
			if registry.names.contains_key(name) {
				return Err(ExtensionError::AlreadyRegistered {
					point: P::NAME,
					name: name.to_owned(),
				});
			}
			registry.canonical.entry(def.path).or_insert_with(|| name.to_owned());
			registry.names.insert(name.to_owned(), def);
			Ok(())
		})
	}

	/// Replaces an existing binding (test support).
	///
	/// Drops the cached instance for `name`, or the cached adaptive outcome
	/// when `def` is adaptive. Fails when nothing is bound to replace.
	pub fn replace(&self, name: &str, def: &'static ProviderDef) -> Result<(), ExtensionError> {
		self.mutate_registry(|registry| {
			if def.is_adaptive() {
				if registry.adaptive.is_none() {
					return Err(ExtensionError::NotRegistered {
						point: P::NAME,
						name: name.to_owned(),
					});
				}
				registry.adaptive = Some(def);
				self.adaptive.store(None);
				return Ok(());
			}

			if split_names(name).is_empty() {
				return Err(ExtensionError::EmptyName);
			}
			if !registry.names.contains_key(name) {
				return Err(ExtensionError::NotRegistered {
					point: P::NAME,
					name: name.to_owned(),
				});
			}
			registry.canonical.insert(def.path, name.to_owned());
			registry.names.insert(name.to_owned(), def);
			self.holders.write().remove(name);
			Ok(())
		})
	}

	/// The published class registry, populating it on first access with a
	/// double-checked load under the loader-private lock.
	pub(crate) fn registry(&self) -> Result<Arc<PointRegistry>, ExtensionError> {
		if let Some(registry) = self.registry.load_full() {
			return Ok(registry);
		}
		let _guard = self.registry_lock.lock();
		if let Some(registry) = self.registry.load_full() {
			return Ok(registry);
		}
		let registry = Arc::new(registry::build_registry(&self.env, P::NAME, P::DEFAULT)?);
		self.registry.store(Some(registry.clone()));
		Ok(registry)
	}

	/// Clones, mutates, and republishes the registry snapshot.
	fn mutate_registry(
		&self,
		mutation: impl FnOnce(&mut PointRegistry) -> Result<(), ExtensionError>,
	) -> Result<(), ExtensionError> {
		self.registry()?;
		let _guard = self.registry_lock.lock();
		let mut registry = match self.registry.load_full() {
			Some(current) => (*current).clone(),
			None => registry::build_registry(&self.env, P::NAME, P::DEFAULT)?,
		};
		mutation(&mut registry)?;
		self.registry.store(Some(Arc::new(registry)));
		Ok(())
	}

	fn holder(&self, name: &str) -> Arc<Holder<P>> {
		if let Some(holder) = self.holders.read().get(name) {
			return holder.clone();
		}
		self.holders
			.write()
			.entry(name.to_owned())
			.or_insert_with(|| Arc::new(Holder::new()))
			.clone()
	}

	/// Materializes the instance for `name`: shared raw construction,
	/// injection, then wrapper composition with re-injection of each layer.
	fn create(&self, name: &str) -> Result<Arc<P>, ExtensionError> {
		let registry = self.registry()?;
		let Some(def) = registry.names.get(name).copied() else {
			return Err(missing::<P>(&registry, name));
		};

		let raw = self
			.env
			.raw_instance(def)
			.map_err(|err| construction_error::<P>(name, &err))?;
		self.inject(def, &raw);

		let mut current = raw;
		for &wrapper in &registry.wrappers {
			current = self
				.wrap(wrapper, current)
				.map_err(|err| construction_error::<P>(name, &err))?;
		}

		current.downcast::<P>().ok_or(ExtensionError::PointMismatch {
			path: def.path,
			point: P::NAME,
		})
	}

	fn wrap(
		&self,
		def: &'static ProviderDef,
		inner: ErasedExtension,
	) -> Result<ErasedExtension, ExtensionError> {
		let ProviderCtor::Wrapper(ctor) = def.ctor else {
			return Err(ExtensionError::PointMismatch { path: def.path, point: P::NAME });
		};
		let wrapped = ctor(&self.env, inner)?;
		self.inject(def, &wrapped);
		Ok(wrapped)
	}

	/// Resolves each declared dependency through the object factory.
	/// Individual failures are logged and skipped; they never abort
	/// construction.
	fn inject(&self, def: &'static ProviderDef, target: &ErasedExtension) {
		let Some(factory) = &self.factory else { return };
		for dep in def.deps {
			match factory.get(&self.env, dep.point, dep.property) {
				Ok(Some(value)) => {
					if let Err(err) = (dep.assign)(target, value) {
						error!(
							point = P::NAME,
							provider = def.path,
							property = dep.property,
							"fail to inject dependency: {err}"
						);
					}
				}
				Ok(None) => {}
				Err(err) => error!(
					point = P::NAME,
					provider = def.path,
					property = dep.property,
					"fail to resolve dependency: {err}"
				),
			}
		}
	}

	fn create_adaptive(&self) -> Result<Arc<P>, ExtensionError> {
		let registry = self.registry().map_err(|err| adaptive_error::<P>(&err))?;
		if let Some(def) = registry.adaptive {
			let ProviderCtor::Adaptive(ctor) = def.ctor else {
				return Err(ExtensionError::PointMismatch { path: def.path, point: P::NAME });
			};
			let erased = ctor(&self.env).map_err(|err| adaptive_error::<P>(&err))?;
			self.inject(def, &erased);
			return erased.downcast::<P>().ok_or(ExtensionError::PointMismatch {
				path: def.path,
				point: P::NAME,
			});
		}

		match P::synthesize(&self.env) {
			Some(result) => result.map_err(|err| adaptive_error::<P>(&err)),
			None => Err(ExtensionError::NoAdaptiveSupport { point: P::NAME }),
		}
	}
}

/// Type-erased view of a loader, used by the extension factory plumbing.
pub trait ErasedLoader: Send + Sync {
	/// NAME of the point this loader serves.
	fn point_name(&self) -> &'static str;

	/// Whether any named providers are bound for the point.
	fn has_providers(&self) -> bool;

	/// The adaptive singleton, type-erased.
	fn adaptive_erased(&self) -> Result<ErasedExtension, ExtensionError>;
}

impl<P: ExtensionPoint + ?Sized> ErasedLoader for ExtensionLoader<P> {
	fn point_name(&self) -> &'static str {
		P::NAME
	}

	fn has_providers(&self) -> bool {
		self.registry()
			.map(|registry| !registry.names.is_empty())
			.unwrap_or(false)
	}

	fn adaptive_erased(&self) -> Result<ErasedExtension, ExtensionError> {
		Ok(ErasedExtension::from_point::<P>(self.adaptive()?))
	}
}

impl<P: ExtensionPoint + ?Sized> fmt::Debug for ExtensionLoader<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ExtensionLoader[{}]", P::NAME)
	}
}

impl<P: ExtensionPoint + ?Sized> fmt::Display for ExtensionLoader<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ExtensionLoader[{}]", P::NAME)
	}
}

/// Composes the not-found diagnostic: a captured load failure whose class
/// literal contains the requested name wins; otherwise every captured
/// failure is enumerated.
fn missing<P: ExtensionPoint + ?Sized>(registry: &PointRegistry, name: &str) -> ExtensionError {
	let needle = name.to_lowercase();
	for (literal, err) in &registry.errors {
		if literal.to_lowercase().contains(&needle) {
			return err.clone();
		}
	}

	let mut report = String::new();
	for (i, (literal, err)) in registry.errors.iter().enumerate() {
		if i == 0 {
			report.push_str(", possible causes: ");
		}
		report.push_str(&format!("\r\n({}) {literal}:\r\n{err}", i + 1));
	}
	ExtensionError::NotFound { point: P::NAME, name: name.to_owned(), report }
}

fn construction_error<P: ExtensionPoint + ?Sized>(name: &str, cause: &ExtensionError) -> ExtensionError {
	ExtensionError::Construction {
		point: P::NAME,
		name: name.to_owned(),
		reason: cause.to_string(),
	}
}

fn adaptive_error<P: ExtensionPoint + ?Sized>(cause: &ExtensionError) -> ExtensionError {
	match cause {
		ExtensionError::NoAdaptiveSupport { .. } => cause.clone(),
		_ => ExtensionError::Adaptive { point: P::NAME, reason: cause.to_string() },
	}
}
