//! Static provider, point, and resource descriptors collected at link time.
//!
//! Descriptor files select providers by their fully qualified path; the
//! providers themselves are `ProviderDef` statics registered into the
//! [`PROVIDERS`] distributed slice, usually through
//! [`extension_provider!`](crate::extension_provider). A descriptor line
//! naming a path that is not linked into the binary is the load-failure case:
//! it is captured per line and surfaced when the name is actually requested.

use std::any::Any;
use std::sync::{Arc, LazyLock};

use linkme::distributed_slice;
use rustc_hash::FxHashMap;

use crate::env::Environment;
use crate::error::ExtensionError;
use crate::loader::ErasedLoader;
use crate::point::ExtensionPoint;

/// All provider descriptors linked into the process.
#[distributed_slice]
pub static PROVIDERS: [ProviderDef];

/// All extension point descriptors linked into the process.
#[distributed_slice]
pub static POINTS: [PointDef];

/// Descriptor resources embedded in the binary.
#[distributed_slice]
pub static RESOURCES: [ResourceDef];

/// A materialized extension instance with its type erased.
///
/// Carries two views of the same object: the `Arc<dyn Point>` view used by
/// loaders and wrappers, and (for descriptor-built instances) the concrete
/// `Arc<C>` view that generated dependency-assignment thunks downcast to.
#[derive(Clone)]
pub struct ErasedExtension {
	instance: Arc<dyn Any + Send + Sync>,
	concrete: Option<Arc<dyn Any + Send + Sync>>,
}

impl ErasedExtension {
	/// Erases both views of a freshly constructed instance.
	pub fn from_parts<P, C>(instance: Arc<P>, concrete: Arc<C>) -> Self
	where
		P: ExtensionPoint + ?Sized,
		C: Any + Send + Sync,
	{
		let concrete: Arc<dyn Any + Send + Sync> = concrete;
		Self { instance: Arc::new(instance), concrete: Some(concrete) }
	}

	/// Erases an instance for which only the point view is available.
	pub fn from_point<P: ExtensionPoint + ?Sized>(instance: Arc<P>) -> Self {
		Self { instance: Arc::new(instance), concrete: None }
	}

	/// The instance as the given extension point, if it is one.
	pub fn downcast<P: ExtensionPoint + ?Sized>(&self) -> Option<Arc<P>> {
		self.instance.downcast_ref::<Arc<P>>().cloned()
	}

	/// The instance as its concrete type, if that view was erased.
	pub fn concrete<C: Any + Send + Sync>(&self) -> Option<Arc<C>> {
		self.concrete.as_ref()?.clone().downcast::<C>().ok()
	}
}

/// Constructor shape of a provider. The shape is also its category: a
/// single-argument constructor taking the point makes a wrapper, everything
/// else is an ordinary provider or a hand-written adaptive dispatcher.
#[derive(Clone, Copy)]
pub enum ProviderCtor {
	/// Plain implementation built from nothing.
	Ordinary(fn(&Arc<Environment>) -> Result<ErasedExtension, ExtensionError>),
	/// Decorator wrapping an existing instance of the same point.
	Wrapper(fn(&Arc<Environment>, ErasedExtension) -> Result<ErasedExtension, ExtensionError>),
	/// Hand-written adaptive dispatcher.
	Adaptive(fn(&Arc<Environment>) -> Result<ErasedExtension, ExtensionError>),
}

/// Activation metadata attached to an ordinary provider.
#[derive(Debug, Clone, Copy)]
pub struct ActivateDef {
	/// Group labels this provider activates for; empty matches every group.
	pub groups: &'static [&'static str],
	/// URL parameter keys that trigger activation; empty always triggers.
	pub keys: &'static [&'static str],
	/// Sort position within the auto-activated set (ascending).
	pub order: i32,
}

/// A declarative dependency of a provider, resolved through the extension
/// factory after construction.
#[derive(Clone, Copy)]
pub struct DepDef {
	/// Property name handed to the factory.
	pub property: &'static str,
	/// NAME of the extension point the dependency belongs to.
	pub point: &'static str,
	/// Stores a resolved dependency into the target instance.
	pub assign: fn(&ErasedExtension, ErasedExtension) -> Result<(), ExtensionError>,
}

/// A provider implementation registered for one extension point.
pub struct ProviderDef {
	/// Fully qualified provider path, as written in descriptor files.
	pub path: &'static str,
	/// NAME of the extension point this provider implements.
	pub point: &'static str,
	/// Constructor; its shape classifies the provider.
	pub ctor: ProviderCtor,
	/// Inline name used when a descriptor line omits one.
	pub name_hint: Option<&'static str>,
	/// Activation metadata, if the provider is activatable.
	pub activate: Option<ActivateDef>,
	/// Dependencies injected after construction.
	pub deps: &'static [DepDef],
}

impl ProviderDef {
	/// Last `::` or `.` separated segment of the provider path.
	pub fn simple_name(&self) -> &'static str {
		let tail = self.path.rsplit("::").next().unwrap_or(self.path);
		tail.rsplit('.').next().unwrap_or(tail)
	}

	/// Whether the constructor shape classifies this as a wrapper.
	#[inline]
	pub fn is_wrapper(&self) -> bool {
		matches!(self.ctor, ProviderCtor::Wrapper(_))
	}

	/// Whether this is a hand-written adaptive dispatcher.
	#[inline]
	pub fn is_adaptive(&self) -> bool {
		matches!(self.ctor, ProviderCtor::Adaptive(_))
	}
}

impl std::fmt::Debug for ProviderDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProviderDef")
			.field("path", &self.path)
			.field("point", &self.point)
			.field("wrapper", &self.is_wrapper())
			.field("adaptive", &self.is_adaptive())
			.finish_non_exhaustive()
	}
}

/// An extension point linked into the process, with a thunk producing its
/// type-erased loader for an environment.
pub struct PointDef {
	/// The point NAME.
	pub name: &'static str,
	/// Resolves the point's loader, erased for cross-point plumbing.
	pub loader: fn(&Arc<Environment>) -> Result<Arc<dyn ErasedLoader>, ExtensionError>,
}

/// An embedded descriptor resource, path-relative to a search root.
pub struct ResourceDef {
	/// Relative resource path, e.g. `META-INF/axon/internal/<point-name>`.
	pub path: &'static str,
	/// UTF-8 descriptor file contents.
	pub contents: &'static str,
}

/// Looks up a linked provider by its path literal. First registration wins
/// when a path is linked twice.
pub(crate) fn provider_by_path(path: &str) -> Option<&'static ProviderDef> {
	static INDEX: LazyLock<FxHashMap<&'static str, &'static ProviderDef>> = LazyLock::new(|| {
		let mut index = FxHashMap::default();
		for def in PROVIDERS.iter() {
			index.entry(def.path).or_insert(def);
		}
		index
	});
	INDEX.get(path).copied()
}

/// Looks up a linked extension point by NAME.
pub(crate) fn point_by_name(name: &str) -> Option<&'static PointDef> {
	static INDEX: LazyLock<FxHashMap<&'static str, &'static PointDef>> = LazyLock::new(|| {
		let mut index = FxHashMap::default();
		for def in POINTS.iter() {
			index.entry(def.name).or_insert(def);
		}
		index
	});
	INDEX.get(name).copied()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn simple_name_handles_both_separators() {
		let def = ProviderDef {
			path: "demo::robots::OptimusPrime",
			point: "demo.Robot",
			ctor: ProviderCtor::Ordinary(|_| unreachable!()),
			name_hint: None,
			activate: None,
			deps: &[],
		};
		assert_eq!(def.simple_name(), "OptimusPrime");

		let dotted = ProviderDef { path: "demo.robots.Bumblebee", ..def };
		assert_eq!(dotted.simple_name(), "Bumblebee");
	}
}
