//! The extension factory bootstrap.
//!
//! Dependency injection resolves every declared dependency through the
//! adaptive [`ExtensionFactory`], which is itself an extension point. The
//! loader for the factory point is the one loader built without a factory
//! (the bootstrap hole), so factory implementations receive no injection.

use std::sync::Arc;

use linkme::distributed_slice;

use crate::env::Environment;
use crate::error::ExtensionError;
use crate::provider::{ErasedExtension, ResourceDef, RESOURCES};

/// Resolves dependencies requested by the injector.
///
/// Returning `Ok(None)` skips the property; errors are logged by the
/// injector and likewise skip the property.
pub trait ExtensionFactory: Send + Sync {
	/// An instance satisfying the dependency `(point, property)`.
	fn get(
		&self,
		env: &Arc<Environment>,
		point: &str,
		property: &str,
	) -> Result<Option<ErasedExtension>, ExtensionError>;
}

crate::extension_point! {
	/// The object factory consulted during dependency injection.
	dyn ExtensionFactory, name = "axon.ExtensionFactory";
}

/// Built-in factory descriptor, embedded so every environment discovers the
/// `adaptive` and `spi` factories without filesystem setup.
#[distributed_slice(RESOURCES)]
static FACTORY_DESCRIPTOR: ResourceDef = ResourceDef {
	path: "META-INF/axon/internal/axon.ExtensionFactory",
	contents: "adaptive=axon::factory::AdaptiveExtensionFactory\n\
	           spi=axon::factory::SpiExtensionFactory\n",
};

/// Delegates to every ordinary factory in supported-name order.
///
/// Built as the hand-written adaptive dispatcher of the factory point, so
/// `loader.adaptive()` on the factory loader returns it.
pub struct AdaptiveExtensionFactory {
	factories: Vec<Arc<dyn ExtensionFactory>>,
}

impl AdaptiveExtensionFactory {
	fn build(env: &Arc<Environment>) -> Result<Self, ExtensionError> {
		let loader = env.loader::<dyn ExtensionFactory>()?;
		let mut factories = Vec::new();
		for name in loader.supported_names()? {
			factories.push(loader.by_name(&name)?);
		}
		Ok(Self { factories })
	}
}

impl ExtensionFactory for AdaptiveExtensionFactory {
	fn get(
		&self,
		env: &Arc<Environment>,
		point: &str,
		property: &str,
	) -> Result<Option<ErasedExtension>, ExtensionError> {
		for factory in &self.factories {
			if let Some(found) = factory.get(env, point, property)? {
				return Ok(Some(found));
			}
		}
		Ok(None)
	}
}

crate::extension_provider! {
	/// The delegating factory; fills the adaptive slot of the factory point.
	adaptive ADAPTIVE_FACTORY {
		class: AdaptiveExtensionFactory,
		point: dyn ExtensionFactory,
		path: "axon::factory::AdaptiveExtensionFactory",
		ctor: AdaptiveExtensionFactory::build,
	}
}

/// Resolves a dependency as the adaptive instance of its extension point,
/// when that point has any providers.
pub struct SpiExtensionFactory;

impl ExtensionFactory for SpiExtensionFactory {
	fn get(
		&self,
		env: &Arc<Environment>,
		point: &str,
		_property: &str,
	) -> Result<Option<ErasedExtension>, ExtensionError> {
		let Some(loader) = env.loader_by_point_name(point)? else {
			return Ok(None);
		};
		if !loader.has_providers() {
			return Ok(None);
		}
		loader.adaptive_erased().map(Some)
	}
}

crate::extension_provider! {
	/// The point-resolving factory.
	provider SPI_FACTORY {
		class: SpiExtensionFactory,
		point: dyn ExtensionFactory,
		path: "axon::factory::SpiExtensionFactory",
		ctor: |_env| Ok(SpiExtensionFactory),
	}
}
