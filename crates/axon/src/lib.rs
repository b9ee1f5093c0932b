//! Named, pluggable implementations of host-declared extension points.
//!
//! An extension point is an object-safe trait marked with
//! [`extension_point!`]. Implementations register static descriptors via
//! [`extension_provider!`]; descriptor files under `META-INF` style
//! directories bind short names (and comma-separated aliases) to those
//! providers. A per-point [`ExtensionLoader`] then materializes cached
//! singleton instances with dependency injection and decorator wrapping,
//! filters activatable subsets against a request [`Url`], and serves an
//! adaptive dispatcher that picks the concrete implementation per call from
//! URL attributes.
//!
//! ```ignore
//! axon::extension_point! {
//! 	/// Robots say hello.
//! 	dyn Robot, name = "demo.Robot", default = "optimusPrime";
//! }
//!
//! let env = axon::Environment::builder().search_root("config").build();
//! let robot = env.loader::<dyn Robot>()?.by_name("optimusPrime")?;
//! robot.say_hello();
//! ```
//!
//! All state lives in an explicit [`Environment`]; [`Environment::global`]
//! is the process-wide default. Loaders and their instances live as long as
//! the environment.

pub mod adaptive;
pub mod env;
pub mod error;
pub mod loader;
pub mod point;
pub mod provider;
pub mod url;

mod activate;
mod factory;
mod macros;
mod registry;
mod scan;

pub use env::{Environment, EnvironmentBuilder};
pub use error::ExtensionError;
pub use factory::{AdaptiveExtensionFactory, ExtensionFactory, SpiExtensionFactory};
pub use loader::{ErasedLoader, ExtensionLoader};
pub use point::ExtensionPoint;
pub use provider::{
	ActivateDef, DepDef, ErasedExtension, PointDef, ProviderCtor, ProviderDef, ResourceDef,
};
pub use url::{Invocation, Url};
