//! Extension point markers.

use std::sync::Arc;

use crate::env::Environment;
use crate::error::ExtensionError;

/// Marker implemented for `dyn Trait` objects that act as extension points.
///
/// Declared with [`extension_point!`](crate::extension_point); the loader
/// machinery is generic over `P: ExtensionPoint + ?Sized`. Only marked
/// interfaces can obtain a loader, so "not an extension point" is a compile
/// error rather than a runtime one.
pub trait ExtensionPoint: Send + Sync + 'static {
	/// Fully qualified dotted name, used to locate descriptor resources.
	const NAME: &'static str;

	/// Default extension name declared on the point, if any.
	const DEFAULT: Option<&'static str>;

	/// Builds the compile-time synthesized adaptive dispatcher, if the point
	/// declares one via [`adaptive_dispatch!`](crate::adaptive_dispatch).
	fn synthesize(env: &Arc<Environment>) -> Option<Result<Arc<Self>, ExtensionError>> {
		let _ = env;
		None
	}

	/// Last dotted segment of [`Self::NAME`].
	fn simple_name() -> &'static str {
		simple_name_of(Self::NAME)
	}
}

/// Last segment of a dotted point name.
pub(crate) fn simple_name_of(name: &str) -> &str {
	name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn simple_name_strips_packages() {
		assert_eq!(simple_name_of("com.acme.LoadBalance"), "LoadBalance");
		assert_eq!(simple_name_of("Robot"), "Robot");
	}
}
