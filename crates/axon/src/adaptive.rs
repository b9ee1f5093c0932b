//! Adaptive dispatch support.
//!
//! The original system emitted dispatcher source code at runtime; here the
//! dispatcher struct is synthesized at compile time by
//! [`adaptive_dispatch!`](crate::adaptive_dispatch) and only the extension
//! name resolution happens per call, through [`resolve_extension_name`].

use std::sync::Arc;

use crate::error::ExtensionError;
use crate::point::{ExtensionPoint, simple_name_of};
use crate::url::{Invocation, Url};

/// Lookup key that reads the URL protocol instead of a parameter.
const PROTOCOL_KEY: &str = "protocol";

/// Cached result of building the adaptive singleton.
pub(crate) enum AdaptiveOutcome<P: ExtensionPoint + ?Sized> {
	Ready(Arc<P>),
	/// Terminal construction failure, re-raised on every later request.
	Failed(ExtensionError),
}

impl<P: ExtensionPoint + ?Sized> AdaptiveOutcome<P> {
	pub(crate) fn to_result(&self) -> Result<Arc<P>, ExtensionError> {
		match self {
			AdaptiveOutcome::Ready(instance) => Ok(instance.clone()),
			AdaptiveOutcome::Failed(err) => Err(err.clone()),
		}
	}
}

/// Derives the lookup key for a method that declares none: upper-case
/// boundaries of the point's simple name become dot separators, so
/// `LoadBalance` turns into `load.balance`.
pub fn derive_point_key(simple_name: &str) -> String {
	let mut key = String::with_capacity(simple_name.len() + 4);
	for (i, ch) in simple_name.char_indices() {
		if ch.is_uppercase() {
			if i != 0 {
				key.push('.');
			}
			key.extend(ch.to_lowercase());
		} else {
			key.push(ch);
		}
	}
	key
}

/// Resolves the extension name for one adaptive call.
///
/// Keys are read right to left building a default chain whose innermost
/// default is the point's declared default name. The `protocol` key reads
/// the URL scheme; any other key reads a URL parameter, scoped through the
/// invocation's method name when one is in scope. An unresolvable name fails
/// with the full key list for diagnosis.
pub fn resolve_extension_name(
	point: &'static str,
	default_name: Option<&'static str>,
	keys: &[&str],
	url: &Url,
	invocation: Option<&Invocation>,
) -> Result<String, ExtensionError> {
	let derived_key;
	let derived_keys;
	let keys: &[&str] = if keys.is_empty() {
		derived_key = derive_point_key(simple_name_of(point));
		derived_keys = [derived_key.as_str()];
		&derived_keys
	} else {
		keys
	};

	let mut resolved: Option<String> = None;
	for (i, key) in keys.iter().enumerate().rev() {
		let terminal = i + 1 == keys.len();
		resolved = if *key == PROTOCOL_KEY {
			let protocol = Some(url.protocol())
				.filter(|p| !p.is_empty())
				.map(str::to_owned);
			if terminal {
				protocol.or_else(|| default_name.map(str::to_owned))
			} else {
				protocol.or(resolved)
			}
		} else if let Some(invocation) = invocation {
			// Method-scoped lookup. Mirrors the original emitter: every key
			// falls back to the point default, not to the accumulated chain.
			url.method_parameter(invocation.method_name(), key)
				.map(str::to_owned)
				.or_else(|| default_name.map(str::to_owned))
		} else if terminal {
			url.parameter(key)
				.map(str::to_owned)
				.or_else(|| default_name.map(str::to_owned))
		} else {
			url.parameter(key).map(str::to_owned).or(resolved)
		};
	}

	resolved.ok_or_else(|| ExtensionError::NameNotResolved {
		point,
		url: url.to_string(),
		keys: keys.iter().map(|key| (*key).to_owned()).collect(),
	})
}
