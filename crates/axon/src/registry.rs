//! Per-point classification of discovered providers.
//!
//! One immutable [`PointRegistry`] is built per extension point from the
//! scanned descriptor lines. Line-level load failures are captured into the
//! registry's error dictionary and deferred until a request actually names
//! them; duplicate bindings and duplicate adaptive providers abort the build.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::env::Environment;
use crate::error::ExtensionError;
use crate::point::simple_name_of;
use crate::provider::{ActivateDef, ProviderCtor, ProviderDef, provider_by_path};
use crate::scan::{RawEntry, scan_point};

/// Classified providers of one extension point.
#[derive(Clone, Default)]
pub(crate) struct PointRegistry {
	/// Every bound name (aliases included) to its provider.
	pub names: FxHashMap<String, &'static ProviderDef>,
	/// Provider path to its canonical name (first alias).
	pub canonical: FxHashMap<&'static str, String>,
	/// Wrapper providers in discovery order.
	pub wrappers: Vec<&'static ProviderDef>,
	/// The hand-written adaptive dispatcher, at most one.
	pub adaptive: Option<&'static ProviderDef>,
	/// Activation metadata keyed by canonical name, in discovery order.
	pub activates: Vec<(String, &'static ActivateDef)>,
	/// Default name declared on the point.
	pub default_name: Option<&'static str>,
	/// Per-line load failures keyed by the failing class literal.
	pub errors: FxHashMap<String, ExtensionError>,
}

/// Splits an alias list on commas, dropping surrounding whitespace and empty
/// tokens.
pub(crate) fn split_names(value: &str) -> Vec<&str> {
	value
		.split(',')
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.collect()
}

/// Scans and classifies all providers of `point`.
pub(crate) fn build_registry(
	env: &Environment,
	point: &'static str,
	default: Option<&'static str>,
) -> Result<PointRegistry, ExtensionError> {
	let mut registry = PointRegistry::default();

	if let Some(value) = default {
		let tokens = split_names(value);
		if tokens.len() > 1 {
			return Err(ExtensionError::MultipleDefaultNames { point, value });
		}
		registry.default_name = tokens.first().copied();
	}

	for entry in scan_point(env, point) {
		load_entry(&mut registry, point, &entry)?;
	}
	Ok(registry)
}

/// Classifies one descriptor line into the registry.
///
/// Returns `Err` only for configuration errors (duplicate names, duplicate
/// adaptive providers); everything else is captured into the error dictionary
/// so the rest of the scan proceeds.
fn load_entry(
	registry: &mut PointRegistry,
	point: &'static str,
	entry: &RawEntry,
) -> Result<(), ExtensionError> {
	let Some(def) = provider_by_path(&entry.class) else {
		capture(registry, point, entry, "provider is not linked into this binary".to_owned());
		return Ok(());
	};
	if def.point != point {
		capture(
			registry,
			point,
			entry,
			format!("provider implements {}, not {}", def.point, point),
		);
		return Ok(());
	}

	match def.ctor {
		ProviderCtor::Adaptive(_) => match registry.adaptive {
			None => registry.adaptive = Some(def),
			Some(existing) if std::ptr::eq(existing, def) => {}
			Some(existing) => {
				return Err(ExtensionError::DuplicateAdaptive {
					point,
					existing: existing.path,
					duplicate: def.path,
				});
			}
		},
		ProviderCtor::Wrapper(_) => {
			if !registry.wrappers.iter().any(|w| std::ptr::eq(*w, def)) {
				registry.wrappers.push(def);
			}
		}
		ProviderCtor::Ordinary(_) => {
			let name = match &entry.name {
				Some(name) => name.clone(),
				None => infer_name(def, point),
			};
			if name.is_empty() {
				capture(
					registry,
					point,
					entry,
					format!("no extension name for provider {}", def.path),
				);
				return Ok(());
			}

			let tokens = split_names(&name);
			if let Some(first) = tokens.first() {
				if let Some(activate) = &def.activate {
					registry.activates.push(((*first).to_owned(), activate));
				}
				registry
					.canonical
					.entry(def.path)
					.or_insert_with(|| (*first).to_owned());
			}
			for token in tokens {
				match registry.names.get(token) {
					None => {
						registry.names.insert(token.to_owned(), def);
					}
					Some(existing) if std::ptr::eq(*existing, def) => {}
					Some(existing) => {
						return Err(ExtensionError::DuplicateName {
							point,
							name: token.to_owned(),
							existing: existing.path,
							duplicate: def.path,
						});
					}
				}
			}
		}
	}
	Ok(())
}

/// Derives the name for an ordinary provider listed without one: the inline
/// hint if present, otherwise the simple type name with a trailing point
/// simple name stripped, lower-cased.
fn infer_name(def: &'static ProviderDef, point: &'static str) -> String {
	if let Some(hint) = def.name_hint {
		return hint.to_owned();
	}
	let simple = def.simple_name();
	let stripped = simple.strip_suffix(simple_name_of(point)).unwrap_or(simple);
	stripped.to_lowercase()
}

fn capture(registry: &mut PointRegistry, point: &'static str, entry: &RawEntry, reason: String) {
	warn!(point, line = %entry.class, resource = %entry.resource, "failed to load extension provider: {reason}");
	registry.errors.insert(
		entry.class.clone(),
		ExtensionError::ClassLoad {
			point,
			line: entry.class.clone(),
			resource: entry.resource.clone(),
			reason,
		},
	);
}

#[cfg(test)]
mod tests {
	use linkme::distributed_slice;

	use super::*;
	use crate::provider::PROVIDERS;

	const POINT: &str = "axon.test.registry.Widget";

	#[distributed_slice(PROVIDERS)]
	static FIRST: ProviderDef = ProviderDef {
		path: "registry_tests::FirstWidget",
		point: POINT,
		ctor: ProviderCtor::Ordinary(|_| unreachable!()),
		name_hint: None,
		activate: None,
		deps: &[],
	};

	#[distributed_slice(PROVIDERS)]
	static SECOND: ProviderDef = ProviderDef {
		path: "registry_tests::SecondWidget",
		point: POINT,
		ctor: ProviderCtor::Ordinary(|_| unreachable!()),
		name_hint: None,
		activate: None,
		deps: &[],
	};

	fn entry(name: Option<&str>, class: &str) -> RawEntry {
		RawEntry {
			name: name.map(str::to_owned),
			class: class.to_owned(),
			resource: "test".to_owned(),
		}
	}

	#[test]
	fn split_names_handles_whitespace_and_runs() {
		assert_eq!(split_names("a, b"), vec!["a", "b"]);
		assert_eq!(split_names("a ,, b"), vec!["a", "b"]);
		assert_eq!(split_names("  solo  "), vec!["solo"]);
		assert!(split_names("  ").is_empty());
	}

	#[test]
	fn infers_name_from_simple_type_name() {
		static DEF: ProviderDef = ProviderDef {
			path: "demo::robots::TeleportRobot",
			point: "demo.Robot",
			ctor: ProviderCtor::Ordinary(|_| unreachable!()),
			name_hint: None,
			activate: None,
			deps: &[],
		};
		assert_eq!(infer_name(&DEF, "demo.Robot"), "teleport");
	}

	#[test]
	fn name_hint_wins_over_inference() {
		static DEF: ProviderDef = ProviderDef {
			path: "demo::robots::TeleportRobot",
			point: "demo.Robot",
			ctor: ProviderCtor::Ordinary(|_| unreachable!()),
			name_hint: Some("blink"),
			activate: None,
			deps: &[],
		};
		assert_eq!(infer_name(&DEF, "demo.Robot"), "blink");
	}

	#[test]
	fn duplicate_name_on_distinct_providers_is_fatal() {
		let mut registry = PointRegistry::default();
		load_entry(&mut registry, POINT, &entry(Some("x"), "registry_tests::FirstWidget"))
			.unwrap();

		let result =
			load_entry(&mut registry, POINT, &entry(Some("x"), "registry_tests::SecondWidget"));
		assert!(matches!(result, Err(ExtensionError::DuplicateName { .. })));
	}

	#[test]
	fn rebinding_the_same_provider_is_idempotent() {
		let mut registry = PointRegistry::default();
		load_entry(&mut registry, POINT, &entry(Some("x"), "registry_tests::FirstWidget"))
			.unwrap();
		load_entry(&mut registry, POINT, &entry(Some("x"), "registry_tests::FirstWidget"))
			.unwrap();
		assert_eq!(registry.names.len(), 1);
	}

	#[test]
	fn alias_list_binds_every_token_with_first_canonical() {
		let mut registry = PointRegistry::default();
		load_entry(&mut registry, POINT, &entry(Some("a, b"), "registry_tests::FirstWidget"))
			.unwrap();

		assert!(registry.names.contains_key("a"));
		assert!(registry.names.contains_key("b"));
		assert_eq!(
			registry.canonical.get("registry_tests::FirstWidget").map(String::as_str),
			Some("a")
		);
	}

	#[test]
	fn unknown_provider_path_is_captured_not_fatal() {
		let mut registry = PointRegistry::default();
		load_entry(&mut registry, POINT, &entry(None, "registry_tests::Missing")).unwrap();

		assert!(registry.names.is_empty());
		assert!(registry.errors.contains_key("registry_tests::Missing"));
	}

	#[test]
	fn wrong_point_is_captured_not_fatal() {
		let mut registry = PointRegistry::default();
		load_entry(
			&mut registry,
			"axon.test.registry.Other",
			&entry(None, "registry_tests::FirstWidget"),
		)
		.unwrap();

		assert!(registry.names.is_empty());
		assert!(registry.errors.contains_key("registry_tests::FirstWidget"));
	}
}
