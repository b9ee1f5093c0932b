//! Rule-based activation of extension subsets.
//!
//! Activation merges two lists: extensions whose metadata matches the group
//! and the request URL (sorted by their declared order), and the names the
//! caller asked for explicitly. Requested names support a `-` removal prefix
//! and the `default` placeholder, which splices the names accumulated so far
//! in front of the automatic set.

use std::sync::Arc;

use crate::error::ExtensionError;
use crate::loader::ExtensionLoader;
use crate::point::ExtensionPoint;
use crate::provider::ActivateDef;
use crate::url::Url;

/// Prefix marking a requested name as a removal filter.
const REMOVE_PREFIX: char = '-';

/// Placeholder splicing user names before the auto-activated set.
const DEFAULT_KEY: &str = "default";

impl<P: ExtensionPoint + ?Sized> ExtensionLoader<P> {
	/// Activatable extensions for `url`, with no user names and no group.
	pub fn activate_default(&self, url: &Url) -> Result<Vec<Arc<P>>, ExtensionError> {
		self.activate(url, &[], None)
	}

	/// Requested names taken from the `key` URL parameter, comma separated.
	pub fn activate_key(&self, url: &Url, key: &str) -> Result<Vec<Arc<P>>, ExtensionError> {
		self.activate_key_group(url, key, None)
	}

	/// Requested names taken from the `key` URL parameter, filtered by group.
	pub fn activate_key_group(
		&self,
		url: &Url,
		key: &str,
		group: Option<&str>,
	) -> Result<Vec<Arc<P>>, ExtensionError> {
		let value = url.parameter(key);
		let requested: Vec<&str> = value
			.map(|value| {
				value
					.split(',')
					.map(str::trim)
					.filter(|name| !name.is_empty())
					.collect()
			})
			.unwrap_or_default();
		self.activate(url, &requested, group)
	}

	/// The ordered activation list for `url`, `requested`, and `group`.
	pub fn activate(
		&self,
		url: &Url,
		requested: &[&str],
		group: Option<&str>,
	) -> Result<Vec<Arc<P>>, ExtensionError> {
		let removed: Vec<&str> = requested
			.iter()
			.filter_map(|name| name.strip_prefix(REMOVE_PREFIX))
			.collect();

		let mut activated: Vec<Arc<P>> = Vec::new();
		if !removed.contains(&DEFAULT_KEY) {
			let registry = self.registry()?;
			let mut auto: Vec<(i32, Arc<P>)> = Vec::new();
			for (name, activate) in &registry.activates {
				if !group_matches(group, activate.groups) {
					continue;
				}
				if requested.iter().any(|r| *r == name.as_str())
					|| removed.iter().any(|r| *r == name.as_str())
				{
					continue;
				}
				if !is_active(activate, url) {
					continue;
				}
				auto.push((activate.order, self.by_name(name)?));
			}
			auto.sort_by_key(|(order, _)| *order);
			activated.extend(auto.into_iter().map(|(_, instance)| instance));
		}

		let mut user: Vec<Arc<P>> = Vec::new();
		for name in requested {
			if name.starts_with(REMOVE_PREFIX) || removed.contains(name) {
				continue;
			}
			if *name == DEFAULT_KEY {
				if !user.is_empty() {
					activated.splice(0..0, user.drain(..));
				}
			} else {
				user.push(self.by_name(name)?);
			}
		}
		activated.extend(user);
		Ok(activated)
	}
}

/// Whether the entry's groups admit the requested group. An empty requested
/// group matches every entry; an entry with no groups matches every group.
fn group_matches(group: Option<&str>, groups: &[&str]) -> bool {
	match group {
		None | Some("") => true,
		Some(group) => groups.is_empty() || groups.contains(&group),
	}
}

/// Whether the URL triggers the entry: no trigger keys, or some parameter
/// whose key equals a trigger key (or ends in `.` + key) with a non-empty
/// value.
fn is_active(activate: &ActivateDef, url: &Url) -> bool {
	if activate.keys.is_empty() {
		return true;
	}
	for key in activate.keys {
		for (k, v) in url.parameters() {
			if (k == key || k.ends_with(&format!(".{key}"))) && !v.is_empty() {
				return true;
			}
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use super::*;

	fn meta(
		groups: &'static [&'static str],
		keys: &'static [&'static str],
		order: i32,
	) -> ActivateDef {
		ActivateDef { groups, keys, order }
	}

	#[test]
	fn empty_groups_match_every_group() {
		assert!(group_matches(None, &["provider"]));
		assert!(group_matches(Some(""), &["provider"]));
		assert!(group_matches(Some("consumer"), &[]));
		assert!(group_matches(Some("provider"), &["provider", "consumer"]));
		assert!(!group_matches(Some("consumer"), &["provider"]));
	}

	#[test]
	fn trigger_keys_match_plain_and_suffixed_parameters() {
		let activate = meta(&[], &["cache"], 0);

		let plain = Url::new("dubbo", "h", 0, "").with_parameter("cache", "lru");
		assert!(is_active(&activate, &plain));

		let suffixed = Url::new("dubbo", "h", 0, "").with_parameter("findAll.cache", "lru");
		assert!(is_active(&activate, &suffixed));

		let empty = Url::new("dubbo", "h", 0, "").with_parameter("cache", "");
		assert!(!is_active(&activate, &empty));

		let unrelated = Url::new("dubbo", "h", 0, "").with_parameter("validation", "x");
		assert!(!is_active(&activate, &unrelated));
	}

	#[test]
	fn no_trigger_keys_always_activate() {
		let activate = meta(&[], &[], 0);
		assert!(is_active(&activate, &Url::new("dubbo", "h", 0, "")));
	}
}
