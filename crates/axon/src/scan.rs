//! Descriptor resource scanning.
//!
//! Descriptors live under three directories of decreasing precedence, each
//! holding one file per extension point named after the point. Resources come
//! from embedded [`ResourceDef`](crate::provider::ResourceDef) statics and
//! from files under the environment's search roots; all readable resources
//! are merged.

use crate::env::Environment;

/// Descriptor directories, highest precedence first.
pub(crate) const DIRECTORIES: [&str; 3] =
	["META-INF/axon/internal/", "META-INF/axon/", "META-INF/services/"];

/// One effective descriptor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
	/// Alias list from the left of `=`, if the line had one.
	pub name: Option<String>,
	/// Provider path literal.
	pub class: String,
	/// Resource the line came from, for diagnostics.
	pub resource: String,
}

/// Collects every effective descriptor line for a point, in precedence order.
pub(crate) fn scan_point(env: &Environment, point_name: &str) -> Vec<RawEntry> {
	let mut entries = Vec::new();
	for dir in DIRECTORIES {
		let rel = format!("{dir}{point_name}");
		for (origin, contents) in env.resources(&rel) {
			parse_resource(&origin, &contents, &mut entries);
		}
	}
	entries
}

/// Parses one resource body line by line.
///
/// `#` starts a comment running to end of line; blank lines are skipped. A
/// line is either `NAME_LIST = CLASS` or a bare `CLASS`. Lines with an empty
/// class side are dropped.
fn parse_resource(origin: &str, contents: &str, entries: &mut Vec<RawEntry>) {
	for raw_line in contents.lines() {
		let line = match raw_line.find('#') {
			Some(i) => &raw_line[..i],
			None => raw_line,
		};
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		let (name, class) = match line.find('=') {
			Some(i) if i > 0 => {
				let name = line[..i].trim();
				let class = line[i + 1..].trim();
				(if name.is_empty() { None } else { Some(name.to_owned()) }, class)
			}
			_ => (None, line),
		};
		if class.is_empty() {
			continue;
		}

		entries.push(RawEntry {
			name,
			class: class.to_owned(),
			resource: origin.to_owned(),
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(contents: &str) -> Vec<RawEntry> {
		let mut entries = Vec::new();
		parse_resource("test", contents, &mut entries);
		entries
	}

	#[test]
	fn parses_named_and_bare_lines() {
		let entries = parse(
			"# robots\n\
			 optimusPrime = demo::OptimusPrime\n\
			 demo::Bumblebee\n",
		);
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].name.as_deref(), Some("optimusPrime"));
		assert_eq!(entries[0].class, "demo::OptimusPrime");
		assert_eq!(entries[1].name, None);
		assert_eq!(entries[1].class, "demo::Bumblebee");
	}

	#[test]
	fn truncates_trailing_comments_and_whitespace() {
		let entries = parse("  a , b =  demo::Impl   # aliases\n");
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].name.as_deref(), Some("a , b"));
		assert_eq!(entries[0].class, "demo::Impl");
	}

	#[test]
	fn skips_blank_and_comment_only_lines() {
		assert!(parse("\n   \n# nothing here\n").is_empty());
	}

	#[test]
	fn keeps_malformed_equals_line_as_class_literal() {
		// A leading `=` cannot carry a name; the whole line becomes the
		// class literal and fails provider lookup later.
		let entries = parse("=demo::Broken\n");
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].name, None);
		assert_eq!(entries[0].class, "=demo::Broken");
	}

	#[test]
	fn drops_lines_with_empty_class_side() {
		assert!(parse("name = \n").is_empty());
	}
}
