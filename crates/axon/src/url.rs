//! Request and call-site descriptors consumed by activation and adaptive
//! dispatch.
//!
//! [`Url`] is an opaque request descriptor: a protocol, an authority, a path,
//! and a string parameter map with per-method scoped lookup. The loader never
//! interprets it beyond these accessors; parsing covers the subset the
//! extension machinery consumes.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ExtensionError;

/// An opaque request descriptor.
///
/// Empty parameter values count as absent, so `parameter` and
/// `method_parameter` only ever return non-empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
	protocol: String,
	host: String,
	port: u16,
	path: String,
	parameters: BTreeMap<String, String>,
}

impl Url {
	/// Builds a descriptor from its parts, with no parameters.
	pub fn new(
		protocol: impl Into<String>,
		host: impl Into<String>,
		port: u16,
		path: impl Into<String>,
	) -> Self {
		Self {
			protocol: protocol.into(),
			host: host.into(),
			port,
			path: path.into(),
			parameters: BTreeMap::new(),
		}
	}

	/// Parses `[protocol://][host[:port]][/path][?key=value&...]`.
	///
	/// A missing scheme leaves the protocol empty.
	pub fn parse(text: &str) -> Result<Self, ExtensionError> {
		let trimmed = text.trim();
		if trimmed.is_empty() {
			return Err(ExtensionError::InvalidUrl { text: text.to_owned() });
		}

		let (body, query) = match trimmed.split_once('?') {
			Some((body, query)) => (body, Some(query)),
			None => (trimmed, None),
		};
		let (protocol, rest) = match body.split_once("://") {
			Some((protocol, rest)) => (protocol.to_owned(), rest),
			None => (String::new(), body),
		};
		let (authority, path) = match rest.split_once('/') {
			Some((authority, path)) => (authority, path.to_owned()),
			None => (rest, String::new()),
		};
		let (host, port) = match authority.rsplit_once(':') {
			Some((host, port)) => {
				let port = port
					.parse()
					.map_err(|_| ExtensionError::InvalidUrl { text: text.to_owned() })?;
				(host.to_owned(), port)
			}
			None => (authority.to_owned(), 0),
		};

		let mut parameters = BTreeMap::new();
		if let Some(query) = query {
			for pair in query.split('&').filter(|pair| !pair.is_empty()) {
				match pair.split_once('=') {
					Some((key, value)) => parameters.insert(key.to_owned(), value.to_owned()),
					None => parameters.insert(pair.to_owned(), String::new()),
				};
			}
		}

		Ok(Self { protocol, host, port, path, parameters })
	}

	/// Protocol (scheme), possibly empty.
	#[inline]
	pub fn protocol(&self) -> &str {
		&self.protocol
	}

	/// Host, possibly empty.
	#[inline]
	pub fn host(&self) -> &str {
		&self.host
	}

	/// Port; zero when none was given.
	#[inline]
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Path with the leading slash removed, possibly empty.
	#[inline]
	pub fn path(&self) -> &str {
		&self.path
	}

	/// The full parameter map, including empty values.
	#[inline]
	pub fn parameters(&self) -> &BTreeMap<String, String> {
		&self.parameters
	}

	/// A parameter value; empty values count as absent.
	pub fn parameter(&self, key: &str) -> Option<&str> {
		self.parameters
			.get(key)
			.map(String::as_str)
			.filter(|value| !value.is_empty())
	}

	/// A method-scoped parameter: `<method>.<key>` first, then the plain key.
	pub fn method_parameter(&self, method: &str, key: &str) -> Option<&str> {
		let scoped = format!("{method}.{key}");
		self.parameters
			.get(&scoped)
			.map(String::as_str)
			.filter(|value| !value.is_empty())
			.or_else(|| self.parameter(key))
	}

	/// Returns the descriptor with a parameter added.
	pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.parameters.insert(key.into(), value.into());
		self
	}
}

impl fmt::Display for Url {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if !self.protocol.is_empty() {
			write!(f, "{}://", self.protocol)?;
		}
		f.write_str(&self.host)?;
		if self.port != 0 {
			write!(f, ":{}", self.port)?;
		}
		if !self.path.is_empty() {
			write!(f, "/{}", self.path)?;
		}
		for (i, (key, value)) in self.parameters.iter().enumerate() {
			f.write_str(if i == 0 { "?" } else { "&" })?;
			write!(f, "{key}={value}")?;
		}
		Ok(())
	}
}

/// A call-site descriptor exposing the invoked method name.
///
/// Adaptive methods that receive one resolve their lookup keys through
/// [`Url::method_parameter`] scoped to this name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
	method_name: String,
}

impl Invocation {
	/// Describes a call to `method_name`.
	pub fn new(method_name: impl Into<String>) -> Self {
		Self { method_name: method_name.into() }
	}

	/// Name of the invoked method.
	#[inline]
	pub fn method_name(&self) -> &str {
		&self.method_name
	}
}
