//! Error types for the extension loading machinery.

/// Errors raised by loaders, registries, and adaptive dispatch.
///
/// The type is `Clone` because a terminal adaptive-construction failure is
/// cached in the adaptive holder and re-raised on every later request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtensionError {
	/// A lookup was attempted with an empty extension name.
	#[error("extension name must not be empty")]
	EmptyName,

	/// The extension point declares a multi-token default name.
	#[error("more than one default extension name on point {point}: {value:?}")]
	MultipleDefaultNames {
		point: &'static str,
		value: &'static str,
	},

	/// The default extension was requested on a point with no usable default.
	#[error("extension point {point} has no default extension")]
	NoDefault { point: &'static str },

	/// Two descriptor lines bind the same name to different providers.
	#[error("duplicate extension {point} name {name} on {existing} and {duplicate}")]
	DuplicateName {
		point: &'static str,
		name: String,
		existing: &'static str,
		duplicate: &'static str,
	},

	/// A second adaptive provider was discovered for the same point.
	#[error("more than one adaptive provider for {point}: {existing} and {duplicate}")]
	DuplicateAdaptive {
		point: &'static str,
		existing: &'static str,
		duplicate: &'static str,
	},

	/// A descriptor line could not be resolved to a usable provider.
	#[error("failed to load extension provider (point {point}, line {line:?}) in {resource}: {reason}")]
	ClassLoad {
		point: &'static str,
		line: String,
		resource: String,
		reason: String,
	},

	/// No provider is bound to the requested name.
	///
	/// `report` carries the collected per-line load failures, if any.
	#[error("no such extension {point} by name {name}{report}")]
	NotFound {
		point: &'static str,
		name: String,
		report: String,
	},

	/// A provider constructor failed while materializing an instance.
	#[error("extension instance (name: {name}, point: {point}) could not be built: {reason}")]
	Construction {
		point: &'static str,
		name: String,
		reason: String,
	},

	/// Building the adaptive instance failed.
	#[error("fail to create adaptive instance for {point}: {reason}")]
	Adaptive { point: &'static str, reason: String },

	/// The point has neither an adaptive provider nor a synthesized dispatcher.
	#[error("no adaptive method on extension point {point}, refuse to create the adaptive instance")]
	NoAdaptiveSupport { point: &'static str },

	/// A non-adaptive method was called on an adaptive dispatcher.
	#[error("method {method} of extension point {point} is not adaptive")]
	NotAdaptive {
		point: &'static str,
		method: &'static str,
	},

	/// No extension name could be resolved from the request URL.
	#[error("fail to get extension ({point}) name from url ({url}) use keys ({keys:?})")]
	NameNotResolved {
		point: &'static str,
		url: String,
		keys: Vec<String>,
	},

	/// `register` was given a name that is already bound.
	#[error("extension name {name} already registered on point {point}")]
	AlreadyRegistered { point: &'static str, name: String },

	/// `replace` was given a name (or adaptive slot) that is not bound.
	#[error("extension name {name} not registered on point {point}")]
	NotRegistered { point: &'static str, name: String },

	/// An erased instance did not hold the expected extension point type.
	#[error("provider {path} does not implement extension point {point}")]
	PointMismatch {
		path: &'static str,
		point: &'static str,
	},

	/// A resolved dependency did not hold the expected point type.
	#[error("dependency {property} for point {point} has an unexpected type")]
	DependencyType {
		point: &'static str,
		property: &'static str,
	},

	/// A request descriptor could not be parsed.
	#[error("malformed url {text:?}")]
	InvalidUrl { text: String },
}
