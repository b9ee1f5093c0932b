//! Declarative registration macros.
//!
//! Crates invoking these macros need `linkme` and `paste` in their own
//! dependency tables; the expansions reference both by name, the same way
//! the descriptors they generate reference `$crate` items.

/// Declares a trait object as an extension point.
///
/// ```ignore
/// axon::extension_point! {
/// 	/// Robots say hello.
/// 	dyn Robot, name = "demo.Robot", default = "optimusPrime";
/// }
/// ```
///
/// `name` is the dotted descriptor-file name. `default` declares the default
/// extension; `adaptive` names a dispatcher generated by
/// [`adaptive_dispatch!`](crate::adaptive_dispatch). The trait must be object
/// safe and `Send + Sync`.
#[macro_export]
macro_rules! extension_point {
	(
		$(#[$meta:meta])*
		dyn $trait:ident, name = $name:expr $(, default = $default:expr)? $(, adaptive = $dispatcher:ty)? ;
	) => {
		$(#[$meta])*
		impl $crate::ExtensionPoint for dyn $trait {
			const NAME: &'static str = $name;
			const DEFAULT: ::core::option::Option<&'static str> = $crate::__axon_opt!($($default)?);

			$(
				fn synthesize(
					env: &::std::sync::Arc<$crate::Environment>,
				) -> ::core::option::Option<
					::core::result::Result<::std::sync::Arc<Self>, $crate::ExtensionError>,
				> {
					::core::option::Option::Some(<$dispatcher>::synthesize(env))
				}
			)?
		}

		paste::paste! {
			#[linkme::distributed_slice($crate::provider::POINTS)]
			static [<__AXON_POINT_ $trait:upper>]: $crate::PointDef = $crate::PointDef {
				name: $name,
				loader: |env| {
					let loader: ::std::sync::Arc<dyn $crate::ErasedLoader> =
						env.loader::<dyn $trait>()?;
					::core::result::Result::Ok(loader)
				},
			};
		}
	};
}

/// Registers a provider descriptor for an extension point.
///
/// Three shapes mirror the three provider categories:
///
/// ```ignore
/// axon::extension_provider! {
/// 	/// Ordinary provider; `ctor` builds the concrete value.
/// 	provider OPTIMUS_PRIME {
/// 		class: OptimusPrime,
/// 		point: dyn Robot,
/// 		path: "demo::OptimusPrime",
/// 		ctor: |_env| Ok(OptimusPrime),
/// 	}
/// }
///
/// axon::extension_provider! {
/// 	/// Wrapper; `ctor` receives the instance it decorates.
/// 	wrapper LOGGING_WRAPPER {
/// 		class: LoggingRobotWrapper,
/// 		point: dyn Robot,
/// 		path: "demo::LoggingRobotWrapper",
/// 		ctor: |_env, inner| Ok(LoggingRobotWrapper { inner }),
/// 	}
/// }
/// ```
///
/// Ordinary providers accept optional `name:` (the inline name used when a
/// descriptor line has none), `activate: { groups: [..], keys: [..],
/// order: N, }`, and `deps: [{ property: "p", point: dyn Dep, assign: |t, d|
/// t.set_p(d) }]` fields, in that order relative to `ctor`.
#[macro_export]
macro_rules! extension_provider {
	(
		$(#[$meta:meta])*
		$vis:vis provider $id:ident {
			class: $class:ty,
			point: $point:ty,
			path: $path:expr,
			$(name: $hint:expr,)?
			$(activate: { $($activate:tt)* },)?
			ctor: $ctor:expr,
			$(deps: [$($deps:tt)*],)?
		}
	) => {
		$(#[$meta])*
		#[linkme::distributed_slice($crate::provider::PROVIDERS)]
		$vis static $id: $crate::ProviderDef = $crate::ProviderDef {
			path: $path,
			point: <$point as $crate::ExtensionPoint>::NAME,
			ctor: $crate::ProviderCtor::Ordinary({
				fn __ctor(
					env: &::std::sync::Arc<$crate::Environment>,
				) -> ::core::result::Result<$crate::ErasedExtension, $crate::ExtensionError> {
					let built: ::core::result::Result<$class, $crate::ExtensionError> =
						($ctor)(env);
					let concrete = ::std::sync::Arc::new(built?);
					let instance: ::std::sync::Arc<$point> = concrete.clone();
					::core::result::Result::Ok($crate::ErasedExtension::from_parts(
						instance, concrete,
					))
				}
				__ctor
			}),
			name_hint: $crate::__axon_opt!($($hint)?),
			activate: $crate::__axon_activate!($($($activate)*)?),
			deps: $crate::__axon_deps!($class; $($($deps)*)?),
		};
	};
	(
		$(#[$meta:meta])*
		$vis:vis wrapper $id:ident {
			class: $class:ty,
			point: $point:ty,
			path: $path:expr,
			ctor: $ctor:expr,
			$(deps: [$($deps:tt)*],)?
		}
	) => {
		$(#[$meta])*
		#[linkme::distributed_slice($crate::provider::PROVIDERS)]
		$vis static $id: $crate::ProviderDef = $crate::ProviderDef {
			path: $path,
			point: <$point as $crate::ExtensionPoint>::NAME,
			ctor: $crate::ProviderCtor::Wrapper({
				fn __ctor(
					env: &::std::sync::Arc<$crate::Environment>,
					inner: $crate::ErasedExtension,
				) -> ::core::result::Result<$crate::ErasedExtension, $crate::ExtensionError> {
					let inner: ::std::sync::Arc<$point> = inner.downcast::<$point>().ok_or(
						$crate::ExtensionError::PointMismatch {
							path: $path,
							point: <$point as $crate::ExtensionPoint>::NAME,
						},
					)?;
					let built: ::core::result::Result<$class, $crate::ExtensionError> =
						($ctor)(env, inner);
					let concrete = ::std::sync::Arc::new(built?);
					let instance: ::std::sync::Arc<$point> = concrete.clone();
					::core::result::Result::Ok($crate::ErasedExtension::from_parts(
						instance, concrete,
					))
				}
				__ctor
			}),
			name_hint: ::core::option::Option::None,
			activate: ::core::option::Option::None,
			deps: $crate::__axon_deps!($class; $($($deps)*)?),
		};
	};
	(
		$(#[$meta:meta])*
		$vis:vis adaptive $id:ident {
			class: $class:ty,
			point: $point:ty,
			path: $path:expr,
			ctor: $ctor:expr,
			$(deps: [$($deps:tt)*],)?
		}
	) => {
		$(#[$meta])*
		#[linkme::distributed_slice($crate::provider::PROVIDERS)]
		$vis static $id: $crate::ProviderDef = $crate::ProviderDef {
			path: $path,
			point: <$point as $crate::ExtensionPoint>::NAME,
			ctor: $crate::ProviderCtor::Adaptive({
				fn __ctor(
					env: &::std::sync::Arc<$crate::Environment>,
				) -> ::core::result::Result<$crate::ErasedExtension, $crate::ExtensionError> {
					let built: ::core::result::Result<$class, $crate::ExtensionError> =
						($ctor)(env);
					let concrete = ::std::sync::Arc::new(built?);
					let instance: ::std::sync::Arc<$point> = concrete.clone();
					::core::result::Result::Ok($crate::ErasedExtension::from_parts(
						instance, concrete,
					))
				}
				__ctor
			}),
			name_hint: ::core::option::Option::None,
			activate: ::core::option::Option::None,
			deps: $crate::__axon_deps!($class; $($($deps)*)?),
		};
	};
}

/// Synthesizes the adaptive dispatcher for an extension point.
///
/// Every listed method either dispatches adaptively or is marked
/// `unsupported`. Adaptive methods name the expression binding their request
/// URL, optionally the expression binding an [`Invocation`](crate::Invocation),
/// and their lookup keys (an empty list derives one from the point's simple
/// name). All listed methods must return `Result<_, ExtensionError>`.
///
/// ```ignore
/// axon::adaptive_dispatch! {
/// 	/// Call-time dispatcher for [`Protocol`].
/// 	pub struct ProtocolAdaptive: Protocol {
/// 		fn refer(&self, service: &str, url: &Url) -> Result<String, ExtensionError> {
/// 			url = url;
/// 			keys = ["protocol"];
/// 		}
/// 		fn destroy(&self) -> Result<(), ExtensionError> {
/// 			unsupported;
/// 		}
/// 	}
/// }
/// ```
#[macro_export]
macro_rules! adaptive_dispatch {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident : $trait:ident {
			$($methods:tt)*
		}
	) => {
		$(#[$meta])*
		$vis struct $name {
			loader: ::std::sync::Arc<$crate::ExtensionLoader<dyn $trait>>,
		}

		impl $name {
			/// Builds the dispatcher against an environment.
			pub fn synthesize(
				env: &::std::sync::Arc<$crate::Environment>,
			) -> ::core::result::Result<::std::sync::Arc<dyn $trait>, $crate::ExtensionError> {
				::core::result::Result::Ok(::std::sync::Arc::new(Self {
					loader: env.loader::<dyn $trait>()?,
				}))
			}
		}

		impl $trait for $name {
			$crate::__adaptive_methods! { $trait; $($methods)* }
		}
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __adaptive_methods {
	($trait:ident;) => {};
	(
		$trait:ident;
		$(#[$meta:meta])*
		fn $method:ident(&self $(, $arg:ident : $aty:ty)* $(,)?) -> $ret:ty {
			unsupported;
		}
		$($rest:tt)*
	) => {
		$(#[$meta])*
		fn $method(&self $(, $arg: $aty)*) -> $ret {
			$(let _ = $arg;)*
			::core::result::Result::Err($crate::ExtensionError::NotAdaptive {
				point: <dyn $trait as $crate::ExtensionPoint>::NAME,
				method: stringify!($method),
			})
		}
		$crate::__adaptive_methods! { $trait; $($rest)* }
	};
	(
		$trait:ident;
		$(#[$meta:meta])*
		fn $method:ident(&self $(, $arg:ident : $aty:ty)* $(,)?) -> $ret:ty {
			url = $url:expr;
			invocation = $invocation:expr;
			keys = [$($key:expr),* $(,)?];
		}
		$($rest:tt)*
	) => {
		$(#[$meta])*
		fn $method(&self $(, $arg: $aty)*) -> $ret {
			let url: &$crate::Url = $url;
			let invocation: &$crate::Invocation = $invocation;
			let name = $crate::adaptive::resolve_extension_name(
				<dyn $trait as $crate::ExtensionPoint>::NAME,
				<dyn $trait as $crate::ExtensionPoint>::DEFAULT,
				&[$($key),*],
				url,
				::core::option::Option::Some(invocation),
			)?;
			let extension = self.loader.by_name(&name)?;
			extension.$method($($arg),*)
		}
		$crate::__adaptive_methods! { $trait; $($rest)* }
	};
	(
		$trait:ident;
		$(#[$meta:meta])*
		fn $method:ident(&self $(, $arg:ident : $aty:ty)* $(,)?) -> $ret:ty {
			url = $url:expr;
			keys = [$($key:expr),* $(,)?];
		}
		$($rest:tt)*
	) => {
		$(#[$meta])*
		fn $method(&self $(, $arg: $aty)*) -> $ret {
			let url: &$crate::Url = $url;
			let name = $crate::adaptive::resolve_extension_name(
				<dyn $trait as $crate::ExtensionPoint>::NAME,
				<dyn $trait as $crate::ExtensionPoint>::DEFAULT,
				&[$($key),*],
				url,
				::core::option::Option::None,
			)?;
			let extension = self.loader.by_name(&name)?;
			extension.$method($($arg),*)
		}
		$crate::__adaptive_methods! { $trait; $($rest)* }
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __axon_opt {
	() => {
		::core::option::Option::None
	};
	($value:expr) => {
		::core::option::Option::Some($value)
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __axon_activate {
	() => {
		::core::option::Option::None
	};
	($(groups: [$($group:expr),* $(,)?],)? $(keys: [$($key:expr),* $(,)?],)? order: $order:expr $(,)?) => {
		::core::option::Option::Some($crate::ActivateDef {
			groups: &[$($($group),*)?],
			keys: &[$($($key),*)?],
			order: $order,
		})
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __axon_deps {
	($class:ty;) => {
		&[]
	};
	($class:ty; $({ property: $prop:expr, point: $dpoint:ty, assign: $assign:expr }),+ $(,)?) => {
		&[$(
			$crate::DepDef {
				property: $prop,
				point: <$dpoint as $crate::ExtensionPoint>::NAME,
				assign: {
					fn __assign(
						target: &$crate::ErasedExtension,
						value: $crate::ErasedExtension,
					) -> ::core::result::Result<(), $crate::ExtensionError> {
						let target = target.concrete::<$class>().ok_or(
							$crate::ExtensionError::DependencyType {
								point: <$dpoint as $crate::ExtensionPoint>::NAME,
								property: $prop,
							},
						)?;
						let value = value.downcast::<$dpoint>().ok_or(
							$crate::ExtensionError::DependencyType {
								point: <$dpoint as $crate::ExtensionPoint>::NAME,
								property: $prop,
							},
						)?;
						($assign)(&target, value);
						::core::result::Result::Ok(())
					}
					__assign
				},
			}
		),+]
	};
}
