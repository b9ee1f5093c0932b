//! Dependency injection scenarios: declared dependencies resolved through
//! the adaptive extension factory, adaptive dependencies routed per call,
//! and unsatisfiable properties skipped without aborting construction.

mod common;

use std::sync::{Arc, OnceLock};

use axon::{ExtensionError, Url};
use common::{unique_temp_dir, write_descriptor};

// Transporter: the dependency point, with adaptive dispatch on "transporter".

pub trait Transporter: Send + Sync {
	fn connect(&self, url: &Url) -> Result<String, ExtensionError>;
}

axon::adaptive_dispatch! {
	/// Call-time dispatcher for [`Transporter`].
	struct TransporterAdaptive: Transporter {
		fn connect(&self, url: &Url) -> Result<String, ExtensionError> {
			url = url;
			keys = ["transporter"];
		}
	}
}

axon::extension_point! {
	dyn Transporter, name = "demo.Transporter", default = "netty", adaptive = TransporterAdaptive;
}

struct NettyTransporter;

impl Transporter for NettyTransporter {
	fn connect(&self, _url: &Url) -> Result<String, ExtensionError> {
		Ok("netty".to_owned())
	}
}

axon::extension_provider! {
	provider NETTY_TRANSPORTER {
		class: NettyTransporter,
		point: dyn Transporter,
		path: "transport::NettyTransporter",
		ctor: |_env| Ok(NettyTransporter),
	}
}

struct MinaTransporter;

impl Transporter for MinaTransporter {
	fn connect(&self, _url: &Url) -> Result<String, ExtensionError> {
		Ok("mina".to_owned())
	}
}

axon::extension_provider! {
	provider MINA_TRANSPORTER {
		class: MinaTransporter,
		point: dyn Transporter,
		path: "transport::MinaTransporter",
		ctor: |_env| Ok(MinaTransporter),
	}
}

// Codec: a point that exists but has no providers anywhere.

pub trait Codec: Send + Sync {
	fn encode(&self) -> &'static str;
}

axon::extension_point! {
	dyn Codec, name = "demo.Codec";
}

// Remoting: the consumer point whose provider declares dependencies.

pub trait Remoting: Send + Sync {
	fn call(&self, url: &Url) -> Result<String, ExtensionError>;
	fn codec_name(&self) -> Option<&'static str>;
}

axon::extension_point! {
	dyn Remoting, name = "demo.Remoting";
}

struct HttpRemoting {
	transporter: OnceLock<Arc<dyn Transporter>>,
	codec: OnceLock<Arc<dyn Codec>>,
}

impl HttpRemoting {
	fn set_transporter(&self, transporter: Arc<dyn Transporter>) {
		let _ = self.transporter.set(transporter);
	}

	fn set_codec(&self, codec: Arc<dyn Codec>) {
		let _ = self.codec.set(codec);
	}
}

impl Remoting for HttpRemoting {
	fn call(&self, url: &Url) -> Result<String, ExtensionError> {
		match self.transporter.get() {
			Some(transporter) => transporter.connect(url),
			None => Err(ExtensionError::Construction {
				point: "demo.Remoting",
				name: "http".to_owned(),
				reason: "no transporter injected".to_owned(),
			}),
		}
	}

	fn codec_name(&self) -> Option<&'static str> {
		self.codec.get().map(|codec| codec.encode())
	}
}

axon::extension_provider! {
	provider HTTP_REMOTING {
		class: HttpRemoting,
		point: dyn Remoting,
		path: "remoting::HttpRemoting",
		ctor: |_env| Ok(HttpRemoting { transporter: OnceLock::new(), codec: OnceLock::new() }),
		deps: [
			{
				property: "transporter",
				point: dyn Transporter,
				assign: |target: &Arc<HttpRemoting>, transporter| target.set_transporter(transporter)
			},
			{
				property: "codec",
				point: dyn Codec,
				assign: |target: &Arc<HttpRemoting>, codec| target.set_codec(codec)
			},
		],
	}
}

fn build_env(prefix: &str) -> Arc<axon::Environment> {
	let root = unique_temp_dir(prefix);
	write_descriptor(
		&root,
		"META-INF/axon/",
		"demo.Transporter",
		"netty = transport::NettyTransporter\nmina = transport::MinaTransporter\n",
	);
	write_descriptor(
		&root,
		"META-INF/axon/",
		"demo.Remoting",
		"http = remoting::HttpRemoting\n",
	);
	axon::Environment::builder().search_root(&root).build()
}

#[test]
fn declared_dependencies_are_injected_through_the_factory() {
	let env = build_env("inject-basic");
	let remoting = env.loader::<dyn Remoting>().unwrap().by_name("http").unwrap();

	// The injected dependency is the adaptive transporter, so the concrete
	// implementation is chosen per call from the URL.
	let url = Url::parse("dubbo://h:1/p").unwrap().with_parameter("transporter", "mina");
	assert_eq!(remoting.call(&url).unwrap(), "mina");

	let bare = Url::parse("dubbo://h:1/p").unwrap();
	assert_eq!(remoting.call(&bare).unwrap(), "netty");
}

#[test]
fn unsatisfiable_dependencies_are_skipped_not_fatal() {
	let env = build_env("inject-skip");
	let remoting = env.loader::<dyn Remoting>().unwrap().by_name("http").unwrap();

	// demo.Codec has no providers, so the factory returns nothing and the
	// property stays unset; construction still succeeded.
	assert_eq!(remoting.codec_name(), None);
}

#[test]
fn factory_point_itself_is_supported() {
	let env = build_env("inject-factory");
	let loader = env.loader::<dyn axon::ExtensionFactory>().unwrap();

	// The delegating factory fills the adaptive slot, so only the ordinary
	// factories are named.
	let supported = loader.supported_names().unwrap();
	assert!(supported.contains("spi"));
	assert!(!supported.contains("adaptive"));

	// The adaptive factory is the factory point's adaptive instance.
	let first = loader.adaptive().unwrap();
	let second = loader.adaptive().unwrap();
	assert!(Arc::ptr_eq(&first, &second));
}
