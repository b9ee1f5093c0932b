//! Activation filter scenarios: group matching, declared order, removal
//! filters, the `default` placeholder, and URL trigger keys.

mod common;

use std::sync::Arc;

use axon::Url;
use common::env_with_descriptor;

const POINT: &str = "demo.Filter";

pub trait Filter: Send + Sync {
	fn label(&self) -> &'static str;
}

axon::extension_point! {
	/// Request filters assembled per invocation side.
	dyn Filter, name = "demo.Filter";
}

macro_rules! filter_impl {
	($ty:ident, $label:literal) => {
		struct $ty;

		impl Filter for $ty {
			fn label(&self) -> &'static str {
				$label
			}
		}
	};
}

filter_impl!(FirstFilter, "first");
filter_impl!(SecondFilter, "second");
filter_impl!(CacheFilter, "cache");
filter_impl!(CustomFilter, "custom");

axon::extension_provider! {
	provider FIRST_FILTER {
		class: FirstFilter,
		point: dyn Filter,
		path: "filters::FirstFilter",
		activate: { groups: ["provider"], order: 10, },
		ctor: |_env| Ok(FirstFilter),
	}
}

axon::extension_provider! {
	provider SECOND_FILTER {
		class: SecondFilter,
		point: dyn Filter,
		path: "filters::SecondFilter",
		activate: { groups: ["provider"], order: 20, },
		ctor: |_env| Ok(SecondFilter),
	}
}

axon::extension_provider! {
	provider CACHE_FILTER {
		class: CacheFilter,
		point: dyn Filter,
		path: "filters::CacheFilter",
		activate: { keys: ["cache"], order: 5, },
		ctor: |_env| Ok(CacheFilter),
	}
}

axon::extension_provider! {
	provider CUSTOM_FILTER {
		class: CustomFilter,
		point: dyn Filter,
		path: "filters::CustomFilter",
		ctor: |_env| Ok(CustomFilter),
	}
}

const DESCRIPTOR: &str = "\
first = filters::FirstFilter\n\
second = filters::SecondFilter\n\
cache = filters::CacheFilter\n\
custom = filters::CustomFilter\n";

fn labels(filters: &[Arc<dyn Filter>]) -> Vec<&'static str> {
	filters.iter().map(|filter| filter.label()).collect()
}

#[test]
fn group_activation_orders_by_declared_order() {
	let (env, _root) = env_with_descriptor("activate-order", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	let url = Url::parse("dubbo://h:1/p").unwrap();
	let active = loader.activate(&url, &[], Some("provider")).unwrap();
	assert_eq!(labels(&active), vec!["first", "second"]);
}

#[test]
fn removal_prefix_excludes_an_activation() {
	let (env, _root) = env_with_descriptor("activate-remove", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	let url = Url::parse("dubbo://h:1/p").unwrap();
	let active = loader.activate(&url, &["-first"], Some("provider")).unwrap();
	assert_eq!(labels(&active), vec!["second"]);
}

#[test]
fn default_placeholder_splices_user_names_before_the_auto_set() {
	let (env, _root) = env_with_descriptor("activate-default", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	let url = Url::parse("dubbo://h:1/p").unwrap();
	let active = loader
		.activate(&url, &["custom", "default"], Some("provider"))
		.unwrap();
	assert_eq!(labels(&active), vec!["custom", "first", "second"]);

	// Without the placeholder, user names follow the auto set.
	let active = loader.activate(&url, &["custom"], Some("provider")).unwrap();
	assert_eq!(labels(&active), vec!["first", "second", "custom"]);
}

#[test]
fn minus_default_suppresses_every_automatic_activation() {
	let (env, _root) = env_with_descriptor("activate-nodefault", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	let url = Url::parse("dubbo://h:1/p").unwrap();
	let active = loader
		.activate(&url, &["-default", "custom", "first"], Some("provider"))
		.unwrap();
	assert_eq!(labels(&active), vec!["custom", "first"]);
}

#[test]
fn trigger_keys_require_a_matching_url_parameter() {
	let (env, _root) = env_with_descriptor("activate-trigger", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	// Without the cache parameter the cache filter stays out.
	let url = Url::parse("dubbo://h:1/p").unwrap();
	let active = loader.activate(&url, &[], None).unwrap();
	assert_eq!(labels(&active), vec!["first", "second"]);

	// With it, the cache filter joins at its declared order.
	let url = url.with_parameter("cache", "lru");
	let active = loader.activate(&url, &[], None).unwrap();
	assert_eq!(labels(&active), vec!["cache", "first", "second"]);

	// Method-suffixed parameters trigger too.
	let url = Url::parse("dubbo://h:1/p").unwrap().with_parameter("findAll.cache", "lru");
	let active = loader.activate(&url, &[], None).unwrap();
	assert_eq!(labels(&active), vec!["cache", "first", "second"]);
}

#[test]
fn requested_names_come_from_the_url_key_variant() {
	let (env, _root) = env_with_descriptor("activate-key", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	let url = Url::parse("dubbo://h:1/p").unwrap().with_parameter("service.filter", "custom");
	let active = loader
		.activate_key_group(&url, "service.filter", Some("provider"))
		.unwrap();
	assert_eq!(labels(&active), vec!["first", "second", "custom"]);

	let bare = Url::parse("dubbo://h:1/p").unwrap();
	let active = loader.activate_key(&bare, "service.filter").unwrap();
	assert_eq!(labels(&active), vec!["first", "second"]);
}

#[test]
fn group_mismatch_excludes_grouped_activations() {
	let (env, _root) = env_with_descriptor("activate-group", POINT, DESCRIPTOR);
	let loader = env.loader::<dyn Filter>().unwrap();

	let url = Url::parse("dubbo://h:1/p").unwrap().with_parameter("cache", "lru");
	let active = loader.activate(&url, &[], Some("consumer")).unwrap();
	// The grouped filters require "provider"; the cache filter declares no
	// groups and matches any.
	assert_eq!(labels(&active), vec!["cache"]);
}
