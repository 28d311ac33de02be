#![doc(html_root_url = "https://docs.rs/tagged-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! Tagged-template rendering that keeps a live DOM subtree in sync with changing values.
//!
//! A template is parsed once into a [`Blueprint`] with located dynamic positions. Rendering stamps that blueprint
//! into the container and afterwards only commits values that changed.
//!
//! The engine is generic over [`Dom`]. [`memory::MemoryDom`] runs anywhere, `web::WebDom` (feature `"web"`) drives a browser.
//!
//! # Features
//!
//! - `"web"` (default): The browser backend.
//! - `"dangerous-logging"`: Includes template text and committed text in log output.

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub mod readme {}

mod cache;
pub mod dom;
mod error;
mod instance;
pub mod marker;
pub mod memory;
pub mod parts;
mod render;
mod result;
mod shim;
mod template;
mod value;
mod walker;

#[cfg(feature = "web")]
pub mod web;

pub use cache::TemplateCache;
pub use dom::{Dom, NodeKind};
pub use error::{Error, Result};
pub use parts::PartRef;
pub use render::{RenderOptions, Renderer};
pub use result::{html, svg, Strings, TemplateKind, TemplateResult};
pub use shim::ScopingShim;
pub use template::{Blueprint, PartDescriptor};
pub use value::{Directive, EventReceiver, HandleEvent, Handler, Listener, ListenerOptions, Value};

/// Tags an HTML template at this call site.
///
/// The literal segments become one `static` [`Strings`], so every evaluation of the same call site shares its blueprint.
/// Each value goes through [`Value::from`].
///
/// ```
/// use tagged_dom::{html, memory::MemoryDom, TemplateResult};
///
/// fn greeting(name: &str) -> TemplateResult<MemoryDom> {
///     html!(["<p>Hello, ", "!</p>"], name)
/// }
///
/// assert_eq!(greeting("World").values().len(), 1);
/// assert!(core::ptr::eq(greeting("a").strings(), greeting("b").strings()));
/// ```
#[macro_export]
macro_rules! html {
	([$($string:literal),+ $(,)?] $(, $value:expr)* $(,)?) => {{
		static STRINGS: $crate::Strings = $crate::Strings::new(&[$($string),+]);
		$crate::html(&STRINGS, ::std::vec![$($crate::Value::from($value)),*])
	}};
}

/// Tags an SVG template at this call site. See [`html!`].
#[macro_export]
macro_rules! svg {
	([$($string:literal),+ $(,)?] $(, $value:expr)* $(,)?) => {{
		static STRINGS: $crate::Strings = $crate::Strings::new(&[$($string),+]);
		$crate::svg(&STRINGS, ::std::vec![$($crate::Value::from($value)),*])
	}};
}
