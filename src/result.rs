use crate::{
	marker::{last_attribute, marker, BOUND_ATTRIBUTE_SUFFIX},
	Dom, Value,
};
use core::fmt::{self, Debug, Formatter};

/// The literal segments of one tagged-template call site.
///
/// Identity is the address of the `static` holding it, which [`html!`](`crate::html!`) and [`svg!`](`crate::svg!`) declare once per call site.
/// Evaluating the same call site again therefore yields the same identity.
pub struct Strings(&'static [&'static str]);
impl Strings {
	#[must_use]
	pub const fn new(strings: &'static [&'static str]) -> Self {
		Self(strings)
	}

	#[must_use]
	pub fn as_slice(&self) -> &'static [&'static str] {
		self.0
	}

	#[allow(clippy::len_without_is_empty)]
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub(crate) fn identity(&'static self) -> usize {
		self as *const Self as usize
	}
}
impl Debug for Strings {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			f.debug_tuple("Strings").field(&self.0).finish()
		} else {
			f.debug_struct("Strings").field("len", &self.0.len()).finish()
		}
	}
}

/// Which parser context a template is meant for.
///
/// Templates of different kinds never share a blueprint, even with identical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
	Html,
	Svg,
}

/// One evaluation of a tagged template: literal segments, the values between them, and a [`TemplateKind`].
#[derive(Clone)]
pub struct TemplateResult<D: Dom> {
	strings: &'static Strings,
	values: Vec<Value<D>>,
	kind: TemplateKind,
}

/// Tags an HTML template.
#[must_use]
pub fn html<D: Dom>(strings: &'static Strings, values: Vec<Value<D>>) -> TemplateResult<D> {
	TemplateResult::new(strings, values, TemplateKind::Html)
}

/// Tags an SVG template, i.e. one whose content is parsed inside an `<svg>` element.
#[must_use]
pub fn svg<D: Dom>(strings: &'static Strings, values: Vec<Value<D>>) -> TemplateResult<D> {
	TemplateResult::new(strings, values, TemplateKind::Svg)
}

impl<D: Dom> TemplateResult<D> {
	#[must_use]
	pub fn new(strings: &'static Strings, values: Vec<Value<D>>, kind: TemplateKind) -> Self {
		debug_assert!(!strings.as_slice().is_empty(), "A template needs at least one literal segment.");
		debug_assert_eq!(strings.len(), values.len() + 1, "Expected exactly one value between each pair of literal segments.");
		Self { strings, values, kind }
	}

	#[must_use]
	pub fn strings(&self) -> &'static Strings {
		self.strings
	}

	#[must_use]
	pub fn values(&self) -> &[Value<D>] {
		&self.values
	}

	#[must_use]
	pub fn into_values(self) -> Vec<Value<D>> {
		self.values
	}

	#[must_use]
	pub fn kind(&self) -> TemplateKind {
		self.kind
	}

	/// Serializes the literal segments with a marker at each dynamic position.
	///
	/// Positions inside a still-open comment get the token padded with spaces, so that such a comment never reads
	/// as a node marker. Attribute values get the bare token and their name receives [`BOUND_ATTRIBUTE_SUFFIX`].
	/// All other positions get the comment-wrapped marker.
	#[must_use]
	pub fn html(&self) -> String {
		let marker = marker();
		let strings = self.strings.as_slice();
		let (last, strings) = match strings.split_last() {
			Some(split) => split,
			None => return String::new(),
		};

		let mut html = String::new();
		if self.kind == TemplateKind::Svg {
			html.push_str("<svg>");
		}

		let mut in_comment = false;
		for s in strings {
			let comment_open = s.rfind("<!--");
			let close_search_start = comment_open.map_or(0, |open| open + 1);
			in_comment = (comment_open.is_some() || in_comment) && !s[close_search_start..].contains("-->");

			if in_comment {
				html.push_str(s);
				html.push(' ');
				html.push_str(marker.token());
				html.push(' ');
			} else if let Some(attribute) = last_attribute(s) {
				html.push_str(&s[..attribute.start]);
				html.push_str(attribute.whitespace);
				html.push_str(attribute.name);
				html.push_str(BOUND_ATTRIBUTE_SUFFIX);
				html.push_str(attribute.tail);
				html.push_str(marker.token());
			} else {
				html.push_str(s);
				html.push_str(marker.node_marker());
			}
		}
		html.push_str(last);

		if self.kind == TemplateKind::Svg {
			html.push_str("</svg>");
		}
		html
	}

	/// Parses [`TemplateResult::html`] into a detached `<template>` element.
	///
	/// For SVG templates, the wrapping `<svg>` element is dissolved again so that its children sit directly in the content.
	pub fn template_element(&self, dom: &D) -> D::Node {
		let template = dom.create_template(&self.html());
		if self.kind == TemplateKind::Svg {
			if let Some(content) = dom.template_content(&template) {
				if let Some(svg) = dom.first_child(&content) {
					dom.remove_child(&content, &svg);
					while let Some(child) = dom.first_child(&svg) {
						dom.append_child(&content, &child);
					}
				}
			}
		}
		template
	}
}

impl<D: Dom> Debug for TemplateResult<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateResult")
			.field("kind", &self.kind)
			.field("strings", &self.strings)
			.field("values", &self.values)
			.finish()
	}
}
