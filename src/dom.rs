//! The host DOM surface the engine is written against.
//!
//! Everything here mirrors a small subset of the [DOM Standard](https://dom.spec.whatwg.org/).
//! Implementations are cheap handles: cloning a [`Dom`] must not clone the document.

use crate::{value::ListenerOptions, Value};
use core::fmt::Debug;

/// The node types the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Element,
	Text,
	Comment,
	Fragment,
	/// Doctypes, processing instructions, documents… Never addressed by parts.
	Other,
}

/// A host DOM.
///
/// Node handles compare by identity, never by content.
pub trait Dom: Clone + Debug + 'static {
	type Node: Clone + PartialEq + Debug + 'static;
	/// A handle that does not keep its node alive.
	type WeakNode: Clone + Debug + 'static;
	type Event: 'static;
	/// A host-side event listener wrapping one Rust callback.
	type Listener: 'static;

	/// Parses `html` as the content of a fresh, detached `<template>` element and returns that element.
	fn create_template(&self, html: &str) -> Self::Node;
	/// The content fragment of a `<template>` element, or [`None`] for any other node.
	fn template_content(&self, node: &Self::Node) -> Option<Self::Node>;
	fn create_text(&self, data: &str) -> Self::Node;
	fn create_comment(&self, data: &str) -> Self::Node;
	fn create_fragment(&self) -> Self::Node;
	/// Clones `node` (and, if `deep`, its descendants and template contents) into this document.
	fn import_node(&self, node: &Self::Node, deep: bool) -> Self::Node;

	fn downgrade(&self, node: &Self::Node) -> Self::WeakNode;
	fn upgrade(&self, node: &Self::WeakNode) -> Option<Self::Node>;

	fn node_kind(&self, node: &Self::Node) -> NodeKind;
	/// The node name as reported by the host, i.e. uppercase for HTML elements.
	fn node_name(&self, node: &Self::Node) -> String;
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `node` into `parent` before `reference`, or at the end if `reference` is [`None`].
	///
	/// Inserting a fragment moves its children instead.
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node);
	fn append_child(&self, parent: &Self::Node, node: &Self::Node) {
		self.insert_before(parent, node, None)
	}

	/// Data of a text or comment node.
	fn text_data(&self, node: &Self::Node) -> Option<String>;
	fn set_text_data(&self, node: &Self::Node, data: &str);

	fn attribute_names(&self, element: &Self::Node) -> Vec<String>;
	fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String>;
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&self, element: &Self::Node, name: &str);
	/// Assigns a host-level property, preserving the value's type as far as the host allows.
	fn set_property(&self, element: &Self::Node, name: &str, value: &Value<Self>);

	fn create_listener(&self, callback: Box<dyn Fn(&Self::Event)>) -> Self::Listener;
	fn add_event_listener(&self, target: &Self::Node, event: &str, listener: &Self::Listener, options: ListenerOptions);
	fn remove_event_listener(&self, target: &Self::Node, event: &str, listener: &Self::Listener, options: ListenerOptions);

	/// Removes every child of `parent` from `start` (inclusive) up to `end` (exclusive, or the end if [`None`]).
	fn remove_range(&self, parent: &Self::Node, start: Option<Self::Node>, end: Option<&Self::Node>) {
		let mut node = start;
		while let Some(current) = node {
			if Some(&current) == end {
				break;
			}
			node = self.next_sibling(&current);
			self.remove_child(parent, &current);
		}
	}
}
