//! A pure-Rust DOM for native use and testing.
//!
//! [`MemoryDom`] counts every mutation made through the [`Dom`] trait (see [`MutationStats`]),
//! which makes redundant DOM writes directly observable.
//! Nodes created by the HTML parser or by [`MemoryDom::create_element`] aren't counted until they are inserted somewhere.

mod parser;

use crate::{dom::NodeKind, value::ListenerOptions, Dom, Value};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::trace;

/// Mutation counters of one [`MemoryDom`] and all its clones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
	/// Nodes inserted or moved into a parent. Inserting a fragment counts each of its children.
	pub inserted: usize,
	pub removed: usize,
	pub text_writes: usize,
	pub attribute_sets: usize,
	/// Only removals of attributes that were present.
	pub attribute_removals: usize,
	pub property_sets: usize,
	pub listener_adds: usize,
	/// Only removals of listeners that were registered.
	pub listener_removes: usize,
}

impl MutationStats {
	/// All counted mutations of the document tree itself, i.e. everything except listener changes.
	#[must_use]
	pub fn dom_writes(&self) -> usize {
		self.inserted + self.removed + self.text_writes + self.attribute_sets + self.attribute_removals + self.property_sets
	}

	#[must_use]
	pub fn total(&self) -> usize {
		self.dom_writes() + self.listener_adds + self.listener_removes
	}
}

/// The in-memory [`Dom`]. Clones share their [`MutationStats`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
	stats: Rc<Cell<MutationStats>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
	Html,
	Svg,
}

/// A node handle. Compares by identity.
#[derive(Clone)]
pub struct MemoryNode(Rc<NodeInner>);

/// A handle that doesn't keep its node alive.
#[derive(Clone)]
pub struct WeakMemoryNode(Weak<NodeInner>);

struct NodeInner {
	data: RefCell<NodeData>,
	parent: RefCell<Weak<NodeInner>>,
	children: RefCell<Vec<MemoryNode>>,
}

enum NodeData {
	Element(ElementData),
	Text(String),
	Comment(String),
	Fragment,
}

struct ElementData {
	name: String,
	namespace: Namespace,
	attributes: Vec<(String, String)>,
	properties: Vec<(String, Value<MemoryDom>)>,
	listeners: Vec<Registration>,
	/// Template content, for `<template>` elements only.
	content: Option<MemoryNode>,
}

struct Registration {
	event: String,
	listener: MemoryListener,
	options: ListenerOptions,
}

/// A host-side listener. Compares by identity.
#[derive(Clone)]
pub struct MemoryListener(Rc<dyn Fn(&MemoryEvent)>);

impl MemoryListener {
	fn same(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0).cast::<()>() == Rc::as_ptr(&other.0).cast::<()>()
	}
}

impl Debug for MemoryListener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MemoryListener").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

/// A synthetic event, as sent by [`MemoryDom::dispatch`].
#[derive(Debug, Clone)]
pub struct MemoryEvent {
	name: String,
	target: MemoryNode,
}

impl MemoryEvent {
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn target(&self) -> &MemoryNode {
		&self.target
	}
}

impl MemoryNode {
	fn new(data: NodeData) -> Self {
		Self(Rc::new(NodeInner {
			data: RefCell::new(data),
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
		}))
	}

	fn element(name: &str, namespace: Namespace) -> Self {
		let content = if namespace == Namespace::Html && name == "template" {
			Some(Self::new(NodeData::Fragment))
		} else {
			None
		};
		Self::new(NodeData::Element(ElementData {
			name: name.to_owned(),
			namespace,
			attributes: Vec::new(),
			properties: Vec::new(),
			listeners: Vec::new(),
			content,
		}))
	}

	fn parent(&self) -> Option<Self> {
		self.0.parent.borrow().upgrade().map(Self)
	}

	fn children(&self) -> Vec<Self> {
		self.0.children.borrow().clone()
	}

	fn index_in_parent(&self) -> Option<(Self, usize)> {
		let parent = self.parent()?;
		let index = parent.0.children.borrow().iter().position(|child| child == self)?;
		Some((parent, index))
	}

	fn sibling(&self, offset: isize) -> Option<Self> {
		let (parent, index) = self.index_in_parent()?;
		let index = index.checked_add_signed(offset)?;
		let sibling = parent.0.children.borrow().get(index).cloned();
		sibling
	}

	fn detach(&self) -> bool {
		match self.index_in_parent() {
			Some((parent, index)) => {
				parent.0.children.borrow_mut().remove(index);
				*self.0.parent.borrow_mut() = Weak::new();
				true
			}
			None => false,
		}
	}

	/// Inserts without counting and without fragment handling.
	fn insert_raw(&self, child: &Self, index: Option<usize>) {
		child.detach();
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		let mut children = self.0.children.borrow_mut();
		match index {
			Some(index) if index <= children.len() => children.insert(index, child.clone()),
			_ => children.push(child.clone()),
		}
	}

	fn namespace(&self) -> Option<Namespace> {
		match &*self.0.data.borrow() {
			NodeData::Element(element) => Some(element.namespace),
			_ => None,
		}
	}

	fn local_name(&self) -> Option<String> {
		match &*self.0.data.borrow() {
			NodeData::Element(element) => Some(element.name.clone()),
			_ => None,
		}
	}

	fn template_content(&self) -> Option<Self> {
		match &*self.0.data.borrow() {
			NodeData::Element(element) => element.content.clone(),
			_ => None,
		}
	}

	fn deep_clone(&self, deep: bool) -> Self {
		let data = match &*self.0.data.borrow() {
			NodeData::Element(element) => NodeData::Element(ElementData {
				name: element.name.clone(),
				namespace: element.namespace,
				attributes: element.attributes.clone(),
				properties: Vec::new(),
				listeners: Vec::new(),
				content: element.content.as_ref().map(|content| if deep { content.deep_clone(true) } else { Self::new(NodeData::Fragment) }),
			}),
			NodeData::Text(data) => NodeData::Text(data.clone()),
			NodeData::Comment(data) => NodeData::Comment(data.clone()),
			NodeData::Fragment => NodeData::Fragment,
		};
		let clone = Self::new(data);
		if deep {
			for child in self.children() {
				clone.insert_raw(&child.deep_clone(true), None);
			}
		}
		clone
	}
}

impl PartialEq for MemoryNode {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for MemoryNode {}

impl Debug for MemoryNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &*self.0.data.borrow() {
			NodeData::Element(element) => write!(f, "<{}>", element.name),
			NodeData::Text(data) if cfg!(feature = "dangerous-logging") => write!(f, "#text({:?})", data),
			NodeData::Text(data) => write!(f, "#text(len = {})", data.len()),
			NodeData::Comment(data) => write!(f, "#comment(len = {})", data.len()),
			NodeData::Fragment => f.write_str("#document-fragment"),
		}
	}
}

impl Debug for WeakMemoryNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("WeakMemoryNode").field(&self.0.upgrade().map(MemoryNode)).finish()
	}
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn stats(&self) -> MutationStats {
		self.stats.get()
	}

	pub fn reset_stats(&self) {
		self.stats.set(MutationStats::default());
	}

	fn count(&self, update: impl FnOnce(&mut MutationStats)) {
		let mut stats = self.stats.get();
		update(&mut stats);
		self.stats.set(stats);
	}

	/// Creates a detached HTML element, e.g. to render into.
	#[must_use]
	pub fn create_element(&self, name: &str) -> MemoryNode {
		MemoryNode::element(&name.to_ascii_lowercase(), Namespace::Html)
	}

	#[must_use]
	pub fn child_nodes(&self, node: &MemoryNode) -> Vec<MemoryNode> {
		node.children()
	}

	/// The last value assigned to property `name` through [`Dom::set_property`].
	#[must_use]
	pub fn property(&self, element: &MemoryNode, name: &str) -> Option<Value<Self>> {
		match &*element.0.data.borrow() {
			NodeData::Element(element) => element.properties.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	/// How many listeners are currently registered on `node`, for any event.
	#[must_use]
	pub fn listener_count(&self, node: &MemoryNode) -> usize {
		match &*node.0.data.borrow() {
			NodeData::Element(element) => element.listeners.len(),
			_ => 0,
		}
	}

	/// The first descendant element named `name` in tree order, not looking into template contents.
	#[must_use]
	pub fn find_element(&self, root: &MemoryNode, name: &str) -> Option<MemoryNode> {
		root.children().into_iter().find_map(|child| {
			if child.local_name().map_or(false, |local| local.eq_ignore_ascii_case(name)) {
				Some(child)
			} else {
				self.find_element(&child, name)
			}
		})
	}

	/// Serializes `node`'s children (or, for a `<template>`, its content's).
	#[must_use]
	pub fn inner_html(&self, node: &MemoryNode) -> String {
		let mut html = String::new();
		parser::serialize_children(node, &mut html, true);
		html
	}

	/// Like [`MemoryDom::inner_html`], but without comments. Part boundaries are comments, so this is what a user would see.
	#[must_use]
	pub fn visible_html(&self, node: &MemoryNode) -> String {
		let mut html = String::new();
		parser::serialize_children(node, &mut html, false);
		html
	}

	/// The concatenated data of all descendant text nodes.
	#[must_use]
	pub fn text_content(&self, node: &MemoryNode) -> String {
		let mut text = String::new();
		for child in node.children() {
			match &*child.0.data.borrow() {
				NodeData::Text(data) => text.push_str(data),
				NodeData::Element(_) | NodeData::Fragment => text.push_str(&self.text_content(&child)),
				NodeData::Comment(_) => (),
			}
		}
		text
	}

	/// Sends an event named `name` at `target`, through capture, target and bubble phases.
	///
	/// Returns how many listeners were invoked.
	pub fn dispatch(&self, target: &MemoryNode, name: &str) -> usize {
		let event = MemoryEvent {
			name: name.to_owned(),
			target: target.clone(),
		};

		let mut ancestors = Vec::new();
		let mut node = target.parent();
		while let Some(current) = node {
			node = current.parent();
			ancestors.push(current);
		}

		let mut invoked = 0;
		for ancestor in ancestors.iter().rev() {
			invoked += self.invoke(ancestor, &event, Some(true));
		}
		invoked += self.invoke(target, &event, None);
		for ancestor in &ancestors {
			invoked += self.invoke(ancestor, &event, Some(false));
		}
		invoked
	}

	/// Invokes the listeners on `node` whose capture flag matches, or all of them for [`None`].
	fn invoke(&self, node: &MemoryNode, event: &MemoryEvent, capture: Option<bool>) -> usize {
		let snapshot: Vec<(MemoryListener, ListenerOptions)> = match &*node.0.data.borrow() {
			NodeData::Element(element) => element
				.listeners
				.iter()
				.filter(|registration| registration.event == event.name && capture.map_or(true, |capture| registration.options.capture == capture))
				.map(|registration| (registration.listener.clone(), registration.options))
				.collect(),
			_ => return 0,
		};

		let mut invoked = 0;
		for (listener, options) in snapshot {
			// Listeners removed by an earlier listener in this dispatch don't run.
			let still_registered = match &mut *node.0.data.borrow_mut() {
				NodeData::Element(element) => {
					let position = element
						.listeners
						.iter()
						.position(|registration| registration.event == event.name && registration.options.capture == options.capture && registration.listener.same(&listener));
					if let (Some(position), true) = (position, options.once) {
						element.listeners.remove(position);
					}
					position.is_some()
				}
				_ => false,
			};
			if still_registered {
				trace!(event = %event.name, "Invoking listener.");
				(listener.0)(event);
				invoked += 1;
			}
		}
		invoked
	}
}

impl Dom for MemoryDom {
	type Node = MemoryNode;
	type WeakNode = WeakMemoryNode;
	type Event = MemoryEvent;
	type Listener = MemoryListener;

	fn create_template(&self, html: &str) -> Self::Node {
		let template = MemoryNode::element("template", Namespace::Html);
		if let Some(content) = template.template_content() {
			parser::parse_into(&content, html);
		}
		template
	}

	fn template_content(&self, node: &Self::Node) -> Option<Self::Node> {
		node.template_content()
	}

	fn create_text(&self, data: &str) -> Self::Node {
		MemoryNode::new(NodeData::Text(data.to_owned()))
	}

	fn create_comment(&self, data: &str) -> Self::Node {
		MemoryNode::new(NodeData::Comment(data.to_owned()))
	}

	fn create_fragment(&self) -> Self::Node {
		MemoryNode::new(NodeData::Fragment)
	}

	fn import_node(&self, node: &Self::Node, deep: bool) -> Self::Node {
		node.deep_clone(deep)
	}

	fn downgrade(&self, node: &Self::Node) -> Self::WeakNode {
		WeakMemoryNode(Rc::downgrade(&node.0))
	}

	fn upgrade(&self, node: &Self::WeakNode) -> Option<Self::Node> {
		node.0.upgrade().map(MemoryNode)
	}

	fn node_kind(&self, node: &Self::Node) -> NodeKind {
		match &*node.0.data.borrow() {
			NodeData::Element(_) => NodeKind::Element,
			NodeData::Text(_) => NodeKind::Text,
			NodeData::Comment(_) => NodeKind::Comment,
			NodeData::Fragment => NodeKind::Fragment,
		}
	}

	fn node_name(&self, node: &Self::Node) -> String {
		match &*node.0.data.borrow() {
			NodeData::Element(ElementData {
				name,
				namespace: Namespace::Html,
				..
			}) => name.to_ascii_uppercase(),
			NodeData::Element(ElementData { name, .. }) => name.clone(),
			NodeData::Text(_) => "#text".to_owned(),
			NodeData::Comment(_) => "#comment".to_owned(),
			NodeData::Fragment => "#document-fragment".to_owned(),
		}
	}

	fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
		node.parent()
	}

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node> {
		node.0.children.borrow().first().cloned()
	}

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		node.sibling(1)
	}

	fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		node.sibling(-1)
	}

	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) {
		let reference = match reference {
			Some(reference) if reference == node => node.sibling(1),
			reference => reference.cloned(),
		};
		let moved = match &*node.0.data.borrow() {
			NodeData::Fragment => node.children(),
			_ => vec![node.clone()],
		};

		for child in &moved {
			child.detach();
			let index = reference.as_ref().and_then(|reference| parent.0.children.borrow().iter().position(|c| c == reference));
			parent.insert_raw(child, index);
		}
		self.count(|stats| stats.inserted += moved.len());
	}

	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) {
		if child.parent().as_ref() == Some(parent) && child.detach() {
			self.count(|stats| stats.removed += 1);
		}
	}

	fn text_data(&self, node: &Self::Node) -> Option<String> {
		match &*node.0.data.borrow() {
			NodeData::Text(data) | NodeData::Comment(data) => Some(data.clone()),
			_ => None,
		}
	}

	fn set_text_data(&self, node: &Self::Node, data: &str) {
		match &mut *node.0.data.borrow_mut() {
			NodeData::Text(old) | NodeData::Comment(old) => data.clone_into(old),
			_ => return,
		}
		self.count(|stats| stats.text_writes += 1);
	}

	fn attribute_names(&self, element: &Self::Node) -> Vec<String> {
		match &*element.0.data.borrow() {
			NodeData::Element(element) => element.attributes.iter().map(|(name, _)| name.clone()).collect(),
			_ => Vec::new(),
		}
	}

	fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String> {
		match &*element.0.data.borrow() {
			NodeData::Element(element) => {
				let name = element.attribute_name(name);
				element.attributes.iter().find(|(key, _)| *key == name).map(|(_, value)| value.clone())
			}
			_ => None,
		}
	}

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) {
		match &mut *element.0.data.borrow_mut() {
			NodeData::Element(element) => {
				let name = element.attribute_name(name);
				match element.attributes.iter_mut().find(|(key, _)| *key == name) {
					Some((_, old)) => value.clone_into(old),
					None => element.attributes.push((name, value.to_owned())),
				}
			}
			_ => return,
		}
		self.count(|stats| stats.attribute_sets += 1);
	}

	fn remove_attribute(&self, element: &Self::Node, name: &str) {
		let removed = match &mut *element.0.data.borrow_mut() {
			NodeData::Element(element) => {
				let name = element.attribute_name(name);
				let before = element.attributes.len();
				element.attributes.retain(|(key, _)| *key != name);
				element.attributes.len() != before
			}
			_ => false,
		};
		if removed {
			self.count(|stats| stats.attribute_removals += 1);
		}
	}

	fn set_property(&self, element: &Self::Node, name: &str, value: &Value<Self>) {
		match &mut *element.0.data.borrow_mut() {
			NodeData::Element(element) => match element.properties.iter_mut().find(|(key, _)| key == name) {
				Some((_, old)) => *old = value.clone(),
				None => element.properties.push((name.to_owned(), value.clone())),
			},
			_ => return,
		}
		self.count(|stats| stats.property_sets += 1);
	}

	fn create_listener(&self, callback: Box<dyn Fn(&Self::Event)>) -> Self::Listener {
		MemoryListener(Rc::from(callback))
	}

	fn add_event_listener(&self, target: &Self::Node, event: &str, listener: &Self::Listener, options: ListenerOptions) {
		match &mut *target.0.data.borrow_mut() {
			NodeData::Element(element) => {
				let duplicate = element
					.listeners
					.iter()
					.any(|registration| registration.event == event && registration.options.capture == options.capture && registration.listener.same(listener));
				if duplicate {
					return;
				}
				element.listeners.push(Registration {
					event: event.to_owned(),
					listener: listener.clone(),
					options,
				});
			}
			_ => return,
		}
		self.count(|stats| stats.listener_adds += 1);
	}

	fn remove_event_listener(&self, target: &Self::Node, event: &str, listener: &Self::Listener, options: ListenerOptions) {
		let removed = match &mut *target.0.data.borrow_mut() {
			NodeData::Element(element) => {
				let position = element
					.listeners
					.iter()
					.position(|registration| registration.event == event && registration.options.capture == options.capture && registration.listener.same(listener));
				position.map(|position| element.listeners.remove(position)).is_some()
			}
			_ => false,
		};
		if removed {
			self.count(|stats| stats.listener_removes += 1);
		}
	}
}

impl ElementData {
	/// HTML elements match attribute names ASCII case-insensitively.
	fn attribute_name(&self, name: &str) -> String {
		match self.namespace {
			Namespace::Html => name.to_ascii_lowercase(),
			Namespace::Svg => name.to_owned(),
		}
	}
}
