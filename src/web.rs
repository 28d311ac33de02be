//! The browser backend.
//!
//! Host call failures are logged at `ERROR` level and otherwise ignored, since there is no sensible recovery within a commit.
//!
//! # Containers are held strongly
//!
//! The browser offers no weak node handles to Rust, so a [`Renderer`](`crate::Renderer`) over [`WebDom`] keeps every container it rendered into alive.
//! Call [`Renderer::unmount`](`crate::Renderer::unmount`) for containers that are discarded.

use crate::{dom::NodeKind, value::ListenerOptions, Dom, Value};
use core::cell::RefCell;
use js_sys::{Array, Function, Reflect};
use std::rc::Rc;
use tracing::{error, instrument, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};
use web_sys::{AddEventListenerOptions, CharacterData, Document, Element, HtmlTemplateElement};

/// The browser DOM of one [`Document`].
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
	event_listener_options_cache: Rc<RefCell<[Option<AddEventListenerOptions>; 8]>>,
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			event_listener_options_cache: Rc::new(RefCell::new([None, None, None, None, None, None, None, None])),
		}
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		Some(Self::new(web_sys::window()?.document()?))
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	// Later web-sys releases deprecate the chained setters below in favour of `set_capture` and friends.
	#[allow(deprecated)]
	#[instrument(skip(self))]
	fn add_event_listener_options(&self, options: ListenerOptions) -> AddEventListenerOptions {
		let mut cache = self.event_listener_options_cache.borrow_mut();
		let entry = cache
			.get_mut(usize::from(options.capture) + usize::from(options.once) * 2 + usize::from(options.passive) * 4)
			.unwrap_throw();

		entry
			.get_or_insert_with(|| {
				let mut web_options = AddEventListenerOptions::new();
				web_options.capture(options.capture).once(options.once).passive(options.passive);
				web_options
			})
			.clone()
	}

	fn element<'a>(&self, node: &'a web_sys::Node) -> Option<&'a Element> {
		let element = node.dyn_ref::<Element>();
		if element.is_none() {
			error!("Expected an element but found {:?}.", node);
		}
		element
	}

	fn to_js(&self, value: &Value<Self>) -> JsValue {
		match value {
			Value::Nothing | Value::NoChange => JsValue::UNDEFINED,
			Value::Null => JsValue::NULL,
			Value::Bool(b) => JsValue::from_bool(*b),
			Value::Number(n) => JsValue::from_f64(*n),
			Value::Str(s) => JsValue::from_str(s),
			Value::Node(node) => node.clone().into(),
			Value::Iterable(items) => items.iter().map(|item| self.to_js(item)).collect::<Array>().into(),
			Value::Object(object) => match object.downcast_ref::<JsValue>() {
				Some(js) => js.clone(),
				None => {
					warn!("Only `JsValue` objects can be assigned as properties. Assigning `undefined` instead.");
					JsValue::UNDEFINED
				}
			},
			Value::Template(_) | Value::Directive(_) | Value::Listener(_) => {
				warn!(value = ?value, "This value has no JavaScript representation. Assigning `undefined` instead.");
				JsValue::UNDEFINED
			}
		}
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;
	type WeakNode = web_sys::Node;
	type Event = web_sys::Event;
	type Listener = Closure<dyn Fn(web_sys::Event)>;

	fn create_template(&self, html: &str) -> Self::Node {
		let template = self
			.document
			.create_element("template")
			.expect_throw("tagged-dom: Failed to create a <template> element.");
		template.set_inner_html(html);
		template.into()
	}

	fn template_content(&self, node: &Self::Node) -> Option<Self::Node> {
		node.dyn_ref::<HtmlTemplateElement>().map(|template| template.content().into())
	}

	fn create_text(&self, data: &str) -> Self::Node {
		self.document.create_text_node(data).into()
	}

	fn create_comment(&self, data: &str) -> Self::Node {
		self.document.create_comment(data).into()
	}

	fn create_fragment(&self) -> Self::Node {
		self.document.create_document_fragment().into()
	}

	fn import_node(&self, node: &Self::Node, deep: bool) -> Self::Node {
		match self.document.import_node_with_deep(node, deep) {
			Ok(imported) => imported,
			Err(error) => {
				error!("Failed to import node: {:?}", error);
				self.create_fragment()
			}
		}
	}

	fn downgrade(&self, node: &Self::Node) -> Self::WeakNode {
		node.clone()
	}

	fn upgrade(&self, node: &Self::WeakNode) -> Option<Self::Node> {
		Some(node.clone())
	}

	fn node_kind(&self, node: &Self::Node) -> NodeKind {
		match node.node_type() {
			web_sys::Node::ELEMENT_NODE => NodeKind::Element,
			web_sys::Node::TEXT_NODE => NodeKind::Text,
			web_sys::Node::COMMENT_NODE => NodeKind::Comment,
			web_sys::Node::DOCUMENT_FRAGMENT_NODE => NodeKind::Fragment,
			_ => NodeKind::Other,
		}
	}

	fn node_name(&self, node: &Self::Node) -> String {
		node.node_name()
	}

	fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		node.next_sibling()
	}

	fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		node.previous_sibling()
	}

	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) {
		if let Err(error) = parent.insert_before(node, reference) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove the node: {:?}", error);
		}
	}

	fn text_data(&self, node: &Self::Node) -> Option<String> {
		node.dyn_ref::<CharacterData>().map(CharacterData::data)
	}

	fn set_text_data(&self, node: &Self::Node, data: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.set_data(data),
			None => error!("Expected character data but found {:?}.", node),
		}
	}

	fn attribute_names(&self, element: &Self::Node) -> Vec<String> {
		self.element(element)
			.map(|element| element.get_attribute_names().iter().filter_map(|name| name.as_string()).collect())
			.unwrap_or_default()
	}

	fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String> {
		self.element(element)?.get_attribute(name)
	}

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) {
		if let Some(element) = self.element(element) {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&self, element: &Self::Node, name: &str) {
		if let Some(element) = self.element(element) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn set_property(&self, element: &Self::Node, name: &str, value: &Value<Self>) {
		if let Err(error) = Reflect::set(element, &JsValue::from_str(name), &self.to_js(value)) {
			error!("Failed to set property {:?}: {:?}", name, error);
		}
	}

	fn create_listener(&self, callback: Box<dyn Fn(&Self::Event)>) -> Self::Listener {
		Closure::wrap(Box::new(move |event: web_sys::Event| callback(&event)) as Box<dyn Fn(web_sys::Event)>)
	}

	fn add_event_listener(&self, target: &Self::Node, event: &str, listener: &Self::Listener, options: ListenerOptions) {
		let options = self.add_event_listener_options(options);
		if let Err(error) = target.add_event_listener_with_callback_and_add_event_listener_options(event, listener.as_ref().unchecked_ref::<Function>(), &options) {
			error!("Failed to add event listener: {:?}", error);
		}
	}

	fn remove_event_listener(&self, target: &Self::Node, event: &str, listener: &Self::Listener, options: ListenerOptions) {
		if let Err(error) = target.remove_event_listener_with_callback_and_bool(event, listener.as_ref().unchecked_ref::<Function>(), options.capture) {
			error!("Failed to remove event listener: {:?}", error);
		}
	}
}
