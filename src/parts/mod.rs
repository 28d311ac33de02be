//! Live value sinks, each bound to one location in a stamped DOM.
//!
//! Every part remembers what it last committed and only touches the DOM when a newly set value differs.

mod attribute;
mod boolean;
mod event;
mod node;

pub use attribute::{AttributeCommitter, AttributePart};
pub use boolean::BooleanAttributePart;
pub use event::EventPart;
pub use node::NodePart;

use crate::{value::Directive, Dom, Value};

/// Mutable access to a live part, as handed to a [`Directive`].
pub enum PartRef<'a, D: Dom> {
	Node(&'a mut NodePart<D>),
	/// One dynamic position of an attribute (or property) binding.
	Attribute(AttributePart<'a, D>),
	Boolean(&'a mut BooleanAttributePart<D>),
	Event(&'a mut EventPart<D>),
}

impl<'a, D: Dom> PartRef<'a, D> {
	/// Replaces the value the part will commit next.
	///
	/// Setting another [`Value::Directive`] runs that directive too. [`Value::NoChange`] skips the commit.
	pub fn set_value(&mut self, value: Value<D>) {
		match self {
			PartRef::Node(part) => part.set_value(value),
			PartRef::Attribute(part) => part.set_value(value),
			PartRef::Boolean(part) => part.set_value(value),
			PartRef::Event(part) => part.set_value(value),
		}
	}

	/// The value currently stored in the part.
	#[must_use]
	pub fn value(&self) -> &Value<D> {
		match self {
			PartRef::Node(part) => part.value(),
			PartRef::Attribute(part) => part.value(),
			PartRef::Boolean(part) => part.value(),
			PartRef::Event(part) => part.value(),
		}
	}
}

/// Takes a pending directive out of `pending`, leaving [`Value::NoChange`] in its place.
pub(crate) fn take_directive<D: Dom>(pending: &mut Value<D>) -> Option<Directive<D>> {
	match pending {
		Value::Directive(directive) => {
			let directive = directive.clone();
			*pending = Value::NoChange;
			Some(directive)
		}
		_ => None,
	}
}
