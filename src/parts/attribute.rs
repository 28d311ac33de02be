use super::PartRef;
use crate::{value::Directive, Dom, Value};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
	Attribute,
	/// `single` iff the value is exactly one dynamic position without literal text, in which case it's assigned as-is.
	Property { single: bool },
}

/// The shared writer behind all dynamic positions of one attribute (or property) binding.
///
/// Each position is a slot. Setting a changed value into any slot marks the committer dirty,
/// and [`commit`](`AttributeCommitter::commit`) writes the whole interpolated value at most once.
pub struct AttributeCommitter<D: Dom> {
	dom: D,
	element: D::Node,
	name: Rc<str>,
	strings: Rc<[Rc<str>]>,
	values: Vec<Value<D>>,
	directives: Vec<Option<Directive<D>>>,
	dirty: bool,
	target: Target,
}

impl<D: Dom> AttributeCommitter<D> {
	pub(crate) fn attribute(dom: D, element: D::Node, name: Rc<str>, strings: Rc<[Rc<str>]>) -> Self {
		Self::new(dom, element, name, strings, Target::Attribute)
	}

	pub(crate) fn property(dom: D, element: D::Node, name: Rc<str>, strings: Rc<[Rc<str>]>) -> Self {
		let single = strings.len() == 2 && strings.iter().all(|s| s.is_empty());
		Self::new(dom, element, name, strings, Target::Property { single })
	}

	fn new(dom: D, element: D::Node, name: Rc<str>, strings: Rc<[Rc<str>]>, target: Target) -> Self {
		let slots = strings.len().saturating_sub(1);
		Self {
			dom,
			element,
			name,
			values: (0..slots).map(|_| Value::Null).collect(),
			directives: (0..slots).map(|_| None).collect(),
			strings,
			// The first commit always writes.
			dirty: true,
			target,
		}
	}

	/// The attribute or property name, without binding prefix.
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn element(&self) -> &D::Node {
		&self.element
	}

	/// The number of dynamic positions.
	#[must_use]
	pub fn slot_count(&self) -> usize {
		self.values.len()
	}

	pub(crate) fn set_value(&mut self, index: usize, value: Value<D>) {
		let (slot, directive) = match (self.values.get_mut(index), self.directives.get_mut(index)) {
			(Some(slot), Some(directive)) => (slot, directive),
			_ => return,
		};
		match value {
			Value::Directive(pending) => *directive = Some(pending),
			Value::NoChange => (),
			value => {
				*directive = None;
				if !value.is_primitive() || !value.same_primitive(slot) {
					*slot = value;
					self.dirty = true;
				}
			}
		}
	}

	/// Runs pending directives slot by slot, then writes the attribute or property once if anything changed.
	#[instrument(skip(self), fields(name = %self.name))]
	pub(crate) fn commit(&mut self) {
		for index in 0..self.directives.len() {
			while let Some(directive) = self.directives[index].take() {
				directive.apply(PartRef::Attribute(AttributePart { committer: &mut *self, index }));
			}
		}

		if !self.dirty {
			return;
		}
		self.dirty = false;

		match self.target {
			Target::Attribute => {
				let value = self.interpolate();
				trace!("setAttribute");
				self.dom.set_attribute(&self.element, &self.name, &value);
			}
			Target::Property { single: true } => {
				trace!("Assigning property.");
				self.dom.set_property(&self.element, &self.name, &self.values[0]);
			}
			Target::Property { single: false } => {
				trace!("Assigning interpolated property.");
				let value = Value::Str(self.interpolate().into());
				self.dom.set_property(&self.element, &self.name, &value);
			}
		}
	}

	fn interpolate(&self) -> String {
		let mut text = String::new();
		for (literal, value) in self.strings.iter().zip(&self.values) {
			text.push_str(literal);
			text.push_str(&value.attribute_text());
		}
		if let Some(last) = self.strings.last() {
			text.push_str(last);
		}
		text
	}
}

impl<D: Dom> Debug for AttributeCommitter<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("AttributeCommitter")
			.field("element", &self.element)
			.field("name", &self.name)
			.field("target", &self.target)
			.field("values", &self.values)
			.field("dirty", &self.dirty)
			.finish_non_exhaustive()
	}
}

/// One slot of an [`AttributeCommitter`].
pub struct AttributePart<'a, D: Dom> {
	committer: &'a mut AttributeCommitter<D>,
	index: usize,
}

impl<'a, D: Dom> AttributePart<'a, D> {
	pub fn set_value(&mut self, value: Value<D>) {
		self.committer.set_value(self.index, value);
	}

	#[must_use]
	pub fn value(&self) -> &Value<D> {
		&self.committer.values[self.index]
	}

	#[must_use]
	pub fn index(&self) -> usize {
		self.index
	}

	#[must_use]
	pub fn committer(&self) -> &AttributeCommitter<D> {
		self.committer
	}
}
