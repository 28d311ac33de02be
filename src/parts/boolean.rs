use super::{take_directive, PartRef};
use crate::{Dom, Error, Result, Value};
use core::{
	fmt::{self, Debug, Formatter},
	mem,
};
use std::rc::Rc;
use tracing::{instrument, trace};

/// A `?name=${…}` binding: the attribute is present (and empty) iff the value is truthy.
pub struct BooleanAttributePart<D: Dom> {
	dom: D,
	element: D::Node,
	name: Rc<str>,
	pending: Value<D>,
	value: Option<bool>,
}

impl<D: Dom> BooleanAttributePart<D> {
	/// # Errors
	///
	/// Iff `strings` isn't exactly one dynamic position without literal text around it.
	pub(crate) fn new(dom: D, element: D::Node, name: Rc<str>, strings: &[Rc<str>]) -> Result<Self> {
		if strings.len() != 2 || strings.iter().any(|s| !s.is_empty()) {
			return Err(Error::MalformedBooleanBinding { name: name.to_string() });
		}
		Ok(Self {
			dom,
			element,
			name,
			pending: Value::NoChange,
			value: None,
		})
	}

	pub fn set_value(&mut self, value: Value<D>) {
		self.pending = value;
	}

	#[must_use]
	pub fn value(&self) -> &Value<D> {
		&self.pending
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether the attribute was last committed as present.
	#[must_use]
	pub fn is_present(&self) -> Option<bool> {
		self.value
	}

	#[instrument(skip(self), fields(name = %self.name))]
	pub(crate) fn commit(&mut self) {
		while let Some(directive) = take_directive(&mut self.pending) {
			directive.apply(PartRef::Boolean(&mut *self));
		}
		let pending = mem::replace(&mut self.pending, Value::NoChange);
		if let Value::NoChange = pending {
			return;
		}

		let value = pending.is_truthy();
		if self.value != Some(value) {
			if value {
				trace!("Adding attribute.");
				self.dom.set_attribute(&self.element, &self.name, "");
			} else {
				trace!("Removing attribute.");
				self.dom.remove_attribute(&self.element, &self.name);
			}
			self.value = Some(value);
		}
	}
}

impl<D: Dom> Debug for BooleanAttributePart<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("BooleanAttributePart")
			.field("element", &self.element)
			.field("name", &self.name)
			.field("value", &self.value)
			.finish_non_exhaustive()
	}
}
