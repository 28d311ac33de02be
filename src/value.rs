use crate::{parts::PartRef, Dom, TemplateResult};
use core::{
	any::Any,
	fmt::{self, Debug, Display, Formatter, Write as _},
};
use std::{borrow::Cow, rc::Rc};

/// Everything that can be bound to a dynamic position.
///
/// Parts dispatch on this with one exhaustive `match`, so there is no runtime type inspection beyond the discriminant.
#[derive(Clone)]
pub enum Value<D: Dom> {
	/// Renders nothing: node parts clear their range.
	Nothing,
	/// Skips the commit entirely. Mostly useful to [`Directive`]s.
	NoChange,
	Null,
	Bool(bool),
	Number(f64),
	Str(Rc<str>),
	Template(TemplateResult<D>),
	Node(D::Node),
	/// Rendered positionally, one child part per item.
	Iterable(Vec<Value<D>>),
	Directive(Directive<D>),
	Listener(Listener<D>),
	/// Anything else. Assigned as-is by single-position property bindings, stringified elsewhere.
	Object(Rc<dyn Any>),
}

impl<D: Dom> Value<D> {
	#[must_use]
	pub fn is_primitive(&self) -> bool {
		matches!(self, Value::Null | Value::Bool(_) | Value::Number(_) | Value::Str(_))
	}

	/// Strict (`===`) equality between two primitives.
	///
	/// Non-primitives are never equal, not even to themselves.
	#[must_use]
	#[allow(clippy::float_cmp)]
	pub fn same_primitive(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			_ => false,
		}
	}

	/// `!!value`.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Nothing | Value::NoChange | Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::Str(s) => !s.is_empty(),
			Value::Template(_) | Value::Node(_) | Value::Iterable(_) | Value::Directive(_) | Value::Listener(_) | Value::Object(_) => true,
		}
	}

	/// Text as committed into a node part's text node.
	#[must_use]
	pub fn node_text(&self) -> Cow<'_, str> {
		match self {
			Value::Str(s) => Cow::Borrowed(s),
			Value::Null | Value::Nothing | Value::NoChange => Cow::Borrowed(""),
			other => Cow::Owned(other.to_string()),
		}
	}

	/// Text as interpolated into an attribute value.
	///
	/// Unlike [`Value::node_text`], `NaN` reflects as the empty string.
	#[must_use]
	pub fn attribute_text(&self) -> Cow<'_, str> {
		match self {
			Value::Number(n) if n.is_nan() => Cow::Borrowed(""),
			Value::Iterable(items) => Cow::Owned(items.iter().map(Value::attribute_text).collect()),
			other => other.node_text(),
		}
	}

	#[must_use]
	pub fn directive(directive: impl Fn(PartRef<'_, D>) + 'static) -> Self {
		Value::Directive(Directive::new(directive))
	}
}

impl<D: Dom> Display for Value<D> {
	/// Mirrors JavaScript's `String(value)`, except that `Null` is empty.
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Nothing | Value::NoChange | Value::Null => Ok(()),
			Value::Bool(b) => Display::fmt(b, f),
			Value::Number(n) if n.is_nan() => f.write_str("NaN"),
			Value::Number(n) if n.is_infinite() => f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" }),
			Value::Number(n) if *n == 0.0 => f.write_char('0'),
			Value::Number(n) if n.abs() >= 1e21 || n.abs() < 1e-6 => {
				let exponential = format!("{:e}", n);
				match exponential.split_once('e') {
					Some((mantissa, exponent)) if !exponent.starts_with('-') => write!(f, "{}e+{}", mantissa, exponent),
					_ => f.write_str(&exponential),
				}
			}
			Value::Number(n) => Display::fmt(n, f),
			Value::Str(s) => f.write_str(s),
			Value::Iterable(items) => items.iter().try_for_each(|item| Display::fmt(item, f)),
			Value::Node(_) => f.write_str("[object Node]"),
			Value::Directive(_) => f.write_str("[object Function]"),
			Value::Template(_) | Value::Listener(_) | Value::Object(_) => f.write_str("[object Object]"),
		}
	}
}

impl<D: Dom> Debug for Value<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Nothing => f.write_str("Nothing"),
			Value::NoChange => f.write_str("NoChange"),
			Value::Null => f.write_str("Null"),
			Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
			Value::Str(s) => {
				if cfg!(feature = "dangerous-logging") {
					f.debug_tuple("Str").field(s).finish()
				} else {
					f.debug_struct("Str").field("len", &s.len()).finish()
				}
			}
			Value::Template(result) => f.debug_tuple("Template").field(result).finish(),
			Value::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Value::Iterable(items) => f.debug_tuple("Iterable").field(items).finish(),
			Value::Directive(_) => f.write_str("Directive"),
			Value::Listener(listener) => f.debug_tuple("Listener").field(&listener.options).finish(),
			Value::Object(_) => f.write_str("Object"),
		}
	}
}

impl<D: Dom> From<&str> for Value<D> {
	fn from(s: &str) -> Self {
		Value::Str(s.into())
	}
}

impl<D: Dom> From<String> for Value<D> {
	fn from(s: String) -> Self {
		Value::Str(s.into())
	}
}

impl<D: Dom> From<Rc<str>> for Value<D> {
	fn from(s: Rc<str>) -> Self {
		Value::Str(s)
	}
}

impl<D: Dom> From<bool> for Value<D> {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

macro_rules! number_conversions {
	($($number:ty),*) => {$(
		impl<D: Dom> From<$number> for Value<D> {
			#[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
			fn from(n: $number) -> Self {
				Value::Number(n as f64)
			}
		}
	)*};
}
number_conversions!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl<D: Dom, T: Into<Value<D>>> From<Option<T>> for Value<D> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

impl<D: Dom, T: Into<Value<D>>> From<Vec<T>> for Value<D> {
	fn from(items: Vec<T>) -> Self {
		Value::Iterable(items.into_iter().map(Into::into).collect())
	}
}

impl<D: Dom> From<TemplateResult<D>> for Value<D> {
	fn from(result: TemplateResult<D>) -> Self {
		Value::Template(result)
	}
}

impl<D: Dom> From<Listener<D>> for Value<D> {
	fn from(listener: Listener<D>) -> Self {
		Value::Listener(listener)
	}
}

impl<D: Dom> From<Directive<D>> for Value<D> {
	fn from(directive: Directive<D>) -> Self {
		Value::Directive(directive)
	}
}

/// A callable that receives the live part instead of being committed.
///
/// It may inspect the part and call its `set_value` (including with [`Value::NoChange`]) before anything is written.
#[derive(Clone)]
pub struct Directive<D: Dom>(Rc<dyn Fn(PartRef<'_, D>)>);
impl<D: Dom> Directive<D> {
	pub fn new(directive: impl Fn(PartRef<'_, D>) + 'static) -> Self {
		Self(Rc::new(directive))
	}

	pub(crate) fn apply(&self, part: PartRef<'_, D>) {
		(self.0)(part)
	}
}
impl<D: Dom> Debug for Directive<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("Directive")
	}
}

/// The `{capture, once, passive}` triple of an event listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
	pub capture: bool,
	pub once: bool,
	pub passive: bool,
}

/// What a function handler receives as its receiver: the render call's event context if one was given,
/// otherwise the element the listener is bound to.
pub enum EventReceiver<'a, D: Dom> {
	Context(&'a Rc<dyn Any>),
	Element(&'a D::Node),
}

/// An object-style event handler.
pub trait HandleEvent<D: Dom> {
	fn handle_event(&self, event: &D::Event);
}

pub enum Handler<D: Dom> {
	#[allow(clippy::type_complexity)]
	Function(Rc<dyn Fn(EventReceiver<'_, D>, &D::Event)>),
	Object(Rc<dyn HandleEvent<D>>),
}
// Not derived, since that would require `D::Event: Clone`.
impl<D: Dom> Clone for Handler<D> {
	fn clone(&self) -> Self {
		match self {
			Handler::Function(handler) => Handler::Function(Rc::clone(handler)),
			Handler::Object(handler) => Handler::Object(Rc::clone(handler)),
		}
	}
}

/// A value for `@event=…` bindings.
pub struct Listener<D: Dom> {
	pub handler: Handler<D>,
	pub options: ListenerOptions,
}
impl<D: Dom> Clone for Listener<D> {
	fn clone(&self) -> Self {
		Self {
			handler: self.handler.clone(),
			options: self.options,
		}
	}
}
impl<D: Dom> Listener<D> {
	pub fn function(handler: impl Fn(EventReceiver<'_, D>, &D::Event) + 'static) -> Self {
		Self {
			handler: Handler::Function(Rc::new(handler)),
			options: ListenerOptions::default(),
		}
	}

	pub fn object(handler: Rc<dyn HandleEvent<D>>) -> Self {
		Self {
			handler: Handler::Object(handler),
			options: ListenerOptions::default(),
		}
	}

	#[must_use]
	pub fn capture(mut self, capture: bool) -> Self {
		self.options.capture = capture;
		self
	}

	#[must_use]
	pub fn once(mut self, once: bool) -> Self {
		self.options.once = once;
		self
	}

	#[must_use]
	pub fn passive(mut self, passive: bool) -> Self {
		self.options.passive = passive;
		self
	}
}
impl<D: Dom> Debug for Listener<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Listener").field("options", &self.options).finish_non_exhaustive()
	}
}
