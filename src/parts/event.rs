use super::{take_directive, PartRef};
use crate::{
	value::{EventReceiver, Handler, Listener, ListenerOptions},
	Dom, Value,
};
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	mem,
};
use std::rc::Rc;
use tracing::{instrument, trace, trace_span, warn};

/// An `@event=${…}` binding.
///
/// The host only ever sees one listener per part, a trampoline created up front that dispatches to whichever [`Listener`]
/// was committed last. Swapping handlers with an unchanged options triple therefore doesn't touch the host at all.
pub struct EventPart<D: Dom> {
	dom: D,
	element: D::Node,
	event: Rc<str>,
	pending: Value<D>,
	current: Rc<RefCell<Option<Listener<D>>>>,
	/// The options the trampoline is currently registered with, if it is.
	registered: Option<ListenerOptions>,
	trampoline: D::Listener,
}

impl<D: Dom> EventPart<D> {
	pub(crate) fn new(dom: D, element: D::Node, event: Rc<str>, event_context: Option<Rc<dyn Any>>) -> Self {
		let current = Rc::new(RefCell::new(None::<Listener<D>>));
		let trampoline = {
			let current = Rc::clone(&current);
			let host = dom.clone();
			let weak_element = dom.downgrade(&element);
			let event = Rc::clone(&event);
			dom.create_listener(Box::new(move |e: &D::Event| {
				let span = trace_span!("trampoline", event = %event);
				let _enter = span.enter();

				// Cloned out so that handlers may re-render (and so rebind this part) while running.
				let handler = current.borrow().as_ref().map(|listener| listener.handler.clone());
				match handler {
					Some(Handler::Function(handler)) => match &event_context {
						Some(context) => handler(EventReceiver::Context(context), e),
						None => match host.upgrade(&weak_element) {
							Some(element) => handler(EventReceiver::Element(&element), e),
							None => trace!("Element is gone."),
						},
					},
					Some(Handler::Object(handler)) => handler.handle_event(e),
					None => trace!("No handler is bound."),
				}
			}))
		};

		Self {
			dom,
			element,
			event,
			pending: Value::NoChange,
			current,
			registered: None,
			trampoline,
		}
	}

	pub fn set_value(&mut self, value: Value<D>) {
		self.pending = value;
	}

	#[must_use]
	pub fn value(&self) -> &Value<D> {
		&self.pending
	}

	#[must_use]
	pub fn event(&self) -> &str {
		&self.event
	}

	#[instrument(skip(self), fields(event = %self.event))]
	pub(crate) fn commit(&mut self) {
		while let Some(directive) = take_directive(&mut self.pending) {
			directive.apply(PartRef::Event(&mut *self));
		}

		let listener = match mem::replace(&mut self.pending, Value::NoChange) {
			Value::NoChange => return,
			Value::Listener(listener) => Some(listener),
			Value::Nothing | Value::Null => None,
			other => {
				warn!(value = ?other, "Ignoring a non-listener value bound to an event. The previous listener (if any) is removed.");
				None
			}
		};

		let old = self.registered;
		let new = listener.as_ref().map(|listener| listener.options);
		let remove = old.is_some() && new != old;
		let add = new.is_some() && (old.is_none() || remove);

		if let (true, Some(options)) = (remove, old) {
			trace!(?options, "removeEventListener");
			self.dom.remove_event_listener(&self.element, &self.event, &self.trampoline, options);
			self.registered = None;
		}
		*self.current.borrow_mut() = listener;
		if let (true, Some(options)) = (add, new) {
			trace!(?options, "addEventListener");
			self.dom.add_event_listener(&self.element, &self.event, &self.trampoline, options);
			self.registered = Some(options);
		}
	}
}

impl<D: Dom> Drop for EventPart<D> {
	fn drop(&mut self) {
		if let Some(options) = self.registered.take() {
			self.dom.remove_event_listener(&self.element, &self.event, &self.trampoline, options);
		}
	}
}

impl<D: Dom> Debug for EventPart<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventPart")
			.field("element", &self.element)
			.field("event", &self.event)
			.field("registered", &self.registered)
			.finish_non_exhaustive()
	}
}
