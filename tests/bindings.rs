mod common;

use common::setup;
use core::{
	any::Any,
	cell::{Cell, RefCell},
};
use std::rc::Rc;
use tagged_dom::{
	html,
	memory::{MemoryDom, MemoryEvent},
	Dom, Error, EventReceiver, HandleEvent, Listener, PartRef, RenderOptions, TemplateResult, Value,
};

fn classes(a: impl Into<Value<MemoryDom>>, b: impl Into<Value<MemoryDom>>) -> TemplateResult<MemoryDom> {
	html!([r#"<div class="x "#, " ", r#""></div>"#], a.into(), b.into())
}

fn hidden(value: impl Into<Value<MemoryDom>>) -> TemplateResult<MemoryDom> {
	html!([r#"<div ?hidden=""#, r#""></div>"#], value.into())
}

fn input(value: impl Into<Value<MemoryDom>>) -> TemplateResult<MemoryDom> {
	html!(["<input .value=", ">"], value.into())
}

fn button(listener: impl Into<Value<MemoryDom>>) -> TemplateResult<MemoryDom> {
	html!(["<button @click=", ">Go</button>"], listener.into())
}

#[test]
fn attribute_groups_write_once_per_update() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(classes("a", "b"), &container, &options).unwrap();
	let div = dom.find_element(&container, "div").unwrap();
	assert_eq!(dom.get_attribute(&div, "class").as_deref(), Some("x a b"));
	assert_eq!(dom.attribute_names(&div), ["class"]);

	dom.reset_stats();
	renderer.render(classes("c", "d"), &container, &options).unwrap();
	assert_eq!(dom.stats().attribute_sets, 1);
	assert_eq!(dom.get_attribute(&div, "class").as_deref(), Some("x c d"));

	dom.reset_stats();
	renderer.render(classes("c", "e"), &container, &options).unwrap();
	assert_eq!(dom.stats().attribute_sets, 1);

	dom.reset_stats();
	renderer.render(classes("c", "e"), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);
}

#[test]
fn attribute_interpolation_blanks_null_and_nan() {
	let (renderer, dom, container) = setup();
	renderer.render(classes(Value::Null, f64::NAN), &container, &RenderOptions::new()).unwrap();
	let div = dom.find_element(&container, "div").unwrap();
	assert_eq!(dom.get_attribute(&div, "class").as_deref(), Some("x  "));

	renderer.render(classes(1.5, vec!["p", "q"]), &container, &RenderOptions::new()).unwrap();
	assert_eq!(dom.get_attribute(&div, "class").as_deref(), Some("x 1.5 pq"));
}

#[test]
fn several_attributes_bind_in_literal_order() {
	fn link(href: &str, title: &str) -> TemplateResult<MemoryDom> {
		html!(["<a href=", r#" title="("#, r#")">link</a>"#], href, title)
	}

	let (renderer, dom, container) = setup();
	renderer.render(link("/a", "first"), &container, &RenderOptions::new()).unwrap();
	let a = dom.find_element(&container, "a").unwrap();
	assert_eq!(dom.get_attribute(&a, "href").as_deref(), Some("/a"));
	assert_eq!(dom.get_attribute(&a, "title").as_deref(), Some("(first)"));
	assert_eq!(dom.visible_html(&container), r#"<a href="/a" title="(first)">link</a>"#);
}

#[test]
fn boolean_attributes_follow_truthiness() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(hidden(true), &container, &options).unwrap();
	let div = dom.find_element(&container, "div").unwrap();
	assert_eq!(dom.get_attribute(&div, "hidden").as_deref(), Some(""));

	renderer.render(hidden(false), &container, &options).unwrap();
	assert_eq!(dom.get_attribute(&div, "hidden"), None);

	for (value, present) in [
		(Value::<MemoryDom>::from(1), true),
		(Value::from(0), false),
		(Value::from("no"), true),
		(Value::from(""), false),
		(Value::from(f64::NAN), false),
		(Value::from(vec![0]), true),
		(Value::Null, false),
		(Value::Nothing, false),
	] {
		renderer.render(hidden(value), &container, &options).unwrap();
		assert_eq!(dom.get_attribute(&div, "hidden").is_some(), present);
	}

	dom.reset_stats();
	renderer.render(hidden(false), &container, &options).unwrap();
	renderer.render(hidden(0), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);
}

#[test]
fn boolean_attributes_reject_literal_text() {
	fn mixed(value: bool) -> TemplateResult<MemoryDom> {
		html!([r#"<div ?hidden="a"#, r#""></div>"#], value)
	}

	let (renderer, _, container) = setup();
	let result = renderer.render(mixed(true), &container, &RenderOptions::new());
	assert!(matches!(result, Err(Error::MalformedBooleanBinding { name }) if name == "hidden"));
}

#[test]
fn single_property_bindings_keep_the_value() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(input(5), &container, &options).unwrap();
	let element = dom.find_element(&container, "input").unwrap();
	assert!(matches!(dom.property(&element, "value"), Some(Value::Number(n)) if n == 5.0));
	assert_eq!(dom.get_attribute(&element, "value"), None);
	assert!(dom.attribute_names(&element).is_empty());

	dom.reset_stats();
	renderer.render(input(5), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);

	let object: Rc<dyn Any> = Rc::new(String::from("opaque"));
	renderer.render(input(Value::Object(Rc::clone(&object))), &container, &options).unwrap();
	match dom.property(&element, "value") {
		Some(Value::Object(assigned)) => assert!(Rc::ptr_eq(&assigned, &object)),
		other => panic!("Unexpected property value {:?}", other),
	}
}

#[test]
fn property_names_keep_their_case() {
	fn labelled(label: &str) -> TemplateResult<MemoryDom> {
		html!([r#"<span .textLabel="<"#, r#">"></span>"#], label)
	}

	let (renderer, dom, container) = setup();
	renderer.render(labelled("x"), &container, &RenderOptions::new()).unwrap();
	let span = dom.find_element(&container, "span").unwrap();
	assert!(matches!(dom.property(&span, "textLabel"), Some(Value::Str(s)) if &*s == "<x>"));
	assert!(dom.property(&span, "textlabel").is_none());
}

#[test]
fn event_listeners_only_change_with_their_options() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();
	let first = Rc::new(Cell::new(0));
	let second = Rc::new(Cell::new(0));

	let counting = |count: &Rc<Cell<usize>>| {
		let count = Rc::clone(count);
		Listener::<MemoryDom>::function(move |_, _| count.set(count.get() + 1))
	};

	renderer.render(button(counting(&first)), &container, &options).unwrap();
	let element = dom.find_element(&container, "button").unwrap();
	assert_eq!(dom.stats().listener_adds, 1);
	assert_eq!(dom.dispatch(&element, "click"), 1);
	assert_eq!(first.get(), 1);

	dom.reset_stats();
	renderer.render(button(counting(&second)), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);
	dom.dispatch(&element, "click");
	assert_eq!((first.get(), second.get()), (1, 1));

	dom.reset_stats();
	renderer.render(button(counting(&second).once(true)), &container, &options).unwrap();
	assert_eq!(dom.stats().listener_removes, 1);
	assert_eq!(dom.stats().listener_adds, 1);
	assert_eq!(dom.listener_count(&element), 1);

	dom.reset_stats();
	renderer.render(button(Value::Null), &container, &options).unwrap();
	assert_eq!(dom.stats().listener_removes, 1);
	assert_eq!(dom.listener_count(&element), 0);
	assert_eq!(dom.dispatch(&element, "click"), 0);
	assert_eq!(second.get(), 1);
}

#[test]
fn function_handlers_receive_the_event_context() {
	let (renderer, dom, container) = setup();
	let received = Rc::new(RefCell::new(Vec::new()));

	let listener = {
		let received = Rc::clone(&received);
		Listener::<MemoryDom>::function(move |receiver, event: &MemoryEvent| {
			let entry = match receiver {
				EventReceiver::Context(context) => format!("context {:?}", context.downcast_ref::<u32>()),
				EventReceiver::Element(element) => format!("element {:?}", element),
			};
			received.borrow_mut().push(format!("{} {}", entry, event.name()));
		})
	};

	renderer.render(button(listener.clone()), &container, &RenderOptions::new()).unwrap();
	let element = dom.find_element(&container, "button").unwrap();
	dom.dispatch(&element, "click");

	let other = dom.create_element("div");
	let context: Rc<dyn Any> = Rc::new(7_u32);
	renderer.render(button(listener), &other, &RenderOptions::new().event_context(context)).unwrap();
	let element = dom.find_element(&other, "button").unwrap();
	dom.dispatch(&element, "click");

	assert_eq!(*received.borrow(), ["element <button> click", "context Some(7) click"]);
}

#[test]
fn object_handlers_and_bubbling() {
	#[derive(Default)]
	struct Counter(Cell<usize>);
	impl HandleEvent<MemoryDom> for Counter {
		fn handle_event(&self, _: &MemoryEvent) {
			self.0.set(self.0.get() + 1);
		}
	}

	fn wrapper(listener: Listener<MemoryDom>) -> TemplateResult<MemoryDom> {
		html!(["<section @ping=", "><p>inner</p></section>"], listener)
	}

	let (renderer, dom, container) = setup();
	let counter = Rc::new(Counter::default());
	renderer.render(wrapper(Listener::object(counter.clone())), &container, &RenderOptions::new()).unwrap();

	let p = dom.find_element(&container, "p").unwrap();
	assert_eq!(dom.dispatch(&p, "ping"), 1);
	assert_eq!(dom.dispatch(&p, "pong"), 0);
	assert_eq!(counter.0.get(), 1);
}

#[test]
fn event_bindings_reject_literal_text() {
	fn mixed(listener: Listener<MemoryDom>) -> TemplateResult<MemoryDom> {
		html!([r#"<b @click="x"#, r#""></b>"#], listener)
	}

	let (renderer, _, container) = setup();
	let result = renderer.render(mixed(Listener::function(|_, _| ())), &container, &RenderOptions::new());
	assert!(matches!(result, Err(Error::MalformedEventBinding { name }) if name == "click"));
}

#[test]
fn dropping_an_instance_removes_its_listeners() {
	let (renderer, dom, container) = setup();
	renderer.render(button(Listener::function(|_, _| ())), &container, &RenderOptions::new()).unwrap();
	let element = dom.find_element(&container, "button").unwrap();
	assert_eq!(dom.listener_count(&element), 1);

	renderer.render("replaced", &container, &RenderOptions::new()).unwrap();
	assert_eq!(dom.listener_count(&element), 0);
}

#[test]
fn directives_receive_the_live_part() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();
	let seen = Rc::new(RefCell::new(Vec::new()));

	let recording = |label: &'static str| {
		let seen = Rc::clone(&seen);
		Value::<MemoryDom>::directive(move |mut part| {
			let kind = match &part {
				PartRef::Node(_) => "node".to_owned(),
				PartRef::Attribute(attribute) => format!("{}[{}]", attribute.committer().name(), attribute.index()),
				PartRef::Boolean(boolean) => format!("?{}", boolean.name()),
				PartRef::Event(event) => format!("@{}", event.event()),
			};
			seen.borrow_mut().push(kind);
			part.set_value(label.into());
		})
	};

	renderer.render(classes("a", recording("b")), &container, &options).unwrap();
	let div = dom.find_element(&container, "div").unwrap();
	assert_eq!(dom.get_attribute(&div, "class").as_deref(), Some("x a b"));

	renderer.render(recording("text"), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "text");

	renderer.render(hidden(recording("yes")), &container, &options).unwrap();
	let div = dom.find_element(&container, "div").unwrap();
	assert_eq!(dom.get_attribute(&div, "hidden").as_deref(), Some(""));

	assert_eq!(*seen.borrow(), ["class[1]", "node", "?hidden"]);
}

#[test]
fn no_change_directives_skip_the_commit() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();
	let keep = || Value::<MemoryDom>::directive(|mut part| part.set_value(Value::NoChange));

	renderer.render(classes("a", "b"), &container, &options).unwrap();
	dom.reset_stats();
	renderer.render(classes(keep(), keep()), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);

	renderer.render("a", &container, &options).unwrap();
	dom.reset_stats();
	renderer.render(keep(), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);
	assert_eq!(dom.visible_html(&container), "a");
}

#[test]
fn comment_bindings_are_never_committed() {
	fn annotated(note: &str, text: &str) -> TemplateResult<MemoryDom> {
		html!(["<!-- ", " --><p>", "</p>"], note, text)
	}

	let (renderer, dom, container) = setup();
	renderer.render(annotated("secret", "shown"), &container, &RenderOptions::new()).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>shown</p>");
	assert!(!dom.inner_html(&container).contains("secret"));

	renderer.render(annotated("other", "again"), &container, &RenderOptions::new()).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>again</p>");
}

#[test]
fn comment_bindings_without_padding_stay_hidden() {
	fn annotated(note: &str, text: &str) -> TemplateResult<MemoryDom> {
		html!(["<!--", "--><p>", "</p>"], note, text)
	}

	let (renderer, dom, container) = setup();
	renderer.render(annotated("secret", "shown"), &container, &RenderOptions::new()).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>shown</p>");
	assert!(!dom.inner_html(&container).contains("secret"));
	assert_eq!(dom.text_content(&container), "shown");
}

#[test]
fn listeners_clone_for_any_dom() {
	fn duplicate<D: Dom>(listener: &Listener<D>) -> Listener<D> {
		listener.clone()
	}

	let calls = Rc::new(Cell::new(0));
	let listener = Listener::<MemoryDom>::function({
		let calls = Rc::clone(&calls);
		move |_, _| calls.set(calls.get() + 1)
	})
	.once(true);
	let copy = duplicate(&listener);
	assert_eq!(copy.options, listener.options);

	let (renderer, dom, container) = setup();
	renderer.render(button(copy), &container, &RenderOptions::new()).unwrap();
	let element = dom.find_element(&container, "button").unwrap();
	assert_eq!(dom.dispatch(&element, "click"), 1);
	assert_eq!(calls.get(), 1);
}
