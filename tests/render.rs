mod common;

use common::{setup, text_nodes, texts};
use std::rc::Rc;
use tagged_dom::{html, memory::MemoryDom, svg, Dom, RenderOptions, TemplateKind, TemplateResult, Value};

fn paragraph(text: &str) -> TemplateResult<MemoryDom> {
	html!(["<p>", "</p>"], text)
}

fn same_text_elsewhere(text: &str) -> TemplateResult<MemoryDom> {
	html!(["<p>", "</p>"], text)
}

fn item(label: &str) -> TemplateResult<MemoryDom> {
	html!(["<li>", "</li>"], label)
}

fn list(labels: &[&str]) -> TemplateResult<MemoryDom> {
	html!(["<ul>", "</ul>"], labels.iter().map(|label| item(label)).collect::<Vec<_>>())
}

#[test]
fn first_render_replaces_content() {
	let (renderer, dom, container) = setup();
	dom.append_child(&container, &dom.create_text("stale"));

	renderer.render(paragraph("fresh"), &container, &RenderOptions::new()).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>fresh</p>");
}

#[test]
fn unchanged_primitive_commits_once() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render("a", &container, &options).unwrap();
	dom.reset_stats();
	renderer.render("a", &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);

	renderer.render("b", &container, &options).unwrap();
	assert_eq!(dom.stats().text_writes, 1);
	assert_eq!(dom.stats().total(), 1);
	assert_eq!(dom.text_content(&container), "b");
}

#[test]
fn unchanged_template_values_commit_nothing() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(paragraph("a"), &container, &options).unwrap();
	let p = dom.find_element(&container, "p").unwrap();
	dom.reset_stats();

	renderer.render(paragraph("a"), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);

	renderer.render(paragraph("b"), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 1);
	assert_eq!(dom.find_element(&container, "p"), Some(p));
	assert_eq!(dom.visible_html(&container), "<p>b</p>");
}

#[test]
fn text_follows_javascript_conversion() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	for (value, expected) in [
		(Value::<MemoryDom>::from(1.0), "1"),
		(Value::from(0.5), "0.5"),
		(Value::from(-0.0), "0"),
		(Value::from(f64::NAN), "NaN"),
		(Value::from(f64::INFINITY), "Infinity"),
		(Value::from(1e21), "1e+21"),
		(Value::from(-2.5e30), "-2.5e+30"),
		(Value::from(123_456_789_012_345_680_000.0), "123456789012345680000"),
		(Value::from(1e-7), "1e-7"),
		(Value::from(0.000_001), "0.000001"),
		(Value::from(true), "true"),
		(Value::Null, ""),
		(Value::from(vec![1, 2]), "12"),
	] {
		renderer.render(value, &container, &options).unwrap();
		assert_eq!(dom.text_content(&container), expected);
	}
}

#[test]
fn list_items_are_reused_by_position() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(vec!["A", "B", "C"], &container, &options).unwrap();
	let before = text_nodes(&dom, &container);
	assert_eq!(texts(&dom, &container), ["A", "B", "C"]);

	dom.reset_stats();
	renderer.render(vec!["X", "B", "C"], &container, &options).unwrap();
	assert_eq!(texts(&dom, &container), ["X", "B", "C"]);
	assert_eq!(dom.stats().text_writes, 1);
	assert_eq!(dom.stats().dom_writes(), 1);

	dom.reset_stats();
	renderer.render(vec!["C", "B", "X"], &container, &options).unwrap();
	let after = text_nodes(&dom, &container);
	assert_eq!(texts(&dom, &container), ["C", "B", "X"]);
	assert_eq!(before, after);
	assert_eq!(dom.stats().text_writes, 2);
	assert_eq!(dom.stats().inserted + dom.stats().removed, 0);
}

#[test]
fn truncation_leaves_surviving_items_alone() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(vec!["A", "B", "C"], &container, &options).unwrap();
	let a = text_nodes(&dom, &container).remove(0);

	dom.reset_stats();
	renderer.render(vec!["A"], &container, &options).unwrap();
	assert_eq!(text_nodes(&dom, &container), [a.clone()]);
	assert_eq!(dom.text_data(&a).as_deref(), Some("A"));
	assert_eq!(dom.stats().inserted, 0);
	assert_eq!(dom.stats().text_writes, 0);
	// B and C, with the boundary between them and the one after C.
	assert_eq!(dom.stats().removed, 4);

	renderer.render(Vec::<&str>::new(), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "");

	renderer.render(vec!["D", "E"], &container, &options).unwrap();
	assert_eq!(texts(&dom, &container), ["D", "E"]);
}

#[test]
fn nested_template_lists_update_in_place() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(list(&["a", "b"]), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<ul><li>a</li><li>b</li></ul>");
	let ul = dom.find_element(&container, "ul").unwrap();
	let items = |dom: &MemoryDom| {
		dom.child_nodes(&ul)
			.into_iter()
			.filter(|node| dom.node_name(node) == "LI")
			.collect::<Vec<_>>()
	};
	let before = items(&dom);

	dom.reset_stats();
	renderer.render(list(&["c", "b", "d"]), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<ul><li>c</li><li>b</li><li>d</li></ul>");
	assert_eq!(dom.stats().text_writes, 1);
	assert_eq!(items(&dom)[..2], before[..]);
	assert_eq!(renderer.templates().len(), 2);
}

#[test]
fn literal_segments_compile_once() {
	let (renderer, _, _) = setup();
	let options = RenderOptions::new();

	let first = renderer.blueprint(&paragraph("a"), &options).unwrap();
	let again = renderer.blueprint(&paragraph("b"), &options).unwrap();
	let elsewhere = renderer.blueprint(&same_text_elsewhere("c"), &options).unwrap();

	assert!(!core::ptr::eq(paragraph("").strings(), same_text_elsewhere("").strings()));
	assert!(Rc::ptr_eq(&first, &again));
	assert!(Rc::ptr_eq(&first, &elsewhere));
	assert_eq!(renderer.templates().len(), 1);
}

#[test]
fn changing_template_kind_restamps() {
	fn as_html() -> TemplateResult<MemoryDom> {
		html!(["<g>", "</g>"], "x")
	}
	fn as_svg() -> TemplateResult<MemoryDom> {
		svg!(["<g>", "</g>"], "x")
	}

	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(as_html(), &container, &options).unwrap();
	let html_g = dom.find_element(&container, "g").unwrap();
	assert_eq!(dom.node_name(&html_g), "G");

	renderer.render(as_svg(), &container, &options).unwrap();
	let svg_g = dom.find_element(&container, "g").unwrap();
	assert_eq!(dom.node_name(&svg_g), "g");
	assert_ne!(html_g, svg_g);
	assert_eq!(dom.parent(&html_g), None);
	assert_eq!(dom.text_content(&container), "x");

	let html_blueprint = renderer.blueprint(&as_html(), &options).unwrap();
	let svg_blueprint = renderer.blueprint(&as_svg(), &options).unwrap();
	assert!(!Rc::ptr_eq(&html_blueprint, &svg_blueprint));
	assert_eq!(svg_blueprint.kind(), TemplateKind::Svg);
}

#[test]
fn value_shapes_replace_each_other() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render("text", &container, &options).unwrap();
	renderer.render(paragraph("template"), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>template</p>");

	let span = dom.create_element("span");
	renderer.render(Value::<MemoryDom>::Node(span.clone()), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<span></span>");
	dom.reset_stats();
	renderer.render(Value::<MemoryDom>::Node(span), &container, &options).unwrap();
	assert_eq!(dom.stats().total(), 0);

	renderer.render(vec!["a", "b"], &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "ab");

	renderer.render(Value::<MemoryDom>::Nothing, &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "");

	renderer.render(paragraph("back"), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>back</p>");
}

#[test]
fn adjacent_node_parts_stay_separate() {
	fn pair(a: &str, b: &str) -> TemplateResult<MemoryDom> {
		html!(["", "", ""], a, b)
	}

	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(pair("a", "b"), &container, &options).unwrap();
	assert_eq!(texts(&dom, &container), ["a", "b"]);

	renderer.render(pair("c", "b"), &container, &options).unwrap();
	assert_eq!(texts(&dom, &container), ["c", "b"]);
}

#[test]
fn raw_text_positions_render_as_text() {
	fn area(value: &str) -> TemplateResult<MemoryDom> {
		html!(["<textarea>", "</textarea>"], value)
	}

	let (renderer, dom, container) = setup();
	renderer.render(area("<b>"), &container, &RenderOptions::new()).unwrap();
	let textarea = dom.find_element(&container, "textarea").unwrap();
	assert_eq!(dom.text_content(&textarea), "<b>");
	assert_eq!(dom.visible_html(&container), "<textarea>&lt;b&gt;</textarea>");
}

#[test]
fn unmount_and_reset_start_over() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();

	renderer.render(paragraph("a"), &container, &options).unwrap();
	assert!(renderer.unmount(&container));
	assert!(dom.child_nodes(&container).is_empty());
	assert!(!renderer.unmount(&container));

	renderer.render(paragraph("b"), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>b</p>");

	renderer.reset();
	assert!(renderer.templates().is_empty());
	renderer.render(paragraph("c"), &container, &options).unwrap();
	assert_eq!(dom.visible_html(&container), "<p>c</p>");
	assert_eq!(dom.child_nodes(&container).len(), 3);
}

#[test]
fn containers_render_independently() {
	let (renderer, dom, first) = setup();
	let second = dom.create_element("div");
	let options = RenderOptions::new();

	renderer.render(paragraph("1"), &first, &options).unwrap();
	renderer.render(paragraph("2"), &second, &options).unwrap();
	renderer.render(paragraph("3"), &first, &options).unwrap();

	assert_eq!(dom.visible_html(&first), "<p>3</p>");
	assert_eq!(dom.visible_html(&second), "<p>2</p>");
	assert_eq!(renderer.templates().len(), 1);
}

#[test]
fn dropped_containers_are_released() {
	let (renderer, dom, container) = setup();
	let options = RenderOptions::new();
	renderer.render(paragraph("kept"), &container, &options).unwrap();

	let dropped = dom.create_element("div");
	renderer.render(paragraph("gone"), &dropped, &options).unwrap();
	assert_eq!(renderer.root_count(), 2);

	let weak = dom.downgrade(&dropped);
	drop(dropped);
	assert!(dom.upgrade(&weak).is_none());

	renderer.render(paragraph("again"), &container, &options).unwrap();
	assert_eq!(renderer.root_count(), 1);
	assert_eq!(dom.visible_html(&container), "<p>again</p>");
}
