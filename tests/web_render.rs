#![cfg(all(target_arch = "wasm32", feature = "web"))]

use std::{cell::Cell, rc::Rc};
use tagged_dom::{html, web::WebDom, Dom, Listener, RenderOptions, Renderer, TemplateResult};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_logging() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

fn counter(count: usize, on_click: Listener<WebDom>) -> TemplateResult<WebDom> {
	html!([r#"<button id="counter" class="n"#, r#"" @click="#, ">", "</button>"], count, on_click, count)
}

#[wasm_bindgen_test]
fn renders_and_updates() {
	init_logging();

	let dom = WebDom::from_window().unwrap();
	let body = dom.document().body().unwrap();
	let renderer = Renderer::new(dom.clone());
	let container: web_sys::Node = body.into();

	let clicks = Rc::new(Cell::new(0));
	let on_click = {
		let clicks = Rc::clone(&clicks);
		Listener::function(move |_, _| clicks.set(clicks.get() + 1))
	};

	renderer.render(counter(0, on_click.clone()), &container, &RenderOptions::new()).unwrap();
	let button: HtmlElement = window().unwrap().document().unwrap().get_element_by_id("counter").unwrap().dyn_into().unwrap();
	assert_eq!(button.text_content().as_deref(), Some("0"));
	assert_eq!(button.class_name(), "n0");

	button.click();
	assert_eq!(clicks.get(), 1);

	renderer.render(counter(1, on_click), &container, &RenderOptions::new()).unwrap();
	let same: HtmlElement = window().unwrap().document().unwrap().get_element_by_id("counter").unwrap().dyn_into().unwrap();
	assert_eq!(button, same);
	assert_eq!(button.text_content().as_deref(), Some("1"));
	assert_eq!(button.class_name(), "n1");

	button.click();
	assert_eq!(clicks.get(), 2);

	assert!(renderer.unmount(&container));
	assert_eq!(dom.first_child(&container), None);
}

#[wasm_bindgen_test]
fn svg_content_is_namespaced() {
	init_logging();

	let dom = WebDom::from_window().unwrap();
	let container = dom.document().create_element("svg").unwrap();
	let renderer = Renderer::new(dom.clone());

	fn circle(radius: u32) -> TemplateResult<WebDom> {
		tagged_dom::svg!(["<circle r=", "></circle>"], radius)
	}

	let container: web_sys::Node = container.into();
	renderer.render(circle(5), &container, &RenderOptions::new()).unwrap();
	let circle = container.dyn_ref::<web_sys::Element>().unwrap().query_selector("circle").unwrap().unwrap();
	assert_eq!(circle.namespace_uri().as_deref(), Some("http://www.w3.org/2000/svg"));
	assert_eq!(circle.get_attribute("r").as_deref(), Some("5"));
}
