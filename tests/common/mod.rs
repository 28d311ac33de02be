#![allow(dead_code)]

use tagged_dom::{
	memory::{MemoryDom, MemoryNode},
	Dom, NodeKind, Renderer,
};
use tracing_subscriber::EnvFilter;

/// Routes logs through the test harness. Filter with `RUST_LOG`.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_env_filter(EnvFilter::from_default_env())
		.try_init();
}

pub fn setup() -> (Renderer<MemoryDom>, MemoryDom, MemoryNode) {
	init_logging();
	let dom = MemoryDom::new();
	let container = dom.create_element("div");
	(Renderer::new(dom.clone()), dom, container)
}

pub fn text_nodes(dom: &MemoryDom, parent: &MemoryNode) -> Vec<MemoryNode> {
	dom.child_nodes(parent).into_iter().filter(|node| dom.node_kind(node) == NodeKind::Text).collect()
}

pub fn texts(dom: &MemoryDom, parent: &MemoryNode) -> Vec<String> {
	text_nodes(dom, parent).iter().filter_map(|node| dom.text_data(node)).collect()
}
