//! Depth-first traversal over elements, text and comments, including `<template>` contents.
//!
//! Every address in a [`Blueprint`](`crate::Blueprint`) is a position in this traversal order.
//! Compilation, stamping and the structural edit hooks all walk with this type so that they agree on it.

use crate::{dom::NodeKind, Dom};

/// Where to continue once a template's content is exhausted.
#[derive(Debug)]
struct ReturnPoint<N> {
	root: N,
	template: N,
}

#[derive(Debug)]
pub(crate) struct Walker<'a, D: Dom> {
	dom: &'a D,
	root: D::Node,
	current: Option<D::Node>,
	stack: Vec<ReturnPoint<D::Node>>,
	exhausted: bool,
}

impl<'a, D: Dom> Walker<'a, D> {
	/// Walks the descendants of `root`, not `root` itself.
	pub fn new(dom: &'a D, root: D::Node) -> Self {
		Self {
			dom,
			root,
			current: None,
			stack: Vec::new(),
			exhausted: false,
		}
	}

	/// The next element, text or comment node, or [`None`] once the whole tree (and all nested template contents) is exhausted.
	pub fn next_node(&mut self) -> Option<D::Node> {
		while !self.exhausted {
			let next = match &self.current {
				None => self.dom.first_child(&self.root),
				Some(current) => match self.dom.template_content(current) {
					Some(content) => {
						let root = core::mem::replace(&mut self.root, content.clone());
						let template = current.clone();
						self.stack.push(ReturnPoint { root, template });
						self.dom.first_child(&content)
					}
					None => self.dom.first_child(current).or_else(|| self.following(current)),
				},
			};

			let next = match next.or_else(|| self.resume()) {
				Some(next) => next,
				None => {
					self.exhausted = true;
					self.current = None;
					return None;
				}
			};

			self.current = Some(next.clone());
			match self.dom.node_kind(&next) {
				NodeKind::Element | NodeKind::Text | NodeKind::Comment => return Some(next),
				NodeKind::Fragment | NodeKind::Other => (),
			}
		}
		None
	}

	/// Leaves exhausted template contents until a following node is found.
	fn resume(&mut self) -> Option<D::Node> {
		while let Some(ReturnPoint { root, template }) = self.stack.pop() {
			self.root = root;
			if let Some(next) = self.following(&template) {
				return Some(next);
			}
		}
		None
	}

	/// Whether the node last returned by [`Walker::next_node`] is `ancestor` or lies within it, looking through template contents.
	pub fn current_is_within(&self, ancestor: &D::Node) -> bool {
		let current = match &self.current {
			Some(current) => current,
			None => return false,
		};
		self.is_inclusive_descendant(current, ancestor)
			|| self.stack.iter().any(|ReturnPoint { template, .. }| self.is_inclusive_descendant(template, ancestor))
	}

	fn is_inclusive_descendant(&self, node: &D::Node, ancestor: &D::Node) -> bool {
		let mut node = Some(node.clone());
		while let Some(current) = node {
			if &current == ancestor {
				return true;
			}
			node = self.dom.parent(&current);
		}
		false
	}

	/// The next node after `node`'s subtree within the current root.
	fn following(&self, node: &D::Node) -> Option<D::Node> {
		let mut node = node.clone();
		loop {
			if node == self.root {
				return None;
			}
			if let Some(sibling) = self.dom.next_sibling(&node) {
				return Some(sibling);
			}
			node = self.dom.parent(&node)?;
		}
	}
}

/// The number of addresses `node` occupies: itself (unless it is a fragment) plus all its walkable descendants.
pub(crate) fn count_nodes<D: Dom>(dom: &D, node: &D::Node) -> usize {
	let own = match dom.node_kind(node) {
		NodeKind::Fragment => 0,
		_ => 1,
	};
	let root = dom.template_content(node).unwrap_or_else(|| node.clone());
	let mut walker = Walker::new(dom, root);
	let mut count = own;
	while walker.next_node().is_some() {
		count += 1;
	}
	count
}
