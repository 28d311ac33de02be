//! Compiled, address-only plans for one template shape.

use crate::{
	dom::NodeKind,
	marker::{last_attribute, marker, BOUND_ATTRIBUTE_SUFFIX},
	result::TemplateKind,
	walker::{count_nodes, Walker},
	Dom, Error, Result, TemplateResult,
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{instrument, trace, warn};

/// The static description of one dynamic position (or one attribute group of them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartDescriptor {
	/// A child-node range. The addressed node is the range's end boundary.
	Node,
	/// One attribute with one or more dynamic positions in its value.
	Attribute {
		/// As written in the template, including any `.`, `@` or `?` prefix.
		name: Rc<str>,
		/// The literal pieces of the attribute value around its dynamic positions.
		strings: Rc<[Rc<str>]>,
	},
	/// A binding written inside a comment. Consumes a value but never becomes live.
	Inert,
}

impl PartDescriptor {
	/// How many template values this descriptor consumes.
	#[must_use]
	pub fn value_count(&self) -> usize {
		match self {
			PartDescriptor::Node | PartDescriptor::Inert => 1,
			PartDescriptor::Attribute { strings, .. } => strings.len().saturating_sub(1),
		}
	}
}

/// A compiled template: the detached `<template>` element and the located dynamic positions inside its content.
///
/// Descriptors never change after compilation. Their addresses (positions in [`Walker`] order) live in a separate arena
/// indexed by descriptor, so that the structural edit hooks can rewrite all of them in one pass.
/// A [`None`] address marks a descriptor that can never become live.
#[derive(Debug)]
pub struct Blueprint<D: Dom> {
	kind: TemplateKind,
	element: D::Node,
	content: D::Node,
	descriptors: Vec<PartDescriptor>,
	addresses: RefCell<Vec<Option<usize>>>,
}

impl<D: Dom> Blueprint<D> {
	/// Locates all dynamic positions of `result` in `element`, which must be `result`'s parsed [`TemplateResult::template_element`].
	///
	/// # Errors
	///
	/// Iff the parsed markup doesn't contain a location for each of `result`'s values.
	#[instrument(skip(dom, result, element), fields(kind = ?result.kind(), values = result.strings().len().saturating_sub(1)))]
	pub(crate) fn compile(dom: &D, result: &TemplateResult<D>, element: D::Node) -> Result<Self> {
		let marker = marker();
		let strings = result.strings().as_slice();
		let value_count = strings.len().saturating_sub(1);
		let content = dom.template_content(&element).unwrap_or_else(|| element.clone());

		let mut descriptors = Vec::new();
		let mut addresses = Vec::new();
		let mut to_remove = Vec::new();
		let mut walker = Walker::new(dom, content.clone());

		// Signed, since a removed marker comment steps back before the first node is counted.
		let mut index: isize = -1;
		let mut last_part_index: isize = 0;
		let mut part_index = 0;
		#[allow(clippy::cast_sign_loss)]
		let address = |index: isize| Some(index as usize);

		while part_index < value_count {
			let node = walker.next_node().ok_or(Error::WalkExhausted {
				index: part_index,
				pending: value_count - part_index,
			})?;
			index += 1;

			match dom.node_kind(&node) {
				NodeKind::Element => {
					let bound = dom.attribute_names(&node).iter().filter(|name| name.ends_with(BOUND_ATTRIBUTE_SUFFIX)).count();
					for _ in 0..bound {
						// Attributes are matched in literal order, which the host's attribute order need not follow.
						let segment = strings.get(part_index).copied().unwrap_or_default();
						let unbound = || Error::UnboundAttribute {
							segment: if cfg!(feature = "dangerous-logging") { segment.to_owned() } else { format!("<{} bytes>", segment.len()) },
						};
						let attribute = last_attribute(segment).ok_or_else(unbound)?;
						let lookup_name = attribute.name.to_lowercase() + BOUND_ATTRIBUTE_SUFFIX;
						let value = dom.get_attribute(&node, &lookup_name).ok_or_else(unbound)?;
						dom.remove_attribute(&node, &lookup_name);

						let statics: Rc<[Rc<str>]> = marker.split(&value).into_iter().map(Rc::from).collect();
						part_index += statics.len() - 1;
						descriptors.push(PartDescriptor::Attribute {
							name: attribute.name.into(),
							strings: statics,
						});
						addresses.push(address(index));
					}
				}

				NodeKind::Text => {
					let data = dom.text_data(&node).unwrap_or_default();
					if !marker.is_in(&data) {
						continue;
					}
					let parent = match dom.parent(&node) {
						Some(parent) => parent,
						None => continue,
					};

					// Markers in raw text (`<style>`, `<textarea>`…) are split out into their own node ranges.
					let segments = marker.split(&data);
					let (last, segments) = match segments.split_last() {
						Some(split) => split,
						None => continue,
					};
					for segment in segments {
						let insert = if segment.is_empty() {
							dom.create_comment("")
						} else {
							dom.create_text(&strip_bound_suffix(segment))
						};
						dom.insert_before(&parent, &insert, Some(&node));
						index += 1;
						descriptors.push(PartDescriptor::Node);
						addresses.push(address(index));
					}
					if last.is_empty() {
						dom.insert_before(&parent, &dom.create_comment(""), Some(&node));
						to_remove.push(node);
					} else {
						dom.set_text_data(&node, last);
					}
					part_index += segments.len();
				}

				NodeKind::Comment => {
					let data = dom.text_data(&node).unwrap_or_default();
					if data == marker.token() {
						let parent = match dom.parent(&node) {
							Some(parent) => parent,
							None => continue,
						};

						// Two adjacent parts must not share a boundary.
						if dom.previous_sibling(&node).is_none() || index == last_part_index {
							index += 1;
							dom.insert_before(&parent, &dom.create_comment(""), Some(&node));
						}
						last_part_index = index;
						descriptors.push(PartDescriptor::Node);
						addresses.push(address(index));

						if dom.next_sibling(&node).is_none() {
							// Kept as the end boundary.
							dom.set_text_data(&node, "");
						} else {
							to_remove.push(node);
							index -= 1;
						}
						part_index += 1;
					} else {
						for _ in 0..marker.count_in(&data) {
							descriptors.push(PartDescriptor::Inert);
							addresses.push(None);
							part_index += 1;
						}
					}
				}

				NodeKind::Fragment | NodeKind::Other => (),
			}
		}

		for node in to_remove {
			if let Some(parent) = dom.parent(&node) {
				dom.remove_child(&parent, &node);
			}
		}

		trace!(descriptors = descriptors.len(), "Compiled blueprint.");
		Ok(Self {
			kind: result.kind(),
			element,
			content,
			descriptors,
			addresses: RefCell::new(addresses),
		})
	}

	#[must_use]
	pub fn kind(&self) -> TemplateKind {
		self.kind
	}

	/// The detached `<template>` element.
	#[must_use]
	pub fn element(&self) -> &D::Node {
		&self.element
	}

	/// The compiled content that instances are stamped from.
	#[must_use]
	pub fn content(&self) -> &D::Node {
		&self.content
	}

	#[must_use]
	pub fn descriptors(&self) -> &[PartDescriptor] {
		&self.descriptors
	}

	/// The current addresses, aligned with [`Blueprint::descriptors`].
	#[must_use]
	pub fn addresses(&self) -> Vec<Option<usize>> {
		self.addresses.borrow().clone()
	}

	/// How many values an instance of this blueprint expects.
	#[must_use]
	pub fn value_count(&self) -> usize {
		self.descriptors.iter().map(PartDescriptor::value_count).sum()
	}

	/// Removes `nodes` (each with its subtree) from the compiled content, re-addressing every descriptor.
	///
	/// Descriptors that pointed into a removed subtree can never become live afterwards.
	/// Nodes that aren't part of the content are ignored.
	#[instrument(skip(self, dom, nodes), fields(nodes = nodes.len()))]
	pub fn remove_nodes(&self, dom: &D, nodes: &[D::Node]) {
		let mut addresses = self.addresses.borrow_mut();
		let mut next = next_active(&addresses, 0);
		let mut walker = Walker::new(dom, self.content.clone());
		let mut node_index = 0;
		let mut remove_count = 0;
		let mut removing: Option<D::Node> = None;
		let mut found = Vec::new();

		while let Some(node) = walker.next_node() {
			if removing.as_ref().map_or(false, |removing| !walker.current_is_within(removing)) {
				removing = None;
			}
			if nodes.contains(&node) {
				found.push(node.clone());
				if removing.is_none() {
					removing = Some(node);
				}
			}
			if removing.is_some() {
				remove_count += 1;
			}

			while let Some(i) = next {
				if addresses[i] != Some(node_index) {
					break;
				}
				addresses[i] = if removing.is_some() { None } else { Some(node_index - remove_count) };
				next = next_active(&addresses, i + 1);
			}
			node_index += 1;
		}
		drop(addresses);

		for node in found {
			if let Some(parent) = dom.parent(&node) {
				dom.remove_child(&parent, &node);
			}
		}
	}

	/// Inserts `node` into the compiled content before `reference`, or appends it to the content if `reference` is [`None`].
	///
	/// Every descriptor at or after `reference` moves back by the number of nodes inserted.
	#[instrument(skip(self, dom, node, reference))]
	pub fn insert_node(&self, dom: &D, node: &D::Node, reference: Option<&D::Node>) {
		let reference = match reference {
			Some(reference) => reference,
			None => return dom.append_child(&self.content, node),
		};

		let mut walker = Walker::new(dom, self.content.clone());
		let mut walker_index = 0;
		let at = loop {
			match walker.next_node() {
				Some(current) if &current == reference => break walker_index,
				Some(_) => walker_index += 1,
				None => {
					warn!("Reference node isn't part of the blueprint's content. Nothing was inserted.");
					return;
				}
			}
		};

		let parent = match dom.parent(reference) {
			Some(parent) => parent,
			None => return,
		};
		let inserted = count_nodes(dom, node);
		dom.insert_before(&parent, node, Some(reference));

		for address in self.addresses.borrow_mut().iter_mut().flatten() {
			if *address >= at {
				*address += inserted;
			}
		}
		trace!(at, inserted, "Shifted descriptors.");
	}
}

fn next_active(addresses: &[Option<usize>], from: usize) -> Option<usize> {
	(from..addresses.len()).find(|&i| addresses[i].is_some())
}

/// Undoes the attribute name rewrite in text that the host parser didn't treat as markup.
fn strip_bound_suffix(segment: &str) -> String {
	match last_attribute(segment) {
		Some(attribute) if attribute.name.ends_with(BOUND_ATTRIBUTE_SUFFIX) => {
			let name = &attribute.name[..attribute.name.len() - BOUND_ATTRIBUTE_SUFFIX.len()];
			format!("{}{}{}{}", &segment[..attribute.start], attribute.whitespace, name, attribute.tail)
		}
		_ => segment.to_owned(),
	}
}
