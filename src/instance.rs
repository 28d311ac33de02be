//! Stamped realizations of a [`Blueprint`].

use crate::{
	parts::{AttributeCommitter, BooleanAttributePart, EventPart, NodePart},
	render::RenderContext,
	template::PartDescriptor,
	walker::Walker,
	Blueprint, Dom, Error, Result, Value,
};
use std::rc::Rc;
use tracing::{instrument, trace_span};

#[derive(Debug)]
enum LivePart<D: Dom> {
	Node(NodePart<D>),
	Attribute(AttributeCommitter<D>),
	Boolean(BooleanAttributePart<D>),
	Event(EventPart<D>),
}

/// A live part and the position of its first value in the template's value list.
#[derive(Debug)]
struct Bound<D: Dom> {
	first_value: usize,
	value_count: usize,
	part: LivePart<D>,
}

/// One stamped copy of a [`Blueprint`]'s content, with one live part per active descriptor.
#[derive(Debug)]
pub struct TemplateInstance<D: Dom> {
	blueprint: Rc<Blueprint<D>>,
	parts: Vec<Bound<D>>,
}

impl<D: Dom> TemplateInstance<D> {
	/// Imports `blueprint`'s content and binds parts to it.
	///
	/// Returns the instance and the fragment holding the stamped nodes. No values are committed yet.
	///
	/// # Errors
	///
	/// Iff a descriptor can't be located in the stamped DOM, or a binding is malformed.
	#[instrument(skip(ctx, blueprint), fields(descriptors = blueprint.descriptors().len()))]
	pub(crate) fn instantiate(ctx: RenderContext<'_, D>, blueprint: Rc<Blueprint<D>>) -> Result<(Self, D::Node)> {
		let dom = ctx.dom;
		let fragment = dom.import_node(blueprint.content(), true);
		let addresses = blueprint.addresses();
		let descriptor_count = blueprint.descriptors().len();

		let mut walker = Walker::new(dom, fragment.clone());
		let mut node = walker.next_node();
		let mut node_index = 0;
		let mut first_value = 0;
		let mut parts = Vec::new();

		for (i, (descriptor, address)) in blueprint.descriptors().iter().zip(addresses).enumerate() {
			let value_count = descriptor.value_count();
			let bound_at = first_value;
			first_value += value_count;

			let address = match address {
				Some(address) => address,
				None => continue,
			};
			while node_index < address && node.is_some() {
				node = walker.next_node();
				node_index += 1;
			}
			let node = node.clone().ok_or(Error::WalkExhausted {
				index: node_index,
				pending: descriptor_count - i,
			})?;

			let part = match descriptor {
				PartDescriptor::Inert => continue,
				PartDescriptor::Node => {
					let start = dom.previous_sibling(&node).ok_or(Error::MissingBoundary { index: address })?;
					LivePart::Node(NodePart::between(start, node))
				}
				PartDescriptor::Attribute { name, strings } => {
					let (prefix, rest) = name.split_at(name.chars().next().map_or(0, char::len_utf8));
					let single = strings.len() == 2 && strings.iter().all(|s| s.is_empty());
					match prefix {
						"." => LivePart::Attribute(AttributeCommitter::property(dom.clone(), node, rest.into(), Rc::clone(strings))),
						"?" => LivePart::Boolean(BooleanAttributePart::new(dom.clone(), node, rest.into(), strings)?),
						"@" if single => LivePart::Event(EventPart::new(dom.clone(), node, rest.into(), ctx.options.event_context.clone())),
						"@" => return Err(Error::MalformedEventBinding { name: rest.to_owned() }),
						_ => LivePart::Attribute(AttributeCommitter::attribute(dom.clone(), node, Rc::clone(name), Rc::clone(strings))),
					}
				}
			};
			parts.push(Bound {
				first_value: bound_at,
				value_count,
				part,
			});
		}

		Ok((Self { blueprint, parts }, fragment))
	}

	#[must_use]
	pub fn blueprint(&self) -> &Rc<Blueprint<D>> {
		&self.blueprint
	}

	/// Sets `values` into all live parts, then commits them all.
	///
	/// Missing values are treated as [`Value::Null`].
	///
	/// # Errors
	///
	/// Iff a nested template can't be compiled or stamped.
	#[instrument(skip(self, ctx, values), fields(values = values.len()))]
	pub(crate) fn update(&mut self, ctx: RenderContext<'_, D>, values: Vec<Value<D>>) -> Result<()> {
		let mut values: Vec<Option<Value<D>>> = values.into_iter().map(Some).collect();
		let mut take = |i: usize| values.get_mut(i).and_then(Option::take).unwrap_or(Value::Null);

		for Bound { first_value, value_count, part } in &mut self.parts {
			match part {
				LivePart::Node(part) => part.set_value(take(*first_value)),
				LivePart::Attribute(committer) => {
					for slot in 0..*value_count {
						committer.set_value(slot, take(*first_value + slot));
					}
				}
				LivePart::Boolean(part) => part.set_value(take(*first_value)),
				LivePart::Event(part) => part.set_value(take(*first_value)),
			}
		}

		for Bound { part, .. } in &mut self.parts {
			match part {
				LivePart::Node(part) => {
					let span = trace_span!("node part");
					let _enter = span.enter();
					part.commit(ctx)?;
				}
				LivePart::Attribute(committer) => committer.commit(),
				LivePart::Boolean(part) => part.commit(),
				LivePart::Event(part) => part.commit(),
			}
		}
		Ok(())
	}
}
