use super::{take_directive, PartRef};
use crate::{dom::NodeKind, instance::TemplateInstance, render::RenderContext, Blueprint, Dom, Result, TemplateResult, Value};
use core::{
	fmt::{self, Debug, Formatter},
	mem,
};
use std::rc::Rc;
use tracing::{instrument, trace};

/// What a [`NodePart`] last committed.
enum Committed<D: Dom> {
	Unset,
	Nothing,
	Primitive(Value<D>),
	/// A stringified value of some other shape. Never considered unchanged.
	Text,
	Node(D::Node),
	Instance(TemplateInstance<D>),
	Items(Vec<NodePart<D>>),
}

impl<D: Dom> Debug for Committed<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Committed::Unset => f.write_str("Unset"),
			Committed::Nothing => f.write_str("Nothing"),
			Committed::Primitive(value) => f.debug_tuple("Primitive").field(value).finish(),
			Committed::Text => f.write_str("Text"),
			Committed::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Committed::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
			Committed::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
		}
	}
}

/// A range of child nodes between two boundary nodes, which themselves are not part of the range.
pub struct NodePart<D: Dom> {
	start: D::Node,
	end: D::Node,
	pending: Value<D>,
	committed: Committed<D>,
}

impl<D: Dom> NodePart<D> {
	/// Appends two fresh boundary markers to `container`.
	pub(crate) fn append_into(dom: &D, container: &D::Node) -> Self {
		let start = dom.create_comment("");
		let end = dom.create_comment("");
		dom.append_child(container, &start);
		dom.append_child(container, &end);
		Self::between(start, end)
	}

	/// Binds to the range between two existing sibling nodes.
	pub(crate) fn between(start: D::Node, end: D::Node) -> Self {
		Self {
			start,
			end,
			pending: Value::NoChange,
			committed: Committed::Unset,
		}
	}

	/// Appends two fresh boundary markers to the end of `parent`'s range.
	fn append_into_part(dom: &D, parent: &Self) -> Self {
		let start = dom.create_comment("");
		let end = dom.create_comment("");
		parent.insert(dom, &start);
		parent.insert(dom, &end);
		Self::between(start, end)
	}

	/// Splits off the end of `previous`'s range with a fresh marker that `previous` then ends at.
	fn insert_after_part(dom: &D, previous: &mut Self) -> Self {
		let start = dom.create_comment("");
		previous.insert(dom, &start);
		let end = mem::replace(&mut previous.end, start.clone());
		Self::between(start, end)
	}

	#[must_use]
	pub fn start(&self) -> &D::Node {
		&self.start
	}

	#[must_use]
	pub fn end(&self) -> &D::Node {
		&self.end
	}

	pub fn set_value(&mut self, value: Value<D>) {
		self.pending = value;
	}

	/// The pending value, i.e. [`Value::NoChange`] right after a commit.
	#[must_use]
	pub fn value(&self) -> &Value<D> {
		&self.pending
	}

	/// The blueprint of the template instance this part currently holds, if any.
	#[must_use]
	pub fn blueprint(&self) -> Option<&Rc<Blueprint<D>>> {
		match &self.committed {
			Committed::Instance(instance) => Some(instance.blueprint()),
			_ => None,
		}
	}

	/// Commits the pending value.
	///
	/// Does nothing while the start boundary is detached.
	///
	/// # Errors
	///
	/// Iff a nested template can't be compiled or stamped.
	#[instrument(skip(self, ctx))]
	pub(crate) fn commit(&mut self, ctx: RenderContext<'_, D>) -> Result<()> {
		let dom = ctx.dom;
		if dom.parent(&self.start).is_none() {
			trace!("Start boundary is detached.");
			return Ok(());
		}

		while let Some(directive) = take_directive(&mut self.pending) {
			directive.apply(PartRef::Node(&mut *self));
		}

		match mem::replace(&mut self.pending, Value::NoChange) {
			Value::NoChange => Ok(()),
			Value::Nothing => {
				self.committed = Committed::Nothing;
				self.clear(dom, None);
				Ok(())
			}
			Value::Template(result) => self.commit_template(ctx, result),
			Value::Node(node) => {
				self.commit_node(dom, node);
				Ok(())
			}
			Value::Iterable(items) => self.commit_iterable(ctx, items),
			value if value.is_primitive() => {
				if !matches!(&self.committed, Committed::Primitive(old) if old.same_primitive(&value)) {
					self.commit_text(dom, &value);
					self.committed = Committed::Primitive(value);
				}
				Ok(())
			}
			other => {
				self.commit_text(dom, &other);
				self.committed = Committed::Text;
				Ok(())
			}
		}
	}

	/// Inserts `node` right before the end boundary.
	fn insert(&self, dom: &D, node: &D::Node) {
		if let Some(parent) = dom.parent(&self.end) {
			dom.insert_before(&parent, node, Some(&self.end));
		}
	}

	/// Removes everything after `from` (by default the start boundary) up to the end boundary.
	fn clear(&self, dom: &D, from: Option<&D::Node>) {
		let from = from.unwrap_or(&self.start);
		if let Some(parent) = dom.parent(&self.start) {
			dom.remove_range(&parent, dom.next_sibling(from), Some(&self.end));
		}
	}

	fn commit_node(&mut self, dom: &D, node: D::Node) {
		if matches!(&self.committed, Committed::Node(old) if *old == node) {
			return;
		}
		self.clear(dom, None);
		self.insert(dom, &node);
		self.committed = Committed::Node(node);
	}

	fn commit_text(&mut self, dom: &D, value: &Value<D>) {
		let text = value.node_text();
		let first = dom.next_sibling(&self.start);
		match first {
			Some(node) if dom.node_kind(&node) == NodeKind::Text && dom.previous_sibling(&self.end).as_ref() == Some(&node) => {
				trace!("Updating text in place.");
				dom.set_text_data(&node, &text);
			}
			_ => {
				let node = dom.create_text(&text);
				self.commit_node(dom, node);
			}
		}
	}

	fn commit_template(&mut self, ctx: RenderContext<'_, D>, result: TemplateResult<D>) -> Result<()> {
		let blueprint = ctx.blueprint(&result)?;
		if let Committed::Instance(instance) = &mut self.committed {
			if Rc::ptr_eq(instance.blueprint(), &blueprint) {
				trace!("Updating existing instance.");
				return instance.update(ctx, result.into_values());
			}
		}

		let (mut instance, fragment) = TemplateInstance::instantiate(ctx, blueprint)?;
		instance.update(ctx, result.into_values())?;
		self.commit_node(ctx.dom, fragment);
		self.committed = Committed::Instance(instance);
		Ok(())
	}

	fn commit_iterable(&mut self, ctx: RenderContext<'_, D>, items: Vec<Value<D>>) -> Result<()> {
		let dom = ctx.dom;
		let mut parts = match mem::replace(&mut self.committed, Committed::Unset) {
			Committed::Items(parts) => parts,
			_ => {
				self.clear(dom, None);
				Vec::new()
			}
		};

		let mut count = 0;
		for item in items {
			if count == parts.len() {
				let part = match parts.last_mut() {
					None => Self::append_into_part(dom, self),
					Some(previous) => Self::insert_after_part(dom, previous),
				};
				parts.push(part);
			}
			parts[count].set_value(item);
			if let Err(error) = parts[count].commit(ctx) {
				self.committed = Committed::Items(parts);
				return Err(error);
			}
			count += 1;
		}

		if count < parts.len() {
			trace!(from = parts.len(), to = count, "Truncating items.");
			let from = count.checked_sub(1).map(|last| parts[last].end.clone());
			parts.truncate(count);
			self.clear(dom, from.as_ref());
		}
		self.committed = Committed::Items(parts);
		Ok(())
	}
}

impl<D: Dom> Debug for NodePart<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("NodePart")
			.field("start", &self.start)
			.field("end", &self.end)
			.field("committed", &self.committed)
			.finish_non_exhaustive()
	}
}
