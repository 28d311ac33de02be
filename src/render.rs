//! The rendering entry point.

use crate::{cache::TemplateCache, parts::NodePart, shim::ScopingShim, Blueprint, Dom, Error, Result, TemplateResult, Value};
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{instrument, trace};

/// Per-call rendering options.
#[derive(Clone, Default)]
pub struct RenderOptions {
	/// Partitions the blueprint cache and style scoping. Required iff the [`Renderer`] has a [`ScopingShim`].
	pub scope_name: Option<Rc<str>>,
	/// The receiver of function event handlers, instead of the element they are bound to.
	pub event_context: Option<Rc<dyn Any>>,
}

impl RenderOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn scope_name(mut self, scope_name: impl Into<Rc<str>>) -> Self {
		self.scope_name = Some(scope_name.into());
		self
	}

	#[must_use]
	pub fn event_context(mut self, event_context: Rc<dyn Any>) -> Self {
		self.event_context = Some(event_context);
		self
	}
}

impl Debug for RenderOptions {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderOptions")
			.field("scope_name", &self.scope_name)
			.field("event_context", &self.event_context.is_some())
			.finish()
	}
}

/// Everything a commit needs from its [`Renderer`] call.
pub(crate) struct RenderContext<'a, D: Dom> {
	pub dom: &'a D,
	pub templates: &'a TemplateCache<D>,
	pub options: &'a RenderOptions,
	pub shim: Option<&'a dyn ScopingShim<D>>,
}

impl<'a, D: Dom> Clone for RenderContext<'a, D> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<'a, D: Dom> Copy for RenderContext<'a, D> {}

impl<'a, D: Dom> RenderContext<'a, D> {
	/// The scope blueprints are cached under. Only meaningful with a shim installed.
	fn scope(&self) -> Option<&'a Rc<str>> {
		self.shim.and(self.options.scope_name.as_ref())
	}

	pub fn blueprint(&self, result: &TemplateResult<D>) -> Result<Rc<Blueprint<D>>> {
		self.templates.blueprint(self.dom, result, self.scope(), self.shim)
	}
}

struct RootEntry<D: Dom> {
	container: D::WeakNode,
	part: NodePart<D>,
}

/// Keeps containers in sync with rendered values.
///
/// Each container gets exactly one root [`NodePart`], created on the first [`render`](`Renderer::render`) into it.
/// Containers are only referenced weakly (as far as the [`Dom`] allows), so abandoned ones are pruned automatically.
pub struct Renderer<D: Dom> {
	dom: D,
	templates: TemplateCache<D>,
	roots: RefCell<Vec<RootEntry<D>>>,
	shim: Option<Box<dyn ScopingShim<D>>>,
	prepared_scopes: RefCell<HashSet<Rc<str>>>,
}

impl<D: Dom> Renderer<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			dom,
			templates: TemplateCache::new(),
			roots: RefCell::new(Vec::new()),
			shim: None,
			prepared_scopes: RefCell::new(HashSet::new()),
		}
	}

	/// Creates a renderer that scopes through `shim`. Every render call then needs [`RenderOptions::scope_name`].
	#[must_use]
	pub fn with_shim(dom: D, shim: Box<dyn ScopingShim<D>>) -> Self {
		Self {
			shim: Some(shim),
			..Self::new(dom)
		}
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	#[must_use]
	pub fn templates(&self) -> &TemplateCache<D> {
		&self.templates
	}

	/// How many root parts are registered, including those of dropped containers that weren't pruned yet.
	#[must_use]
	pub fn root_count(&self) -> usize {
		self.roots.borrow().len()
	}

	/// Renders `value` into `container`.
	///
	/// The first render into a container clears it and appends the root part's boundaries.
	/// Later renders only commit what changed.
	///
	/// # Errors
	///
	/// - [`Error::MissingScopeName`] iff a shim is installed but `options` names no scope.
	/// - Any template compilation or stamping error.
	#[instrument(skip(self, value, container))]
	pub fn render(&self, value: impl Into<Value<D>>, container: &D::Node, options: &RenderOptions) -> Result<()> {
		let value = value.into();
		let shim = self.shim.as_deref();
		let scope = match shim {
			Some(_) => Some(options.scope_name.clone().ok_or(Error::MissingScopeName)?),
			None => None,
		};

		let existing = self.take_root(container);
		let has_rendered = existing.is_some();
		let needs_scoping = shim.map_or(false, |shim| shim.needs_scoping(&self.dom, container));
		let ctx = RenderContext {
			dom: &self.dom,
			templates: &self.templates,
			options,
			shim,
		};

		match (shim, scope) {
			(Some(shim), Some(scope)) if needs_scoping && !self.prepared_scopes.borrow().contains(&scope) => {
				trace!("First render in scope. Rendering into a detached fragment.");
				drop(existing);
				let fragment = self.dom.create_fragment();
				let mut part = NodePart::append_into(&self.dom, &fragment);
				part.set_value(value);
				part.commit(ctx)?;

				self.prepared_scopes.borrow_mut().insert(Rc::clone(&scope));
				let scope_blueprints = self.templates.blueprints_in_scope(&scope);
				shim.prepare_template_styles(&self.dom, &scope, &fragment, part.blueprint().map(|blueprint| &**blueprint), &scope_blueprints);

				self.dom.remove_range(container, self.dom.first_child(container), None);
				self.dom.append_child(container, &fragment);
				self.insert_root(container, part);
			}
			_ => {
				let mut part = match existing {
					Some(part) => part,
					None => {
						self.dom.remove_range(container, self.dom.first_child(container), None);
						NodePart::append_into(&self.dom, container)
					}
				};
				part.set_value(value);
				let committed = part.commit(ctx);
				self.insert_root(container, part);
				committed?;
			}
		}

		if let (Some(shim), false, true) = (shim, has_rendered, needs_scoping) {
			shim.style_element(&self.dom, container);
		}
		Ok(())
	}

	/// Compiles (or fetches) the blueprint `result` renders with under `options`.
	///
	/// # Errors
	///
	/// Iff compilation fails.
	pub fn blueprint(&self, result: &TemplateResult<D>, options: &RenderOptions) -> Result<Rc<Blueprint<D>>> {
		RenderContext {
			dom: &self.dom,
			templates: &self.templates,
			options,
			shim: self.shim.as_deref(),
		}
		.blueprint(result)
	}

	/// Forgets `container`'s root part and removes all of its children.
	///
	/// Returns whether anything had been rendered into it.
	#[instrument(skip(self, container))]
	pub fn unmount(&self, container: &D::Node) -> bool {
		let part = self.take_root(container);
		self.dom.remove_range(container, self.dom.first_child(container), None);
		part.is_some()
	}

	/// Drops all cached blueprints and root parts and forgets which scopes were prepared.
	///
	/// Containers keep their current content, but the next render into each starts from scratch.
	pub fn reset(&self) {
		self.templates.clear();
		self.roots.borrow_mut().clear();
		self.prepared_scopes.borrow_mut().clear();
	}

	/// Removes `container`'s root part from the registry, pruning entries of dropped containers along the way.
	fn take_root(&self, container: &D::Node) -> Option<NodePart<D>> {
		let mut roots = self.roots.borrow_mut();
		let dom = &self.dom;
		roots.retain(|entry| dom.upgrade(&entry.container).is_some());
		let position = roots.iter().position(|entry| dom.upgrade(&entry.container).as_ref() == Some(container))?;
		Some(roots.swap_remove(position).part)
	}

	fn insert_root(&self, container: &D::Node, part: NodePart<D>) {
		self.roots.borrow_mut().push(RootEntry {
			container: self.dom.downgrade(container),
			part,
		});
	}
}

impl<D: Dom> Debug for Renderer<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Renderer")
			.field("dom", &self.dom)
			.field("templates", &self.templates)
			.field("roots", &self.roots.borrow().len())
			.field("shim", &self.shim.is_some())
			.field("prepared_scopes", &self.prepared_scopes.borrow().len())
			.finish()
	}
}
