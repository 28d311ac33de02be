//! Compiled blueprints, partitioned by template kind and scope.

use crate::{marker::marker, result::TemplateKind, shim::ScopingShim, Blueprint, Dom, Result, TemplateResult};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
	kind: TemplateKind,
	scope: Option<Rc<str>>,
}

struct Templates<D: Dom> {
	/// Keyed by [`Strings`](`crate::Strings`) identity.
	by_identity: HashMap<usize, Rc<Blueprint<D>>>,
	/// Keyed by the literal segments joined with the marker token.
	by_content: HashMap<String, Rc<Blueprint<D>>>,
}

impl<D: Dom> Default for Templates<D> {
	fn default() -> Self {
		Self {
			by_identity: HashMap::new(),
			by_content: HashMap::new(),
		}
	}
}

/// Blueprint cache for one [`Renderer`](`crate::Renderer`).
pub struct TemplateCache<D: Dom> {
	templates: RefCell<HashMap<CacheKey, Templates<D>>>,
}

impl<D: Dom> Default for TemplateCache<D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Dom> TemplateCache<D> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			templates: RefCell::new(HashMap::new()),
		}
	}

	/// Fetches the blueprint for `result`, compiling it on first use.
	///
	/// Lookup is by literal-segment identity first, then by content, so identical text at different call sites shares one blueprint.
	/// When both `scope` and `shim` are given, freshly parsed templates are handed to [`ScopingShim::prepare_template_dom`] before compilation.
	///
	/// # Errors
	///
	/// Iff compilation fails.
	#[instrument(skip(self, dom, result, shim), fields(kind = ?result.kind()))]
	pub fn blueprint(&self, dom: &D, result: &TemplateResult<D>, scope: Option<&Rc<str>>, shim: Option<&dyn ScopingShim<D>>) -> Result<Rc<Blueprint<D>>> {
		let key = CacheKey {
			kind: result.kind(),
			scope: scope.cloned(),
		};
		let strings = result.strings();
		let identity = strings.identity();

		let content = {
			let mut templates = self.templates.borrow_mut();
			let templates = templates.entry(key.clone()).or_default();
			if let Some(blueprint) = templates.by_identity.get(&identity) {
				trace!("Cache hit by identity.");
				return Ok(Rc::clone(blueprint));
			}

			let content = strings.as_slice().join(marker().token());
			if let Some(blueprint) = templates.by_content.get(&content).cloned() {
				trace!("Cache hit by content.");
				templates.by_identity.insert(identity, Rc::clone(&blueprint));
				return Ok(blueprint);
			}
			content
		};

		// The cache isn't borrowed here, so a shim may inspect it.
		let element = result.template_element(dom);
		if let (Some(scope), Some(shim)) = (scope, shim) {
			shim.prepare_template_dom(dom, &element, scope);
		}
		let blueprint = Rc::new(Blueprint::compile(dom, result, element)?);

		let mut templates = self.templates.borrow_mut();
		let templates = templates.entry(key).or_default();
		templates.by_content.insert(content, Rc::clone(&blueprint));
		templates.by_identity.insert(identity, Rc::clone(&blueprint));
		Ok(blueprint)
	}

	/// All distinct blueprints compiled within `scope`, across template kinds.
	#[must_use]
	pub fn blueprints_in_scope(&self, scope: &str) -> Vec<Rc<Blueprint<D>>> {
		self.templates
			.borrow()
			.iter()
			.filter(|(key, _)| key.scope.as_deref() == Some(scope))
			.flat_map(|(_, templates)| templates.by_content.values().cloned())
			.collect()
	}

	/// The number of distinct blueprints across all partitions.
	#[must_use]
	pub fn len(&self) -> usize {
		self.templates.borrow().values().map(|templates| templates.by_content.len()).sum()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.templates.borrow_mut().clear();
	}
}

impl<D: Dom> Debug for TemplateCache<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateCache").field("len", &self.len()).finish()
	}
}
