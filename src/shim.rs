//! The extension points offered to a style-scoping compatibility layer.
//!
//! Nothing here is needed for unscoped rendering. A [`Renderer`](`crate::Renderer`) without a shim never calls into this module.

use crate::{Blueprint, Dom};
use std::rc::Rc;

/// A collaborator that scopes styles for containers that can't encapsulate them natively.
pub trait ScopingShim<D: Dom> {
	/// Whether rendering into `container` needs scoping at all.
	fn needs_scoping(&self, dom: &D, container: &D::Node) -> bool;

	/// Called once for each freshly parsed `<template>` element inside a scope, before its dynamic positions are located.
	fn prepare_template_dom(&self, dom: &D, template: &D::Node, scope: &str);

	/// Called on the first render per scope, with the result rendered into the detached `fragment`.
	///
	/// `blueprint` is the blueprint of the root instance, if a template was rendered.
	/// `scope_blueprints` are all blueprints compiled within `scope` so far.
	/// Styles may be moved out of (or into) them with [`Blueprint::remove_nodes`] and [`Blueprint::insert_node`].
	fn prepare_template_styles(&self, dom: &D, scope: &str, fragment: &D::Node, blueprint: Option<&Blueprint<D>>, scope_blueprints: &[Rc<Blueprint<D>>]) {
		let _ = (dom, scope, fragment, blueprint, scope_blueprints);
	}

	/// Called after the first render into a container that needs scoping.
	fn style_element(&self, dom: &D, container: &D::Node) {
		let _ = (dom, container);
	}
}
