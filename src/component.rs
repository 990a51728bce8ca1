//! Placeholders for components, whose lifecycle lives outside this crate.

use crate::{
	dom::Dom,
	node::{Node, VNode},
};
use std::rc::Rc;
use tracing::trace_span;

/// Hooks the component layer receives from the engine.
pub trait Lifecycle {
	/// Called once the component's content has been inserted.
	fn mounted(&self) {}

	/// Called before the component's DOM is detached, top-down (so before any nested component's hook).
	///
	/// Must not touch the DOM.
	fn before_remove(&self);
}

/// A [`Node::Component`] descriptor.
pub struct ComponentNode<D: Dom> {
	/// Identifies the component instance. Placeholders with different instances are never patched into each other.
	pub lifecycle: Rc<dyn Lifecycle>,
	pub content: Box<Node<D>>,
}

/// A live component placeholder: the component's rendered content plus its hooks.
pub struct Component<D: Dom> {
	lifecycle: Rc<dyn Lifecycle>,
	content: Box<VNode<D>>,
}

impl<D: Dom> Component<D> {
	pub(crate) fn mount(dom: &mut D, node: ComponentNode<D>, parent: &D::Node, before: Option<&D::Node>) -> Result<Self, D::Error> {
		let span = trace_span!("Mounting component");
		let _enter = span.enter();

		let ComponentNode { lifecycle, content } = node;
		let content = Box::new((*content).mount(dom, parent, before)?);
		lifecycle.mounted();
		Ok(Self { lifecycle, content })
	}

	pub(crate) fn patch(&mut self, dom: &mut D, node: ComponentNode<D>, parent: &D::Node, after: Option<&D::Node>) -> Result<(), D::Error> {
		debug_assert!(self.is_instance(&node.lifecycle));
		let span = trace_span!("Patching component");
		let _enter = span.enter();
		self.content.patch(dom, *node.content, parent, after)
	}

	pub(crate) fn is_instance(&self, lifecycle: &Rc<dyn Lifecycle>) -> bool {
		Rc::as_ptr(&self.lifecycle).cast::<()>() == Rc::as_ptr(lifecycle).cast::<()>()
	}

	pub(crate) fn before_remove(&self) {
		self.lifecycle.before_remove();
		self.content.before_remove();
	}

	pub(crate) fn remove(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		self.content.detach(dom, parent)
	}

	pub(crate) fn release_listeners(&mut self, dom: &mut D) -> Result<(), D::Error> {
		self.content.release_listeners(dom)
	}

	pub(crate) fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		self.content.move_before(dom, parent, before)
	}

	pub(crate) fn first_dom_node(&self) -> Option<&D::Node> {
		self.content.first_dom_node()
	}

	#[must_use]
	pub fn lifecycle(&self) -> &Rc<dyn Lifecycle> {
		&self.lifecycle
	}

	#[must_use]
	pub fn content(&self) -> &VNode<D> {
		&self.content
	}
}
