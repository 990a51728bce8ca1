use crate::{
	dom::Dom,
	key::Key,
	node::{patch_slot, Node, VNode},
};
use tracing::trace_span;

/// A live conditional: empty, or one active variant identified by `key`.
pub struct Toggler<D: Dom> {
	key: Key,
	content: Option<Box<VNode<D>>>,
}

impl<D: Dom> Toggler<D> {
	pub(crate) fn mount(dom: &mut D, key: Key, content: Option<Node<D>>, parent: &D::Node, before: Option<&D::Node>) -> Result<Self, D::Error> {
		let span = trace_span!("Mounting toggler", %key, active = content.is_some());
		let _enter = span.enter();

		let content = match content {
			Some(content) => Some(Box::new(content.mount(dom, parent, before)?)),
			None => None,
		};
		Ok(Self { key, content })
	}

	/// Different discriminants never share DOM: the old variant is removed before the new one is mounted.
	pub(crate) fn patch(&mut self, dom: &mut D, key: Key, content: Option<Node<D>>, parent: &D::Node, after: Option<&D::Node>) -> Result<(), D::Error> {
		let span = trace_span!("Patching toggler", old_key = %self.key, new_key = %key);
		let _enter = span.enter();

		let mut slot = self.content.take().map(|content| *content);
		if self.key != key {
			if let Some(old) = slot.take() {
				old.before_remove();
				old.remove(dom, parent)?;
			}
			self.key = key;
		}
		let result = patch_slot(dom, &mut slot, content, parent, after);
		self.content = slot.map(Box::new);
		result
	}

	pub(crate) fn before_remove(&self) {
		if let Some(content) = &self.content {
			content.before_remove();
		}
	}

	pub(crate) fn remove(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		match self.content.take() {
			Some(content) => (*content).remove(dom, parent),
			None => Ok(()),
		}
	}

	pub(crate) fn release_listeners(&mut self, dom: &mut D) -> Result<(), D::Error> {
		match &mut self.content {
			Some(content) => content.release_listeners(dom),
			None => Ok(()),
		}
	}

	pub(crate) fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		match &self.content {
			Some(content) => content.move_before(dom, parent, before),
			None => Ok(()),
		}
	}

	pub(crate) fn first_dom_node(&self) -> Option<&D::Node> {
		self.content.as_deref().and_then(VNode::first_dom_node)
	}

	#[must_use]
	pub fn key(&self) -> &Key {
		&self.key
	}

	#[must_use]
	pub fn content(&self) -> Option<&VNode<D>> {
		self.content.as_deref()
	}
}
