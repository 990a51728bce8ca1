use crate::{
	dom::Dom,
	node::{next_anchor, patch_slot, Node, VNode},
};
use tracing::trace_span;

/// Live fixed-arity siblings. Empty slots own no DOM at all.
pub struct Multi<D: Dom> {
	slots: Vec<Option<VNode<D>>>,
}

impl<D: Dom> Multi<D> {
	pub(crate) fn mount(dom: &mut D, slots: Vec<Option<Node<D>>>, parent: &D::Node, before: Option<&D::Node>) -> Result<Self, D::Error> {
		let span = trace_span!("Mounting multi", "slots.len()" = slots.len());
		let _enter = span.enter();

		let mut live = Vec::with_capacity(slots.len());
		for slot in slots {
			live.push(match slot {
				Some(node) => Some(node.mount(dom, parent, before)?),
				None => None,
			});
		}
		Ok(Self { slots: live })
	}

	pub(crate) fn patch(&mut self, dom: &mut D, slots: Vec<Option<Node<D>>>, parent: &D::Node, after: Option<&D::Node>) -> Result<(), D::Error> {
		assert_eq!(
			self.slots.len(),
			slots.len(),
			"Multi arity changed from {} to {}. Multi slots are structural and must not change in number.",
			self.slots.len(),
			slots.len()
		);
		let span = trace_span!("Patching multi", "slots.len()" = slots.len());
		let _enter = span.enter();

		for (i, new) in slots.into_iter().enumerate() {
			let (head, tail) = self.slots.split_at_mut(i + 1);
			let anchor = next_anchor(tail.iter().flatten(), after);
			patch_slot(dom, &mut head[i], new, parent, anchor.as_ref())?;
		}
		Ok(())
	}

	pub(crate) fn before_remove(&self) {
		for child in self.slots.iter().flatten() {
			child.before_remove();
		}
	}

	pub(crate) fn remove(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		for child in self.slots.drain(..).flatten() {
			child.remove(dom, parent)?;
		}
		Ok(())
	}

	pub(crate) fn release_listeners(&mut self, dom: &mut D) -> Result<(), D::Error> {
		for child in self.slots.iter_mut().flatten() {
			child.release_listeners(dom)?;
		}
		Ok(())
	}

	pub(crate) fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		for child in self.slots.iter().flatten() {
			child.move_before(dom, parent, before)?;
		}
		Ok(())
	}

	pub(crate) fn first_dom_node(&self) -> Option<&D::Node> {
		self.slots.iter().flatten().find_map(VNode::first_dom_node)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	#[must_use]
	pub fn slot(&self, index: usize) -> Option<&VNode<D>> {
		self.slots.get(index).and_then(Option::as_ref)
	}
}
