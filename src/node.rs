use crate::{
	block::{Block, BlockNode},
	component::{Component, ComponentNode, Lifecycle},
	dom::Dom,
	key::Key,
	list::List,
	multi::Multi,
	text::{TextKind, VText},
	toggler::Toggler,
};
use std::rc::Rc;
use tracing::{trace_span, warn};

/// A descriptor: what a region should look like after the next [`mount`](`Node::mount`) or [`patch`](`VNode::patch`).
pub enum Node<D: Dom> {
	Text(String),
	Comment(String),
	Block(BlockNode<D>),
	/// Fixed-arity siblings without a wrapper element. Positions are structural.
	Multi(Vec<Option<Node<D>>>),
	/// Keyed siblings. Keys must be unique.
	List(Vec<(Key, Node<D>)>),
	/// At most one active variant, identified by its discriminant.
	Toggler { key: Key, content: Option<Box<Node<D>>> },
	Component(ComponentNode<D>),
}

/// A live, mounted [`Node`].
///
/// Each [`VNode`] owns one contiguous (possibly empty) run of DOM nodes inside its parent.
pub enum VNode<D: Dom> {
	Text(VText<D>),
	Block(Block<D>),
	Multi(Multi<D>),
	List(List<D>),
	Toggler(Toggler<D>),
	Component(Component<D>),
}

impl<D: Dom> Node<D> {
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	pub fn comment(comment: impl Into<String>) -> Self {
		Self::Comment(comment.into())
	}

	pub fn multi(slots: impl IntoIterator<Item = Option<Node<D>>>) -> Self {
		Self::Multi(slots.into_iter().collect())
	}

	pub fn list(entries: impl IntoIterator<Item = (Key, Node<D>)>) -> Self {
		Self::List(entries.into_iter().collect())
	}

	pub fn toggler(key: impl Into<Key>, content: Option<Node<D>>) -> Self {
		Self::Toggler {
			key: key.into(),
			content: content.map(Box::new),
		}
	}

	pub fn component(lifecycle: Rc<dyn Lifecycle>, content: Node<D>) -> Self {
		Self::Component(ComponentNode {
			lifecycle,
			content: Box::new(content),
		})
	}

	pub(crate) fn kind_name(&self) -> &'static str {
		match self {
			Node::Text(_) => "text",
			Node::Comment(_) => "comment",
			Node::Block(_) => "block",
			Node::Multi(_) => "multi",
			Node::List(_) => "list",
			Node::Toggler { .. } => "toggler",
			Node::Component(_) => "component",
		}
	}

	/// Inserts this node's DOM into `parent` before `before` (or at the end).
	///
	/// # Errors
	///
	/// Iff a host operation fails. The DOM may be partially updated in that case.
	pub fn mount(self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<VNode<D>, D::Error> {
		Ok(match self {
			Node::Text(text) => VNode::Text(VText::mount(dom, TextKind::Text, text, parent, before)?),
			Node::Comment(comment) => VNode::Text(VText::mount(dom, TextKind::Comment, comment, parent, before)?),
			Node::Block(block) => VNode::Block(Block::mount(dom, block, parent, before)?),
			Node::Multi(slots) => VNode::Multi(Multi::mount(dom, slots, parent, before)?),
			Node::List(entries) => VNode::List(List::mount(dom, entries, parent, before)?),
			Node::Toggler { key, content } => VNode::Toggler(Toggler::mount(dom, key, content.map(|content| *content), parent, before)?),
			Node::Component(component) => VNode::Component(Component::mount(dom, component, parent, before)?),
		})
	}
}

impl<D: Dom> VNode<D> {
	pub(crate) fn kind_name(&self) -> &'static str {
		match self {
			VNode::Text(text) => match text.kind() {
				TextKind::Text => "text",
				TextKind::Comment => "comment",
			},
			VNode::Block(_) => "block",
			VNode::Multi(_) => "multi",
			VNode::List(_) => "list",
			VNode::Toggler(_) => "toggler",
			VNode::Component(_) => "component",
		}
	}

	/// Whether `node` can be [patched](`VNode::patch`) into `self` without replacing it.
	#[must_use]
	pub fn is_compatible(&self, node: &Node<D>) -> bool {
		match (self, node) {
			(VNode::Text(text), Node::Text(_)) => text.kind() == TextKind::Text,
			(VNode::Text(text), Node::Comment(_)) => text.kind() == TextKind::Comment,
			(VNode::Block(block), Node::Block(node)) => Rc::ptr_eq(block.template(), &node.template),
			(VNode::Multi(_), Node::Multi(_)) | (VNode::List(_), Node::List(_)) | (VNode::Toggler(_), Node::Toggler { .. }) => true,
			(VNode::Component(component), Node::Component(node)) => component.is_instance(&node.lifecycle),
			_ => false,
		}
	}

	/// Updates this node in place to match `node`.
	///
	/// `after` must be the DOM node that directly follows this node's region in `parent` ([`None`] at the end).
	///
	/// If `node` is not [compatible](`VNode::is_compatible`), `self` is torn down and replaced by a freshly mounted `node` at the same position.
	///
	/// # Errors
	///
	/// Iff a host operation fails. The DOM may be partially updated in that case.
	pub fn patch(&mut self, dom: &mut D, node: Node<D>, parent: &D::Node, after: Option<&D::Node>) -> Result<(), D::Error> {
		if !self.is_compatible(&node) {
			let span = trace_span!("Replacing mismatching", old = self.kind_name(), new = node.kind_name());
			let _enter = span.enter();
			self.before_remove();
			self.detach(dom, parent)?;
			*self = node.mount(dom, parent, after)?;
			return Ok(());
		}

		match (self, node) {
			(VNode::Text(text), Node::Text(data)) | (VNode::Text(text), Node::Comment(data)) => text.patch(dom, data),
			(VNode::Block(block), Node::Block(node)) => block.patch(dom, node),
			(VNode::Multi(multi), Node::Multi(slots)) => multi.patch(dom, slots, parent, after),
			(VNode::List(list), Node::List(entries)) => list.patch(dom, entries, parent, after),
			(VNode::Toggler(toggler), Node::Toggler { key, content }) => toggler.patch(dom, key, content.map(|content| *content), parent, after),
			(VNode::Component(component), Node::Component(node)) => component.patch(dom, node, parent, after),
			(old, new) => unreachable!("Compatibility check passed for {} and {}", old.kind_name(), new.kind_name()),
		}
	}

	/// Lets nested [component placeholders](`Node::Component`) run their teardown hooks, top-down.
	///
	/// Never touches the DOM.
	pub fn before_remove(&self) {
		match self {
			VNode::Text(_) => (),
			VNode::Block(block) => block.before_remove(),
			VNode::Multi(multi) => multi.before_remove(),
			VNode::List(list) => list.before_remove(),
			VNode::Toggler(toggler) => toggler.before_remove(),
			VNode::Component(component) => component.before_remove(),
		}
	}

	/// Detaches this node's DOM from `parent`.
	///
	/// This does **not** call [`before_remove`](`VNode::before_remove`).
	///
	/// # Errors
	///
	/// Iff a host operation fails.
	pub fn remove(mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		self.detach(dom, parent)
	}

	/// [`remove`](`VNode::remove`) without giving up ownership, for in-place replacement.
	pub(crate) fn detach(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		match self {
			VNode::Text(text) => text.remove(dom, parent),
			VNode::Block(block) => block.remove(dom, parent),
			VNode::Multi(multi) => multi.remove(dom, parent),
			VNode::List(list) => list.remove(dom, parent),
			VNode::Toggler(toggler) => toggler.remove(dom, parent),
			VNode::Component(component) => component.remove(dom, parent),
		}
	}

	/// Detaches every event listener in this region without touching the tree.
	///
	/// Used where DOM is dropped wholesale instead of being removed node by node.
	pub(crate) fn release_listeners(&mut self, dom: &mut D) -> Result<(), D::Error> {
		match self {
			VNode::Text(_) => Ok(()),
			VNode::Block(block) => block.release_listeners(dom),
			VNode::Multi(multi) => multi.release_listeners(dom),
			VNode::List(list) => list.release_listeners(dom),
			VNode::Toggler(toggler) => toggler.release_listeners(dom),
			VNode::Component(component) => component.release_listeners(dom),
		}
	}

	/// Moves this node's DOM before `before` (or to the end of `parent`), without recreating anything.
	///
	/// # Errors
	///
	/// Iff a host operation fails.
	pub fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		match self {
			VNode::Text(text) => text.move_before(dom, parent, before),
			VNode::Block(block) => block.move_before(dom, parent, before),
			VNode::Multi(multi) => multi.move_before(dom, parent, before),
			VNode::List(list) => list.move_before(dom, parent, before),
			VNode::Toggler(toggler) => toggler.move_before(dom, parent, before),
			VNode::Component(component) => component.move_before(dom, parent, before),
		}
	}

	/// The first DOM node of this region, or [`None`] if the region is empty.
	#[must_use]
	pub fn first_dom_node(&self) -> Option<&D::Node> {
		match self {
			VNode::Text(text) => Some(text.dom_node()),
			VNode::Block(block) => Some(block.dom_node()),
			VNode::Multi(multi) => multi.first_dom_node(),
			VNode::List(list) => list.first_dom_node(),
			VNode::Toggler(toggler) => toggler.first_dom_node(),
			VNode::Component(component) => component.first_dom_node(),
		}
	}
}

/// The insertion reference directly after some region, given the regions that follow it in order.
///
/// Empty regions are skipped; if all of them are empty, this is `after`.
pub(crate) fn next_anchor<'a, D: 'a + Dom>(following: impl IntoIterator<Item = &'a VNode<D>>, after: Option<&D::Node>) -> Option<D::Node> {
	following
		.into_iter()
		.find_map(VNode::first_dom_node)
		.or(after)
		.cloned()
}

/// Patches `old` with `new` if both are present, mounts or removes otherwise.
///
/// Shared by the slot-based containers ([`Block`] child holes, [`Multi`], [`Toggler`]).
pub(crate) fn patch_slot<D: Dom>(dom: &mut D, slot: &mut Option<VNode<D>>, new: Option<Node<D>>, parent: &D::Node, after: Option<&D::Node>) -> Result<(), D::Error> {
	match new {
		Some(new) => {
			if let Some(old) = slot {
				old.patch(dom, new, parent, after)
			} else {
				*slot = Some(new.mount(dom, parent, after)?);
				Ok(())
			}
		}
		None => {
			if let Some(old) = slot.take() {
				old.before_remove();
				old.remove(dom, parent)?;
			}
			Ok(())
		}
	}
}

pub(crate) fn warn_replaced_keyed<D: Dom>(key: &Key, old: &VNode<D>, new: &Node<D>) {
	if !old.is_compatible(new) {
		warn!(
			%key,
			old = old.kind_name(),
			new = new.kind_name(),
			"Keyed entry changed its kind and will be recreated. Consider giving it a new key instead."
		);
	}
}
