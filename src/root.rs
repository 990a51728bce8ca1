use crate::{
	dom::Dom,
	node::{Node, VNode},
};
use tracing::{info, instrument, trace_span};

/// Attached to a specific container element, this `struct` owns the content rendered into it.
///
/// Content is appended after any children the container already has,
/// and only nodes this root inserted are ever touched.
///
/// # Correct Use
///
/// Hand the same `dom` to every call. Removing content that was never rendered (or was removed already) panics.
pub struct DomRoot<D: Dom> {
	container: D::Node,
	content: Option<VNode<D>>,
	generation: u64,
}

impl<D: Dom> DomRoot<D> {
	#[must_use]
	pub fn new_for_element(container: D::Node) -> Self {
		Self {
			container,
			content: None,
			generation: 0,
		}
	}

	/// Mounts `node` on first use, patches the existing content afterwards.
	///
	/// # Errors
	///
	/// Iff a host operation fails. The container may be partially updated in that case.
	#[instrument(skip(self, dom, node), fields(generation = self.generation, container = ?self.container))]
	pub fn render(&mut self, dom: &mut D, node: Node<D>) -> Result<(), D::Error> {
		match &mut self.content {
			Some(content) => content.patch(dom, node, &self.container, None)?,
			empty @ None => *empty = Some(node.mount(dom, &self.container, None)?),
		}
		self.generation += 1;
		info!(generation = self.generation, "Rendered.");
		Ok(())
	}

	/// Runs the [`before_remove`](`VNode::before_remove`) hooks, then detaches all content.
	///
	/// # Errors
	///
	/// Iff a host operation fails.
	///
	/// # Panics
	///
	/// Iff nothing is mounted.
	pub fn remove(&mut self, dom: &mut D) -> Result<(), D::Error> {
		let span = trace_span!("Removing root content", generation = self.generation);
		let _enter = span.enter();

		let content = self
			.content
			.take()
			.unwrap_or_else(|| panic!("Tried to remove root content that isn't mounted (anymore)."));
		content.before_remove();
		content.remove(dom, &self.container)
	}

	#[must_use]
	pub fn container(&self) -> &D::Node {
		&self.container
	}

	#[must_use]
	pub fn content(&self) -> Option<&VNode<D>> {
		self.content.as_ref()
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.content.is_some()
	}

	/// How many [`render`](`DomRoot::render`) calls completed.
	#[must_use]
	pub fn generation(&self) -> u64 {
		self.generation
	}
}
