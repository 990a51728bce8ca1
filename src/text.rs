use crate::dom::Dom;
use tracing::trace_span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
	Text,
	Comment,
}

/// A live text or comment node.
pub struct VText<D: Dom> {
	kind: TextKind,
	data: String,
	node: D::Node,
}

impl<D: Dom> VText<D> {
	pub(crate) fn mount(dom: &mut D, kind: TextKind, data: String, parent: &D::Node, before: Option<&D::Node>) -> Result<Self, D::Error> {
		let span = if cfg!(feature = "dangerous-logging") {
			trace_span!("Mounting character data", ?kind, data = data.as_str())
		} else {
			trace_span!("Mounting character data", ?kind)
		};
		let _enter = span.enter();

		let node = match kind {
			TextKind::Text => dom.create_text(&data)?,
			TextKind::Comment => dom.create_comment(&data)?,
		};
		dom.insert_before(parent, &node, before)?;
		Ok(Self { kind, data, node })
	}

	pub(crate) fn patch(&mut self, dom: &mut D, data: String) -> Result<(), D::Error> {
		if self.data != data {
			let span = trace_span!("Updating character data", kind = ?self.kind);
			let _enter = span.enter();
			dom.set_text(&self.node, &data)?;
			self.data = data;
		}
		Ok(())
	}

	pub(crate) fn remove(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		dom.remove_child(parent, &self.node)
	}

	pub(crate) fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		dom.insert_before(parent, &self.node, before)
	}

	#[must_use]
	pub fn kind(&self) -> TextKind {
		self.kind
	}

	#[must_use]
	pub fn data(&self) -> &str {
		&self.data
	}

	#[must_use]
	pub fn dom_node(&self) -> &D::Node {
		&self.node
	}
}
