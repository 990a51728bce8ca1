//! An in-process [`Dom`] implementation.
//!
//! [`MemoryDom`] keeps all nodes in an arena and records every mutation it performs,
//! which makes it suitable for tests and for bounded rendering without a browser.

use crate::dom::{Dom, Handler, Property};
use core::{
	fmt::{self, Debug, Formatter, Write as _},
	sync::atomic::{AtomicU32, Ordering},
};
use thiserror::Error;
use tracing::trace;

/// A node handle. Only meaningful for the [`MemoryDom`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Distinguishes [`MemoryDom`] instances. This is their [`Dom::Owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u32);

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(0);

/// The event passed to handlers by [`MemoryDom::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub name: String,
	pub target: NodeId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryDomError {
	#[error("unknown node {0:?}")]
	UnknownNode(NodeId),
	#[error("{child:?} is not a child of {parent:?}")]
	NotAChild { parent: NodeId, child: NodeId },
	#[error("{0:?} is not an element")]
	NotAnElement(NodeId),
	#[error("{0:?} is not a text or comment node")]
	NotCharacterData(NodeId),
	#[error("inserting {node:?} into {parent:?} would create a cycle")]
	Cycle { parent: NodeId, node: NodeId },
	#[error("listener {0:?} is not attached to this element")]
	UnknownListener(ListenerId),
}

/// One recorded host operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	Create(NodeId),
	/// `node` was detached before and got attached.
	Insert { parent: NodeId, node: NodeId, before: Option<NodeId> },
	/// `node` was attached already and got relocated.
	Move { parent: NodeId, node: NodeId, before: Option<NodeId> },
	Remove { parent: NodeId, node: NodeId },
	Clear(NodeId),
	SetText(NodeId),
	SetAttribute { element: NodeId, name: String },
	RemoveAttribute { element: NodeId, name: String },
	SetProperty { element: NodeId, name: String },
	AddClass { element: NodeId, token: String },
	RemoveClass { element: NodeId, token: String },
	AddListener { element: NodeId, event: String },
	RemoveListener { element: NodeId, event: String },
}

impl Mutation {
	/// The node this mutation was performed on (the inserted, moved or removed one for tree mutations).
	#[must_use]
	pub fn subject(&self) -> NodeId {
		match *self {
			Mutation::Create(node)
			| Mutation::Insert { node, .. }
			| Mutation::Move { node, .. }
			| Mutation::Remove { node, .. }
			| Mutation::Clear(node)
			| Mutation::SetText(node) => node,
			Mutation::SetAttribute { element, .. }
			| Mutation::RemoveAttribute { element, .. }
			| Mutation::SetProperty { element, .. }
			| Mutation::AddClass { element, .. }
			| Mutation::RemoveClass { element, .. }
			| Mutation::AddListener { element, .. }
			| Mutation::RemoveListener { element, .. } => element,
		}
	}
}

enum Data {
	Element {
		tag: String,
		namespace: Option<String>,
		attributes: Vec<(String, String)>,
		properties: Vec<(String, Property)>,
		listeners: Vec<(ListenerId, String, Handler<MemoryDom>)>,
	},
	Text(String),
	Comment(String),
}

struct MemoryNode {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// An arena-backed DOM that logs its mutations.
///
/// Nodes are never freed: [`NodeId`]s stay valid for the lifetime of the arena, and its size grows with every node ever created.
/// Patching reuses nodes, so only content that is actually recreated adds to it.
/// For long-running rendering, use a host with real node lifetimes instead.
pub struct MemoryDom {
	id: ArenaId,
	nodes: Vec<MemoryNode>,
	mutations: Vec<Mutation>,
	next_listener: u64,
}

impl Debug for MemoryDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom")
			.field("id", &self.id)
			.field("nodes.len()", &self.nodes.len())
			.field("mutations.len()", &self.mutations.len())
			.finish()
	}
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self {
			id: ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed)),
			nodes: Vec::new(),
			mutations: Vec::new(),
			next_listener: 0,
		}
	}

	/// How many nodes were ever created in this arena, attached or not.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	fn node(&self, id: NodeId) -> Result<&MemoryNode, MemoryDomError> {
		self.nodes.get(id.0 as usize).ok_or(MemoryDomError::UnknownNode(id))
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, MemoryDomError> {
		self.nodes.get_mut(id.0 as usize).ok_or(MemoryDomError::UnknownNode(id))
	}

	fn push(&mut self, data: Data) -> NodeId {
		#[allow(clippy::cast_possible_truncation)]
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(MemoryNode {
			data,
			parent: None,
			children: Vec::new(),
		});
		self.mutations.push(Mutation::Create(id));
		id
	}

	fn detach(&mut self, node: NodeId) -> Result<(), MemoryDomError> {
		if let Some(parent) = self.node(node)?.parent {
			self.node_mut(parent)?.children.retain(|&child| child != node);
			self.node_mut(node)?.parent = None;
		}
		Ok(())
	}

	fn element_mut(&mut self, id: NodeId) -> Result<ElementMut<'_>, MemoryDomError> {
		match &mut self.node_mut(id)?.data {
			Data::Element {
				attributes,
				properties,
				listeners,
				..
			} => Ok(ElementMut {
				attributes,
				properties,
				listeners,
			}),
			_ => Err(MemoryDomError::NotAnElement(id)),
		}
	}

	fn class_tokens(&self, element: NodeId) -> Vec<String> {
		self.attribute(element, "class")
			.map(|class| class.split_whitespace().map(ToOwned::to_owned).collect())
			.unwrap_or_default()
	}

	fn write_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), MemoryDomError> {
		let attributes = self.element_mut(element)?.attributes;
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => value.clone_into(existing),
			None => attributes.push((name.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	/// Every mutation since construction or the last [`take_mutations`](`MemoryDom::take_mutations`).
	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.mutations
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.mutations)
	}

	/// Counts recorded mutations matching `predicate`.
	pub fn count_mutations(&self, predicate: impl Fn(&Mutation) -> bool) -> usize {
		self.mutations.iter().filter(|mutation| predicate(mutation)).count()
	}

	#[must_use]
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		match self.node(id) {
			Ok(node) => &node.children,
			Err(_) => &[],
		}
	}

	#[must_use]
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok().and_then(|node| node.parent)
	}

	/// The tag name, for elements.
	#[must_use]
	pub fn tag(&self, id: NodeId) -> Option<&str> {
		match &self.node(id).ok()?.data {
			Data::Element { tag, .. } => Some(tag),
			_ => None,
		}
	}

	/// The data of a text or comment node.
	#[must_use]
	pub fn text(&self, id: NodeId) -> Option<&str> {
		match &self.node(id).ok()?.data {
			Data::Text(text) | Data::Comment(text) => Some(text),
			Data::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		match &self.node(id).ok()?.data {
			Data::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.as_str()),
			_ => None,
		}
	}

	/// The live property `name`, as last written through [`Dom::set_property`].
	///
	/// Properties aren't attributes, so they don't show up in [`outer_html`](`MemoryDom::outer_html`).
	#[must_use]
	pub fn property(&self, id: NodeId, name: &str) -> Option<&Property> {
		match &self.node(id).ok()?.data {
			Data::Element { properties, .. } => properties.iter().find(|(n, _)| n == name).map(|(_, value)| value),
			_ => None,
		}
	}

	/// The concatenated data of all descendant text nodes, like ***textContent***.
	#[must_use]
	pub fn text_content(&self, id: NodeId) -> String {
		let mut text = String::new();
		self.collect_text(id, &mut text);
		text
	}

	fn collect_text(&self, id: NodeId, text: &mut String) {
		if let Ok(node) = self.node(id) {
			match &node.data {
				Data::Text(data) => text.push_str(data),
				Data::Comment(_) => (),
				Data::Element { .. } => {
					for &child in &node.children {
						self.collect_text(child, text);
					}
				}
			}
		}
	}

	/// Serializes the children of `id`.
	#[must_use]
	pub fn inner_html(&self, id: NodeId) -> String {
		let mut html = String::new();
		for &child in self.children(id) {
			self.write_html(child, &mut html);
		}
		html
	}

	/// Serializes `id` itself.
	#[must_use]
	pub fn outer_html(&self, id: NodeId) -> String {
		let mut html = String::new();
		self.write_html(id, &mut html);
		html
	}

	fn write_html(&self, id: NodeId, html: &mut String) {
		let node = match self.node(id) {
			Ok(node) => node,
			Err(_) => return,
		};
		match &node.data {
			Data::Text(text) => html.push_str(&escape(text)),
			Data::Comment(comment) => {
				let _ = write!(html, "<!--{}-->", comment);
			}
			Data::Element { tag, attributes, .. } => {
				let _ = write!(html, "<{}", tag);
				for (name, value) in attributes {
					let _ = write!(html, " {}=\"{}\"", name, escape(value).replace('"', "&quot;"));
				}
				html.push('>');
				for &child in &node.children {
					self.write_html(child, html);
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	/// Calls every handler listening for `event` on `target` and returns how many there were.
	///
	/// Events don't bubble.
	pub fn dispatch(&self, target: NodeId, event: &str) -> usize {
		let handlers: Vec<Handler<MemoryDom>> = match self.node(target).map(|node| &node.data) {
			Ok(Data::Element { listeners, .. }) => listeners
				.iter()
				.filter(|(_, name, _)| name == event)
				.map(|(_, _, handler)| handler.clone())
				.collect(),
			_ => return 0,
		};
		let event = MemoryEvent {
			name: event.to_owned(),
			target,
		};
		for handler in &handlers {
			handler(&event);
		}
		handlers.len()
	}

	/// How many listeners for `event` are attached to `element`.
	#[must_use]
	pub fn listener_count(&self, element: NodeId, event: &str) -> usize {
		match self.node(element).map(|node| &node.data) {
			Ok(Data::Element { listeners, .. }) => listeners.iter().filter(|(_, name, _)| name == event).count(),
			_ => 0,
		}
	}

	fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.parent(node) {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, MemoryDomError> {
		let (data, children) = {
			let node = self.node(id)?;
			let data = match &node.data {
				Data::Element { tag, namespace, attributes, .. } => Data::Element {
					tag: tag.clone(),
					namespace: namespace.clone(),
					attributes: attributes.clone(),
					properties: Vec::new(),
					listeners: Vec::new(),
				},
				Data::Text(text) => Data::Text(text.clone()),
				Data::Comment(comment) => Data::Comment(comment.clone()),
			};
			(data, node.children.clone())
		};
		let clone = self.push(data);
		for child in children {
			let child = self.clone_subtree(child)?;
			self.node_mut(child)?.parent = Some(clone);
			self.node_mut(clone)?.children.push(child);
		}
		Ok(clone)
	}
}

struct ElementMut<'a> {
	attributes: &'a mut Vec<(String, String)>,
	properties: &'a mut Vec<(String, Property)>,
	listeners: &'a mut Vec<(ListenerId, String, Handler<MemoryDom>)>,
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl Dom for MemoryDom {
	type Node = NodeId;
	type Event = MemoryEvent;
	type Listener = ListenerId;
	type Error = MemoryDomError;
	type Owner = ArenaId;

	fn owner(&self) -> ArenaId {
		self.id
	}

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<NodeId, MemoryDomError> {
		Ok(self.push(Data::Element {
			tag: tag.to_owned(),
			namespace: namespace.map(ToOwned::to_owned),
			attributes: Vec::new(),
			properties: Vec::new(),
			listeners: Vec::new(),
		}))
	}

	fn create_text(&mut self, data: &str) -> Result<NodeId, MemoryDomError> {
		Ok(self.push(Data::Text(data.to_owned())))
	}

	fn create_comment(&mut self, data: &str) -> Result<NodeId, MemoryDomError> {
		Ok(self.push(Data::Comment(data.to_owned())))
	}

	fn clone_deep(&mut self, node: &NodeId) -> Result<NodeId, MemoryDomError> {
		self.clone_subtree(*node)
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.children(*node).first().copied()
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let siblings = self.children(self.parent(*node)?);
		let index = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn insert_before(&mut self, parent: &NodeId, node: &NodeId, before: Option<&NodeId>) -> Result<(), MemoryDomError> {
		let (parent, node) = (*parent, *node);
		if !matches!(self.node(parent)?.data, Data::Element { .. }) {
			return Err(MemoryDomError::NotAnElement(parent));
		}
		if self.is_ancestor_or_self(node, parent) {
			return Err(MemoryDomError::Cycle { parent, node });
		}
		// Inserting a node before itself means before its next sibling.
		let before = match before {
			Some(&before) if before == node => self.next_sibling(&node),
			Some(&before) => {
				if self.node(before)?.parent != Some(parent) {
					return Err(MemoryDomError::NotAChild { parent, child: before });
				}
				Some(before)
			}
			None => None,
		};

		let was_attached = self.node(node)?.parent.is_some();
		self.detach(node)?;
		let children = &mut self.node_mut(parent)?.children;
		let index = match before {
			Some(before) => children.iter().position(|&child| child == before).unwrap_or_else(|| children.len()),
			None => children.len(),
		};
		children.insert(index, node);
		self.node_mut(node)?.parent = Some(parent);

		trace!(?parent, ?node, ?before, was_attached, "insert_before");
		self.mutations.push(if was_attached {
			Mutation::Move { parent, node, before }
		} else {
			Mutation::Insert { parent, node, before }
		});
		Ok(())
	}

	fn remove_child(&mut self, parent: &NodeId, node: &NodeId) -> Result<(), MemoryDomError> {
		let (parent, node) = (*parent, *node);
		if self.node(node)?.parent != Some(parent) {
			return Err(MemoryDomError::NotAChild { parent, child: node });
		}
		self.detach(node)?;
		self.mutations.push(Mutation::Remove { parent, node });
		Ok(())
	}

	fn clear_children(&mut self, parent: &NodeId) -> Result<(), MemoryDomError> {
		let parent = *parent;
		let children = core::mem::take(&mut self.node_mut(parent)?.children);
		for child in children {
			self.node_mut(child)?.parent = None;
		}
		self.mutations.push(Mutation::Clear(parent));
		Ok(())
	}

	fn set_text(&mut self, node: &NodeId, data: &str) -> Result<(), MemoryDomError> {
		match &mut self.node_mut(*node)?.data {
			Data::Text(text) | Data::Comment(text) => {
				data.clone_into(text);
			}
			Data::Element { .. } => return Err(MemoryDomError::NotCharacterData(*node)),
		}
		self.mutations.push(Mutation::SetText(*node));
		Ok(())
	}

	fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) -> Result<(), MemoryDomError> {
		self.write_attribute(*element, name, value)?;
		self.mutations.push(Mutation::SetAttribute {
			element: *element,
			name: name.to_owned(),
		});
		Ok(())
	}

	fn remove_attribute(&mut self, element: &NodeId, name: &str) -> Result<(), MemoryDomError> {
		self.element_mut(*element)?.attributes.retain(|(n, _)| n != name);
		self.mutations.push(Mutation::RemoveAttribute {
			element: *element,
			name: name.to_owned(),
		});
		Ok(())
	}

	fn set_property(&mut self, element: &NodeId, name: &str, value: &Property) -> Result<(), MemoryDomError> {
		let properties = self.element_mut(*element)?.properties;
		match properties.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => *existing = value.clone(),
			None => properties.push((name.to_owned(), value.clone())),
		}
		self.mutations.push(Mutation::SetProperty {
			element: *element,
			name: name.to_owned(),
		});
		Ok(())
	}

	/// Like ***classList.add***, this creates the `class` attribute if needed.
	fn add_class(&mut self, element: &NodeId, token: &str) -> Result<(), MemoryDomError> {
		let mut tokens = self.class_tokens(*element);
		if !tokens.iter().any(|existing| existing == token) {
			tokens.push(token.to_owned());
		}
		self.write_attribute(*element, "class", &tokens.join(" "))?;
		self.mutations.push(Mutation::AddClass {
			element: *element,
			token: token.to_owned(),
		});
		Ok(())
	}

	/// Like ***classList.remove***, this leaves an empty `class` attribute behind.
	fn remove_class(&mut self, element: &NodeId, token: &str) -> Result<(), MemoryDomError> {
		let mut tokens = self.class_tokens(*element);
		tokens.retain(|existing| existing != token);
		self.write_attribute(*element, "class", &tokens.join(" "))?;
		self.mutations.push(Mutation::RemoveClass {
			element: *element,
			token: token.to_owned(),
		});
		Ok(())
	}

	fn add_event_listener(&mut self, element: &NodeId, event: &str, handler: Handler<Self>) -> Result<ListenerId, MemoryDomError> {
		let id = ListenerId(self.next_listener);
		self.element_mut(*element)?.listeners.push((id, event.to_owned(), handler));
		self.next_listener += 1;
		self.mutations.push(Mutation::AddListener {
			element: *element,
			event: event.to_owned(),
		});
		Ok(id)
	}

	fn remove_event_listener(&mut self, element: &NodeId, event: &str, listener: ListenerId) -> Result<(), MemoryDomError> {
		let listeners = self.element_mut(*element)?.listeners;
		let index = listeners
			.iter()
			.position(|(id, name, _)| *id == listener && name == event)
			.ok_or(MemoryDomError::UnknownListener(listener))?;
		listeners.remove(index);
		self.mutations.push(Mutation::RemoveListener {
			element: *element,
			event: event.to_owned(),
		});
		Ok(())
	}
}
