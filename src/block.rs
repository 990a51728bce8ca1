use crate::{
	dom::{Dom, Property},
	node::{patch_slot, Node, VNode},
	template::{ChildSlot, LocationKind, Template},
	value::Value,
};
use core::mem;
use hashbrown::HashSet;
use std::{collections::BTreeMap, rc::Rc};
use tracing::{trace, trace_span};

/// A [`Node::Block`] descriptor: a template and the values for its holes.
pub struct BlockNode<D: Dom> {
	pub template: Rc<Template<D>>,
	pub data: Vec<Value<D>>,
	pub children: Vec<Option<Node<D>>>,
}

impl<D: Dom> Node<D> {
	pub fn block(template: &Rc<Template<D>>, data: impl IntoIterator<Item = Value<D>>, children: impl IntoIterator<Item = Option<Node<D>>>) -> Self {
		Self::Block(BlockNode {
			template: Rc::clone(template),
			data: data.into_iter().collect(),
			children: children.into_iter().collect(),
		})
	}
}

/// A live instance of a [`Template`].
///
/// The template's prototype is cloned exactly once, in [`Node::mount`]. Patches only touch changed holes.
pub struct Block<D: Dom> {
	template: Rc<Template<D>>,
	/// `refs[0]` is the block's single root node.
	refs: Vec<D::Node>,
	data: Vec<Value<D>>,
	listeners: Vec<Option<D::Listener>>,
	children: Vec<Option<VNode<D>>>,
}

impl<D: Dom> Block<D> {
	pub(crate) fn mount(dom: &mut D, node: BlockNode<D>, parent: &D::Node, before: Option<&D::Node>) -> Result<Self, D::Error> {
		let BlockNode { template, data, children } = node;
		let span = trace_span!("Mounting block", template = template.id(), "data.len()" = data.len(), "children.len()" = children.len());
		let _enter = span.enter();

		check_arity(&template, &data, &children);

		let (root, refs) = template.instantiate(dom)?;

		let mut listeners = Vec::with_capacity(data.len());
		for (location, value) in template.locations().iter().zip(&data) {
			let target = &refs[location.ref_index];
			listeners.push(match (&location.kind, value) {
				(LocationKind::Handler(event), Value::Handler(handler)) => Some(dom.add_event_listener(target, event, Rc::clone(handler))?),
				(LocationKind::Handler(_), Value::Empty) | (LocationKind::Ref, Value::Ref(_)) | (LocationKind::Ref, Value::Empty) => None,
				(LocationKind::Handler(_), value) | (LocationKind::Ref, value) => mismatch(&location.kind, value),
				// The prototype already matches.
				(_, Value::Empty) => None,
				(kind, value) => {
					write_hole(dom, target, kind, &Value::Empty, value)?;
					None
				}
			});
		}

		dom.insert_before(parent, &root, before)?;

		let mut live_children = Vec::with_capacity(children.len());
		for (slot, child) in template.child_slots().iter().zip(children) {
			live_children.push(match child {
				Some(child) => Some(mount_child(dom, child, slot, &refs)?),
				None => None,
			});
		}

		for (location, value) in template.locations().iter().zip(&data) {
			if let (LocationKind::Ref, Value::Ref(hook)) = (&location.kind, value) {
				hook(Some(&refs[location.ref_index]));
			}
		}

		debug_assert_eq!(refs[0], root);
		Ok(Self {
			template,
			refs,
			data,
			listeners,
			children: live_children,
		})
	}

	pub(crate) fn patch(&mut self, dom: &mut D, node: BlockNode<D>) -> Result<(), D::Error> {
		let BlockNode { template, data, children } = node;
		assert!(
			Rc::ptr_eq(&self.template, &template),
			"Tried to patch a block of template {} with a descriptor of template {}. Remove and remount instead.",
			self.template.id(),
			template.id()
		);
		let span = trace_span!("Patching block", template = template.id());
		let _enter = span.enter();

		check_arity(&template, &data, &children);

		for (i, (location, new)) in template.locations().iter().zip(data).enumerate() {
			let old = &mut self.data[i];
			if *old == new {
				continue;
			}

			let target = &self.refs[location.ref_index];
			trace!(hole = i, ?new, "Updating hole.");
			match (&location.kind, &new) {
				(LocationKind::Handler(event), Value::Handler(_)) | (LocationKind::Handler(event), Value::Empty) => {
					if let Some(listener) = self.listeners[i].take() {
						dom.remove_event_listener(target, event, listener)?;
					}
					if let Value::Handler(handler) = &new {
						self.listeners[i] = Some(dom.add_event_listener(target, event, Rc::clone(handler))?);
					}
				}
				(LocationKind::Ref, Value::Ref(_)) | (LocationKind::Ref, Value::Empty) => {
					if let Value::Ref(hook) = &*old {
						hook(None);
					}
					if let Value::Ref(hook) = &new {
						hook(Some(target));
					}
				}
				(kind, value) => write_hole(dom, target, kind, old, value)?,
			}
			*old = new;
		}

		let refs = &self.refs;
		for (i, (slot, new)) in template.child_slots().iter().zip(children).enumerate() {
			let parent = &refs[slot.parent_ref];
			let anchor = slot.anchor_ref.map(|anchor_ref| &refs[anchor_ref]);
			patch_slot(dom, &mut self.children[i], new, parent, anchor)?;
			if let (None, Some(child)) = (slot.anchor_ref, &mut self.children[i]) {
				// Also covers freshly mounted and replaced content.
				mark_only_child(child);
			}
		}
		Ok(())
	}

	pub(crate) fn before_remove(&self) {
		for child in self.children.iter().flatten() {
			child.before_remove();
		}
	}

	/// Removes the root. Nested content goes with it.
	pub(crate) fn remove(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		let span = trace_span!("Removing block", template = self.template.id());
		let _enter = span.enter();

		self.release_listeners(dom)?;
		dom.remove_child(parent, &self.refs[0])?;
		self.children.clear();
		for (location, value) in self.template.locations().iter().zip(mem::take(&mut self.data)) {
			if let (LocationKind::Ref, Value::Ref(hook)) = (&location.kind, value) {
				hook(None);
			}
		}
		Ok(())
	}

	/// Detaches the listeners of this block and of all nested blocks, without touching the tree.
	///
	/// [`Dom::Listener`]s must not be dropped while still attached to an element that may outlive the block.
	pub(crate) fn release_listeners(&mut self, dom: &mut D) -> Result<(), D::Error> {
		for (location, listener) in self.template.locations().iter().zip(&mut self.listeners) {
			if let (LocationKind::Handler(event), Some(listener)) = (&location.kind, listener.take()) {
				dom.remove_event_listener(&self.refs[location.ref_index], event, listener)?;
			}
		}
		for child in self.children.iter_mut().flatten() {
			child.release_listeners(dom)?;
		}
		Ok(())
	}

	pub(crate) fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		dom.insert_before(parent, &self.refs[0], before)
	}

	#[must_use]
	pub fn template(&self) -> &Rc<Template<D>> {
		&self.template
	}

	/// The block's root node.
	#[must_use]
	pub fn dom_node(&self) -> &D::Node {
		&self.refs[0]
	}

	#[must_use]
	pub fn data(&self) -> &[Value<D>] {
		&self.data
	}

	/// The live content of child hole `index`.
	#[must_use]
	pub fn child(&self, index: usize) -> Option<&VNode<D>> {
		self.children.get(index).and_then(Option::as_ref)
	}
}

fn mount_child<D: Dom>(dom: &mut D, child: Node<D>, slot: &ChildSlot, refs: &[D::Node]) -> Result<VNode<D>, D::Error> {
	let parent = &refs[slot.parent_ref];
	let anchor = slot.anchor_ref.map(|anchor_ref| &refs[anchor_ref]);
	let mut child = child.mount(dom, parent, anchor)?;
	if slot.anchor_ref.is_none() {
		mark_only_child(&mut child);
	}
	Ok(child)
}

/// A list that is the only content of its parent element can clear that element wholesale.
fn mark_only_child<D: Dom>(child: &mut VNode<D>) {
	if let VNode::List(list) = child {
		list.set_only_child();
	}
}

fn check_arity<D: Dom>(template: &Template<D>, data: &[Value<D>], children: &[Option<Node<D>>]) {
	assert_eq!(
		data.len(),
		template.data_len(),
		"Template {} has {} data hole(s), but {} value(s) were given.",
		template.id(),
		template.data_len(),
		data.len()
	);
	assert_eq!(
		children.len(),
		template.children_len(),
		"Template {} has {} child hole(s), but {} child(ren) were given.",
		template.id(),
		template.children_len(),
		children.len()
	);
}

/// Applies `new` to a text, attribute, class, property or attribute map hole that currently holds `old`.
fn write_hole<D: Dom>(dom: &mut D, target: &D::Node, kind: &LocationKind, old: &Value<D>, new: &Value<D>) -> Result<(), D::Error> {
	match (kind, new) {
		(LocationKind::Text, Value::Text(text)) => dom.set_text(target, text),
		(LocationKind::Text, Value::Empty) => dom.set_text(target, ""),
		(LocationKind::Attribute(name), Value::Text(value)) => dom.set_attribute(target, name, value),
		(LocationKind::Attribute(name), Value::Bool(true)) => dom.set_attribute(target, name, ""),
		(LocationKind::Attribute(name), Value::Bool(false)) | (LocationKind::Attribute(name), Value::Empty) => dom.remove_attribute(target, name),
		(LocationKind::Class, Value::Text(_)) | (LocationKind::Class, Value::Empty) => {
			update_class(dom, target, old.as_text().unwrap_or_default(), new.as_text().unwrap_or_default())
		}
		(LocationKind::Property(name), Value::Text(text)) => dom.set_property(target, name, &Property::Text(text.clone())),
		(LocationKind::Property(name), Value::Bool(flag)) => dom.set_property(target, name, &Property::Bool(*flag)),
		(LocationKind::Property(name), Value::Empty) => {
			let blank = if name == "value" { Property::Text(String::new()) } else { Property::Bool(false) };
			dom.set_property(target, name, &blank)
		}
		(LocationKind::Attributes, Value::Attributes(_)) | (LocationKind::Attributes, Value::Empty) => update_attributes(dom, target, attribute_map(old), attribute_map(new)),
		(kind, value) => mismatch(kind, value),
	}
}

/// Adds and removes single tokens, so classes set by others on the same element survive.
fn update_class<D: Dom>(dom: &mut D, target: &D::Node, old: &str, new: &str) -> Result<(), D::Error> {
	let old_tokens: HashSet<&str> = old.split_whitespace().collect();
	let new_tokens: HashSet<&str> = new.split_whitespace().collect();
	let mut done = HashSet::new();
	for token in old.split_whitespace() {
		if !new_tokens.contains(token) && done.insert(token) {
			dom.remove_class(target, token)?;
		}
	}
	for token in new.split_whitespace() {
		if !old_tokens.contains(token) && done.insert(token) {
			dom.add_class(target, token)?;
		}
	}
	Ok(())
}

fn attribute_map<D: Dom>(value: &Value<D>) -> Option<&BTreeMap<String, String>> {
	match value {
		Value::Attributes(attributes) => Some(attributes),
		_ => None,
	}
}

fn update_attributes<D: Dom>(
	dom: &mut D,
	target: &D::Node,
	old: Option<&BTreeMap<String, String>>,
	new: Option<&BTreeMap<String, String>>,
) -> Result<(), D::Error> {
	let none = BTreeMap::new();
	let (old, new) = (old.unwrap_or(&none), new.unwrap_or(&none));
	for (name, value) in old {
		if !new.contains_key(name) {
			if name == "class" {
				update_class(dom, target, value, "")?;
			} else {
				dom.remove_attribute(target, name)?;
			}
		}
	}
	for (name, value) in new {
		let previous = old.get(name);
		if previous == Some(value) {
			continue;
		}
		if name == "class" {
			update_class(dom, target, previous.map_or("", String::as_str), value)?;
		} else {
			dom.set_attribute(target, name, value)?;
		}
	}
	Ok(())
}

fn mismatch<D: Dom>(kind: &LocationKind, value: &Value<D>) -> ! {
	panic!("Can't apply a {} value to a {:?} hole.", value.kind_name(), kind)
}
