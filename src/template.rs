//! Static block structure with numbered holes, compiled once and shared by every [`Block`](`crate::Node::Block`) built from it.

use crate::dom::Dom;
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	sync::atomic::{AtomicU32, Ordering},
};
use hashbrown::HashMap;
use thiserror::Error;
use tracing::{trace, trace_span};

/// Uncompiled template markup, as a tree.
///
/// Data holes ([`text_hole`](`TemplateNode::text_hole`), [`attribute_hole`](`TemplateNode::attribute_hole`),
/// [`attributes_hole`](`TemplateNode::attributes_hole`), [`property_hole`](`TemplateNode::property_hole`),
/// [`handler_hole`](`TemplateNode::handler_hole`), [`ref_hole`](`TemplateNode::ref_hole`)) share one index space,
/// [`child_hole`](`TemplateNode::child_hole`)s another. Both must be dense and start at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
	Element(TemplateElement),
	Text(String),
	Comment(String),
	/// A text node whose data is data hole `.0`.
	TextHole(usize),
	/// The position of nested content `.0`.
	ChildHole(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateElement {
	pub tag: String,
	pub namespace: Option<String>,
	pub attributes: Vec<(String, String)>,
	pub dynamic: Vec<ElementHole>,
	pub children: Vec<TemplateNode>,
}

/// A data hole placed on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementHole {
	/// Compiles to a property hole for the form control properties that attributes don't track (`value`, `checked`, …),
	/// and to a token-wise hole for `class`.
	Attribute { name: String, index: usize },
	/// A whole map of attributes.
	Attributes { index: usize },
	Property { name: String, index: usize },
	Handler { event: String, index: usize },
	Ref { index: usize },
}

impl TemplateNode {
	pub fn element(tag: impl Into<String>) -> Self {
		Self::Element(TemplateElement {
			tag: tag.into(),
			namespace: None,
			attributes: Vec::new(),
			dynamic: Vec::new(),
			children: Vec::new(),
		})
	}

	pub fn element_ns(namespace: impl Into<String>, tag: impl Into<String>) -> Self {
		let mut this = Self::element(tag);
		if let Self::Element(element) = &mut this {
			element.namespace = Some(namespace.into());
		}
		this
	}

	pub fn text(data: impl Into<String>) -> Self {
		Self::Text(data.into())
	}

	pub fn comment(data: impl Into<String>) -> Self {
		Self::Comment(data.into())
	}

	#[must_use]
	pub fn text_hole(index: usize) -> Self {
		Self::TextHole(index)
	}

	#[must_use]
	pub fn child_hole(index: usize) -> Self {
		Self::ChildHole(index)
	}

	/// Adds a static attribute.
	///
	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let (name, value) = (name.into(), value.into());
		self.map_element(move |element| element.attributes.push((name, value)))
	}

	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn attribute_hole(self, name: impl Into<String>, index: usize) -> Self {
		let name = name.into();
		self.map_element(move |element| element.dynamic.push(ElementHole::Attribute { name, index }))
	}

	/// A hole for a [`Value::Attributes`](`crate::Value::Attributes`) map.
	///
	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn attributes_hole(self, index: usize) -> Self {
		self.map_element(move |element| element.dynamic.push(ElementHole::Attributes { index }))
	}

	/// Always writes the live property `name`, even where [`attribute_hole`](`TemplateNode::attribute_hole`) wouldn't.
	///
	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn property_hole(self, name: impl Into<String>, index: usize) -> Self {
		let name = name.into();
		self.map_element(move |element| element.dynamic.push(ElementHole::Property { name, index }))
	}

	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn handler_hole(self, event: impl Into<String>, index: usize) -> Self {
		let event = event.into();
		self.map_element(move |element| element.dynamic.push(ElementHole::Handler { event, index }))
	}

	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn ref_hole(self, index: usize) -> Self {
		self.map_element(move |element| element.dynamic.push(ElementHole::Ref { index }))
	}

	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn child(self, child: TemplateNode) -> Self {
		self.map_element(move |element| element.children.push(child))
	}

	/// # Panics
	///
	/// Iff `self` is not an element.
	#[must_use]
	pub fn children(self, children: impl IntoIterator<Item = TemplateNode>) -> Self {
		self.map_element(move |element| element.children.extend(children))
	}

	fn map_element(mut self, f: impl FnOnce(&mut TemplateElement)) -> Self {
		match &mut self {
			Self::Element(element) => f(element),
			other => panic!("Expected a template element but found {:?}", other),
		}
		self
	}

	/// Drops whitespace-only static text, except inside `<pre>`.
	fn normalize(&mut self) {
		if let Self::Element(element) = self {
			if element.tag.eq_ignore_ascii_case("pre") {
				return;
			}
			element.children.retain(|child| !matches!(child, Self::Text(text) if text.trim().is_empty()));
			for child in &mut element.children {
				child.normalize();
			}
		}
	}
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
	#[error("a child hole can't be the root of a template")]
	ChildHoleAtRoot,
	#[error("data hole {0} is used more than once")]
	DuplicateDataHole(usize),
	#[error("data hole {missing} is missing (the template uses {count} data hole(s))")]
	MissingDataHole { missing: usize, count: usize },
	#[error("child hole {0} is used more than once")]
	DuplicateChildHole(usize),
	#[error("child hole {missing} is missing (the template uses {count} child hole(s))")]
	MissingChildHole { missing: usize, count: usize },
}

/// Template compilation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOptions {
	/// Whether to drop whitespace-only static text nodes outside `<pre>`. Default: `true`.
	pub normalize_whitespace: bool,
}

impl Default for TemplateOptions {
	fn default() -> Self {
		Self { normalize_whitespace: true }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LocationKind {
	Text,
	Attribute(String),
	Class,
	Property(String),
	Attributes,
	Handler(String),
	Ref,
}

/// Where data hole `i` is applied: `refs[ref_index]` of a block.
#[derive(Debug, Clone)]
pub(crate) struct Location {
	pub ref_index: usize,
	pub kind: LocationKind,
}

/// Where child hole `i` is mounted.
#[derive(Debug, Clone)]
pub(crate) struct ChildSlot {
	pub parent_ref: usize,
	/// The placeholder the child is mounted before. [`None`] iff the child is the only content of its parent.
	pub anchor_ref: Option<usize>,
}

static NEXT_TEMPLATE_ID: AtomicU32 = AtomicU32::new(0);

/// A compiled template.
///
/// Compile it once and share it through an [`Rc`](`std::rc::Rc`):
/// blocks are only compatible with each other if they were built from the same instance.
///
/// The prototype DOM that blocks are cloned from is built lazily, once for each [`Dom::owner`] the template is used with.
pub struct Template<D: Dom> {
	id: u32,
	root: TemplateNode,
	/// Child index paths from the root to each referenced node. `ref_paths[0]` is the root itself.
	ref_paths: Vec<Vec<usize>>,
	locations: Vec<Location>,
	child_slots: Vec<ChildSlot>,
	prototypes: RefCell<Vec<(D::Owner, D::Node)>>,
}

impl<D: Dom> Debug for Template<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Template")
			.field("id", &self.id)
			.field("data_len", &self.locations.len())
			.field("children_len", &self.child_slots.len())
			.finish()
	}
}

struct Compiler {
	ref_paths: Vec<Vec<usize>>,
	locations: HashMap<usize, Location>,
	data_count: usize,
	child_slots: HashMap<usize, ChildSlot>,
	child_count: usize,
}

impl Compiler {
	fn add_ref(&mut self, path: &[usize]) -> usize {
		self.ref_paths.push(path.to_vec());
		self.ref_paths.len() - 1
	}

	fn add_location(&mut self, index: usize, ref_index: usize, kind: LocationKind) -> Result<(), TemplateError> {
		self.data_count = self.data_count.max(index + 1);
		if self.locations.insert(index, Location { ref_index, kind }).is_some() {
			return Err(TemplateError::DuplicateDataHole(index));
		}
		Ok(())
	}

	fn add_child_slot(&mut self, index: usize, slot: ChildSlot) -> Result<(), TemplateError> {
		self.child_count = self.child_count.max(index + 1);
		if self.child_slots.insert(index, slot).is_some() {
			return Err(TemplateError::DuplicateChildHole(index));
		}
		Ok(())
	}

	/// `ref_index` is the reference of `node` itself, if it already has one (the root always does).
	fn visit(&mut self, node: &TemplateNode, path: &mut Vec<usize>, ref_index: Option<usize>) -> Result<(), TemplateError> {
		match node {
			TemplateNode::Text(_) | TemplateNode::Comment(_) => Ok(()),
			TemplateNode::TextHole(index) => {
				let ref_index = match ref_index {
					Some(ref_index) => ref_index,
					None => self.add_ref(path),
				};
				self.add_location(*index, ref_index, LocationKind::Text)
			}
			TemplateNode::ChildHole(_) => unreachable!("Child holes are handled by their parent element."),
			TemplateNode::Element(element) => {
				let needs_ref = !element.dynamic.is_empty() || element.children.iter().any(|child| matches!(child, TemplateNode::ChildHole(_)));
				let ref_index = match ref_index {
					Some(ref_index) => Some(ref_index),
					None if needs_ref => Some(self.add_ref(path)),
					None => None,
				};

				if let Some(ref_index) = ref_index {
					for hole in &element.dynamic {
						match hole {
							ElementHole::Attribute { name, index } => {
								let kind = if is_property(&element.tag, name) {
									LocationKind::Property(name.clone())
								} else if name == "class" {
									LocationKind::Class
								} else {
									LocationKind::Attribute(name.clone())
								};
								self.add_location(*index, ref_index, kind)?;
							}
							ElementHole::Attributes { index } => self.add_location(*index, ref_index, LocationKind::Attributes)?,
							ElementHole::Property { name, index } => self.add_location(*index, ref_index, LocationKind::Property(name.clone()))?,
							ElementHole::Handler { event, index } => self.add_location(*index, ref_index, LocationKind::Handler(event.clone()))?,
							ElementHole::Ref { index } => self.add_location(*index, ref_index, LocationKind::Ref)?,
						}
					}
				}

				if let [TemplateNode::ChildHole(index)] = element.children.as_slice() {
					let parent_ref = ref_index.unwrap_or_else(|| unreachable!());
					return self.add_child_slot(*index, ChildSlot { parent_ref, anchor_ref: None });
				}

				for (i, child) in element.children.iter().enumerate() {
					path.push(i);
					if let TemplateNode::ChildHole(index) = child {
						let parent_ref = ref_index.unwrap_or_else(|| unreachable!());
						let anchor_ref = self.add_ref(path);
						self.add_child_slot(*index, ChildSlot { parent_ref, anchor_ref: Some(anchor_ref) })?;
					} else {
						self.visit(child, path, None)?;
					}
					path.pop();
				}
				Ok(())
			}
		}
	}
}

impl<D: Dom> Template<D> {
	/// Compiles `root` with default [`TemplateOptions`].
	///
	/// # Errors
	///
	/// Iff the holes in `root` are inconsistent. See [`TemplateError`].
	pub fn compile(root: TemplateNode) -> Result<Self, TemplateError> {
		Self::compile_with(root, TemplateOptions::default())
	}

	/// # Errors
	///
	/// Iff the holes in `root` are inconsistent. See [`TemplateError`].
	pub fn compile_with(mut root: TemplateNode, options: TemplateOptions) -> Result<Self, TemplateError> {
		if let TemplateNode::ChildHole(_) = root {
			return Err(TemplateError::ChildHoleAtRoot);
		}
		if options.normalize_whitespace {
			root.normalize();
		}

		let mut compiler = Compiler {
			ref_paths: vec![Vec::new()],
			locations: HashMap::new(),
			data_count: 0,
			child_slots: HashMap::new(),
			child_count: 0,
		};
		compiler.visit(&root, &mut Vec::new(), Some(0))?;

		let Compiler {
			ref_paths,
			mut locations,
			data_count,
			mut child_slots,
			child_count,
		} = compiler;

		let locations = (0..data_count)
			.map(|i| locations.remove(&i).ok_or(TemplateError::MissingDataHole { missing: i, count: data_count }))
			.collect::<Result<Vec<_>, _>>()?;
		let child_slots = (0..child_count)
			.map(|i| child_slots.remove(&i).ok_or(TemplateError::MissingChildHole { missing: i, count: child_count }))
			.collect::<Result<Vec<_>, _>>()?;

		let id = NEXT_TEMPLATE_ID.fetch_add(1, Ordering::Relaxed);
		trace!(id, data_len = locations.len(), children_len = child_slots.len(), refs = ref_paths.len(), "Compiled template.");
		Ok(Self {
			id,
			root,
			ref_paths,
			locations,
			child_slots,
			prototypes: RefCell::new(Vec::new()),
		})
	}

	#[must_use]
	pub fn id(&self) -> u32 {
		self.id
	}

	/// The number of data holes a [`BlockNode`](`crate::BlockNode`) of this template must provide.
	#[must_use]
	pub fn data_len(&self) -> usize {
		self.locations.len()
	}

	/// The number of child holes a [`BlockNode`](`crate::BlockNode`) of this template must provide.
	#[must_use]
	pub fn children_len(&self) -> usize {
		self.child_slots.len()
	}

	#[must_use]
	pub fn root(&self) -> &TemplateNode {
		&self.root
	}

	pub(crate) fn locations(&self) -> &[Location] {
		&self.locations
	}

	pub(crate) fn child_slots(&self) -> &[ChildSlot] {
		&self.child_slots
	}

	/// Clones the prototype DOM (building it on first use) and collects the references of the dynamic positions.
	pub(crate) fn instantiate(&self, dom: &mut D) -> Result<(D::Node, Vec<D::Node>), D::Error> {
		let span = trace_span!("Instantiating template", id = self.id);
		let _enter = span.enter();

		let owner = dom.owner();
		let mut prototypes = self.prototypes.borrow_mut();
		let index = match prototypes.iter().position(|(known, _)| *known == owner) {
			Some(index) => index,
			None => {
				trace!(?owner, "Building prototype.");
				let prototype = build_prototype(dom, &self.root)?;
				prototypes.push((owner, prototype));
				prototypes.len() - 1
			}
		};

		let root = dom.clone_deep(&prototypes[index].1)?;
		let refs = self
			.ref_paths
			.iter()
			.map(|path| {
				path.iter().fold(root.clone(), |node, &i| {
					let mut child = dom.first_child(&node);
					for _ in 0..i {
						child = child.and_then(|child| dom.next_sibling(&child));
					}
					child.unwrap_or_else(|| panic!("block-vdom bug: Template path {:?} not found in the cloned prototype.", path))
				})
			})
			.collect();
		Ok((root, refs))
	}
}

/// Whether the attribute `name` of a `tag` element goes stale once the user interacts with it,
/// so that only writing the property of the same name has a visible effect.
fn is_property(tag: &str, name: &str) -> bool {
	match tag {
		"input" => matches!(name, "checked" | "indeterminate" | "value" | "readonly" | "disabled"),
		"option" => matches!(name, "selected" | "disabled"),
		"textarea" => matches!(name, "value" | "readonly" | "disabled"),
		"select" => matches!(name, "value" | "disabled"),
		"button" | "optgroup" => name == "disabled",
		_ => false,
	}
}

fn build_prototype<D: Dom>(dom: &mut D, node: &TemplateNode) -> Result<D::Node, D::Error> {
	match node {
		TemplateNode::Text(text) => dom.create_text(text),
		TemplateNode::Comment(comment) => dom.create_comment(comment),
		TemplateNode::TextHole(_) | TemplateNode::ChildHole(_) => dom.create_text(""),
		TemplateNode::Element(element) => {
			let node = dom.create_element(&element.tag, element.namespace.as_deref())?;
			for (name, value) in &element.attributes {
				dom.set_attribute(&node, name, value)?;
			}
			if let [TemplateNode::ChildHole(_)] = element.children.as_slice() {
				return Ok(node);
			}
			for child in &element.children {
				let child = build_prototype(dom, child)?;
				dom.insert_before(&node, &child, None)?;
			}
			Ok(node)
		}
	}
}
