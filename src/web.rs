//! The browser host, through [***web-sys***](https://docs.rs/web-sys).

use crate::dom::{Dom, Handler, Property};
use core::fmt::{self, Debug, Formatter};
use js_sys::{Function, Reflect};
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CharacterData, Document, Element, Event, Node};

/// Forwards every [`Dom`] primitive to the browser DOM of one [`Document`].
///
/// Listeners are [`Closure`]s that forward to the [`Handler`] they were created for.
/// They are dropped (and so released on the JavaScript side) once removed.
///
/// # Safety Note
///
/// Dropping a listener that is still attached makes the next matching event throw on the JavaScript side.
/// The engine removes every listener before giving it up, including those of blocks that are cleared wholesale.
pub struct WebDom {
	document: Document,
}

impl Debug for WebDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebDom").finish_non_exhaustive()
	}
}

impl WebDom {
	/// Uses the document of the current global `window`.
	///
	/// # Errors
	///
	/// Iff there is no `window` or it has no `document`.
	pub fn new() -> Result<Self, JsValue> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| JsValue::from_str("block-vdom: No `window.document` available."))?;
		Ok(Self::for_document(document))
	}

	#[must_use]
	pub fn for_document(document: Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn as_element(node: &Node) -> Result<&Element, JsValue> {
	node.dyn_ref::<Element>()
		.ok_or_else(|| JsValue::from_str("block-vdom: Expected an element."))
}

impl Dom for WebDom {
	type Node = Node;
	type Event = Event;
	type Listener = Closure<dyn Fn(Event)>;
	type Error = JsValue;
	type Owner = Document;

	fn owner(&self) -> Document {
		self.document.clone()
	}

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<Node, JsValue> {
		Ok(match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag)?,
			None => self.document.create_element(tag)?,
		}
		.into())
	}

	fn create_text(&mut self, data: &str) -> Result<Node, JsValue> {
		Ok(self.document.create_text_node(data).into())
	}

	fn create_comment(&mut self, data: &str) -> Result<Node, JsValue> {
		Ok(self.document.create_comment(data).into())
	}

	fn clone_deep(&mut self, node: &Node) -> Result<Node, JsValue> {
		node.clone_node_with_deep(true)
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn insert_before(&mut self, parent: &Node, node: &Node, before: Option<&Node>) -> Result<(), JsValue> {
		parent.insert_before(node, before).map(drop)
	}

	fn remove_child(&mut self, parent: &Node, node: &Node) -> Result<(), JsValue> {
		parent.remove_child(node).map(drop)
	}

	fn clear_children(&mut self, parent: &Node) -> Result<(), JsValue> {
		parent.set_text_content(Some(""));
		Ok(())
	}

	fn set_text(&mut self, node: &Node, data: &str) -> Result<(), JsValue> {
		node.dyn_ref::<CharacterData>()
			.ok_or_else(|| JsValue::from_str("block-vdom: Expected a text or comment node."))?
			.set_data(data);
		Ok(())
	}

	fn set_attribute(&mut self, element: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		as_element(element)?.set_attribute(name, value)
	}

	fn remove_attribute(&mut self, element: &Node, name: &str) -> Result<(), JsValue> {
		as_element(element)?.remove_attribute(name)
	}

	fn set_property(&mut self, element: &Node, name: &str, value: &Property) -> Result<(), JsValue> {
		let value = match value {
			Property::Text(text) => JsValue::from_str(text),
			Property::Bool(flag) => JsValue::from_bool(*flag),
		};
		Reflect::set(element, &JsValue::from_str(name), &value).map(drop)
	}

	fn add_class(&mut self, element: &Node, token: &str) -> Result<(), JsValue> {
		as_element(element)?.class_list().add_1(token)
	}

	fn remove_class(&mut self, element: &Node, token: &str) -> Result<(), JsValue> {
		as_element(element)?.class_list().remove_1(token)
	}

	fn add_event_listener(&mut self, element: &Node, event: &str, handler: Handler<Self>) -> Result<Self::Listener, JsValue> {
		let closure = Closure::wrap(Box::new(move |event: Event| handler(&event)) as Box<dyn Fn(Event)>);
		element.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())?;
		trace!(event, "Added event listener.");
		Ok(closure)
	}

	fn remove_event_listener(&mut self, element: &Node, event: &str, listener: Self::Listener) -> Result<(), JsValue> {
		element.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref::<Function>())?;
		trace!(event, "Removed event listener.");
		Ok(())
	}
}
