//! The host primitives the engine is written against.
//!
//! Everything in this crate reaches the document only through [`Dom`].
//! [`MemoryDom`](`crate::memory::MemoryDom`) implements it in-process,
//! `WebDom` (feature `"web"`) forwards to [***web-sys***](https://docs.rs/web-sys).

use core::fmt::Debug;
use std::rc::Rc;

/// An event handler as stored in a [`Value::Handler`](`crate::Value::Handler`) hole.
///
/// Handlers are compared by identity, so re-using the same [`Rc`] across renders avoids listener churn.
pub type Handler<D> = Rc<dyn Fn(&<D as Dom>::Event)>;

/// A callback stored in a [`Value::Ref`](`crate::Value::Ref`) hole.
///
/// It receives the referenced element once the block is attached and [`None`] when the block is removed.
pub type RefHook<D> = Rc<dyn Fn(Option<&<D as Dom>::Node>)>;

/// A value written through [`Dom::set_property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
	Text(String),
	Bool(bool),
}

/// Node insertion/removal/move, character data, attributes, properties, class tokens and event listeners. Nothing else.
///
/// All fallible operations return the host's own error type, which the engine propagates unchanged.
pub trait Dom: Sized {
	/// A handle to a host node. Equality must be node identity.
	type Node: Clone + PartialEq + Debug;
	/// The event type handed to [`Handler`]s.
	type Event;
	/// Keeps a listener alive until it is handed back to [`Dom::remove_event_listener`].
	type Listener;
	type Error: Debug;
	/// Identifies the document this host creates nodes in.
	///
	/// [`Template`](`crate::Template`)s cache one prototype per owner, so a template can be shared between hosts.
	type Owner: PartialEq + Debug;

	fn owner(&self) -> Self::Owner;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<Self::Node, Self::Error>;
	fn create_text(&mut self, data: &str) -> Result<Self::Node, Self::Error>;
	fn create_comment(&mut self, data: &str) -> Result<Self::Node, Self::Error>;

	/// Clones `node` and its whole subtree, including attributes but excluding event listeners.
	fn clone_deep(&mut self, node: &Self::Node) -> Result<Self::Node, Self::Error>;

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `node` into `parent` before `before`, or at the end if `before` is [`None`].
	///
	/// If `node` is already attached somewhere, it is moved.
	fn insert_before(&mut self, parent: &Self::Node, node: &Self::Node, before: Option<&Self::Node>) -> Result<(), Self::Error>;
	fn remove_child(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), Self::Error>;

	/// Detaches all children of `parent` at once.
	fn clear_children(&mut self, parent: &Self::Node) -> Result<(), Self::Error>;

	/// Replaces the data of a text or comment node.
	fn set_text(&mut self, node: &Self::Node, data: &str) -> Result<(), Self::Error>;

	fn set_attribute(&mut self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;
	fn remove_attribute(&mut self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// Writes the live property `name`, which for form controls isn't the same as the attribute of that name.
	fn set_property(&mut self, element: &Self::Node, name: &str, value: &Property) -> Result<(), Self::Error>;

	/// Adds `token` to the `class` of `element`, if it isn't there yet.
	fn add_class(&mut self, element: &Self::Node, token: &str) -> Result<(), Self::Error>;
	fn remove_class(&mut self, element: &Self::Node, token: &str) -> Result<(), Self::Error>;

	fn add_event_listener(&mut self, element: &Self::Node, event: &str, handler: Handler<Self>) -> Result<Self::Listener, Self::Error>;
	fn remove_event_listener(&mut self, element: &Self::Node, event: &str, listener: Self::Listener) -> Result<(), Self::Error>;
}
