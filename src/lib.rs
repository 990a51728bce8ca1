#![doc(html_root_url = "https://docs.rs/block-vdom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A block-based virtual DOM engine.
//!
//! Static markup is compiled once into a [`Template`] with numbered holes.
//! Each [`Node::block`] clones the template's prototype DOM and afterwards only ever touches its holes.
//! Dynamic structure is expressed through [`Node::Multi`] (fixed slots), [`Node::Toggler`] (one active variant)
//! and [`Node::List`] (keyed siblings, reconciled with a minimal number of moves).
//!
//! All document access goes through the [`Dom`] trait.
//! [`MemoryDom`] implements it in-process, `WebDom` (feature `"web"`) in the browser.
//!
//! # Logging
//!
//! This crate emits [***tracing***](https://docs.rs/tracing) spans and events.
//! Text and attribute contents are only logged with the `"dangerous-logging"` feature enabled.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod block;
mod component;
pub mod dom;
mod key;
mod list;
pub mod memory;
mod multi;
mod node;
mod registry;
mod root;
pub mod template;
mod text;
mod toggler;
mod value;

#[cfg(feature = "web")]
pub mod web;

pub use block::{Block, BlockNode};
pub use component::{Component, ComponentNode, Lifecycle};
pub use dom::{Dom, Handler, Property, RefHook};
pub use key::Key;
pub use list::List;
pub use memory::{MemoryDom, MemoryDomError, MemoryEvent, Mutation, NodeId};
pub use multi::Multi;
pub use node::{Node, VNode};
pub use registry::Registry;
pub use root::DomRoot;
pub use template::{Template, TemplateError, TemplateNode, TemplateOptions};
pub use text::{TextKind, VText};
pub use toggler::Toggler;
pub use value::Value;

#[cfg(feature = "web")]
pub use web::WebDom;
