#![allow(dead_code)]

use block_vdom::{Dom, Key, Lifecycle, MemoryDom, Mutation, Node, NodeId};
use std::{cell::RefCell, rc::Rc};
use tracing_subscriber::EnvFilter;

/// Set `RUST_LOG=block_vdom=trace` to see what the engine does.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A fresh host with one detached `<div>` container. The mutation log starts out empty.
pub fn setup() -> (MemoryDom, NodeId) {
	init_logging();
	let mut dom = MemoryDom::new();
	let container = dom.create_element("div", None).unwrap();
	dom.take_mutations();
	(dom, container)
}

/// A keyed list of text nodes, each showing its key.
pub fn keyed(keys: &[i64]) -> Node<MemoryDom> {
	Node::list(keys.iter().map(|&key| (Key::Int(key), Node::text(key.to_string()))))
}

pub fn texts(dom: &MemoryDom, parent: NodeId) -> Vec<String> {
	dom.children(parent)
		.iter()
		.map(|&child| dom.text(child).unwrap_or_default().to_owned())
		.collect()
}

pub fn moves(dom: &MemoryDom) -> usize {
	dom.count_mutations(|mutation| matches!(mutation, Mutation::Move { .. }))
}

pub fn inserts(dom: &MemoryDom) -> usize {
	dom.count_mutations(|mutation| matches!(mutation, Mutation::Insert { .. }))
}

pub fn removes(dom: &MemoryDom) -> usize {
	dom.count_mutations(|mutation| matches!(mutation, Mutation::Remove { .. }))
}

pub fn creates(dom: &MemoryDom) -> usize {
	dom.count_mutations(|mutation| matches!(mutation, Mutation::Create(_)))
}

/// Whether any recorded mutation was performed on `node`.
pub fn touched(dom: &MemoryDom, node: NodeId) -> bool {
	dom.mutations().iter().any(|mutation| mutation.subject() == node)
}

pub type Log = Rc<RefCell<Vec<String>>>;

/// A [`Lifecycle`] that appends its hook calls to a shared log.
pub struct Recorder {
	pub name: &'static str,
	pub log: Log,
}

impl Recorder {
	pub fn new(name: &'static str, log: &Log) -> Rc<dyn Lifecycle> {
		Rc::new(Self { name, log: Rc::clone(log) })
	}
}

impl Lifecycle for Recorder {
	fn mounted(&self) {
		self.log.borrow_mut().push(format!("mounted {}", self.name));
	}

	fn before_remove(&self) {
		self.log.borrow_mut().push(format!("before_remove {}", self.name));
	}
}
