//! Keyed list reconciliation.
//!
//! After trimming the common prefix and suffix (by key), entries of the remaining middle segment are matched by key.
//! Matched entries are patched in place, unmatched old entries are removed,
//! and then only the matched entries *outside* the longest increasing subsequence of their old positions are moved.
//! This keeps the number of moves at `reused - LIS`, which is minimal for a key-only diff.

use crate::{
	dom::Dom,
	key::Key,
	node::{next_anchor, warn_replaced_keyed, Node, VNode},
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use tracing::{debug, trace, trace_span};

/// Live keyed siblings. An empty list owns no DOM nodes and anchors on whatever follows it.
pub struct List<D: Dom> {
	entries: Vec<(Key, VNode<D>)>,
	/// Whether this list is the only content of its parent element, in which case clearing can be done wholesale.
	only_child: bool,
}

/// What happens to one entry of the new middle segment.
enum Pending<D: Dom> {
	/// Reuse old middle entry `.0` (already patched).
	Reused(usize),
	Fresh(Key, Node<D>),
}

impl<D: Dom> List<D> {
	pub(crate) fn mount(dom: &mut D, entries: Vec<(Key, Node<D>)>, parent: &D::Node, before: Option<&D::Node>) -> Result<Self, D::Error> {
		let span = trace_span!("Mounting list", "entries.len()" = entries.len());
		let _enter = span.enter();

		check_unique_keys(&entries);

		let mut live = Vec::with_capacity(entries.len());
		for (key, node) in entries {
			let node = node.mount(dom, parent, before)?;
			live.push((key, node));
		}
		Ok(Self {
			entries: live,
			only_child: false,
		})
	}

	pub(crate) fn set_only_child(&mut self) {
		self.only_child = true;
	}

	#[allow(clippy::too_many_lines)]
	pub(crate) fn patch(&mut self, dom: &mut D, entries: Vec<(Key, Node<D>)>, parent: &D::Node, after: Option<&D::Node>) -> Result<(), D::Error> {
		let span = trace_span!("Patching list", "old.len()" = self.entries.len(), "new.len()" = entries.len());
		let _enter = span.enter();

		check_unique_keys(&entries);

		if entries.is_empty() && self.only_child && !self.entries.is_empty() {
			trace!("Clearing parent of only-child list.");
			self.before_remove();
			self.release_listeners(dom)?;
			self.entries.clear();
			return dom.clear_children(parent);
		}

		let mut old = std::mem::take(&mut self.entries);
		let mut new = entries;

		// Edge trim, by key only. Patching follows below in the same order.
		let front = old.iter().zip(&new).take_while(|((k_1, _), (k_2, _))| k_1 == k_2).count();
		let back = old[front..]
			.iter()
			.rev()
			.zip(new[front..].iter().rev())
			.take_while(|((k_1, _), (k_2, _))| k_1 == k_2)
			.count();
		trace!(front, back, "Trimmed common edges.");

		let mut old_back = old.split_off(old.len() - back);
		let old_mid = old.split_off(front);
		let mut old_front = old;
		let new_back = new.split_off(new.len() - back);
		let new_mid = new.split_off(front);
		let new_front = new;

		for (i, (key, node)) in new_front.into_iter().enumerate() {
			let (head, tail) = old_front.split_at_mut(i + 1);
			let anchor = next_anchor(tail.iter().chain(&old_mid).chain(&old_back).map(|(_, node)| node), after);
			let (_, live) = &mut head[i];
			warn_replaced_keyed(&key, live, &node);
			live.patch(dom, node, parent, anchor.as_ref())?;
		}

		for (i, (key, node)) in new_back.into_iter().enumerate().rev() {
			let (head, tail) = old_back.split_at_mut(i + 1);
			let anchor = next_anchor(tail.iter().map(|(_, node)| node), after);
			let (_, live) = &mut head[i];
			warn_replaced_keyed(&key, live, &node);
			live.patch(dom, node, parent, anchor.as_ref())?;
		}

		let middle = if old_mid.is_empty() {
			// Pure insertion.
			let anchor = next_anchor(old_back.iter().map(|(_, node)| node), after);
			let mut inserted = Vec::with_capacity(new_mid.len());
			for (key, node) in new_mid {
				let node = node.mount(dom, parent, anchor.as_ref())?;
				inserted.push((key, node));
			}
			debug!(created = inserted.len(), "Inserted list entries.");
			inserted
		} else if new_mid.is_empty() {
			// Pure removal.
			let removed = old_mid.len();
			for (_, node) in old_mid {
				node.before_remove();
				node.remove(dom, parent)?;
			}
			debug!(removed, "Removed list entries.");
			Vec::new()
		} else {
			reconcile_middle(dom, old_mid, new_mid, &old_back, parent, after)?
		};

		old_front.extend(middle);
		old_front.append(&mut old_back);
		self.entries = old_front;
		Ok(())
	}

	pub(crate) fn before_remove(&self) {
		for (_, node) in &self.entries {
			node.before_remove();
		}
	}

	pub(crate) fn remove(&mut self, dom: &mut D, parent: &D::Node) -> Result<(), D::Error> {
		if self.only_child {
			self.release_listeners(dom)?;
			self.entries.clear();
			return dom.clear_children(parent);
		}
		for (_, node) in self.entries.drain(..) {
			node.remove(dom, parent)?;
		}
		Ok(())
	}

	pub(crate) fn release_listeners(&mut self, dom: &mut D) -> Result<(), D::Error> {
		for (_, node) in &mut self.entries {
			node.release_listeners(dom)?;
		}
		Ok(())
	}

	pub(crate) fn move_before(&self, dom: &mut D, parent: &D::Node, before: Option<&D::Node>) -> Result<(), D::Error> {
		for (_, node) in &self.entries {
			node.move_before(dom, parent, before)?;
		}
		Ok(())
	}

	pub(crate) fn first_dom_node(&self) -> Option<&D::Node> {
		self.entries.iter().find_map(|(_, node)| node.first_dom_node())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn keys(&self) -> impl '_ + Iterator<Item = &Key> {
		self.entries.iter().map(|(key, _)| key)
	}

	#[must_use]
	pub fn get(&self, key: &Key) -> Option<&VNode<D>> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, node)| node)
	}

	pub fn iter(&self) -> impl '_ + Iterator<Item = (&Key, &VNode<D>)> {
		self.entries.iter().map(|(key, node)| (key, node))
	}
}

/// Reconciles two non-empty middle segments. `old_back` is the (already patched) suffix that follows them.
fn reconcile_middle<D: Dom>(
	dom: &mut D,
	old_mid: Vec<(Key, VNode<D>)>,
	new_mid: Vec<(Key, Node<D>)>,
	old_back: &[(Key, VNode<D>)],
	parent: &D::Node,
	after: Option<&D::Node>,
) -> Result<Vec<(Key, VNode<D>)>, D::Error> {
	let mut old_indices = HashMap::with_capacity(old_mid.len());
	for (i, (key, _)) in old_mid.iter().enumerate() {
		match old_indices.entry(key.clone()) {
			Entry::Occupied(_) => panic!("block-vdom bug: Duplicate key {} in live list.", key),
			Entry::Vacant(vacant) => {
				vacant.insert(i);
			}
		}
	}

	let mut old_mid: Vec<Option<(Key, VNode<D>)>> = old_mid.into_iter().map(Some).collect();

	// Match by key and patch in place, before anything moves.
	let mut pending = Vec::with_capacity(new_mid.len());
	let mut sources = Vec::with_capacity(new_mid.len());
	for (key, node) in new_mid {
		match old_indices.remove(&key) {
			Some(i) => {
				let (head, tail) = old_mid.split_at_mut(i + 1);
				let anchor = next_anchor(tail.iter().flatten().chain(old_back).map(|(_, node)| node), after);
				let (_, live) = head[i].as_mut().unwrap_or_else(|| panic!("Duplicate key {} in list.", key));
				warn_replaced_keyed(&key, live, &node);
				live.patch(dom, node, parent, anchor.as_ref())?;
				sources.push(Some(i));
				pending.push(Pending::Reused(i));
			}
			None => {
				sources.push(None);
				pending.push(Pending::Fresh(key, node));
			}
		}
	}

	// Keys that vanished.
	let mut stale: Vec<usize> = old_indices.into_iter().map(|(_, i)| i).collect();
	stale.sort_unstable();
	let mut removed = 0_usize;
	for i in stale {
		if let Some((_, node)) = old_mid[i].take() {
			node.before_remove();
			node.remove(dom, parent)?;
			removed += 1;
		}
	}

	let stable = longest_increasing_subsequence(&sources);
	trace!(reused = sources.iter().flatten().count(), stable = stable.iter().filter(|&&s| s).count(), "Computed LIS.");

	// Materialize right to left, each entry before its already-placed right neighbour.
	let mut placed: Vec<(Key, VNode<D>)> = Vec::with_capacity(pending.len());
	let (mut created, mut moved) = (0_usize, 0_usize);
	for (j, pending) in pending.into_iter().enumerate().rev() {
		let anchor = next_anchor(placed.iter().rev().chain(old_back).map(|(_, node)| node), after);
		match pending {
			Pending::Fresh(key, node) => {
				let node = node.mount(dom, parent, anchor.as_ref())?;
				placed.push((key, node));
				created += 1;
			}
			Pending::Reused(i) => {
				let (key, node) = old_mid[i].take().unwrap_or_else(|| panic!("block-vdom bug: List entry {} reused twice.", i));
				if !stable[j] {
					node.move_before(dom, parent, anchor.as_ref())?;
					moved += 1;
				}
				placed.push((key, node));
			}
		}
	}
	placed.reverse();
	debug!(created, moved, removed, "Reconciled keyed list.");
	Ok(placed)
}

/// Contract check: keys must be unique. Checked in full only with debug assertions.
fn check_unique_keys<D: Dom>(entries: &[(Key, Node<D>)]) {
	if cfg!(debug_assertions) {
		let mut seen = HashSet::with_capacity(entries.len());
		for (key, _) in entries {
			assert!(seen.insert(key), "Duplicate key {} in list.", key);
		}
	}
}

/// Marks the positions of `sequence` that belong to one longest strictly increasing subsequence of its [`Some`] values.
///
/// [`None`] positions never belong to it. `O(n log n)`.
pub(crate) fn longest_increasing_subsequence(sequence: &[Option<usize>]) -> Vec<bool> {
	// `tails[k]`: position of the smallest tail value of any increasing run of length `k + 1` so far.
	let mut tails: Vec<usize> = Vec::new();
	let mut tail_values: Vec<usize> = Vec::new();
	let mut predecessors: Vec<Option<usize>> = vec![None; sequence.len()];

	for (position, value) in sequence.iter().enumerate() {
		let value = match *value {
			Some(value) => value,
			None => continue,
		};
		let k = tail_values.partition_point(|&tail| tail < value);
		predecessors[position] = k.checked_sub(1).map(|k| tails[k]);
		if k == tails.len() {
			tails.push(position);
			tail_values.push(value);
		} else {
			tails[k] = position;
			tail_values[k] = value;
		}
	}

	let mut members = vec![false; sequence.len()];
	let mut cursor = tails.last().copied();
	while let Some(position) = cursor {
		members[position] = true;
		cursor = predecessors[position];
	}
	members
}
