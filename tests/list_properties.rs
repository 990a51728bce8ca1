mod common;

use block_vdom::NodeId;
use common::{inserts, keyed, moves, removes, setup, texts};
use proptest::{prelude::*, sample::subsequence};
use std::collections::HashMap;

/// Distinct keys in arbitrary order.
fn keys() -> impl Strategy<Value = Vec<i64>> {
	subsequence((0..16).collect::<Vec<i64>>(), 0..=16).prop_shuffle()
}

/// Quadratic reference for the length of the longest strictly increasing subsequence.
fn lis_len(sequence: &[usize]) -> usize {
	let mut lengths = vec![1; sequence.len()];
	for i in 0..sequence.len() {
		for j in 0..i {
			if sequence[j] < sequence[i] {
				lengths[i] = lengths[i].max(lengths[j] + 1);
			}
		}
	}
	lengths.into_iter().max().unwrap_or(0)
}

proptest! {
	#[test]
	fn reconciliation(old in keys(), new in keys()) {
		let (mut dom, container) = setup();

		let mut list = keyed(&old).mount(&mut dom, &container, None).unwrap();
		let before: HashMap<i64, NodeId> = old.iter().copied().zip(dom.children(container).iter().copied()).collect();
		dom.take_mutations();

		list.patch(&mut dom, keyed(&new), &container, None).unwrap();

		// Final order.
		let expected: Vec<String> = new.iter().map(ToString::to_string).collect();
		prop_assert_eq!(texts(&dom, container), expected);

		// Identity of reused entries.
		let after = dom.children(container);
		for (key, node) in new.iter().zip(after) {
			if let Some(old_node) = before.get(key) {
				prop_assert_eq!(old_node, node);
			}
		}

		// Minimal moves.
		let old_positions: HashMap<i64, usize> = old.iter().enumerate().map(|(i, &key)| (key, i)).collect();
		let reused: Vec<usize> = new.iter().filter_map(|key| old_positions.get(key).copied()).collect();
		prop_assert_eq!(moves(&dom), reused.len() - lis_len(&reused));
		prop_assert_eq!(inserts(&dom), new.len() - reused.len());
		prop_assert_eq!(removes(&dom), old.len() - reused.len());
	}

	#[test]
	fn repeated_patch_is_silent(entries in keys()) {
		let (mut dom, container) = setup();

		let mut list = keyed(&entries).mount(&mut dom, &container, None).unwrap();
		dom.take_mutations();
		list.patch(&mut dom, keyed(&entries), &container, None).unwrap();
		prop_assert!(dom.mutations().is_empty());
	}

	#[test]
	fn round_trip(a in keys(), b in keys()) {
		let (mut dom, container) = setup();

		let mut list = keyed(&a).mount(&mut dom, &container, None).unwrap();
		list.patch(&mut dom, keyed(&b), &container, None).unwrap();
		list.patch(&mut dom, keyed(&a), &container, None).unwrap();

		let expected: Vec<String> = a.iter().map(ToString::to_string).collect();
		prop_assert_eq!(texts(&dom, container), expected);
	}
}
