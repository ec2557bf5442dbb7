use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::arena::NodeRef;
use crate::bits::{bit_at, bit_range_eq};
use crate::tree::RadixTree;

/// Walk the whole tree and assert every structural invariant.
pub(crate) fn validate_tree<V>(t: &RadixTree<V>) {
    let mut stack: Vec<NodeRef> = Vec::new();
    if !t.root.is_null() {
        let r = t.arena.get(t.root);
        assert_eq!(r.start, 0, "root span must begin at bit 0");
        assert!(r.parent.is_null(), "root must have no parent");
        stack.push(t.root);
    }

    let mut entries = 0usize;
    let mut nodes = 0usize;
    while let Some(node) = stack.pop() {
        nodes += 1;
        let n = t.arena.get(node);

        assert!(n.end >= n.start - 1, "inverted span");
        assert!(
            n.end >= n.start || node == t.root,
            "empty span below the root"
        );
        if n.data.is_some() {
            entries += 1;
            assert!(
                n.bytes.len() * 8 >= (n.end + 1) as usize,
                "key buffer shorter than the span"
            );
        } else {
            assert!(
                !n.left.is_null() && !n.right.is_null(),
                "fork with fewer than two children"
            );
        }

        for (child, side_bit) in [(n.left, 0u8), (n.right, 1u8)] {
            if child.is_null() {
                continue;
            }
            let c = t.arena.get(child);
            assert_eq!(c.parent, node, "child must point back at its parent");
            assert_eq!(c.start, n.end + 1, "child span must extend the parent's");
            assert!(c.end >= c.start, "child spans are never empty");
            assert_eq!(
                bit_at(&c.bytes, c.start),
                side_bit,
                "child must sit on the side of its first own bit"
            );
            if n.end >= 0 {
                assert!(
                    bit_range_eq(&c.bytes, &n.bytes, n.start, n.end),
                    "child buffer must agree with the parent's span"
                );
            }
            stack.push(child);
        }
    }

    assert_eq!(entries, t.len(), "len must count the reachable entries");
    assert_eq!(
        t.arena.capacity() - t.arena.free_slots(),
        nodes,
        "live arena slots must match reachable nodes"
    );
}

/// Model key: one byte per bit. Lexicographic order over these expansions is
/// exactly the tree's order — a shorter prefix sorts before its extensions.
fn model_key(key: &[u8], bits: u16) -> Vec<u8> {
    (0..i32::from(bits)).map(|i| bit_at(key, i)).collect()
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, u16, u64),
    Remove(Vec<u8>, u16),
    Get(Vec<u8>, u16),
    LookupLongest(Vec<u8>, u16),
    LookupGe(Vec<u8>, u16),
    LookupLe(Vec<u8>, u16),
}

/// Short keys over few bytes collide constantly, which is the point: every
/// insert case and delete cascade gets exercised.
fn key_strategy() -> impl Strategy<Value = (Vec<u8>, u16)> + Clone {
    prop::collection::vec(any::<u8>(), 1..=3).prop_flat_map(|k| {
        let max = (k.len() * 8) as u16;
        (Just(k), 0..=max)
    })
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        45 => (key.clone(), any::<u64>()).prop_map(|((k, b), v)| Op::Insert(k, b, v)),
        20 => key.clone().prop_map(|(k, b)| Op::Remove(k, b)),
        15 => key.clone().prop_map(|(k, b)| Op::Get(k, b)),
        10 => key.clone().prop_map(|(k, b)| Op::LookupLongest(k, b)),
        5 => key.clone().prop_map(|(k, b)| Op::LookupGe(k, b)),
        5 => key.prop_map(|(k, b)| Op::LookupLe(k, b)),
    ];
    prop::collection::vec(op, 0..=400)
}

proptest! {
    #[test]
    fn ops_match_model(ops in ops_strategy()) {
        let mut t: RadixTree<u64> = RadixTree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, b, v) => {
                    let (node, inserted) = t.insert(&k, b, v);
                    if b == 0 {
                        prop_assert!(node.is_none() && !inserted, "zero-bit insert must be a no-op");
                    } else {
                        let mk = model_key(&k, b);
                        prop_assert_eq!(inserted, !m.contains_key(&mk));
                        let stored = *m.entry(mk).or_insert(v);
                        prop_assert_eq!(t.value(node.unwrap()), Some(&stored));
                    }
                }
                Op::Remove(k, b) => {
                    let got = t.get(&k, b).and_then(|n| t.remove(n));
                    let want = if b == 0 { None } else { m.remove(&model_key(&k, b)) };
                    prop_assert_eq!(got, want);
                }
                Op::Get(k, b) => {
                    let got = t.get(&k, b).and_then(|n| t.value(n)).copied();
                    let want = if b == 0 { None } else { m.get(&model_key(&k, b)).copied() };
                    prop_assert_eq!(got, want);
                }
                Op::LookupLongest(k, b) => {
                    let got = t
                        .lookup_longest(&k, b)
                        .map(|n| model_key(t.key_bytes(n), t.key_bits(n)));
                    let mk = if b == 0 { Vec::new() } else { model_key(&k, b) };
                    let want = (1..=mk.len())
                        .rev()
                        .map(|l| mk[..l].to_vec())
                        .find(|p| m.contains_key(p));
                    prop_assert_eq!(got, want);
                }
                Op::LookupGe(k, b) => {
                    let got = t
                        .lookup_ge(&k, b)
                        .map(|n| model_key(t.key_bytes(n), t.key_bits(n)));
                    let mk = if b == 0 { Vec::new() } else { model_key(&k, b) };
                    let want = m.range(mk..).next().map(|(key, _)| key.clone());
                    prop_assert_eq!(got, want);
                }
                Op::LookupLe(k, b) => {
                    let got = t
                        .lookup_le(&k, b)
                        .map(|n| model_key(t.key_bytes(n), t.key_bits(n)));
                    let want = if b == 0 {
                        None
                    } else {
                        m.range(..=model_key(&k, b)).next_back().map(|(key, _)| key.clone())
                    };
                    prop_assert_eq!(got, want);
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);

        // Full ordered sweep, forward and backward, against the model.
        let walked: Vec<_> = t
            .iter()
            .map(|n| (model_key(t.key_bytes(n), t.key_bits(n)), *t.value(n).unwrap()))
            .collect();
        let expected: Vec<_> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(walked, expected);

        let mut backward = Vec::new();
        let mut node = t.last();
        while let Some(n) = node {
            backward.push((model_key(t.key_bytes(n), t.key_bits(n)), *t.value(n).unwrap()));
            node = t.prev(n);
        }
        backward.reverse();
        let expected: Vec<_> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(backward, expected);
    }

    #[test]
    fn scoped_iteration_matches_model(
        entries in prop::collection::vec(key_strategy(), 0..=120),
        scope in key_strategy(),
    ) {
        let mut t: RadixTree<u32> = RadixTree::new();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        for (i, (k, b)) in entries.into_iter().enumerate() {
            if b == 0 {
                continue;
            }
            t.insert(&k, b, i as u32);
            m.entry(model_key(&k, b)).or_insert(i as u32);
        }

        let (sk, sb) = scope;
        let smk = model_key(&sk, sb);
        let scoped: Vec<_> = t
            .iter_prefix(&sk, sb)
            .map(|n| model_key(t.key_bytes(n), t.key_bits(n)))
            .collect();
        let expected: Vec<_> = m
            .keys()
            .filter(|k| k.starts_with(&smk))
            .cloned()
            .collect();
        prop_assert_eq!(scoped, expected);
    }

    #[test]
    fn delete_everything_in_random_order(
        entries in prop::collection::vec(key_strategy(), 1..=80),
        seed in any::<u64>(),
    ) {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut t: RadixTree<u32> = RadixTree::new();
        let mut keys = Vec::new();
        for (i, (k, b)) in entries.into_iter().enumerate() {
            if b == 0 {
                continue;
            }
            let (_, inserted) = t.insert(&k, b, i as u32);
            if inserted {
                keys.push((k, b));
            }
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        keys.shuffle(&mut rng);

        for (i, (k, b)) in keys.iter().enumerate() {
            let node = t.get(k, *b).expect("inserted key must be present");
            prop_assert!(t.remove(node).is_some());
            validate_tree(&t);
            prop_assert_eq!(t.len(), keys.len() - i - 1);
        }
        prop_assert!(t.is_empty());
        prop_assert!(t.first().is_none());

        // All slots returned to the free list.
        prop_assert_eq!(t.arena.capacity(), t.arena.free_slots());
    }
}
