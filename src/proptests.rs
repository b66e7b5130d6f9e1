use super::*;

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::BTreeMap;

fn validate_tree<K: Ord, V>(t: &RbMultiMap<K, V>) {
    if let Err(err) = t.check_invariants() {
        panic!("invariant violated: {err}");
    }

    let n = t.len();
    let bound = 2.0 * ((n + 1) as f64).log2();
    assert!(
        t.height() as f64 <= bound,
        "height {} exceeds 2*log2({}+1)",
        t.height(),
        n
    );
}

fn assert_matches_model<K, V>(t: &RbMultiMap<K, V>, m: &BTreeMap<K, Vec<V>>)
where
    K: Ord + std::fmt::Debug,
    V: PartialEq + std::fmt::Debug,
{
    assert_eq!(t.len(), m.len());
    assert_eq!(t.value_count(), m.values().map(Vec::len).sum::<usize>());
    let got: Vec<(&K, &[V])> = t.iter().collect();
    let expected: Vec<(&K, &[V])> = m.iter().map(|(k, v)| (k, v.as_slice())).collect();
    assert_eq!(got, expected);
}

#[derive(Clone, Debug)]
enum Op<K, V> {
    Insert(K, V),
    Find(K),
    Clear,
}

fn ops_strategy_u16() -> impl Strategy<Value = Vec<Op<u16, u32>>> {
    // A narrow key range forces plenty of equal-key appends.
    let key = 0u16..512;
    let op = prop_oneof![
        70 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        29 => key.prop_map(Op::Find),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=2000)
}

fn ops_strategy_string() -> impl Strategy<Value = Vec<Op<String, u8>>> {
    let key = "[a-d]{0,4}";
    let op = prop_oneof![
        75 => (key, any::<u8>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.prop_map(Op::Find),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u16(ops in ops_strategy_u16()) {
        let mut t: RbMultiMap<u16, u32> = RbMultiMap::new();
        let mut m: BTreeMap<u16, Vec<u32>> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let created = t.insert(key, value);
                    let entry = m.entry(key).or_default();
                    prop_assert_eq!(created, entry.is_empty());
                    entry.push(value);
                    if created {
                        validate_tree(&t);
                    }
                }
                Op::Find(key) => {
                    let got_t = t.find(&key);
                    let got_m = m.get(&key).map(Vec::as_slice);
                    prop_assert_eq!(got_t, got_m);
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        assert_matches_model(&t, &m);
    }

    #[test]
    fn prop_equivalence_string(ops in ops_strategy_string()) {
        let mut t: RbMultiMap<String, u8> = RbMultiMap::new();
        let mut m: BTreeMap<String, Vec<u8>> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let created = t.insert(key.clone(), value);
                    prop_assert_eq!(created, !m.contains_key(&key));
                    m.entry(key).or_default().push(value);
                }
                Op::Find(key) => {
                    prop_assert_eq!(t.find(key.as_str()), m.get(&key).map(Vec::as_slice));
                }
                Op::Clear => unreachable!(),
            }
        }

        validate_tree(&t);
        assert_matches_model(&t, &m);
    }

    #[test]
    fn prop_distinct_keys_stay_balanced(
        keys in prop::collection::btree_set(any::<i64>(), 0..=3000),
        seed in any::<u64>(),
    ) {
        let mut keys: Vec<i64> = keys.into_iter().collect();
        keys.shuffle(&mut StdRng::seed_from_u64(seed));
        let mut t: RbMultiMap<i64, ()> = RbMultiMap::new();
        for &k in &keys {
            prop_assert!(t.insert(k, ()));
        }
        validate_tree(&t);
        prop_assert_eq!(t.len(), keys.len());
        for k in &keys {
            prop_assert_eq!(t.find(k).map(<[()]>::len), Some(1));
        }
    }
}

/// Visit every ordering of `items`, generated by swaps (Heap's algorithm).
fn each_ordering<T: Clone>(items: &[T], mut visit: impl FnMut(&[T])) {
    let mut current = items.to_vec();
    let mut swaps = vec![0usize; current.len()];
    visit(&current);

    let mut level = 1;
    while level < current.len() {
        if swaps[level] < level {
            let other = if level % 2 == 0 { 0 } else { swaps[level] };
            current.swap(other, level);
            visit(&current);
            swaps[level] += 1;
            level = 1;
        } else {
            swaps[level] = 0;
            level += 1;
        }
    }
}

#[test]
fn each_ordering_visits_every_arrangement() {
    let mut seen = std::collections::BTreeSet::new();
    let mut visits = 0;
    each_ordering(&[1u8, 2, 3, 4], |order| {
        seen.insert(order.to_vec());
        visits += 1;
    });
    assert_eq!(visits, 24);
    assert_eq!(seen.len(), 24);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = ["a", "b", "c", "d", "e", "f", "g"];

    each_ordering(&keys, |order| {
        let mut t: RbMultiMap<&str, usize> = RbMultiMap::new();
        let mut m: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

        for (i, &k) in order.iter().enumerate() {
            assert!(t.insert(k, i));
            m.entry(k).or_default().push(i);
            validate_tree(&t);
        }

        assert_matches_model(&t, &m);
    });
}

#[test]
fn exhaustive_duplicates_never_restructure() {
    let keys = [3u8, 1, 4, 1, 5, 9, 2, 6];

    each_ordering(&keys, |order| {
        let mut t: RbMultiMap<u8, usize> = RbMultiMap::new();
        let mut m: BTreeMap<u8, Vec<usize>> = BTreeMap::new();

        for (i, &k) in order.iter().enumerate() {
            let shape = t.display().to_string();
            let created = t.insert(k, i);
            if !created {
                assert_eq!(t.display().to_string(), shape);
            }
            m.entry(k).or_default().push(i);
        }

        validate_tree(&t);
        assert_matches_model(&t, &m);
        assert_eq!(t.find(&1).map(<[usize]>::len), Some(2));
    });
}

#[test]
fn adversarial_orders_stay_balanced() {
    let n = 4_095usize;
    let bound = 2.0 * ((n + 1) as f64).log2();

    // Alternating outside-in: 0, n-1, 1, n-2, ...
    let mut zig_zag = Vec::with_capacity(n);
    let (mut lo, mut hi) = (0, n - 1);
    while lo <= hi {
        zig_zag.push(lo);
        if lo != hi {
            zig_zag.push(hi);
        }
        lo += 1;
        hi -= 1;
    }

    let mut shuffled: Vec<usize> = (0..n).collect();
    shuffled.shuffle(&mut StdRng::seed_from_u64(0x5eed));

    let orders: [(&str, Vec<usize>); 4] = [
        ("ascending", (0..n).collect()),
        ("descending", (0..n).rev().collect()),
        ("zig-zag", zig_zag),
        ("shuffled", shuffled),
    ];

    for (name, order) in orders {
        let mut t: RbMultiMap<usize, usize> = RbMultiMap::new();
        for k in order {
            t.insert(k, k);
        }
        validate_tree(&t);
        assert_eq!(t.len(), n, "{name}");
        assert!(t.height() as f64 <= bound, "{name}: height {}", t.height());
        assert!(t.keys().copied().eq(0..n), "{name}");
    }
}
