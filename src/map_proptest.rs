#![cfg(test)]

// Property tests for BucketMap kept inside the crate so they can check the
// directory/store bijection through private state.

use crate::config::Config;
use crate::directory::{Chained, Directory, LinearProbing};
use crate::entry_store::{InsertionOrder, Order, Unordered};
use crate::error::Error;
use crate::map::BucketMap;
use core::hash::BuildHasher;
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and shorter
// op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = Config> {
    (1usize..=8, prop_oneof![Just(0.5), Just(0.7), Just(1.0), Just(2.5)]).prop_map(|(cap, lf)| {
        Config::new()
            .with_initial_capacity(cap)
            .with_max_load_factor(lf)
    })
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// State-machine equivalence against std::collections::HashMap.
// Invariants checked after every op:
// - duplicate inserts return false and keep the first value;
// - get/get_mut report KeyNotFound exactly when the model lacks the key;
// - contains_key parity, including borrowed `&str` lookups;
// - iteration yields each live key once, in insertion order when ordered;
// - len/is_empty parity and the directory/store bijection;
// - the directory only ever doubles, never shrinks, across inserts.
fn run_state_machine<D, O, S>(
    mut sut: BucketMap<Key, i32, D, O, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut order: Vec<Key> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let before = sut.bucket_count();
                let inserted = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert result must mirror absence");
                let after = sut.bucket_count();
                prop_assert!(before == 0 || after == before || after == before * 2);
                if inserted {
                    model.insert(k.clone(), v);
                    order.push(k);
                }
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                let removed = sut.remove_entry(&k);
                let expected = model.remove(&k);
                prop_assert_eq!(removed.map(|(_, v)| v), expected);
                order.retain(|o| *o != k);
                prop_assert!(!sut.contains_key(&k));
            }
            OpI::Get(i) => {
                let k = key_from(&pool, i);
                match model.get(&k) {
                    Some(v) => prop_assert_eq!(sut.get(&k), Ok(v)),
                    None => prop_assert_eq!(sut.get(&k), Err(Error::KeyNotFound)),
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Ok(v), Some(mv)) => {
                        *v = v.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (Err(Error::KeyNotFound), None) => {}
                    (got, want) => {
                        prop_assert!(false, "get_mut mismatch: {:?} vs {:?}", got, want)
                    }
                }
            }
            OpI::Iterate => {
                if O::PRESERVES_INSERTION {
                    let s_keys: Vec<Key> = sut.keys().cloned().collect();
                    prop_assert_eq!(&s_keys, &order);
                } else {
                    let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                    let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                    prop_assert_eq!(s_keys, m_keys);
                }
                for (k, v) in sut.iter() {
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                order.clear();
                prop_assert_eq!(sut.bucket_count(), 0);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.assert_invariants();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_chained_unordered((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: BucketMap<Key, i32, Chained, Unordered> = BucketMap::with_config(config).unwrap();
        run_state_machine(sut, pool, ops)?;
    }

    #[test]
    fn prop_chained_insertion_order((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: BucketMap<Key, i32, Chained, InsertionOrder> = BucketMap::with_config(config).unwrap();
        run_state_machine(sut, pool, ops)?;
    }

    #[test]
    fn prop_probing_unordered((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: BucketMap<Key, i32, LinearProbing, Unordered> = BucketMap::with_config(config).unwrap();
        run_state_machine(sut, pool, ops)?;
    }

    #[test]
    fn prop_probing_insertion_order((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: BucketMap<Key, i32, LinearProbing, InsertionOrder> = BucketMap::with_config(config).unwrap();
        run_state_machine(sut, pool, ops)?;
    }
}

// Same invariants under worst-case collisions: every key hashes to 0, so
// all lookups resolve through equality alone.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]

    #[test]
    fn prop_chained_with_collisions((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: BucketMap<Key, i32, Chained, InsertionOrder, ConstBuildHasher> =
            BucketMap::with_config_and_hasher(config, ConstBuildHasher).unwrap();
        run_state_machine(sut, pool, ops)?;
    }

    #[test]
    fn prop_probing_with_collisions((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: BucketMap<Key, i32, LinearProbing, Unordered, ConstBuildHasher> =
            BucketMap::with_config_and_hasher(config, ConstBuildHasher).unwrap();
        run_state_machine(sut, pool, ops)?;
    }
}

// Resize transparency: whatever was readable before the directory grows is
// readable, with the same value, afterwards.
proptest! {
    #[test]
    fn prop_growth_preserves_lookups(keys in proptest::collection::btree_set(any::<u32>(), 1..200)) {
        let mut m: BucketMap<u32, u64, LinearProbing, Unordered, DefaultHashBuilder> =
            BucketMap::with_capacity_and_load_factor(1, 0.7).unwrap();
        let mut inserted: Vec<u32> = Vec::new();
        for k in keys {
            let before = m.bucket_count();
            prop_assert!(m.insert(k, u64::from(k) * 7));
            inserted.push(k);
            if m.bucket_count() != before {
                for &p in &inserted {
                    prop_assert_eq!(m.get(&p), Ok(&(u64::from(p) * 7)));
                }
            }
        }
        m.assert_invariants();
    }
}
