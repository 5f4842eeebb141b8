//! Tests for the weighted attribute pools: deterministic hashing, cycle
//! coverage and construction guards.

use std::collections::HashMap;

use webrig::attributes::{user_agent_pool, window_size_pool, window_size_string};
use webrig::{AttributePool, RigError};

#[test]
fn test_hashed_is_deterministic_across_fresh_pools() {
    let first = user_agent_pool().expect("pool");
    let second = user_agent_pool().expect("pool");

    for key in ["Profile 1", "Profile 2", "some-long-profile-identifier", ""] {
        assert_eq!(first.hashed(Some(key)), second.hashed(Some(key)));
    }

    let sizes_a = window_size_pool().expect("pool");
    let sizes_b = window_size_pool().expect("pool");
    assert_eq!(sizes_a.hashed(Some("Profile 1")), sizes_b.hashed(Some("Profile 1")));
}

#[test]
fn test_hashed_none_uses_fixed_sentinel() {
    let pool = user_agent_pool().expect("pool");
    assert_eq!(pool.hashed(None), pool.hashed(None));
}

#[test]
fn test_hashed_always_lands_in_the_pool() {
    let pool = window_size_pool().expect("pool");
    for i in 0..500 {
        let key = format!("profile-{i}");
        let size = *pool.hashed(Some(&key));
        // Distinct keys may collide (pigeonhole); the result must still be
        // a pool member.
        assert!(
            [(1920, 1080), (1366, 768), (1536, 864), (1280, 720), (1440, 900), (1600, 900)]
                .contains(&size),
            "{size:?} is not a pool member"
        );
    }
}

#[test]
fn test_cycle_visits_every_element_once_per_cycle() {
    let mut pool =
        AttributePool::new(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]).expect("pool");

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for _ in 0..pool.len() {
        *counts.entry(*pool.next_cycled()).or_default() += 1;
    }
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|count| *count == 1));

    // Second cycle replays without losing anyone either.
    for _ in 0..pool.len() {
        *counts.entry(*pool.next_cycled()).or_default() += 1;
    }
    assert!(counts.values().all(|count| *count == 2));
}

#[test]
fn test_weighting_replicates_candidates() {
    let pool = AttributePool::new(&[("common", 3), ("rare", 1)]).expect("pool");
    assert_eq!(pool.len(), 4);
}

#[test]
fn test_empty_pool_is_rejected() {
    let empty: &[(&str, usize)] = &[];
    assert!(matches!(
        AttributePool::new(empty),
        Err(RigError::Configuration(_))
    ));
    // All-zero weights flatten to nothing as well.
    assert!(AttributePool::new(&[("a", 0)]).is_err());
}

#[test]
fn test_remove_rebuilds_and_guards_emptiness() {
    let mut pool = AttributePool::new(&[("a", 2), ("b", 1)]).expect("pool");
    pool.remove(&"a").expect("remove");
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.random(), &"b");
    assert!(pool.remove(&"b").is_err());
}

#[test]
fn test_window_size_string_canonical_form() {
    assert_eq!(window_size_string((1920, 1080)), "1920,1080");
    assert_eq!(window_size_string((1280, 720)), "1280,720");
}

#[test]
fn test_random_draws_pool_members() {
    let pool = user_agent_pool().expect("pool");
    for _ in 0..50 {
        assert!(pool.random().contains("Mozilla/5.0"));
    }
}
