//! Weighted attribute pools for browser fingerprint fields.
//!
//! A pool flattens weighted candidates into a repeated list so that random
//! draws approximate real-world market-share distributions. Selection is
//! either uniformly random, round-robin over a pre-shuffled cycle, or
//! deterministic via a stable hash of a key (used to pin a profile to the
//! same user agent and window size across process restarts).

use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{Result, RigError};

/// Key used by [`AttributePool::hashed`] when the caller has no profile name.
const SENTINEL_KEY: &str = "_";

pub struct AttributePool<T: Clone + PartialEq> {
    data: Vec<T>,
    cycle: Vec<T>,
    cursor: usize,
}

impl<T: Clone + PartialEq> AttributePool<T> {
    /// Build a pool by replicating each candidate by its integer weight.
    ///
    /// Fails fast if the flattened pool would be empty; every selection
    /// method below relies on non-emptiness.
    pub fn new(weighted: &[(T, usize)]) -> Result<Self> {
        let mut data = Vec::new();
        for (value, weight) in weighted {
            for _ in 0..*weight {
                data.push(value.clone());
            }
        }
        Self::from_flat(data)
    }

    fn from_flat(data: Vec<T>) -> Result<Self> {
        if data.is_empty() {
            return Err(RigError::Configuration(
                "attribute pool must not be empty".to_string(),
            ));
        }
        let mut cycle = data.clone();
        cycle.shuffle(&mut rand::thread_rng());
        Ok(Self {
            data,
            cycle,
            cursor: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Uniformly random element from the flattened pool.
    pub fn random(&self) -> &T {
        let index = rand::thread_rng().gen_range(0..self.data.len());
        &self.data[index]
    }

    /// Next element from the pre-shuffled cyclic sequence.
    ///
    /// Every element is visited once before any repeats within one cycle.
    /// The cycle is shuffled only at construction, not at wrap-around, so
    /// consecutive cycles replay the same order.
    pub fn next_cycled(&mut self) -> &T {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.cycle.len();
        &self.cycle[index]
    }

    /// Deterministic selection: a stable hash of `key` reduced modulo the
    /// pool size. The same key always maps to the same element for a given
    /// pool content, independent of process or pool instance.
    pub fn hashed(&self, key: Option<&str>) -> &T {
        let key = key.unwrap_or(SENTINEL_KEY);
        let digest = Sha256::digest(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let hash = u64::from_be_bytes(prefix);
        &self.data[(hash % self.data.len() as u64) as usize]
    }

    /// Remove every occurrence of `item`, rebuilding the shuffled cycle.
    /// Fails if the removal would leave the pool empty.
    pub fn remove(&mut self, item: &T) -> Result<()> {
        let remaining: Vec<T> = self
            .data
            .iter()
            .filter(|value| *value != item)
            .cloned()
            .collect();
        *self = Self::from_flat(remaining)?;
        Ok(())
    }
}

/// Chrome user agents keyed by major version, with market-share weights.
/// The strings are the Windows variants; `os_user_agent` rewrites the
/// platform token for the host OS.
const CHROME_USER_AGENTS: &[(&str, usize)] = &[
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36",
        37,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36",
        42,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/104.0.5112.102 Safari/537.36",
        2,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/103.0.5060.53 Safari/537.36",
        2,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/101.0.4951 Safari/537.36",
        1,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896 Safari/537.36",
        1,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844 Safari/537.36",
        10,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758 Safari/537.36",
        1,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692 Safari/537.36",
        1,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664 Safari/537.36",
        1,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/95.0.4638 Safari/537.36",
        1,
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606 Safari/537.36",
        1,
    ),
];

/// Window sizes with Windows desktop market-share weights.
const WINDOW_SIZES: &[((u32, u32), usize)] = &[
    ((1920, 1080), 35),
    ((1366, 768), 26),
    ((1536, 864), 16),
    ((1280, 720), 9),
    ((1440, 900), 9),
    ((1600, 900), 5),
];

/// Rewrite the Windows platform token for the host operating system.
fn os_user_agent(windows_agent: &str) -> String {
    if cfg!(target_os = "windows") {
        windows_agent.to_string()
    } else if cfg!(target_os = "macos") {
        windows_agent.replace("Windows NT 10.0", "Macintosh; Intel Mac OS X 10_15")
    } else {
        windows_agent.replace("Windows NT 10.0", "X11; Linux x86_64")
    }
}

/// Weighted user-agent pool for the host OS.
pub fn user_agent_pool() -> Result<AttributePool<String>> {
    let weighted: Vec<(String, usize)> = CHROME_USER_AGENTS
        .iter()
        .map(|(agent, weight)| (os_user_agent(agent), *weight))
        .collect();
    AttributePool::new(&weighted)
}

/// Weighted window-size pool.
pub fn window_size_pool() -> Result<AttributePool<(u32, u32)>> {
    AttributePool::new(WINDOW_SIZES)
}

/// Canonical `"width,height"` form used by `--window-size`.
pub fn window_size_string(size: (u32, u32)) -> String {
    format!("{},{}", size.0, size.1)
}
