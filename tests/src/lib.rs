//! Shared fixtures for ringscope integration tests.
//!
//! Provides [`DumpBuilder`] for writing `nodetool ring`-style text and a few
//! token generators for building rings directly.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringscope_types::{RawTokenEntry, Token};

// =========================================================================
// Dump text
// =========================================================================

/// Builds `nodetool ring` output line by line.
#[derive(Debug, Default)]
pub struct DumpBuilder {
    text: String,
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a datacenter section: header, separator, and column header.
    pub fn datacenter(mut self, name: &str) -> Self {
        self.push(format!("Datacenter: {name}"));
        self.push("==========".to_string());
        self.push(format!(
            "{:<15} {:<7} {:<6} {:<7} {:<11} {:<8} {}",
            "Address", "Rack", "Status", "State", "Load", "Owns", "Token"
        ));
        self
    }

    /// An `Up Normal` entry.
    pub fn node(self, address: &str, load: &str, token: Token) -> Self {
        self.entry(address, "Up", load, token)
    }

    /// An entry with an explicit status.
    pub fn entry(mut self, address: &str, status: &str, load: &str, token: Token) -> Self {
        self.push(format!(
            "{address:<15} {:<7} {status:<6} {:<7} {load:<11} {:<8} {token}",
            "rack1", "Normal", "?"
        ));
        self
    }

    /// A bare token line.
    pub fn bare(mut self, token: impl std::fmt::Display) -> Self {
        self.push(format!("{:>70}", token.to_string()));
        self
    }

    /// An arbitrary line, e.g. a malformed one.
    pub fn raw(mut self, line: &str) -> Self {
        self.push(line.to_string());
        self
    }

    /// Blank separator between datacenters.
    pub fn blank(mut self) -> Self {
        self.push(String::new());
        self
    }

    pub fn build(self) -> String {
        self.text
    }

    fn push(&mut self, line: String) {
        self.text.push_str(&line);
        self.text.push('\n');
    }
}

// =========================================================================
// Token generators
// =========================================================================

/// `n` tokens splitting the ring into equal arcs, starting at the minimum.
pub fn evenly_spaced(n: usize) -> Vec<Token> {
    let step = (1i128 << 64) / n as i128;
    (0..n as i128)
        .map(|k| (i128::from(i64::MIN) + k * step) as Token)
        .collect()
}

/// `count` distinct random tokens, deterministic for a given seed.
pub fn random_tokens(count: usize, seed: u64) -> Vec<Token> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tokens = BTreeSet::new();
    while tokens.len() < count {
        tokens.insert(rng.random::<i64>());
    }
    tokens.into_iter().collect()
}

/// Assign `tokens` to `nodes` round-robin as raw entries named `10.0.0.<i>`.
pub fn round_robin(tokens: &[Token], nodes: usize) -> Vec<RawTokenEntry> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            RawTokenEntry::new(i + 1, format!("10.0.0.{}", i % nodes + 1), t).with_load(1 << 30)
        })
        .collect()
}
