//! Parser for `nodetool ring` text dumps.
//!
//! ```text
//! Datacenter: dc1
//! ==========
//! Address     Rack   Status State   Load        Owns     Token
//!                                                        3074457345618258602
//! 10.0.0.1    rack1  Up     Normal  1.46 TiB    33.33%   -9223372036854775808
//! 10.0.0.2    rack1  Up     Normal  1.45 TiB    33.33%   -3074457345618258603
//! 10.0.0.3    rack1  Down   Normal  ?           33.33%   3074457345618258602
//! ```
//!
//! Entry lines are split on whitespace. Load usually spans two columns
//! (`1.46 TiB`) but is a single `?` when unknown. The bare token right after
//! the header repeats the datacenter's last token and is dropped; any other
//! bare token is kept as an orphaned entry. Field validation is left to the
//! ring model.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use ringscope_types::RawTokenEntry;
use tracing::{debug, warn};

/// Datacenter used for entries that precede any `Datacenter:` header.
pub const DEFAULT_DATACENTER: &str = "default";

const KIB: f64 = 1024.0;

/// Parse a whole dump into per-datacenter raw entries.
///
/// Every `Datacenter:` section appears in the result, even when it has no
/// column header or no entries. Fails only if the text contains no `Address`
/// header at all.
pub fn parse_ring_dump(text: &str) -> Result<BTreeMap<String, Vec<RawTokenEntry>>> {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    let mut current = DEFAULT_DATACENTER.to_string();
    let mut in_table = false;
    let mut declared = false;
    let mut saw_header = false;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if let Some(name) = line.strip_prefix("Datacenter:") {
            current = name.trim().to_string();
            sections.entry(current.clone()).or_default();
            in_table = false;
            declared = true;
            continue;
        }
        if line.starts_with("Address") {
            in_table = true;
            saw_header = true;
            sections.entry(current.clone()).or_default();
            continue;
        }
        if line.is_empty() || line.starts_with('=') {
            continue;
        }
        if line.starts_with("Warning:") || line.starts_with("Note:") {
            continue;
        }
        if !in_table {
            // Preamble before any section is not ring data.
            if !declared {
                continue;
            }
            warn!(datacenter = %current, line = line_no, "entries without an `Address` header");
            in_table = true;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let section = sections.entry(current.clone()).or_default();
        match parts.as_slice() {
            [token] => section.bare.push((line_no, token.to_string())),
            _ => section.entries.push(parse_entry(line_no, &parts)),
        }
    }

    if !saw_header {
        bail!("no `Address` header found; is this `nodetool ring` output?");
    }

    let datacenters: BTreeMap<String, Vec<RawTokenEntry>> = sections
        .into_iter()
        .map(|(name, section)| {
            let entries = section.finish(&name);
            (name, entries)
        })
        .collect();
    debug!(datacenters = datacenters.len(), "parsed ring dump");
    Ok(datacenters)
}

#[derive(Default)]
struct Section {
    entries: Vec<RawTokenEntry>,
    bare: Vec<(usize, String)>,
}

impl Section {
    /// Resolve bare tokens: echoes of an owned token are dropped, the rest
    /// become orphaned entries.
    fn finish(mut self, datacenter: &str) -> Vec<RawTokenEntry> {
        for (line, token) in self.bare {
            let echoed = self.entries.iter().any(|e| !e.orphaned && e.token == token);
            if echoed {
                debug!(datacenter, line, %token, "dropped echoed token line");
                continue;
            }
            self.entries.push(RawTokenEntry::orphan(line, token));
        }
        self.entries
    }
}

/// Build an entry from an owned-token line.
///
/// Eight or more columns: two-column load. Seven: single-column load. Fewer
/// columns keep only the address and the last column as the token.
fn parse_entry(line: usize, parts: &[&str]) -> RawTokenEntry {
    let mut entry = RawTokenEntry {
        line,
        address: Some(parts[0].to_string()),
        ..RawTokenEntry::default()
    };
    match parts.len() {
        n if n >= 8 => {
            fill_flags(&mut entry, parts);
            entry.load_bytes = parse_load(&format!("{} {}", parts[4], parts[5]));
            entry.owns = Some(parts[6].to_string());
            entry.token = parts[7].to_string();
        }
        7 => {
            fill_flags(&mut entry, parts);
            entry.load_bytes = parse_load(parts[4]);
            entry.owns = Some(parts[5].to_string());
            entry.token = parts[6].to_string();
        }
        _ => {
            warn!(line, columns = parts.len(), "short ring line, keeping address and token only");
            entry.token = parts[parts.len() - 1].to_string();
        }
    }
    entry
}

fn fill_flags(entry: &mut RawTokenEntry, parts: &[&str]) {
    entry.rack = Some(parts[1].to_string());
    entry.status = Some(parts[2].to_string());
    entry.state = Some(parts[3].to_string());
}

/// Convert a load string such as `1.46 TiB`, `512KB`, or `12 bytes` to bytes.
///
/// Units are binary; `KB` and `KiB` both mean 1024. Returns `None` for `?`,
/// negative, or unparseable values.
pub fn parse_load(s: &str) -> Option<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().ok()?;
    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" | "BYTES" => 1.0,
        "KB" | "KIB" => KIB,
        "MB" | "MIB" => KIB.powi(2),
        "GB" | "GIB" => KIB.powi(3),
        "TB" | "TIB" => KIB.powi(4),
        _ => return None,
    };
    let bytes = value * multiplier;
    if !bytes.is_finite() || bytes < 0.0 || bytes > u64::MAX as f64 {
        return None;
    }
    Some(bytes.round() as u64)
}
