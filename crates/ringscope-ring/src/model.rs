//! Validated, sorted token entries for one datacenter.

use std::collections::BTreeSet;

use ringscope_types::{
    NodeState, NodeStatus, RawTokenEntry, SnapshotId, Token, TokenEntry,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::RingError;

/// A degraded optional field, recorded instead of failing the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingWarning {
    /// Source line of the entry.
    pub line: usize,
    /// Field that was missing or unparseable.
    pub field: String,
    /// What was substituted.
    pub message: String,
}

/// One datacenter's ring: token entries sorted ascending by token.
///
/// Built once from parsed entries and immutable afterwards. Token values are
/// unique; duplicates are rejected as [`RingError::MalformedToken`].
#[derive(Debug, Clone, PartialEq)]
pub struct RingModel {
    datacenter: String,
    entries: Vec<TokenEntry>,
    warnings: Vec<RingWarning>,
}

impl RingModel {
    /// Validate `raw` entries and build the model for `datacenter`.
    ///
    /// Address and token are required (address may be absent only on
    /// orphaned entries). Missing optional fields fall back to empty / zero /
    /// unknown and are recorded in [`RingModel::warnings`].
    pub fn build(datacenter: impl Into<String>, raw: &[RawTokenEntry]) -> Result<Self, RingError> {
        let datacenter = datacenter.into();
        if raw.is_empty() {
            return Err(RingError::EmptyRing { datacenter });
        }

        let mut warnings = Vec::new();
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            entries.push(validate_entry(&datacenter, entry, &mut warnings)?);
        }

        // Stable sort keeps source order among equal tokens, so the duplicate
        // error names the later line.
        entries.sort_by_key(|e| e.token);
        if let Some(pair) = entries.windows(2).find(|w| w[0].token == w[1].token) {
            return Err(RingError::MalformedToken {
                line: pair[1].line,
                field: "token",
                value: pair[1].token.to_string(),
                reason: format!("duplicate token (already on line {})", pair[0].line),
            });
        }

        if !warnings.is_empty() {
            warn!(
                %datacenter,
                count = warnings.len(),
                "ring entries had missing optional fields; defaults substituted"
            );
        }
        debug!(%datacenter, tokens = entries.len(), "built ring model");

        Ok(Self {
            datacenter,
            entries,
            warnings,
        })
    }

    /// Datacenter name.
    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }

    /// Entries sorted ascending by token.
    pub fn entries(&self) -> &[TokenEntry] {
        &self.entries
    }

    /// Tokens in ascending order.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.entries.iter().map(|e| e.token)
    }

    /// Number of tokens (never zero).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: an empty ring fails to build.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Warnings recorded while validating optional fields.
    pub fn warnings(&self) -> &[RingWarning] {
        &self.warnings
    }

    /// Look up the entry at exactly `token`.
    pub fn entry_at(&self, token: Token) -> Option<&TokenEntry> {
        self.entries
            .binary_search_by_key(&token, |e| e.token)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Distinct node addresses present in the ring, sorted.
    pub fn node_addresses(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.address.as_deref())
            .collect()
    }

    /// Load reported for `address`.
    ///
    /// Ring dumps repeat the node's load on every token line, so this is the
    /// largest value seen rather than a sum.
    pub fn node_load(&self, address: &str) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.address.as_deref() == Some(address))
            .map(|e| e.load_bytes)
            .max()
            .unwrap_or(0)
    }

    /// Content fingerprint over the sorted `(token, owner)` pairs.
    pub fn snapshot_id(&self) -> SnapshotId {
        let mut input = Vec::with_capacity(self.entries.len() * 24);
        input.extend_from_slice(self.datacenter.as_bytes());
        input.push(0);
        for e in &self.entries {
            input.extend_from_slice(&e.token.to_le_bytes());
            input.extend_from_slice(e.address.as_deref().unwrap_or("").as_bytes());
            input.push(0);
        }
        SnapshotId::from_data(&input)
    }
}

/// Validate one raw entry, pushing warnings for degraded optional fields.
fn validate_entry(
    datacenter: &str,
    raw: &RawTokenEntry,
    warnings: &mut Vec<RingWarning>,
) -> Result<TokenEntry, RingError> {
    let token_text = raw.token.trim();
    let token: Token = token_text.parse().map_err(|_| RingError::MalformedToken {
        line: raw.line,
        field: "token",
        value: raw.token.clone(),
        reason: "not a signed 64-bit integer".to_string(),
    })?;

    if raw.orphaned {
        return Ok(TokenEntry {
            address: None,
            rack: String::new(),
            datacenter: datacenter.to_string(),
            status: NodeStatus::Unknown,
            state: NodeState::Unknown,
            load_bytes: 0,
            owns: None,
            token,
            line: raw.line,
        });
    }

    let address = match raw.address.as_deref().map(str::trim) {
        Some(a) if !a.is_empty() => a.to_string(),
        _ => {
            return Err(RingError::MalformedToken {
                line: raw.line,
                field: "address",
                value: raw.address.clone().unwrap_or_default(),
                reason: "missing node address".to_string(),
            });
        }
    };

    let mut degrade = |field: &str, message: String| {
        debug!(line = raw.line, field, %message, "degraded optional field");
        warnings.push(RingWarning {
            line: raw.line,
            field: field.to_string(),
            message,
        });
    };

    let rack = match raw.rack.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => {
            degrade("rack", "missing rack; using empty label".to_string());
            String::new()
        }
    };

    let status = match raw.status.as_deref() {
        Some(s) => NodeStatus::from_label(s).unwrap_or_else(|| {
            degrade("status", format!("unrecognised status {s:?}; using unknown"));
            NodeStatus::Unknown
        }),
        None => {
            degrade("status", "missing status; using unknown".to_string());
            NodeStatus::Unknown
        }
    };

    let state = match raw.state.as_deref() {
        Some(s) => NodeState::from_label(s).unwrap_or_else(|| {
            degrade("state", format!("unrecognised state {s:?}; using unknown"));
            NodeState::Unknown
        }),
        None => {
            degrade("state", "missing state; using unknown".to_string());
            NodeState::Unknown
        }
    };

    let load_bytes = raw.load_bytes.unwrap_or_else(|| {
        degrade("load", "missing load; using 0 bytes".to_string());
        0
    });

    let owns = match raw.owns.as_deref() {
        Some(o) => {
            let parsed = parse_owns(o);
            if parsed.is_none() {
                degrade("owns", format!("unparseable ownership {o:?}; using unknown"));
            }
            parsed
        }
        None => {
            degrade("owns", "missing ownership; using unknown".to_string());
            None
        }
    };

    Ok(TokenEntry {
        address: Some(address),
        rack,
        datacenter: datacenter.to_string(),
        status,
        state,
        load_bytes,
        owns,
        token,
        line: raw.line,
    })
}

/// Parse an ownership column such as `33.33%`.
fn parse_owns(s: &str) -> Option<f64> {
    let value: f64 = s.trim().trim_end_matches('%').trim().parse().ok()?;
    value.is_finite().then_some(value)
}
