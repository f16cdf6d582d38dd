//! Deterministic node colouring.

use std::collections::BTreeMap;

/// Palette size for `node_count` nodes: 10 colours up to ten nodes, 20 beyond.
pub fn palette_len_for(node_count: usize) -> usize {
    if node_count <= 10 { 10 } else { 20 }
}

/// Map node addresses to palette indices.
///
/// Addresses are deduplicated and sorted; the `i`-th gets `i % palette_len`.
/// Gaps have no address and take no index. An empty palette maps nothing.
pub fn assign_palette<'a, I>(addresses: I, palette_len: usize) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    if palette_len == 0 {
        return BTreeMap::new();
    }
    let mut unique: Vec<&str> = addresses.into_iter().collect();
    unique.sort_unstable();
    unique.dedup();
    unique
        .into_iter()
        .enumerate()
        .map(|(i, address)| (address.to_string(), i % palette_len))
        .collect()
}
