//! The balance score.
//!
//! Each node's owned space is normalised to a fraction of all owned space.
//! The score is `1 - σ / ideal`, clamped to `[0, 1]`, where `ideal = 1 / n`
//! and `σ` is the population standard deviation of the fractions around
//! `ideal`. Equal ownership scores `1.0`.

/// Score a set of per-node owned sizes.
///
/// Returns `0.0` for an empty set or when nothing is owned.
pub fn balance_score(owned: &[u128]) -> f64 {
    let total: u128 = owned.iter().sum();
    if owned.is_empty() || total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let fractions: Vec<f64> = owned.iter().map(|&o| o as f64 / total).collect();
    fraction_score(&fractions)
}

/// Score per-node fractions of owned space against the ideal `1 / n`.
///
/// Fractions are taken as given (not renormalised), so moving any single
/// fraction closer to the ideal never lowers the score.
pub fn fraction_score(fractions: &[f64]) -> f64 {
    if fractions.is_empty() {
        return 0.0;
    }
    let n = fractions.len() as f64;
    let ideal = 1.0 / n;
    let variance = fractions
        .iter()
        .map(|f| (f - ideal).powi(2))
        .sum::<f64>()
        / n;
    let score = 1.0 - variance.sqrt() / ideal;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}
