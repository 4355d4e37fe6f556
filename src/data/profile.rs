// ============================================================
// Layer 4 — Removal Profiling
// ============================================================
// Before an FOMC run the stripper is applied to every document
// without a guard, and the fraction of baseline text it removes
// is recorded. The guard for the real run sits a little above
// the median of those fractions, so a document whose strict
// filter removes far more than is typical falls back to the
// baseline instead of losing its content.

use std::collections::HashMap;

/// Headroom added on top of the median removal ratio
pub const GUARD_HEADROOM: f64 = 0.10;

/// Summary of removal ratios across a profiling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalProfile {
    pub documents: usize,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
}

impl RemovalProfile {
    /// `None` if there are no ratios to summarise
    pub fn from_ratios(ratios: &[f64]) -> Option<Self> {
        if ratios.is_empty() {
            return None;
        }
        let mut sorted = ratios.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let p90 = sorted[((n - 1) as f64 * 0.9) as usize];

        Some(Self {
            documents: n,
            mean,
            median,
            p90,
        })
    }
}

/// Pick the removal guard for a run.
///
/// With no ratios the `default` is returned unchanged; otherwise the
/// median plus headroom, clamped to `[min_guard, max_guard]`.
pub fn recommend_guard(ratios: &[f64], default: f64, min_guard: f64, max_guard: f64) -> f64 {
    let Some(profile) = RemovalProfile::from_ratios(ratios) else {
        tracing::warn!(
            "No removal ratios collected; using default guard {:.0}%",
            default * 100.0
        );
        return default;
    };

    tracing::info!(
        "[Profile] {} docs | mean={:.1}% median={:.1}% p90={:.1}%",
        profile.documents,
        profile.mean * 100.0,
        profile.median * 100.0,
        profile.p90 * 100.0
    );

    let guard = (profile.median + GUARD_HEADROOM).clamp(min_guard, max_guard);
    tracing::info!("[Profile] Recommended removal guard: {:.0}%", guard * 100.0);
    guard
}

/// Lines of `before` missing from `after`, in original order.
///
/// Duplicates are matched by count: if a line appears three times
/// before and once after, the last two occurrences are reported.
pub fn compute_removed_lines(before: &[String], after: &[String]) -> Vec<String> {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for line in after {
        *remaining.entry(line.as_str()).or_insert(0) += 1;
    }

    let mut removed = Vec::new();
    for line in before {
        match remaining.get_mut(line.as_str()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => removed.push(line.clone()),
        }
    }
    removed
}
