//! The greatest-match engine and the F1 aggregation over its results.
//!
//! For every cluster of one collection the engine finds the best-scoring
//! cluster of the other collection among those sharing at least one member,
//! then the per-cluster best scores are averaged and combined symmetrically.

use crate::libs::contrib::{ensure_conts, Counting};
use crate::libs::num;
use crate::{Collection, MeasureError, MeasureResult, Trace};

/// Variant of the F1 measure of the greatest matches.
///
/// The variants are ordered: F1p <= F1h <= F1s on the same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum F1Kind {
    /// F1p: harmonic mean of the average greatest partial probabilities,
    /// the most discriminative variant
    PartProb,
    /// F1h: harmonic mean of the average greatest F1s
    Harmonic,
    /// F1s: arithmetic mean of the average greatest F1s
    Average,
}

impl F1Kind {
    /// Single-letter suffix of the reported measure name.
    pub fn suffix(self) -> char {
        match self {
            F1Kind::PartProb => 'p',
            F1Kind::Harmonic => 'h',
            F1Kind::Average => 's',
        }
    }
}

/// Averaging policy of the per-cluster greatest matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Average weighted by the cluster capacities (macro weighting)
    Weighted,
    /// Plain average, each cluster counted equally (micro weighting)
    Unweighted,
    /// Geometric mean of the weighted and unweighted averages
    Combined,
}

impl MatchKind {
    pub fn suffix(self) -> char {
        match self {
            MatchKind::Weighted => 'w',
            MatchKind::Unweighted => 'u',
            MatchKind::Combined => 'c',
        }
    }
}

/// Symmetric F1 of the greatest matches with its directed components.
#[derive(Debug, Clone, Copy)]
pub struct F1Result {
    pub value: f64,
    /// Average greatest match of the first collection against the second
    pub recall: f64,
    /// Average greatest match of the second collection against the first
    pub precision: f64,
}

/// Transient per-cluster match counter: the accumulated overlap with the
/// cluster currently being matched, reset implicitly when the origin changes.
#[derive(Debug, Clone, Copy)]
struct MatchCounter {
    origin: u32,
    count: f64,
}

fn ensure_nonempty(cn: &Collection, name: &str) -> MeasureResult<()> {
    if cn.is_empty() {
        return Err(MeasureError::EmptyCollection(format!(
            "the {} collection has no nodes",
            name
        )));
    }
    Ok(())
}

/// Greatest match (max F1 or partial probability) for each cluster of `cn`
/// against the clusters of `other`, in cluster order.
pub fn gmatches(cn: &Collection, other: &Collection, mode: Counting, prob: bool) -> Vec<f64> {
    gmatches_indexed(cn, other, mode, prob)
        .into_iter()
        .map(|(score, _)| score)
        .collect()
}

/// Greatest matches together with the index of the best-matching cluster,
/// `None` when no cluster of `other` shares a member.
pub fn gmatches_indexed(
    cn: &Collection,
    other: &Collection,
    mode: Counting,
    prob: bool,
) -> Vec<(f64, Option<u32>)> {
    let mut counters = vec![
        MatchCounter {
            origin: u32::MAX,
            count: 0.0,
        };
        other.clusters_num()
    ];
    let mut gmats = Vec::with_capacity(cn.clusters_num());

    for (ci, cl) in cn.clusters().iter().enumerate() {
        let ci = ci as u32;
        let cap1 = mode.capacity(cl);
        let mut best = 0.0f64;
        let mut best_at = None;
        for &nid in cl.members() {
            let mcls = other.owners(nid);
            if mcls.is_empty() {
                // Unequal node base, the member is missed on the other side
                continue;
            }
            // In case of overlaps a shared member contributes the smallest
            // share, the one of the largest number of owners
            let share = match mode {
                Counting::Overlap => 1.0 / cn.owners(nid).len().max(mcls.len()) as f64,
                Counting::MultiRes => 1.0,
            };
            for &cj in mcls {
                let counter = &mut counters[cj as usize];
                if counter.origin != ci {
                    counter.origin = ci;
                    counter.count = 0.0;
                }
                counter.count += share;

                let cap2 = mode.capacity(other.cluster(cj));
                let score = if prob {
                    counter.count * counter.count / (cap1 * cap2)
                } else {
                    2.0 * counter.count / (cap1 + cap2)
                };
                // The score grows monotonically with the counter, so the
                // running max over the traversal is the greatest match;
                // strict < keeps the first-seen maximum
                if best < score {
                    best = score;
                    best_at = Some(cj);
                }
            }
        }
        gmats.push((best, best_at));
    }

    gmats
}

/// Averages the greatest matches of `cn` under the given policy.
pub fn avg_gmatches(
    cn: &Collection,
    gmats: &[f64],
    mkind: MatchKind,
    mode: Counting,
) -> MeasureResult<f64> {
    debug_assert_eq!(
        gmats.len(),
        cn.clusters_num(),
        "avg_gmatches(), matches are not synchronized with the clusters"
    );

    let unweighted = || gmats.iter().sum::<f64>() / gmats.len() as f64;
    let weighted = || {
        let mut acc = 0.0;
        let mut wsum = 0.0;
        for (cl, gm) in cn.clusters().iter().zip(gmats) {
            let w = mode.capacity(cl);
            acc += gm * w;
            wsum += w;
        }
        acc / wsum
    };

    let avg = match mkind {
        MatchKind::Weighted => weighted(),
        MatchKind::Unweighted => unweighted(),
        MatchKind::Combined => num::geometric_mean(weighted(), unweighted()),
    };
    if num::less(1.0, avg, gmats.len() as f32) {
        return Err(MeasureError::Overflow(format!(
            "average of the greatest matches exceeds 1: {}",
            avg
        )));
    }
    Ok(avg)
}

/// Mean F1 of the greatest matches of two collections, symmetric.
///
/// `recall` and `precision` of the result are the directed averages of the
/// first and the second collection respectively.
///
/// ```
/// # use clsim::{f1, Collection, Counting, F1Kind, MatchKind, Trace};
/// let mut cn1: Collection = "1 2 3".parse().unwrap();
/// let mut cn2: Collection = "1; 2; 3".parse().unwrap();
/// let res = f1(
///     &mut cn1,
///     &mut cn2,
///     F1Kind::Harmonic,
///     MatchKind::Weighted,
///     Counting::MultiRes,
///     Trace::default(),
/// )
/// .unwrap();
/// assert!((res.value - 0.5).abs() < 1e-12);
/// ```
pub fn f1(
    cn1: &mut Collection,
    cn2: &mut Collection,
    kind: F1Kind,
    mkind: MatchKind,
    mode: Counting,
    trace: Trace,
) -> MeasureResult<F1Result> {
    ensure_nonempty(cn1, "first")?;
    ensure_nonempty(cn2, "second")?;
    ensure_conts(cn1, cn2, mode);

    let prob = kind == F1Kind::PartProb;
    let g1 = avg_gmatches(cn1, &gmatches(cn1, cn2, mode, prob), mkind, mode)?;
    let g2 = avg_gmatches(cn2, &gmatches(cn2, cn1, mode, prob), mkind, mode)?;
    trace.stage(|| format!("f1(), g1: {:.6}, g2: {:.6}", g1, g2));

    let value = match kind {
        F1Kind::Average => num::arithmetic_mean(g1, g2),
        F1Kind::PartProb | F1Kind::Harmonic => num::harmonic_mean(g1, g2),
    };
    Ok(F1Result {
        value,
        recall: g1,
        precision: g2,
    })
}
