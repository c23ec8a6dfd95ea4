//! Omega Index: a pair-counting agreement index over co-membership
//! multiplicities, a fuzzy counterpart of the Adjusted Rand Index.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::libs::num;
use crate::{Collection, Id, MeasureError, MeasureResult, Trace};

/// Co-membership multiplicity of every unordered node pair sharing at least
/// one cluster.
fn pair_multiplicities(cn: &Collection) -> IndexMap<(Id, Id), u32> {
    let mut pairs: IndexMap<(Id, Id), u32> = IndexMap::new();
    for cl in cn.clusters() {
        // Duplicated members must not inflate the multiplicity
        let mut members = cl.members().to_vec();
        members.sort_unstable();
        members.dedup();
        for (a, b) in members.iter().tuple_combinations() {
            *pairs.entry((*a, *b)).or_insert(0) += 1;
        }
    }
    pairs
}

/// Histogram of the positive multiplicities: multiplicity -> pair count.
fn multiplicity_histogram(pairs: &IndexMap<(Id, Id), u32>) -> IndexMap<u32, u64> {
    let mut hist: IndexMap<u32, u64> = IndexMap::new();
    for &mult in pairs.values() {
        *hist.entry(mult).or_insert(0) += 1;
    }
    hist
}

/// Agreement weight of two multiplicities.
///
/// The standard index demands the exact match; the extended one awards the
/// ratio of the smaller to the larger multiplicity, reducing the penalty
/// for distinct node shares.
fn agreement(r1: u32, r2: u32, extended: bool) -> f64 {
    if extended {
        if r1.max(r2) == 0 {
            1.0
        } else {
            f64::from(r1.min(r2)) / f64::from(r1.max(r2))
        }
    } else if r1 == r2 {
        1.0
    } else {
        0.0
    }
}

/// Evaluates the (extended) Omega Index of two collections.
///
/// Pairs are taken over the union of the node bases; a pair covered by no
/// cluster of a collection has multiplicity 0 there.
///
/// ```
/// # use clsim::{omega, Collection, Trace};
/// let cn1: Collection = "1 2 3; 4 5".parse().unwrap();
/// let cn2: Collection = "1 2 3; 4 5".parse().unwrap();
/// let idx = omega(&cn1, &cn2, false, Trace::default()).unwrap();
/// assert!((idx - 1.0).abs() < 1e-12);
/// ```
pub fn omega(
    cn1: &Collection,
    cn2: &Collection,
    extended: bool,
    trace: Trace,
) -> MeasureResult<f64> {
    if cn1.is_empty() || cn2.is_empty() {
        return Err(MeasureError::EmptyCollection(
            "both collections must have nodes for the Omega Index".to_string(),
        ));
    }

    let mut union_nodes = cn1.nodes_num() as u64;
    for (nid, _) in cn2.nodes() {
        if !cn1.contains_node(nid) {
            union_nodes += 1;
        }
    }
    let pairs_total = union_nodes * (union_nodes - 1) / 2;
    if pairs_total == 0 {
        return Err(MeasureError::MeasureUndefined(
            "a single node yields no pairs".to_string(),
        ));
    }

    let pm1 = pair_multiplicities(cn1);
    let pm2 = pair_multiplicities(cn2);

    // Observed agreement over the pairs covered by either collection; the
    // remaining pairs agree on the multiplicity 0
    let mut covered = 0u64;
    let mut agreed = 0.0f64;
    for (pair, &r1) in &pm1 {
        let r2 = pm2.get(pair).copied().unwrap_or(0);
        covered += 1;
        agreed += agreement(r1, r2, extended);
    }
    for (pair, &r2) in &pm2 {
        if pm1.contains_key(pair) {
            continue;
        }
        covered += 1;
        agreed += agreement(0, r2, extended);
    }
    let observed = (agreed + (pairs_total - covered) as f64) / pairs_total as f64;

    // Expected agreement from the multiplicity histograms, the zero
    // multiplicity included
    let expand = |pairs: &IndexMap<(Id, Id), u32>| -> Vec<(u32, u64)> {
        let hist = multiplicity_histogram(pairs);
        let nonzero: u64 = hist.values().sum();
        let mut counts: Vec<(u32, u64)> = hist.into_iter().collect();
        counts.push((0, pairs_total - nonzero));
        counts
    };
    let hist1 = expand(&pm1);
    let hist2 = expand(&pm2);
    let ptotal = pairs_total as f64;
    let mut expected = 0.0f64;
    for &(t1, n1) in &hist1 {
        for &(t2, n2) in &hist2 {
            let weight = agreement(t1, t2, extended);
            if weight > 0.0 {
                expected += weight * (n1 as f64 / ptotal) * (n2 as f64 / ptotal);
            }
        }
    }

    trace.stage(|| {
        format!(
            "omega(), observed: {:.6}, expected: {:.6}, pairs: {}",
            observed, expected, pairs_total
        )
    });

    if num::equal(expected, 1.0, pairs_total as f32) {
        return Err(MeasureError::MeasureUndefined(
            "the expected pair agreement is 1, the index denominator vanishes".to_string(),
        ));
    }
    Ok((observed - expected) / (1.0 - expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn eval(cn1: &str, cn2: &str, extended: bool) -> MeasureResult<f64> {
        let cn1: Collection = cn1.parse().unwrap();
        let cn2: Collection = cn2.parse().unwrap();
        omega(&cn1, &cn2, extended, Trace::default())
    }

    #[test]
    fn test_identity() {
        assert_abs_diff_eq!(
            eval("1 2 3; 4 5 6", "1 2 3; 4 5 6", false).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            eval("1 2 3; 2 3 4", "1 2 3; 2 3 4", true).unwrap(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_symmetry() {
        let ab = eval("1 2 3; 3 4 5", "1 2; 3 4 5", false).unwrap();
        let ba = eval("1 2; 3 4 5", "1 2 3; 3 4 5", false).unwrap();
        assert_abs_diff_eq!(ab, ba, epsilon = 1e-12);
    }

    #[test]
    fn test_disagreement_below_identity() {
        let idx = eval("1 2 3; 4 5 6", "1 4; 2 5; 3 6", false).unwrap();
        assert!(idx < 1.0);
    }

    #[test]
    fn test_extended_softens_multiplicity_mismatch() {
        // The pair (2, 3) is covered twice on the left, once on the right:
        // a total miss for the standard index, a half match for the
        // extended one
        let std = eval("1 2 3; 2 3 4; 5 6", "1 2 3; 4 5; 6", false).unwrap();
        let ext = eval("1 2 3; 2 3 4; 5 6", "1 2 3; 4 5; 6", true).unwrap();
        assert!(ext > std);
    }

    #[test]
    fn test_single_node_undefined() {
        let res = eval("1", "1", false);
        assert!(matches!(res, Err(MeasureError::MeasureUndefined(_))));
    }

    #[test]
    fn test_multiplicity_histogram() {
        let cn: Collection = "1 2 3; 2 3 4".parse().unwrap();
        let pm = pair_multiplicities(&cn);
        assert_eq!(pm.get(&(2, 3)), Some(&2));
        assert_eq!(pm.get(&(1, 2)), Some(&1));
        let hist = multiplicity_histogram(&pm);
        assert_eq!(hist.get(&2), Some(&1));
        assert_eq!(hist.get(&1), Some(&4));
    }
}
