//! Labeling of evaluated clusters with ground-truth cluster indices and the
//! F1 of the matched labeled clusters.

use crate::libs::contrib::{ensure_conts, Counting};
use crate::libs::fmatch::{avg_gmatches, gmatches_indexed, F1Kind, MatchKind};
use crate::libs::num;
use crate::{Cluster, Collection, MeasureError, MeasureResult, Trace};

/// Ground-truth labels of the evaluated clusters with the quality of the
/// matched pairs.
#[derive(Debug)]
pub struct Labeling {
    /// Ground-truth cluster indices assigned to each evaluated cluster, in
    /// cluster order; empty when the cluster matched nothing
    pub labels: Vec<Vec<u32>>,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Accumulated match of an evaluated cluster against one ground-truth
/// cluster, scored like the greatest-match traversal.
fn match_score(
    cl: &Cluster,
    cn: &Collection,
    gt: &Collection,
    ig: u32,
    mode: Counting,
    prob: bool,
) -> f64 {
    let mut count = 0.0f64;
    for &nid in cl.members() {
        let gcls = gt.owners(nid);
        if !gcls.contains(&ig) {
            continue;
        }
        count += match mode {
            Counting::Overlap => 1.0 / cn.owners(nid).len().max(gcls.len()) as f64,
            Counting::MultiRes => 1.0,
        };
    }
    let cap1 = mode.capacity(cl);
    let cap2 = mode.capacity(gt.cluster(ig));
    if prob {
        count * count / (cap1 * cap2)
    } else {
        2.0 * count / (cap1 + cap2)
    }
}

/// Labels each evaluated cluster of `cn` with the ground-truth clusters of
/// `gt` that selected it as their greatest match, and evaluates F1 with
/// precision and recall of the matched labeled clusters only.
pub fn label_clusters(
    gt: &mut Collection,
    cn: &mut Collection,
    kind: F1Kind,
    mkind: MatchKind,
    mode: Counting,
    trace: Trace,
) -> MeasureResult<Labeling> {
    if gt.is_empty() || cn.is_empty() {
        return Err(MeasureError::EmptyCollection(
            "both the ground truth and the evaluated collection must have nodes".to_string(),
        ));
    }
    ensure_conts(gt, cn, mode);

    let prob = kind == F1Kind::PartProb;
    let gmats = gmatches_indexed(gt, cn, mode, prob);
    let scores: Vec<f64> = gmats.iter().map(|(score, _)| *score).collect();
    let recall = avg_gmatches(gt, &scores, mkind, mode)?;

    let mut labels = vec![Vec::new(); cn.clusters_num()];
    for (ig, (_, best)) in gmats.iter().enumerate() {
        if let Some(ie) = best {
            labels[*ie as usize].push(ig as u32);
        }
    }

    // Precision over the labeled clusters only, each scored against its
    // best assigned label
    let mut acc = 0.0f64;
    let mut wsum = 0.0f64;
    let mut acc_plain = 0.0f64;
    let mut labeled = 0usize;
    for (ie, assigned) in labels.iter().enumerate() {
        if assigned.is_empty() {
            continue;
        }
        labeled += 1;
        let cl = cn.cluster(ie as u32);
        let best = assigned
            .iter()
            .map(|&ig| match_score(cl, cn, gt, ig, mode, prob))
            .fold(0.0f64, f64::max);
        let weight = mode.capacity(cl);
        acc += best * weight;
        wsum += weight;
        acc_plain += best;
    }
    if labeled == 0 {
        return Err(MeasureError::MeasureUndefined(
            "no evaluated cluster matches the ground truth".to_string(),
        ));
    }
    let precision = match mkind {
        MatchKind::Weighted => acc / wsum,
        MatchKind::Unweighted => acc_plain / labeled as f64,
        MatchKind::Combined => num::geometric_mean(acc / wsum, acc_plain / labeled as f64),
    };

    trace.stage(|| {
        format!(
            "label_clusters(), labeled {} of {} clusters, recall: {:.6}, precision: {:.6}",
            labeled,
            labels.len(),
            recall,
            precision
        )
    });

    let f1 = match kind {
        F1Kind::Average => num::arithmetic_mean(recall, precision),
        F1Kind::PartProb | F1Kind::Harmonic => num::harmonic_mean(recall, precision),
    };
    Ok(Labeling {
        labels,
        f1,
        precision,
        recall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn eval(gt: &str, cn: &str) -> Labeling {
        let mut gt: Collection = gt.parse().unwrap();
        let mut cn: Collection = cn.parse().unwrap();
        label_clusters(
            &mut gt,
            &mut cn,
            F1Kind::Harmonic,
            MatchKind::Weighted,
            Counting::MultiRes,
            Trace::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_exact_labeling() {
        let labeling = eval("1 2; 3 4; 5 6", "3 4; 5 6; 1 2");
        assert_eq!(labeling.labels, vec![vec![1], vec![2], vec![0]]);
        assert_abs_diff_eq!(labeling.f1, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(labeling.precision, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(labeling.recall, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_merged_clusters_share_label_target() {
        // Both ground-truth clusters pick the merged cluster as their best
        let labeling = eval("1 2; 3 4", "1 2 3 4");
        assert_eq!(labeling.labels, vec![vec![0, 1]]);
        assert!(labeling.f1 < 1.0);
        assert!(labeling.f1 > 0.0);
    }

    #[test]
    fn test_unmatched_cluster_unlabeled() {
        let labeling = eval("1 2; 3 4", "1 2; 3 4; 7 8");
        assert_eq!(labeling.labels[2], Vec::<u32>::new());
        assert_abs_diff_eq!(labeling.recall, 1.0, epsilon = 1e-12);
        // Precision covers the matched labeled clusters only
        assert_abs_diff_eq!(labeling.precision, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_intersection_undefined() {
        let mut gt: Collection = "1 2; 3".parse().unwrap();
        let mut cn: Collection = "7 8; 9".parse().unwrap();
        let res = label_clusters(
            &mut gt,
            &mut cn,
            F1Kind::Harmonic,
            MatchKind::Weighted,
            Counting::MultiRes,
            Trace::default(),
        );
        assert!(matches!(res, Err(MeasureError::MeasureUndefined(_))));
    }
}
