//! Normalized Mutual Information over the cluster co-occurrence matrix.

use crate::libs::contrib::{eval_contribs, Counting};
use crate::libs::num::{self, LogBase};
use crate::{Collection, MeasureError, MeasureResult, Trace};

/// Raw mutual information with the entropies of both collections.
#[derive(Debug, Clone, Copy)]
pub struct RawNmi {
    pub mi: f64,
    pub h1: f64,
    pub h2: f64,
}

impl RawNmi {
    /// I / max(H1, H2), the most conservative normalization.
    pub fn max_norm(&self) -> f64 {
        self.mi / self.h1.max(self.h2)
    }

    /// I / sqrt(H1 * H2)
    pub fn sqrt_norm(&self) -> f64 {
        self.mi / num::geometric_mean(self.h1, self.h2)
    }

    /// 2 I / (H1 + H2)
    pub fn avg_norm(&self) -> f64 {
        2.0 * self.mi / (self.h1 + self.h2)
    }

    /// I / min(H1, H2)
    pub fn min_norm(&self) -> f64 {
        self.mi / self.h1.min(self.h2)
    }
}

/// Evaluates the mutual information of two collections and their entropies,
/// considering overlaps, multiple resolutions and possibly unequal node
/// bases.
///
/// The joint distribution is the co-occurrence matrix normalized by its
/// total mass; the entropies of the collections are taken over the full
/// per-side contributions, which coincide with the matrix marginals when
/// the node bases agree.
///
/// Fails with [`MeasureError::MeasureUndefined`] when the mutual information
/// does not exceed the precision limit, e.g. when one collection consists
/// of a single cluster; returning 0 instead would be indistinguishable from
/// "completely dissimilar".
pub fn nmi(
    cn1: &mut Collection,
    cn2: &mut Collection,
    mode: Counting,
    base: LogBase,
    trace: Trace,
) -> MeasureResult<RawNmi> {
    if cn1.is_empty() || cn2.is_empty() {
        return Err(MeasureError::EmptyCollection(
            "both collections must have nodes for NMI".to_string(),
        ));
    }

    let cooc = eval_contribs(cn1, cn2, mode, trace);
    if cooc.matrix.is_empty() {
        eprintln!(
            "WARNING nmi(), the collection nodes have no intersection, \
             the collections are totally different"
        );
        return Err(MeasureError::MeasureUndefined(
            "the node bases do not intersect".to_string(),
        ));
    }

    // Information content of a value within a capacity; the zero terms of
    // the entropy sums are skipped by construction, every stored matrix
    // entry and every evaluated contribution is positive
    let infocont = |val: f64, capacity: f64| -> f64 {
        let prob = val / capacity;
        prob * base.log(prob)
    };

    // Marginal masses of the joint distribution
    let mut rsums = vec![0.0f64; cn1.clusters_num()];
    let mut csums = vec![0.0f64; cn2.clusters_num()];
    let mut h12 = 0.0;
    for (i, row) in cooc.matrix.rows() {
        for item in row {
            rsums[i as usize] += item.val;
            csums[item.col as usize] += item.val;
            h12 -= infocont(item.val, cooc.total);
        }
    }

    let mut hr = 0.0;
    for &rsum in &rsums {
        if rsum > 0.0 {
            hr -= infocont(rsum, cooc.total);
        }
    }
    let mut hc = 0.0;
    for &csum in &csums {
        if csum > 0.0 {
            hc -= infocont(csum, cooc.total);
        }
    }
    let mi = hr + hc - h12;

    // Entropies over the full per-side contributions; with equal node bases
    // they equal the marginal entropies above
    let mut h1 = 0.0;
    for cl in cn1.clusters() {
        if cl.cont() > 0.0 {
            h1 -= infocont(cl.cont(), cn1.contsum());
        }
    }
    let mut h2 = 0.0;
    for cl in cn2.clusters() {
        if cl.cont() > 0.0 {
            h2 -= infocont(cl.cont(), cn2.contsum());
        }
    }

    trace.stage(|| {
        format!(
            "nmi(), mi: {:.6} (h12: {:.6}), h1: {:.6}, h2: {:.6}",
            mi, h12, h1, h2
        )
    });

    if mi <= num::precision_limit::<f64>() {
        return Err(MeasureError::MeasureUndefined(
            "the mutual information is 0, which says nothing about the similarity \
             (e.g. one of the collections is a single cluster)"
                .to_string(),
        ));
    }

    Ok(RawNmi { mi, h1, h2 })
}
