//! The contribution engine: assigns each node a unit of evidence,
//! distributes it among the owning clusters of both collections and builds
//! the sparse cluster co-occurrence matrix.

use crate::{Cluster, Collection, SparseMatrix, Trace};

/// Counting semantics of the shared members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Counting {
    /// Integer evidence: a node exists independently at each resolution, so
    /// every owning cluster receives a full count
    #[default]
    MultiRes,
    /// Fractional evidence: the unit mass of a node is split equally among
    /// its owning clusters, keeping the total mass per node equal to 1 on
    /// each side
    Overlap,
}

impl Counting {
    pub fn is_overlap(self) -> bool {
        self == Counting::Overlap
    }

    /// Contribution of a member to a single owner among `owners`.
    pub fn member_share(self, owners: usize) -> f64 {
        match self {
            Counting::MultiRes => 1.0,
            Counting::Overlap => 1.0 / owners as f64,
        }
    }

    /// Capacity of a cluster under this counting: the member count for
    /// multi-resolution, the accumulated contribution for overlaps.
    pub fn capacity(self, cl: &Cluster) -> f64 {
        match self {
            Counting::MultiRes => cl.len() as f64,
            Counting::Overlap => cl.cont(),
        }
    }
}

/// The co-occurrence matrix of two collections with its total mass.
///
/// Rows are indexed by the clusters of the first collection, columns by the
/// clusters of the second one; every stored value is strictly positive.
#[derive(Debug)]
pub struct Cooccurrences {
    pub matrix: SparseMatrix<f64>,
    pub total: f64,
}

/// Evaluates the per-cluster contributions of both collections and the
/// co-occurrence matrix between them.
///
/// Any previously evaluated contributions are reset first. Nodes present on
/// one side only contribute to that side's clusters and never reach the
/// matrix.
pub fn eval_contribs(
    cn1: &mut Collection,
    cn2: &mut Collection,
    mode: Counting,
    trace: Trace,
) -> Cooccurrences {
    cn1.clear_conts();
    cn2.clear_conts();

    let mut matrix = SparseMatrix::with_rows(cn1.clusters_num());
    let mut total = 0.0f64;
    let mut conts1 = vec![0.0f64; cn1.clusters_num()];
    let mut conts2 = vec![0.0f64; cn2.clusters_num()];

    for (nid, cls1) in cn1.nodes() {
        let share1 = mode.member_share(cls1.len());
        let cls2 = cn2.owners(nid);
        match mode {
            Counting::Overlap => {
                for &ci in cls1 {
                    conts1[ci as usize] += share1;
                }
                if !cls2.is_empty() {
                    let share2 = mode.member_share(cls2.len());
                    for &cj in cls2 {
                        conts2[cj as usize] += share2;
                    }
                    // The 1/k mass of the member is split across the
                    // matching clusters of the other side
                    let share = share1 * share2;
                    for &ci in cls1 {
                        for &cj in cls2 {
                            *matrix.get_or_insert(ci, cj) += share;
                            total += share;
                        }
                    }
                }
            }
            Counting::MultiRes => {
                if cls2.is_empty() {
                    for &ci in cls1 {
                        conts1[ci as usize] += 1.0;
                    }
                } else {
                    for &ci in cls1 {
                        for &cj in cls2 {
                            *matrix.get_or_insert(ci, cj) += 1.0;
                            conts1[ci as usize] += 1.0;
                            conts2[cj as usize] += 1.0;
                            total += 1.0;
                        }
                    }
                }
            }
        }
    }

    // Contributions of the nodes missed in the first collection
    if cn1.ndshash() != cn2.ndshash() || cn1.nodes_num() != cn2.nodes_num() {
        for (nid, cls2) in cn2.nodes() {
            if cn1.contains_node(nid) {
                continue;
            }
            let share = mode.member_share(cls2.len());
            for &cj in cls2 {
                conts2[cj as usize] += share;
            }
        }
    }

    cn1.apply_conts(&conts1);
    cn2.apply_conts(&conts2);

    trace.stage(|| {
        format!(
            "eval_contribs(), contsum1: {:.6}, contsum2: {:.6}, matrix mass: {:.6}",
            cn1.contsum(),
            cn2.contsum(),
            total
        )
    });

    #[cfg(debug_assertions)]
    {
        for (_, row) in matrix.rows() {
            for item in row {
                debug_assert!(item.val > 0.0, "eval_contribs(), positive entries expected");
            }
        }
    }

    Cooccurrences { matrix, total }
}

/// Evaluates the per-side member contributions when the matrix is not
/// needed, skipping the work when both collections already carry them.
///
/// Only the overlap counting stores contributions here; multi-resolution
/// matching capacities are plain member counts.
pub fn ensure_conts(cn1: &mut Collection, cn2: &mut Collection, mode: Counting) {
    if !mode.is_overlap() {
        return;
    }
    if cn1.contsum() > 0.0 && cn2.contsum() > 0.0 {
        return;
    }
    init_conts(cn1, mode);
    init_conts(cn2, mode);
}

fn init_conts(cn: &mut Collection, mode: Counting) {
    let mut conts = vec![0.0f64; cn.clusters_num()];
    for (_, cls) in cn.nodes() {
        let share = mode.member_share(cls.len());
        for &ci in cls {
            conts[ci as usize] += share;
        }
    }
    cn.apply_conts(&conts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Collection;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_overlap_conts_sum_to_node_count() {
        // Nodes 2 and 3 belong to two clusters each
        let mut cn1: Collection = "1 2 3; 2 3 4".parse().unwrap();
        let mut cn2: Collection = "1 2 3; 2 3 4".parse().unwrap();
        eval_contribs(&mut cn1, &mut cn2, Counting::Overlap, Trace::default());

        assert_abs_diff_eq!(cn1.cluster(0).cont(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cn1.cluster(1).cont(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cn1.contsum(), cn1.nodes_num() as f64, epsilon = 1e-12);
        assert_abs_diff_eq!(cn2.contsum(), cn2.nodes_num() as f64, epsilon = 1e-12);
    }

    #[test]
    fn test_multires_matrix_mass() {
        let mut cn1: Collection = "1 2 3; 3 4 5".parse().unwrap();
        let mut cn2: Collection = "1 2 3 4 5".parse().unwrap();
        let cooc = eval_contribs(&mut cn1, &mut cn2, Counting::MultiRes, Trace::default());

        // Node 3 co-occurs from both rows
        assert_eq!(cooc.matrix.get(0, 0), Some(3.0));
        assert_eq!(cooc.matrix.get(1, 0), Some(3.0));
        assert_abs_diff_eq!(cooc.total, 6.0, epsilon = 1e-12);
        // The matrix mass matches the contribution sums of both sides
        assert_abs_diff_eq!(cn1.contsum(), cooc.total, epsilon = 1e-12);
        assert_abs_diff_eq!(cn2.contsum(), cooc.total, epsilon = 1e-12);
    }

    #[test]
    fn test_row_sums_bounded_by_conts() {
        let mut cn1: Collection = "1 2; 3 4".parse().unwrap();
        let mut cn2: Collection = "1 2; 3 4; 5 6".parse().unwrap();
        let cooc = eval_contribs(&mut cn1, &mut cn2, Counting::MultiRes, Trace::default());

        for (i, row) in cooc.matrix.rows() {
            let rsum: f64 = row.iter().map(|item| item.val).sum();
            assert!(rsum <= cn1.cluster(i).cont() + 1e-12);
        }
        // Nodes 5 and 6 exist on the second side only
        assert_abs_diff_eq!(cn2.cluster(2).cont(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cn2.contsum(), cooc.total + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_between_evaluations() {
        let mut cn1: Collection = "1 2; 3 4".parse().unwrap();
        let mut cn2: Collection = "1 3; 2 4".parse().unwrap();
        eval_contribs(&mut cn1, &mut cn2, Counting::MultiRes, Trace::default());
        let first = cn1.contsum();
        eval_contribs(&mut cn1, &mut cn2, Counting::MultiRes, Trace::default());
        assert_abs_diff_eq!(cn1.contsum(), first, epsilon = 1e-12);
    }

    #[test]
    fn test_ensure_conts_idempotent() {
        let mut cn1: Collection = "1 2 3; 2 3 4".parse().unwrap();
        let mut cn2: Collection = "1 2; 3 4".parse().unwrap();
        ensure_conts(&mut cn1, &mut cn2, Counting::Overlap);
        let cont = cn1.cluster(0).cont();
        // A repeated call must not double the contributions
        ensure_conts(&mut cn1, &mut cn2, Counting::Overlap);
        assert_abs_diff_eq!(cn1.cluster(0).cont(), cont, epsilon = 1e-12);
    }
}
