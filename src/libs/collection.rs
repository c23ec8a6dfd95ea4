//! Clusters, collections and the collection loader.
//!
//! A collection owns its clusters in a vector; the node-to-clusters map
//! holds `u32` indices into that vector. Both the cluster sequence and the
//! node map iterate in insertion order, which makes every downstream
//! reduction deterministic.

use indexmap::{IndexMap, IndexSet};

use crate::libs::cnl::{estimate_clusters, estimate_nodes, CnlReader};
use crate::{AggHash, Id, MeasureError, MeasureResult};

/// A labeled subset of nodes together with its accumulated member
/// contribution.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    members: Vec<Id>,
    cont: f64,
}

impl Cluster {
    fn new(members: Vec<Id>) -> Self {
        Self { members, cont: 0.0 }
    }

    pub fn members(&self) -> &[Id] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Accumulated contribution of the members: 0 before the contribution
    /// engine has run, strictly positive afterwards.
    pub fn cont(&self) -> f64 {
        self.cont
    }

    pub(crate) fn set_cont(&mut self, cont: f64) {
        self.cont = cont;
    }
}

/// Options of the collection loading.
#[derive(Debug, Clone, Copy)]
pub struct LoadOpts {
    /// Average expected membership of the nodes, > 0; used only for the
    /// container pre-sizing
    pub membership: f32,
    /// Deduplicate members within each cluster
    pub unique: bool,
    /// Minimal accepted cluster size, 0 - unbounded
    pub cmin: usize,
    /// Maximal accepted cluster size, 0 - unbounded
    pub cmax: usize,
}

impl Default for LoadOpts {
    fn default() -> Self {
        Self {
            membership: 1.0,
            unique: false,
            cmin: 0,
            cmax: 0,
        }
    }
}

/// How a supplied node base is applied on loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseMode {
    /// Discard members absent from the node base
    Sync,
    /// Collect base nodes missing from every loaded cluster into a single
    /// synthetic "noise" cluster
    Extend,
}

/// The set of node ids referenced by a collection or a standalone base file.
#[derive(Debug, Default, Clone)]
pub struct NodeBase {
    ids: IndexSet<Id>,
    hash: AggHash,
}

impl NodeBase {
    /// Collects the unique node base of a CNL file.
    pub fn load_cnl(infile: &str) -> MeasureResult<Self> {
        let reader = CnlReader::open(infile)?;
        let mut ids = IndexSet::new();
        for cluster in reader {
            for id in cluster? {
                ids.insert(id);
            }
        }
        Ok(Self::from_ids(ids))
    }

    fn from_ids(ids: IndexSet<Id>) -> Self {
        let mut hash = AggHash::new();
        for &id in &ids {
            hash.add(id);
        }
        Self { ids, hash }
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn hash(&self) -> &AggHash {
        &self.hash
    }

    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.ids.iter().copied()
    }
}

/// A set of clusters over a common node-id space.
///
/// ```
/// # use clsim::Collection;
/// let cn: Collection = "1 2 3; 3 4 5".parse().unwrap();
/// assert_eq!(cn.clusters_num(), 2);
/// assert_eq!(cn.nodes_num(), 5);
/// assert_eq!(cn.owners(3), &[0, 1]);
/// ```
#[derive(Debug, Default)]
pub struct Collection {
    clusters: Vec<Cluster>,
    ndcs: IndexMap<Id, Vec<u32>>,
    ndshash: AggHash,
    contsum: f64,
}

impl Collection {
    /// Loads a collection from a CNL file, `"stdin"` for the standard input.
    pub fn load_cnl(
        infile: &str,
        opts: &LoadOpts,
        base: Option<(&NodeBase, BaseMode)>,
    ) -> MeasureResult<Self> {
        let reader = CnlReader::open(infile)?;
        if reader.file_size() == Some(0) {
            eprintln!("WARNING load(), the file '{}' is empty, skipped", infile);
            return Ok(Self::default());
        }

        // Estimate the numbers of clusters and nodes for the preallocation
        let header = reader.header().clone();
        let mut ndsnum = header.nodes.unwrap_or(0);
        let mut clsnum = header.clusters.unwrap_or(0);
        if clsnum == 0 {
            if ndsnum == 0 {
                if let Some(fsize) = reader.file_size() {
                    ndsnum = estimate_nodes(fsize, opts.membership);
                }
            }
            clsnum = estimate_clusters(ndsnum, opts.membership);
        } else if ndsnum == 0 {
            ndsnum = (clsnum as f64 * clsnum as f64 / f64::from(opts.membership)) as usize;
        }

        Self::from_clusters_sized(reader, opts, base, clsnum, ndsnum)
    }

    /// Builds a collection from an ordered stream of clusters.
    pub fn from_clusters<I>(
        clusters: I,
        opts: &LoadOpts,
        base: Option<(&NodeBase, BaseMode)>,
    ) -> MeasureResult<Self>
    where
        I: IntoIterator<Item = MeasureResult<Vec<Id>>>,
    {
        Self::from_clusters_sized(clusters, opts, base, 0, 0)
    }

    fn from_clusters_sized<I>(
        clusters: I,
        opts: &LoadOpts,
        base: Option<(&NodeBase, BaseMode)>,
        clsnum: usize,
        ndsnum: usize,
    ) -> MeasureResult<Self>
    where
        I: IntoIterator<Item = MeasureResult<Vec<Id>>>,
    {
        let mut cn = Self {
            clusters: Vec::with_capacity(clsnum),
            ndcs: IndexMap::with_capacity(ndsnum),
            ..Default::default()
        };

        for raw in clusters {
            let mut members = raw?;
            if let Some((nb, BaseMode::Sync)) = base {
                members.retain(|id| nb.contains(*id));
            }
            if opts.unique {
                let orig = members.len();
                members.sort_unstable();
                members.dedup();
                if members.len() < orig {
                    eprintln!(
                        "WARNING load(), cluster #{} contained {} duplicated members, corrected",
                        cn.clusters.len(),
                        orig - members.len()
                    );
                }
            }
            if members.is_empty() {
                continue;
            }
            if (opts.cmin > 0 && members.len() < opts.cmin)
                || (opts.cmax > 0 && members.len() > opts.cmax)
            {
                continue;
            }
            cn.push_cluster(members);
        }

        if let Some((nb, BaseMode::Extend)) = base {
            let missing: Vec<Id> = nb.iter().filter(|id| !cn.ndcs.contains_key(id)).collect();
            if !missing.is_empty() {
                cn.push_cluster(missing);
            }
        }

        let mut hash = AggHash::new();
        for &id in cn.ndcs.keys() {
            hash.add(id);
        }
        cn.ndshash = hash;

        Ok(cn)
    }

    fn push_cluster(&mut self, members: Vec<Id>) {
        let ci = self.clusters.len() as u32;
        for &id in &members {
            self.ndcs.entry(id).or_default().push(ci);
        }
        self.clusters.push(Cluster::new(members));
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, ci: u32) -> &Cluster {
        &self.clusters[ci as usize]
    }

    pub fn clusters_num(&self) -> usize {
        self.clusters.len()
    }

    pub fn nodes_num(&self) -> usize {
        self.ndcs.len()
    }

    /// A collection is non-empty iff it has at least one node.
    pub fn is_empty(&self) -> bool {
        self.ndcs.is_empty()
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.ndcs.contains_key(&id)
    }

    /// Indices of the clusters owning the node, empty when the node is
    /// absent. An entry is repeated per duplicated member occurrence unless
    /// uniqueness was enforced on loading.
    pub fn owners(&self, id: Id) -> &[u32] {
        self.ndcs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates `(node, owner cluster indices)` in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (Id, &[u32])> {
        self.ndcs.iter().map(|(id, cls)| (*id, cls.as_slice()))
    }

    /// Fingerprint of the unique node base.
    pub fn ndshash(&self) -> &AggHash {
        &self.ndshash
    }

    /// Total contribution over the clusters, 0 until evaluated.
    pub fn contsum(&self) -> f64 {
        self.contsum
    }

    /// The node base of this collection, for synchronizing another one.
    pub fn node_base(&self) -> NodeBase {
        NodeBase {
            ids: self.ndcs.keys().copied().collect(),
            hash: self.ndshash.clone(),
        }
    }

    pub(crate) fn clear_conts(&mut self) {
        if self.contsum == 0.0 {
            return;
        }
        for cl in &mut self.clusters {
            cl.set_cont(0.0);
        }
        self.contsum = 0.0;
    }

    pub(crate) fn apply_conts(&mut self, conts: &[f64]) {
        debug_assert_eq!(conts.len(), self.clusters.len());
        let mut sum = 0.0;
        for (cl, &cont) in self.clusters.iter_mut().zip(conts) {
            debug_assert!(cont > 0.0, "apply_conts(), positive contribution expected");
            cl.set_cont(cont);
            sum += cont;
        }
        self.contsum = sum;
    }
}

impl std::str::FromStr for Collection {
    type Err = MeasureError;

    /// Parses clusters from a `;`-separated list of whitespace-separated
    /// node ids, e.g. `"1 2 3; 3 4 5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clusters = s.split(';').filter(|part| !part.trim().is_empty()).map(|part| {
            part.split_ascii_whitespace()
                .map(|tok| {
                    tok.parse::<Id>()
                        .map_err(|e| MeasureError::Format(format!("invalid node id '{}': {}", tok, e)))
                })
                .collect::<MeasureResult<Vec<Id>>>()
        });
        Self::from_clusters(clusters, &LoadOpts::default(), None)
    }
}
