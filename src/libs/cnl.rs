//! Reader of the CNL (Cluster Nodes List) text format.
//!
//! Each non-comment line is one cluster: an optional `id>` prefix followed by
//! whitespace-separated decimal node ids. A node id may carry a `:share`
//! suffix, which is parsed past and ignored. Lines starting with `#` are
//! comments; a leading comment may declare `clusters: N` and `nodes: M`
//! counts used only for container pre-sizing.

use std::io::BufRead;

use crate::{Id, MeasureError, MeasureResult};

/// Counts declared by the optional CNL header comment.
#[derive(Debug, Default, Clone)]
pub struct CnlHeader {
    pub clusters: Option<usize>,
    pub nodes: Option<usize>,
}

/// Streaming CNL reader yielding one member list per cluster line.
pub struct CnlReader {
    lines: std::io::Lines<Box<dyn BufRead>>,
    header: CnlHeader,
    pending: Option<String>,
    source: String,
    lineno: usize,
    fsize: Option<u64>,
}

impl CnlReader {
    /// Opens a CNL file, `"stdin"` for the standard input, and parses the
    /// header comment if present.
    pub fn open(infile: &str) -> MeasureResult<Self> {
        let fsize = if infile == "stdin" {
            None
        } else {
            let meta = std::fs::metadata(infile).map_err(|e| {
                std::io::Error::new(e.kind(), format!("could not open {}: {}", infile, e))
            })?;
            Some(meta.len())
        };
        Self::new(intspan::reader(infile), infile, fsize)
    }

    pub fn new(reader: Box<dyn BufRead>, source: &str, fsize: Option<u64>) -> MeasureResult<Self> {
        let mut lines = reader.lines();
        let mut lineno = 0;
        let mut header = CnlHeader::default();
        let mut pending = None;

        // The header is a special initial comment; scanning stops at the
        // first token-bearing comment or the first cluster line
        while let Some(line) = lines.next() {
            let line = line?;
            lineno += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with('#') {
                pending = Some(line);
                break;
            }
            let body = trimmed[1..].trim_start();
            if body.is_empty() || body.starts_with('#') {
                continue;
            }
            Self::parse_header_attrs(body, &mut header, source);
            break;
        }

        Ok(Self {
            lines,
            header,
            pending,
            source: source.to_string(),
            lineno,
            fsize,
        })
    }

    fn parse_header_attrs(body: &str, header: &mut CnlHeader, source: &str) {
        let mut tokens = body
            .split(|c: char| c == ' ' || c == '\t' || c == ':' || c == ',')
            .filter(|t| !t.is_empty());
        while let Some(attr) = tokens.next() {
            let value = match attr.to_ascii_lowercase().as_str() {
                "clusters" => &mut header.clusters,
                "nodes" => &mut header.nodes,
                _ => {
                    eprintln!(
                        "WARNING parse_header(), the header parsing of '{}' is omitted \
                         because of the unexpected attribute: {}",
                        source, attr
                    );
                    break;
                }
            };
            match tokens.next().map(str::parse::<usize>) {
                Some(Ok(num)) => *value = Some(num),
                _ => {
                    eprintln!(
                        "WARNING parse_header(), invalid value of the '{}' attribute in '{}'",
                        attr, source
                    );
                    break;
                }
            }
        }
        // A headline cluster count exceeding the node count is diminished
        if let (Some(clusters), Some(nodes)) = (header.clusters, header.nodes) {
            if clusters > nodes {
                eprintln!(
                    "WARNING parse_header(), clsnum ({}) typically should not exceed \
                     ndsnum ({})",
                    clusters, nodes
                );
                header.clusters = Some(nodes);
            }
        }
    }

    pub fn header(&self) -> &CnlHeader {
        &self.header
    }

    /// Size of the underlying file in bytes, `None` for the standard input.
    pub fn file_size(&self) -> Option<u64> {
        self.fsize
    }

    fn parse_cluster(&self, line: &str) -> MeasureResult<Option<Vec<Id>>> {
        let mut tokens = line.split_ascii_whitespace().peekable();
        // Skip the cluster id if present
        if let Some(first) = tokens.peek() {
            if first.ends_with('>') {
                let cid = (*first).to_string();
                tokens.next();
                // Skip empty clusters, which actually should not exist
                if tokens.peek().is_none() {
                    eprintln!(
                        "WARNING load(), empty cluster exists: '{}', skipped",
                        cid
                    );
                    return Ok(None);
                }
            }
        }

        let mut members = Vec::new();
        for token in tokens {
            // Only the node id is parsed, the share part is skipped if exists
            let idstr = token.split(':').next().unwrap_or(token);
            let nid = idstr.parse::<Id>().map_err(|_| {
                MeasureError::Format(format!(
                    "invalid node id '{}' at {}:{}",
                    token, self.source, self.lineno
                ))
            })?;
            members.push(nid);
        }
        Ok(Some(members))
    }
}

impl Iterator for CnlReader {
    type Item = MeasureResult<Vec<Id>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => match self.lines.next() {
                    Some(Ok(line)) => {
                        self.lineno += 1;
                        line
                    }
                    Some(Err(e)) => return Some(Err(e.into())),
                    None => return None,
                },
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match self.parse_cluster(trimmed) {
                Ok(Some(members)) => return Some(Ok(members)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Estimates the number of nodes from the file size counting the decimal
/// digits plus one delimiter per id of each magnitude.
pub fn estimate_nodes(filesize: u64, mut membership: f32) -> usize {
    if membership <= 0.0 {
        eprintln!(
            "WARNING estimate_nodes(), invalid membership = {} specified, reset to 1",
            membership
        );
        membership = 1.0;
    }

    let mut ndsnum = 0u64;
    if filesize != 0 {
        let mut magn = 10u64; // Decimal ids magnitude
        let mut img = 1u64; // Index of the magnitude (10^1)
        let mut reminder = filesize % magn;
        img += 1;
        ndsnum = reminder / img; // img digits + 1 delimiter for each element
        while filesize >= magn {
            magn *= 10;
            img += 1;
            ndsnum += (filesize - reminder) % magn / img;
            reminder = filesize % magn;
        }
    }
    (ndsnum as f64 / f64::from(membership)) as usize
}

/// Estimates the number of clusters from the number of nodes; usually the
/// cluster count does not exceed the square root of the node count.
pub fn estimate_clusters(ndsnum: usize, mut membership: f32) -> usize {
    if membership <= 0.0 {
        eprintln!(
            "WARNING estimate_clusters(), invalid membership = {} specified, reset to 1",
            membership
        );
        membership = 1.0;
    }

    if ndsnum != 0 {
        (ndsnum as f64 * f64::from(membership)).sqrt() as usize + 1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn reader_of(text: &str) -> CnlReader {
        let boxed: Box<dyn BufRead> = Box::new(BufReader::new(std::io::Cursor::new(
            text.as_bytes().to_vec(),
        )));
        CnlReader::new(boxed, "test.cnl", None).unwrap()
    }

    #[test]
    fn test_header_attrs() {
        let rd = reader_of("# Clusters: 2, Nodes: 5\n1 2 3\n4 5\n");
        assert_eq!(rd.header().clusters, Some(2));
        assert_eq!(rd.header().nodes, Some(5));
        let clusters: Vec<Vec<Id>> = rd.map(Result::unwrap).collect();
        assert_eq!(clusters, vec![vec![1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn test_header_order_and_case() {
        let rd = reader_of("# nodes 8 clusters 3\n1\n");
        assert_eq!(rd.header().clusters, Some(3));
        assert_eq!(rd.header().nodes, Some(8));
    }

    #[test]
    fn test_plain_comment_no_header() {
        let rd = reader_of("# generated by tool\n1 2\n3 4\n");
        assert_eq!(rd.header().clusters, None);
        assert_eq!(rd.count(), 2);
    }

    #[test]
    fn test_cluster_id_prefix_and_shares() {
        let rd = reader_of("0> 1:0.5 2:0.5\n1> 3 4\n");
        let clusters: Vec<Vec<Id>> = rd.map(Result::unwrap).collect();
        assert_eq!(clusters, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_empty_cluster_skipped() {
        let rd = reader_of("5>\n1 2\n");
        let clusters: Vec<Vec<Id>> = rd.map(Result::unwrap).collect();
        assert_eq!(clusters, vec![vec![1, 2]]);
    }

    #[test]
    fn test_malformed_id() {
        let mut rd = reader_of("1 x2 3\n");
        assert!(matches!(rd.next(), Some(Err(MeasureError::Format(_)))));
    }

    #[test]
    fn test_estimations() {
        assert_eq!(estimate_nodes(0, 1.0), 0);
        assert!(estimate_nodes(1000, 1.0) > 0);
        assert!(estimate_nodes(1000, 2.0) < estimate_nodes(1000, 1.0));
        assert_eq!(estimate_clusters(0, 1.0), 0);
        assert_eq!(estimate_clusters(100, 1.0), 11);
    }
}
