//! Constellation figure lines resolved from catalog links.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::CatalogStar;

/// An undirected figure line between two runtime stars, stored as `(min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Connection {
    a: usize,
    b: usize,
}

impl Connection {
    /// Canonical edge between `i` and `j`. Returns `None` for a self-loop.
    pub fn new(i: usize, j: usize) -> Option<Self> {
        match i.cmp(&j) {
            std::cmp::Ordering::Less => Some(Self { a: i, b: j }),
            std::cmp::Ordering::Greater => Some(Self { a: j, b: i }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Lower endpoint index.
    pub fn a(&self) -> usize {
        self.a
    }

    /// Higher endpoint index.
    pub fn b(&self) -> usize {
        self.b
    }
}

/// Names of catalog stars that are an endpoint of at least one resolvable link.
pub fn linked_names(catalog: &'static [CatalogStar]) -> FxHashSet<&'static str> {
    let known: FxHashSet<&'static str> = catalog.iter().map(|s| s.name).collect();
    let mut linked = FxHashSet::default();
    for star in catalog {
        for &other in star.links {
            if other != star.name && known.contains(other) {
                linked.insert(star.name);
                linked.insert(other);
            }
        }
    }
    linked
}

/// Resolve catalog links into a deduplicated edge list.
///
/// `index_by_name` maps catalog names to runtime star indices. Links naming an
/// unknown star are skipped. `A -> B` and `B -> A` collapse to one edge; the
/// output keeps first-seen order.
pub fn build_connections(
    catalog: &[CatalogStar],
    index_by_name: &FxHashMap<&'static str, usize>,
) -> Vec<Connection> {
    let mut seen = FxHashSet::default();
    let mut edges = Vec::new();

    for star in catalog {
        let Some(&from) = index_by_name.get(star.name) else {
            continue;
        };
        for &name in star.links {
            let Some(&to) = index_by_name.get(name) else {
                log::debug!("Skipping link {} -> {}: unknown star", star.name, name);
                continue;
            };
            if let Some(edge) = Connection::new(from, to)
                && seen.insert(edge)
            {
                edges.push(edge);
            }
        }
    }

    edges
}
