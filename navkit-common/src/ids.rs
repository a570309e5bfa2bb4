//! Stable pool indices used instead of the source's raw back-pointers.
//!
//! See the "Ownership / cycles" design note: the graph owns dense vectors of
//! nodes and edges; `NodeId`/`EdgeId` are indices into those vectors, not
//! pointers, so the graph and anything that borrows from it (the matcher's
//! precomputed `route_edges`) can be cloned and snapshotted trivially.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
