use crate::models::{Envelope, Geometry};
use crate::spatial::intersects_envelope;
use geoscope_core::models::FeatureId;
use rstar::{RTree, RTreeObject, AABB};

/// Indexed geometry with ID
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    /// Feature the geometry belongs to
    pub id: FeatureId,

    /// The geometry itself
    pub geometry: Geometry,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexedGeometry {
    /// Create a new indexed geometry, `None` for an empty geometry
    pub fn new(id: FeatureId, geometry: Geometry) -> Option<Self> {
        let bounds = geometry.bounds()?;
        let envelope = AABB::from_corners(bounds.min(), bounds.max());
        Some(Self { id, geometry, envelope })
    }
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the features of one dataset.
///
/// Queries run in two phases: an envelope-overlap candidate lookup in the
/// tree, then the exact closed-envelope intersection test.
#[derive(Clone)]
pub struct SpatialIndex {
    tree: RTree<IndexedGeometry>,
}

impl SpatialIndex {
    /// Create a new empty spatial index
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load an index; empty geometries are skipped
    pub fn from_geometries(geometries: Vec<(FeatureId, Geometry)>) -> Self {
        let indexed: Vec<IndexedGeometry> = geometries
            .into_iter()
            .filter_map(|(id, geom)| IndexedGeometry::new(id, geom))
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Insert a geometry; returns false if it was empty and not indexed
    pub fn insert(&mut self, id: FeatureId, geometry: Geometry) -> bool {
        match IndexedGeometry::new(id, geometry) {
            Some(indexed) => {
                self.tree.insert(indexed);
                true
            }
            None => false,
        }
    }

    /// Candidates whose bounding boxes touch the envelope
    pub fn candidates(&self, envelope: &Envelope) -> Vec<&IndexedGeometry> {
        let bbox = AABB::from_corners(envelope.min(), envelope.max());
        self.tree.locate_in_envelope_intersecting(&bbox).collect()
    }

    /// IDs of every geometry intersecting the closed envelope, sorted
    pub fn query_envelope(&self, envelope: &Envelope) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self
            .candidates(envelope)
            .into_iter()
            .filter(|indexed| intersects_envelope(&indexed.geometry, envelope))
            .map(|indexed| indexed.id)
            .collect();
        ids.sort();
        ids
    }

    /// Get the total number of geometries in the index
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
