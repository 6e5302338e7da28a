//! Spatial index over one hemisphere's surface vertices and its scalar overlays.

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TractMeasuresError};
use crate::fs_curv::read_curv;
use crate::fs_surface::read_surf;

/// All vertices of one hemisphere surface plus a kd-tree over their positions and the
/// attached per-vertex curvature and thickness overlays. Built once, read-only afterwards,
/// so it can be shared across all bundles (and threads) without synchronization.
pub struct SurfaceIndex {
    positions: Vec<Point3<f32>>,
    curvature: Vec<f32>,
    thickness: Vec<f32>,
    tree: KdTree<f32, 3>,
}

impl SurfaceIndex {
    /// Build the index from vertex positions and the two overlays, which share the
    /// vertex indexing of the base geometry. Fails with `ShapeMismatch` if the overlay
    /// lengths disagree with the vertex count, and with `EmptySurface` for zero vertices.
    pub fn build(
        positions: Vec<Point3<f32>>,
        curvature: Vec<f32>,
        thickness: Vec<f32>,
    ) -> Result<SurfaceIndex> {
        if positions.is_empty() {
            return Err(TractMeasuresError::EmptySurface);
        }
        if curvature.len() != positions.len() {
            return Err(TractMeasuresError::ShapeMismatch(
                positions.len(),
                curvature.len(),
            ));
        }
        if thickness.len() != positions.len() {
            return Err(TractMeasuresError::ShapeMismatch(
                positions.len(),
                thickness.len(),
            ));
        }

        let mut tree: KdTree<f32, 3> = KdTree::with_capacity(positions.len());
        for (idx, p) in positions.iter().enumerate() {
            tree.add(&[p.x, p.y, p.z], idx as u64);
        }
        debug!(num_vertices = positions.len(), "built surface index");

        Ok(SurfaceIndex {
            positions,
            curvature,
            thickness,
            tree,
        })
    }

    /// Load one hemisphere from a FreeSurfer surf file plus its curvature and thickness
    /// overlay files and build the index over it.
    pub fn from_files<P: AsRef<Path>>(
        surf_path: P,
        curv_path: P,
        thickness_path: P,
    ) -> Result<SurfaceIndex> {
        let surf = read_surf(surf_path)?;
        let curv = read_curv(curv_path)?;
        let thickness = read_curv(thickness_path)?;
        SurfaceIndex::build(surf.vertices, curv.data, thickness.data)
    }

    /// The id of the vertex closest to `point` and its Euclidean distance, or `None` if no
    /// vertex lies within `max_radius`. Callers use a generous radius (1000 physical units),
    /// so for well-formed inputs this practically always succeeds.
    pub fn nearest_within_radius(
        &self,
        point: &Point3<f32>,
        max_radius: f32,
    ) -> Option<(usize, f32)> {
        let hit = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[point.x, point.y, point.z]);
        let dist = hit.distance.sqrt();
        if dist <= max_radius {
            Some((hit.item as usize, dist))
        } else {
            None
        }
    }

    pub fn curvature_at(&self, vertex: usize) -> f32 {
        self.curvature[vertex]
    }

    pub fn thickness_at(&self, vertex: usize) -> f32 {
        self.thickness[vertex]
    }

    pub fn position_of(&self, vertex: usize) -> &Point3<f32> {
        &self.positions[vertex]
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }
}
