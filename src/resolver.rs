//! Hemisphere disambiguation for streamline endpoints.

use nalgebra::Point3;

use crate::surface_index::SurfaceIndex;

/// Default nearest-vertex search radius in physical units. Generous on purpose: for
/// well-formed inputs every endpoint lies well within this distance of the cortex.
pub const DEFAULT_SEARCH_RADIUS: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    Left,
    Right,
}

/// A resolved endpoint: the winning hemisphere, the matched vertex id on that
/// hemisphere's surface, and the Euclidean distance to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointMatch {
    pub hemisphere: Hemisphere,
    pub vertex: usize,
    pub distance: f32,
}

/// Disambiguates which hemisphere a query point belongs to by querying both
/// hemisphere indices and keeping the closer match.
pub struct EndpointResolver {
    left: SurfaceIndex,
    right: SurfaceIndex,
    search_radius: f32,
}

impl EndpointResolver {
    pub fn new(left: SurfaceIndex, right: SurfaceIndex) -> EndpointResolver {
        EndpointResolver {
            left,
            right,
            search_radius: DEFAULT_SEARCH_RADIUS,
        }
    }

    pub fn with_search_radius(mut self, search_radius: f32) -> EndpointResolver {
        self.search_radius = search_radius;
        self
    }

    /// Resolve one query point against both hemispheres. The strictly smaller distance
    /// wins; an exact tie goes to Left, deterministically. Returns `None` only if
    /// neither hemisphere has a vertex within the search radius.
    pub fn resolve(&self, point: &Point3<f32>) -> Option<EndpointMatch> {
        let left = self.left.nearest_within_radius(point, self.search_radius);
        let right = self.right.nearest_within_radius(point, self.search_radius);

        match (left, right) {
            (None, None) => None,
            (Some((vertex, distance)), None) => Some(EndpointMatch {
                hemisphere: Hemisphere::Left,
                vertex,
                distance,
            }),
            (None, Some((vertex, distance))) => Some(EndpointMatch {
                hemisphere: Hemisphere::Right,
                vertex,
                distance,
            }),
            (Some((l_vertex, l_dist)), Some((r_vertex, r_dist))) => {
                if r_dist < l_dist {
                    Some(EndpointMatch {
                        hemisphere: Hemisphere::Right,
                        vertex: r_vertex,
                        distance: r_dist,
                    })
                } else {
                    Some(EndpointMatch {
                        hemisphere: Hemisphere::Left,
                        vertex: l_vertex,
                        distance: l_dist,
                    })
                }
            }
        }
    }

    /// The surface index of the given hemisphere, for overlay lookups on a match.
    pub fn index(&self, hemisphere: Hemisphere) -> &SurfaceIndex {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn resolver() -> EndpointResolver {
        let left = SurfaceIndex::build(
            vec![Point3::new(-10.0, 0.0, 0.0), Point3::new(-10.0, 0.0, 10.0)],
            vec![0.5, 0.25],
            vec![2.0, 2.5],
        )
        .unwrap();
        let right = SurfaceIndex::build(
            vec![Point3::new(10.0, 0.0, 0.0), Point3::new(10.0, 0.0, 10.0)],
            vec![-0.5, -0.25],
            vec![3.0, 3.5],
        )
        .unwrap();
        EndpointResolver::new(left, right)
    }

    #[test]
    fn a_point_closer_to_the_left_surface_resolves_left() {
        let m = resolver().resolve(&Point3::new(-9.0, 0.0, 9.0)).unwrap();
        assert_eq!(Hemisphere::Left, m.hemisphere);
        assert_eq!(1, m.vertex);
    }

    #[test]
    fn a_point_closer_to_the_right_surface_resolves_right() {
        let m = resolver().resolve(&Point3::new(8.0, 0.0, 0.5)).unwrap();
        assert_eq!(Hemisphere::Right, m.hemisphere);
        assert_eq!(0, m.vertex);
    }

    #[test]
    fn an_exact_distance_tie_resolves_left() {
        // Equidistant from left vertex 0 and right vertex 0.
        for _ in 0..10 {
            let m = resolver().resolve(&Point3::new(0.0, 0.0, 0.0)).unwrap();
            assert_eq!(Hemisphere::Left, m.hemisphere);
            assert_eq!(0, m.vertex);
        }
    }

    #[test]
    fn a_point_outside_both_search_radii_yields_no_match() {
        let r = resolver().with_search_radius(5.0);
        assert!(r.resolve(&Point3::new(0.0, 100.0, 0.0)).is_none());
    }

    #[test]
    fn a_single_sided_match_within_radius_wins() {
        let r = resolver().with_search_radius(3.0);
        // Within 3.0 of the right surface only.
        let m = r.resolve(&Point3::new(12.0, 0.0, 10.0)).unwrap();
        assert_eq!(Hemisphere::Right, m.hemisphere);
        assert_eq!(1, m.vertex);
    }
}
