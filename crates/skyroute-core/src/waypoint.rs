//! Indexed waypoints and step-bounded waypoint paths.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::types::{Positioned, Vec3};

/// A point on a path together with its dense position in that path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub pos: Vec3,
    pub index: u32,
}

impl Waypoint {
    pub fn new(pos: Vec3, index: u32) -> Self {
        Self { pos, index }
    }
}

impl Positioned for Waypoint {
    fn position(&self) -> Vec3 {
        self.pos
    }
}

/// Ordered waypoints where consecutive points are at most `max_step` apart.
///
/// Producers are responsible for the spacing bound; it is not re-checked here.
/// `Clone` copies every point, so a clone is safe to hand to another thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointPath {
    pub max_step: f64,
    pub points: Vec<Waypoint>,
}

impl WaypointPath {
    pub fn new(max_step: f64, points: Vec<Waypoint>) -> Self {
        Self { max_step, points }
    }

    /// Build a path from bare positions, indexing them `0..n` in order.
    pub fn from_positions(max_step: f64, positions: impl IntoIterator<Item = Vec3>) -> Self {
        let points = positions
            .into_iter()
            .enumerate()
            .map(|(i, pos)| Waypoint::new(pos, i as u32))
            .collect();
        Self { max_step, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.points.last()
    }

    /// Reassign dense `0..n` indices in current order.
    pub fn reindex(&mut self) {
        for (i, waypoint) in self.points.iter_mut().enumerate() {
            waypoint.index = i as u32;
        }
    }

    /// Largest distance between two consecutive waypoints (0 for fewer than two points).
    pub fn max_gap(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].pos.distance(pair[1].pos))
            .fold(0.0, f64::max)
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].pos.distance(pair[1].pos))
            .sum()
    }
}

/// Concatenate paths in order into one densely re-indexed path.
///
/// Inputs are copied, never consumed. The merged `max_step` is the smallest
/// input bound, since it has to hold end to end.
pub fn merge_paths(paths: &[WaypointPath]) -> Result<WaypointPath> {
    if paths.is_empty() {
        return Err(RouteError::NothingToMerge);
    }

    let max_step = paths
        .iter()
        .map(|path| path.max_step)
        .fold(f64::INFINITY, f64::min);

    let mut merged = WaypointPath::new(
        max_step,
        paths.iter().flat_map(|path| path.points.iter().copied()).collect(),
    );
    merged.reindex();
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(max_step: f64, xs: &[f64]) -> WaypointPath {
        WaypointPath::from_positions(max_step, xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)))
    }

    #[test]
    fn test_merge_length_and_dense_indices() {
        let a = line(1.0, &[0.0, 1.0, 2.0]);
        let b = line(0.5, &[5.0, 5.5]);

        let merged = merge_paths(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(merged.len(), a.len() + b.len());
        for (i, waypoint) in merged.points.iter().enumerate() {
            assert_eq!(waypoint.index, i as u32);
        }
        assert_eq!(merged.points[3].pos, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(merged.max_step, 0.5, "merged bound is the tightest input bound");
    }

    #[test]
    fn test_merge_single_keeps_max_step() {
        let a = line(1.25, &[0.0, 1.0]);
        let merged = merge_paths(std::slice::from_ref(&a)).unwrap();
        assert_eq!(merged.max_step, a.max_step);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merge_leaves_inputs_untouched() {
        let a = line(1.0, &[0.0, 1.0]);
        let b = line(1.0, &[2.0, 3.0]);
        let before = b.clone();

        let _ = merge_paths(&[a, b.clone()]).unwrap();

        assert_eq!(b, before);
        assert_eq!(b.points[0].index, 0);
    }

    #[test]
    fn test_merge_empty_is_error() {
        assert!(matches!(merge_paths(&[]), Err(RouteError::NothingToMerge)));
    }

    #[test]
    fn test_max_gap() {
        let path = line(2.0, &[0.0, 0.5, 2.0, 2.25]);
        assert!((path.max_gap() - 1.5).abs() < 1e-12);
        assert!((path.length() - 2.25).abs() < 1e-12);
    }
}
