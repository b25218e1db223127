//! Static KD-tree over positioned items with radius queries.
//!
//! Items live in one arena and nodes hold arena indices. Items whose split
//! coordinate equals the median stay at the splitting node, which bounds
//! recursion even when many items share a coordinate. The tree is never
//! updated in place; build a new one when the item set changes.

use skyroute_core::constants::{KD_LEAF_SIZE, KD_MAX_DEPTH};
use skyroute_core::types::{Positioned, Vec3};

#[derive(Debug)]
enum Node {
    Leaf(Vec<usize>),
    Split {
        axis: usize,
        value: f64,
        /// Items lying exactly on the split plane.
        items: Vec<usize>,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug)]
pub struct KdTree<T> {
    items: Vec<T>,
    root: Node,
}

impl<T: Positioned> KdTree<T> {
    /// Build with the default leaf size and depth limit.
    pub fn new(items: Vec<T>) -> Self {
        Self::build(items, KD_LEAF_SIZE, KD_MAX_DEPTH)
    }

    /// Build a tree. A node with fewer than `leaf_size` items, or deeper than
    /// `max_depth`, becomes a leaf holding all of them.
    pub fn build(items: Vec<T>, leaf_size: usize, max_depth: usize) -> Self {
        let indices: Vec<usize> = (0..items.len()).collect();
        let root = construct(&items, indices, 0, leaf_size, max_depth);
        Self { items, root }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Every item whose distance to `center` is at most `radius`.
    pub fn search_radius(&self, center: Vec3, radius: f64) -> Vec<&T> {
        let mut found = Vec::new();
        self.collect_in_radius(&self.root, center, radius, radius * radius, &mut found);
        found
    }

    fn collect_in_radius<'a>(
        &'a self,
        node: &Node,
        center: Vec3,
        radius: f64,
        radius_sq: f64,
        found: &mut Vec<&'a T>,
    ) {
        let within = |idx: usize| self.items[idx].position().distance_squared(center) <= radius_sq;

        match node {
            Node::Leaf(indices) => {
                found.extend(indices.iter().filter(|&&i| within(i)).map(|&i| &self.items[i]));
            }
            Node::Split {
                axis,
                value,
                items,
                left,
                right,
            } => {
                found.extend(items.iter().filter(|&&i| within(i)).map(|&i| &self.items[i]));

                let component = center[*axis];
                if component - radius < *value {
                    self.collect_in_radius(left, center, radius, radius_sq, found);
                }
                if component + radius > *value {
                    self.collect_in_radius(right, center, radius, radius_sq, found);
                }
            }
        }
    }
}

fn construct<T: Positioned>(
    arena: &[T],
    mut indices: Vec<usize>,
    depth: usize,
    leaf_size: usize,
    max_depth: usize,
) -> Node {
    if indices.len() < leaf_size || depth > max_depth || indices.is_empty() {
        return Node::Leaf(indices);
    }

    let axis = depth % 3;
    let coord = |idx: usize| arena[idx].position()[axis];

    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |a, b| coord(*a).total_cmp(&coord(*b)));
    let value = coord(indices[mid]);

    let mut left = Vec::new();
    let mut on_plane = Vec::new();
    let mut right = Vec::new();
    for idx in indices {
        let c = coord(idx);
        if c < value {
            left.push(idx);
        } else if c > value {
            right.push(idx);
        } else {
            on_plane.push(idx);
        }
    }

    Node::Split {
        axis,
        value,
        items: on_plane,
        left: Box::new(construct(arena, left, depth + 1, leaf_size, max_depth)),
        right: Box::new(construct(arena, right, depth + 1, leaf_size, max_depth)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn brute_force(points: &[Vec3], center: Vec3, radius: f64) -> Vec<usize> {
        let mut hits: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance(center) <= radius)
            .map(|(i, _)| i)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Positions are unique in these tests, so they map back to indices.
    fn hit_indices(points: &[Vec3], hits: Vec<&Vec3>) -> Vec<usize> {
        let mut out: Vec<usize> = hits
            .into_iter()
            .map(|h| points.iter().position(|p| p == h).unwrap())
            .collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_matches_brute_force_on_random_sets() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);

        for trial in 0..40 {
            let count = rng.gen_range(0..400);
            let points: Vec<Vec3> = (0..count)
                .map(|_| {
                    Vec3::new(
                        rng.gen_range(-20.0..20.0),
                        rng.gen_range(-20.0..20.0),
                        rng.gen_range(-20.0..20.0),
                    )
                })
                .collect();
            let leaf_size = rng.gen_range(1..8);
            let max_depth = rng.gen_range(0..12);
            let tree = KdTree::build(points.clone(), leaf_size, max_depth);

            for _ in 0..25 {
                let center = Vec3::new(
                    rng.gen_range(-25.0..25.0),
                    rng.gen_range(-25.0..25.0),
                    rng.gen_range(-25.0..25.0),
                );
                let radius = rng.gen_range(0.0..15.0);

                let expected = brute_force(&points, center, radius);
                let got = hit_indices(&points, tree.search_radius(center, radius));
                assert_eq!(got, expected, "trial {trial}: center {center}, radius {radius}");
            }
        }
    }

    #[test]
    fn test_duplicate_coordinates_terminate_and_are_found() {
        // 200 items on one plane plus a shared x coordinate.
        let points: Vec<Vec3> = (0..200)
            .map(|i| Vec3::new(1.0, (i % 10) as f64, 0.0))
            .collect();
        let tree = KdTree::build(points, 2, 64);

        assert_eq!(tree.len(), 200);
        let hits = tree.search_radius(Vec3::new(1.0, 0.0, 0.0), 0.5);
        assert_eq!(hits.len(), 20);
    }

    #[test]
    fn test_every_item_kept_exactly_once() {
        let points: Vec<Vec3> = (0..97)
            .map(|i| Vec3::new(i as f64 * 0.37, (i * 7 % 13) as f64, (i % 5) as f64))
            .collect();
        let tree = KdTree::new(points.clone());

        let all = tree.search_radius(Vec3::ZERO, 1.0e6);
        assert_eq!(all.len(), points.len());
    }

    #[test]
    fn test_empty_tree() {
        let tree: KdTree<Vec3> = KdTree::new(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.search_radius(Vec3::ZERO, 10.0).is_empty());
    }
}
