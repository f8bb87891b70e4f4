//! A static 3-d tree over a borrowed point set, used for
//! near-duplicate removal.

use crate::geometry::Coord;

use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct KdNode {
  point: usize,
  axis: usize,
  left: Option<usize>,
  right: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct KdTree<'a> {
  points: &'a [Coord],
  nodes: Vec<KdNode>,
  root: Option<usize>,
}

impl<'a> KdTree<'a> {
  /// Builds a balanced tree by median splits along cycling axes.
  pub fn new(points: &'a [Coord]) -> Self {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    let mut nodes = Vec::with_capacity(points.len());
    let root = build(points, &mut indices, 0, &mut nodes);
    Self {
      points,
      nodes,
      root,
    }
  }

  /// All point indices with distance `<= radius` to `query`, ascending.
  pub fn within_radius(&self, query: &Coord, radius: f64) -> Vec<usize> {
    let mut found = Vec::new();
    let mut stack: Vec<usize> = self.root.into_iter().collect();
    let radius_sqr = radius * radius;
    while let Some(inode) = stack.pop() {
      let node = &self.nodes[inode];
      let point = &self.points[node.point];
      if (point - query).norm_squared() <= radius_sqr {
        found.push(node.point);
      }
      let diff = query[node.axis] - point[node.axis];
      if diff - radius <= 0.0 {
        stack.extend(node.left);
      }
      if diff + radius >= 0.0 {
        stack.extend(node.right);
      }
    }
    found.sort_unstable();
    found
  }

  /// All index pairs `(i, j)` with `i < j` and distance `<= radius`,
  /// sorted lexicographically.
  pub fn pairs_within(&self, radius: f64) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(usize, usize)> = self
      .points
      .iter()
      .enumerate()
      .flat_map(|(i, p)| {
        self
          .within_radius(p, radius)
          .into_iter()
          .filter(move |&j| j > i)
          .map(move |j| (i, j))
      })
      .collect();
    pairs.sort_unstable();
    pairs
  }
}

fn build(
  points: &[Coord],
  indices: &mut [usize],
  depth: usize,
  nodes: &mut Vec<KdNode>,
) -> Option<usize> {
  if indices.is_empty() {
    return None;
  }
  let axis = depth % 3;
  let median = indices.len() / 2;
  indices.select_nth_unstable_by(median, |&a, &b| {
    points[a][axis]
      .partial_cmp(&points[b][axis])
      .unwrap_or(Ordering::Equal)
  });

  let inode = nodes.len();
  nodes.push(KdNode {
    point: indices[median],
    axis,
    left: None,
    right: None,
  });

  let (lower, upper) = indices.split_at_mut(median);
  let left = build(points, lower, depth + 1, nodes);
  let right = build(points, &mut upper[1..], depth + 1, nodes);
  nodes[inode].left = left;
  nodes[inode].right = right;
  Some(inode)
}

/// Removes near-duplicate points.
///
/// For every pair closer than `min_distance` the higher indexed point is
/// dropped. The relative order of the kept points is preserved.
pub fn remove_close_points(points: Vec<Coord>, min_distance: f64) -> Vec<Coord> {
  if min_distance <= 0.0 || points.len() < 2 {
    return points;
  }
  let mut drop = vec![false; points.len()];
  {
    let tree = KdTree::new(&points);
    for (_, j) in tree.pairs_within(min_distance) {
      drop[j] = true;
    }
  }
  points
    .into_iter()
    .zip(drop)
    .filter_map(|(p, d)| (!d).then_some(p))
    .collect()
}

#[cfg(test)]
mod test {
  use super::*;

  use rand::{Rng, SeedableRng};
  use rand_pcg::Pcg64;

  fn random_points(n: usize, seed: u64) -> Vec<Coord> {
    let mut rng = Pcg64::seed_from_u64(seed);
    (0..n)
      .map(|_| Coord::new(rng.gen(), rng.gen(), rng.gen()))
      .collect()
  }

  #[test]
  fn radius_query_matches_brute_force() {
    let points = random_points(400, 7);
    let tree = KdTree::new(&points);
    let query = Coord::new(0.4, 0.5, 0.6);
    for radius in [0.0, 0.05, 0.2, 0.7] {
      let expected: Vec<usize> = (0..points.len())
        .filter(|&i| (points[i] - query).norm() <= radius)
        .collect();
      assert_eq!(tree.within_radius(&query, radius), expected);
    }
  }

  #[test]
  fn pairs_match_brute_force() {
    let points = random_points(300, 11);
    let radius = 0.06;
    let mut expected = Vec::new();
    for i in 0..points.len() {
      for j in (i + 1)..points.len() {
        if (points[i] - points[j]).norm() <= radius {
          expected.push((i, j));
        }
      }
    }
    assert!(!expected.is_empty());
    assert_eq!(KdTree::new(&points).pairs_within(radius), expected);
  }

  #[test]
  fn duplicates_keep_lower_index() {
    let points = vec![
      Coord::new(0.1, 0.1, 0.1),
      Coord::new(0.5, 0.5, 0.5),
      Coord::new(0.1, 0.1, 0.1 + 1e-6),
      Coord::new(0.9, 0.9, 0.9),
      Coord::new(0.5 + 1e-7, 0.5, 0.5),
    ];
    let kept = remove_close_points(points.clone(), 1e-4);
    assert_eq!(kept, vec![points[0], points[1], points[3]]);
  }

  #[test]
  fn kept_points_are_separated() {
    let min_distance = 0.05;
    let kept = remove_close_points(random_points(500, 3), min_distance);
    let tree = KdTree::new(&kept);
    assert!(tree.pairs_within(min_distance).is_empty());
  }
}
