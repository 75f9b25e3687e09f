//! Spatial hash broad phase.
//!
//! The world is divided into square tiles, every body is registered in each
//! tile its shape touches. Only bodies sharing a bucket can collide, which
//! turns the quadratic narrow phase into a handful of local checks.

use vek::{Extent2, Vec2};

use crate::{math::Rotation, rigidbody::RigidBody};

use super::{
    sat,
    shape::{Obb, Shape},
};

/// Number of buckets the tile keys hash into.
const BUCKETS: usize = 1000;

/// First hash prime, spreads the horizontal tile index.
const HASH_X: i64 = 73_856_093;

/// Second hash prime, spreads the vertical tile index.
const HASH_Y: i64 = 19_349_663;

/// Fixed bucket spatial hash over world tiles.
///
/// The bucket vectors are reused over rebuilds so the grid stops allocating
/// once the simulation reaches a steady state.
pub struct SpatialGrid<I> {
    /// Side length of a single square tile.
    cell_size: f64,
    /// Buckets spread out over the world, each holding the ids in a tile.
    buckets: Vec<Vec<I>>,
    /// Ids registered since the last clear, including duplicates.
    nodes: usize,
}

impl<I: Copy + PartialEq> SpatialGrid<I> {
    /// Construct an empty grid.
    pub fn new(cell_size: f64) -> Self {
        let buckets = (0..BUCKETS).map(|_| Vec::new()).collect();
        let nodes = 0;

        Self {
            cell_size,
            buckets,
            nodes,
        }
    }

    /// Remove all registered ids but keep the bucket allocations.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.nodes = 0;
    }

    /// Bucket index for a tile coordinate.
    ///
    /// The modulo result is folded back to a positive index so negative tile
    /// coordinates hash like any other.
    pub fn hash(tile_x: i64, tile_y: i64) -> usize {
        let hash = (tile_x.wrapping_mul(HASH_X)).wrapping_add(tile_y.wrapping_mul(HASH_Y));

        hash.rem_euclid(BUCKETS as i64) as usize
    }

    /// Register a body in every tile its shape touches.
    pub fn insert_body(&mut self, id: I, body: &RigidBody) {
        self.for_each_intersecting_tile(body, |grid, tile_x, tile_y| {
            let bucket = Self::hash(tile_x, tile_y);
            grid.buckets[bucket].push(id);
            grid.nodes += 1;
        });
    }

    /// Call a function for every tile a body intersects.
    ///
    /// Walks the tiles covered by the bounding box and filters them against
    /// the actual shape, a rotated rectangle can skip the box corners.
    pub fn for_each_intersecting_tile(
        &mut self,
        body: &RigidBody,
        mut visit: impl FnMut(&mut Self, i64, i64),
    ) {
        let aabr = body.aabr();

        let start_x = (aabr.min.x / self.cell_size).floor() as i64;
        let start_y = (aabr.min.y / self.cell_size).floor() as i64;
        let end_x = (aabr.max.x / self.cell_size).floor() as i64;
        let end_y = (aabr.max.y / self.cell_size).floor() as i64;

        for tile_x in start_x..=end_x {
            for tile_y in start_y..=end_y {
                if self.body_intersects_tile(body, tile_x, tile_y) {
                    visit(self, tile_x, tile_y);
                }
            }
        }
    }

    /// Whether the actual shape of a body touches a tile.
    fn body_intersects_tile(&self, body: &RigidBody, tile_x: i64, tile_y: i64) -> bool {
        let tile_pos = Vec2::new(tile_x as f64, tile_y as f64) * self.cell_size;
        let tile = Obb::new(
            tile_pos,
            Extent2::broadcast(self.cell_size),
            Rotation::default(),
        );

        match body.shape() {
            Shape::Rectangle { .. } => sat::obb_intersects_obb(&tile, &body.obb()),
            Shape::Circle { radius } => {
                sat::circle_intersects_aabr(body.position(), radius, tile.aabr())
            }
        }
    }

    /// All buckets currently holding at least two ids.
    ///
    /// Single occupants can never produce a pair so they are skipped here.
    pub fn pair_buckets(&self) -> impl Iterator<Item = &[I]> {
        self.buckets
            .iter()
            .filter(|bucket| bucket.len() >= 2)
            .map(Vec::as_slice)
    }

    /// Total registrations since the last clear, duplicates included.
    pub fn nodes(&self) -> usize {
        self.nodes
    }
}
