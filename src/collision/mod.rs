pub mod contact;
pub mod pairs;
pub mod sat;
pub mod shape;
pub mod spatial_grid;
