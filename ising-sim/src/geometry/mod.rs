pub mod lattice;
pub mod offsets;

pub use lattice::Lattice;
pub use offsets::{neighbor_index, opposite, N_NEIGHBORS, SQUARE};
