pub mod tiles;
pub mod world;
