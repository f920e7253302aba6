pub mod normalize;
pub mod repair;
pub mod reproject;
