mod bounding_box;
mod coordinate;
mod multi_polygon;

pub use bounding_box::BoundingBox2D;
pub use coordinate::Coordinate2D;
pub use multi_polygon::{MultiPolygon, Polygon, Ring};
