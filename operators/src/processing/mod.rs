mod diagnostics;
mod point_sampler;
pub mod zonal;

pub use diagnostics::{GeometryDiagnostics, diagnose};
pub use point_sampler::{PointValue, sample_point};
pub use zonal::{NoCoverageReason, ZonalOutcome, ZonalStatistics, zonal_statistics};
