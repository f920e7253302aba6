use geo::{BooleanOps, Validation};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error;
use crate::operations::normalize::{NormalizedGeometry, PositionRing};
use crate::primitives::{Coordinate2D, MultiPolygon, Polygon, Ring};
use crate::util::Result;

/// Outcome of validating a normalized geometry
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedGeometry {
    /// A non-empty, valid geometry
    Valid {
        geometry: MultiPolygon,
        report: RepairReport,
    },
    /// Nothing is left after dropping empty rings and polygons
    Empty,
}

/// What validation found and whether a repair was necessary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub valid_before: bool,
    /// Validation problems of the input, if any
    pub issues_before: Option<String>,
    pub repaired: bool,
}

/// Builds a `MultiPolygon` and repairs invalid topology with a self-union.
///
/// # Errors
///
/// * `GeometryParse` for rings with one to three positions or non-finite coordinates
/// * `UnrepairableGeometry` if the geometry is still invalid or empty after the repair
#[instrument(skip_all)]
pub fn validate_geometry(geometry: &NormalizedGeometry) -> Result<ValidatedGeometry> {
    let mut polygons: Vec<Polygon> = Vec::new();

    for polygon in geometry.polygons() {
        let rings = polygon
            .iter()
            .filter(|ring| !ring.is_empty())
            .map(build_ring)
            .collect::<Result<Vec<Ring>>>()?;

        if !rings.is_empty() {
            polygons.push(rings);
        }
    }

    if polygons.is_empty() {
        debug!("geometry is empty");
        return Ok(ValidatedGeometry::Empty);
    }

    let multi_polygon =
        MultiPolygon::new(polygons).map_err(|source| error::Error::GeometryParse {
            reason: source.to_string(),
        })?;

    let geo_multi_polygon: geo::MultiPolygon<f64> = (&multi_polygon).into();

    if geo_multi_polygon.is_valid() {
        return Ok(ValidatedGeometry::Valid {
            geometry: multi_polygon,
            report: RepairReport {
                valid_before: true,
                issues_before: None,
                repaired: false,
            },
        });
    }

    let issues_before = describe_issues(&geo_multi_polygon);
    debug!(issues = %issues_before, "repairing invalid geometry");

    // a union with the empty set rebuilds the rings and resolves self-intersections
    let repaired = geo_multi_polygon.union(&geo::MultiPolygon::<f64>::new(vec![]));

    if repaired.0.is_empty() {
        return Err(error::Error::UnrepairableGeometry {
            before: issues_before,
            after: "geometry is empty".to_string(),
        });
    }
    if !repaired.is_valid() {
        return Err(error::Error::UnrepairableGeometry {
            before: issues_before,
            after: describe_issues(&repaired),
        });
    }

    Ok(ValidatedGeometry::Valid {
        geometry: repaired.into(),
        report: RepairReport {
            valid_before: false,
            issues_before: Some(issues_before),
            repaired: true,
        },
    })
}

fn build_ring(positions: &PositionRing) -> Result<Ring> {
    if positions.len() < 4 {
        return Err(error::Error::GeometryParse {
            reason: format!(
                "a linear ring needs at least 4 positions, got {}",
                positions.len()
            ),
        });
    }

    positions
        .iter()
        .map(|&position| {
            let coordinate = Coordinate2D::from(position);
            if coordinate.is_finite() {
                Ok(coordinate)
            } else {
                Err(error::Error::GeometryParse {
                    reason: format!("non-finite coordinate {coordinate}"),
                })
            }
        })
        .collect()
}

fn describe_issues(geometry: &geo::MultiPolygon<f64>) -> String {
    geometry
        .validation_errors()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
