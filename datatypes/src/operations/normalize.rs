//! Turns loosely shaped GeoJSON input into a canonical `Polygon` or `MultiPolygon`.
//!
//! Coordinates may arrive under-nested, e.g. a bare ring as `Polygon` coordinates.
//! The nesting depth is resolved by an explicit parse of the three possible shapes
//! instead of guessing from the first element.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;
use tracing::instrument;

use crate::error;
use crate::util::Result;

pub type Position = [f64; 2];
pub type PositionRing = Vec<Position>;

/// A polygonal geometry with canonical nesting and closed rings.
///
/// Serializes to a GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum NormalizedGeometry {
    Polygon(Vec<PositionRing>),
    MultiPolygon(Vec<Vec<PositionRing>>),
}

impl NormalizedGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            NormalizedGeometry::Polygon(_) => "Polygon",
            NormalizedGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// The geometry as a list of polygons, each a list of rings
    pub fn polygons(&self) -> Vec<&[PositionRing]> {
        match self {
            NormalizedGeometry::Polygon(rings) => vec![rings.as_slice()],
            NormalizedGeometry::MultiPolygon(polygons) => {
                polygons.iter().map(Vec::as_slice).collect()
            }
        }
    }

    /// The first `n` positions in ring order
    pub fn sample_positions(&self, n: usize) -> Vec<Position> {
        self.polygons()
            .into_iter()
            .flatten()
            .flatten()
            .take(n)
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclaredType {
    Polygon,
    MultiPolygon,
}

impl DeclaredType {
    fn parse(type_name: &str) -> Option<Self> {
        if type_name.eq_ignore_ascii_case("Polygon") {
            Some(DeclaredType::Polygon)
        } else if type_name.eq_ignore_ascii_case("MultiPolygon") {
            Some(DeclaredType::MultiPolygon)
        } else {
            None
        }
    }
}

/// The possible nesting depths of polygonal coordinates
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Nesting {
    Ring(PositionRing),
    Rings(Vec<PositionRing>),
    Polygons(Vec<Vec<PositionRing>>),
}

impl Nesting {
    fn depth(&self) -> usize {
        match self {
            Nesting::Ring(_) => 1,
            Nesting::Rings(_) => 2,
            Nesting::Polygons(_) => 3,
        }
    }
}

/// Normalizes a geometry given either as a GeoJSON object or as a string containing one.
///
/// # Errors
///
/// * `MalformedGeometry` if a string does not contain valid JSON
/// * `InvalidGeometryShape` if the value is no object or lacks `type` or `coordinates`
/// * `UnsupportedGeometryType` for types other than `Polygon` and `MultiPolygon`
/// * `GeometryParse` if the coordinates have no valid polygonal nesting
#[instrument(skip_all)]
pub fn normalize_geometry(input: &Value) -> Result<NormalizedGeometry> {
    let parsed;
    let value = if let Value::String(text) = input {
        parsed = serde_json::from_str::<Value>(text).context(error::MalformedGeometry)?;
        &parsed
    } else {
        input
    };

    let Value::Object(object) = value else {
        return Err(error::Error::InvalidGeometryShape {
            reason: format!("expected a JSON object, got {}", json_kind(value)),
        });
    };

    let type_name = match object.get("type") {
        Some(Value::String(type_name)) => type_name,
        Some(other) => {
            return Err(error::Error::InvalidGeometryShape {
                reason: format!("`type` must be a string, got {}", json_kind(other)),
            });
        }
        None => {
            return Err(error::Error::InvalidGeometryShape {
                reason: "missing `type`".to_string(),
            });
        }
    };

    let declared = DeclaredType::parse(type_name).ok_or_else(|| {
        error::Error::UnsupportedGeometryType {
            geometry_type: type_name.clone(),
        }
    })?;

    let coordinates = match object.get("coordinates") {
        Some(Value::Array(coordinates)) if !coordinates.is_empty() => coordinates,
        Some(Value::Array(_)) | Some(Value::Null) | None => {
            return Err(error::Error::InvalidGeometryShape {
                reason: "missing or empty `coordinates`".to_string(),
            });
        }
        Some(other) => {
            return Err(error::Error::InvalidGeometryShape {
                reason: format!("`coordinates` must be an array, got {}", json_kind(other)),
            });
        }
    };

    let nesting = Nesting::deserialize(Value::Array(coordinates.clone())).map_err(|_| {
        error::Error::GeometryParse {
            reason: "coordinates are not nested arrays of [x, y] number pairs".to_string(),
        }
    })?;

    let geometry = match (declared, nesting) {
        (DeclaredType::Polygon, Nesting::Ring(ring)) => NormalizedGeometry::Polygon(vec![ring]),
        (DeclaredType::Polygon, Nesting::Rings(rings)) => NormalizedGeometry::Polygon(rings),
        (DeclaredType::MultiPolygon, Nesting::Ring(ring)) => {
            NormalizedGeometry::MultiPolygon(vec![vec![ring]])
        }
        (DeclaredType::MultiPolygon, Nesting::Rings(rings)) => {
            NormalizedGeometry::MultiPolygon(vec![rings])
        }
        (DeclaredType::MultiPolygon, Nesting::Polygons(polygons)) => {
            NormalizedGeometry::MultiPolygon(polygons)
        }
        (DeclaredType::Polygon, nesting @ Nesting::Polygons(_)) => {
            return Err(error::Error::GeometryParse {
                reason: format!(
                    "coordinates of depth {} are nested deeper than a Polygon",
                    nesting.depth()
                ),
            });
        }
    };

    Ok(close_rings(geometry))
}

fn close_rings(geometry: NormalizedGeometry) -> NormalizedGeometry {
    #[allow(clippy::float_cmp)]
    fn close(ring: &mut PositionRing) {
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
            if first != last {
                ring.push(first);
            }
        }
    }

    match geometry {
        NormalizedGeometry::Polygon(mut rings) => {
            rings.iter_mut().for_each(close);
            NormalizedGeometry::Polygon(rings)
        }
        NormalizedGeometry::MultiPolygon(mut polygons) => {
            polygons.iter_mut().flatten().for_each(close);
            NormalizedGeometry::MultiPolygon(polygons)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn closed_square() -> Vec<Position> {
        vec![[0., 0.], [1., 0.], [1., 1.], [0., 1.], [0., 0.]]
    }

    #[test]
    fn canonical_polygon_is_unchanged() {
        let input = json!({"type": "Polygon", "coordinates": [closed_square()]});

        assert_eq!(
            normalize_geometry(&input).unwrap(),
            NormalizedGeometry::Polygon(vec![closed_square()])
        );
    }

    #[test]
    fn normalizing_is_idempotent() {
        let inputs = [
            json!({"type": "polygon", "coordinates": [[0, 0], [1, 0], [1, 1]]}),
            json!({"type": "MultiPolygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]}),
            json!({"type": "MULTIPOLYGON", "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]], [[[5, 5], [6, 5], [6, 6]]]]}),
        ];

        for input in inputs {
            let once = normalize_geometry(&input).unwrap();
            let twice = normalize_geometry(&serde_json::to_value(&once).unwrap()).unwrap();

            assert_eq!(once, twice);
        }
    }

    #[test]
    fn closes_open_rings() {
        let input = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]});

        let NormalizedGeometry::Polygon(rings) = normalize_geometry(&input).unwrap() else {
            panic!("expected a polygon");
        };
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(rings[0].len(), 5);
    }

    #[test]
    fn bare_ring_equals_wrapped_ring() {
        let bare = json!({"type": "Polygon", "coordinates": closed_square()});
        let wrapped = json!({"type": "Polygon", "coordinates": [closed_square()]});

        assert_eq!(
            normalize_geometry(&bare).unwrap(),
            normalize_geometry(&wrapped).unwrap()
        );
    }

    #[test]
    fn multi_polygon_wraps_single_polygon() {
        let input = json!({"type": "MultiPolygon", "coordinates": [closed_square()]});

        assert_eq!(
            normalize_geometry(&input).unwrap(),
            NormalizedGeometry::MultiPolygon(vec![vec![closed_square()]])
        );
    }

    #[test]
    fn parses_json_text() {
        let input = Value::String(
            r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}"#.to_string(),
        );

        assert_eq!(
            normalize_geometry(&input).unwrap().type_name(),
            "Polygon"
        );
    }

    #[test]
    fn rejects_malformed_text() {
        let input = Value::String("{not json".to_string());

        assert!(matches!(
            normalize_geometry(&input),
            Err(error::Error::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn rejects_invalid_shapes() {
        for input in [
            json!([1, 2, 3]),
            json!({"coordinates": [[0, 0]]}),
            json!({"type": 5, "coordinates": [[0, 0]]}),
            json!({"type": "Polygon"}),
            json!({"type": "Polygon", "coordinates": []}),
            json!({"type": "Polygon", "coordinates": "0 0"}),
        ] {
            assert!(
                matches!(
                    normalize_geometry(&input),
                    Err(error::Error::InvalidGeometryShape { .. })
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn rejects_unsupported_types() {
        let input = json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]});

        assert!(matches!(
            normalize_geometry(&input),
            Err(error::Error::UnsupportedGeometryType { geometry_type }) if geometry_type == "LineString"
        ));
    }

    #[test]
    fn rejects_bad_nesting() {
        for input in [
            json!({"type": "Polygon", "coordinates": [[closed_square()]]}),
            json!({"type": "Polygon", "coordinates": [["a", "b"]]}),
            json!({"type": "Polygon", "coordinates": [[[0, 0, 0], [1, 0, 0], [1, 1, 0]]]}),
            json!({"type": "MultiPolygon", "coordinates": [[[[closed_square()]]]]}),
        ] {
            assert!(
                matches!(
                    normalize_geometry(&input),
                    Err(error::Error::GeometryParse { .. })
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn sample_positions() {
        let input = json!({"type": "Polygon", "coordinates": [closed_square()]});

        assert_eq!(
            normalize_geometry(&input).unwrap().sample_positions(2),
            vec![[0., 0.], [1., 0.]]
        );
    }
}
