//! GeoJSON reading and writing.
//!
//! Reading accepts any geometry object, a `Feature`, a `FeatureCollection`
//! or a bare array of those; features are unwrapped to their geometry and
//! lists become a `GeometryCollection`.

use serde::{Deserialize, Serialize};

use crate::geometry::{Coord, CoordList, Geometry};

/// A GeoJSON position. Extra ordinates (altitude) are ignored.
type Position = Vec<f64>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJson>,
    },
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
    FeatureCollection {
        features: Vec<GeoJson>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Object(GeoJson),
    List(Vec<Document>),
}

/// Error for documents that are valid JSON but not usable geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoJsonError {
    #[error("invalid GeoJSON: {0}")]
    Json(String),
    #[error("position needs at least two numbers, got {0}")]
    ShortPosition(usize),
}

impl From<serde_json::Error> for GeoJsonError {
    fn from(err: serde_json::Error) -> Self {
        GeoJsonError::Json(err.to_string())
    }
}

/// Parse a GeoJSON document into a geometry.
pub fn parse_geojson(text: &str) -> Result<Geometry, GeoJsonError> {
    let document: Document = serde_json::from_str(text)?;
    document_to_geometry(document)
}

/// Render a geometry as a GeoJSON geometry object.
pub fn to_geojson(geometry: &Geometry) -> serde_json::Value {
    // Serializing a tree of plain vectors and numbers cannot fail.
    serde_json::to_value(from_geometry(geometry)).unwrap_or(serde_json::Value::Null)
}

// ── Reading ───────────────────────────────────────────────────────────────────

fn document_to_geometry(document: Document) -> Result<Geometry, GeoJsonError> {
    match document {
        Document::Object(object) => {
            Ok(to_geometry(object)?.unwrap_or(Geometry::GeometryCollection(Vec::new())))
        }
        Document::List(items) => items
            .into_iter()
            .map(document_to_geometry)
            .collect::<Result<_, _>>()
            .map(Geometry::GeometryCollection),
    }
}

fn position(p: Position) -> Result<Coord, GeoJsonError> {
    match p.as_slice() {
        [x, y, ..] => Ok(Coord::new(*x, *y)),
        _ => Err(GeoJsonError::ShortPosition(p.len())),
    }
}

fn positions(ps: Vec<Position>) -> Result<CoordList, GeoJsonError> {
    ps.into_iter().map(position).collect()
}

fn rings(rs: Vec<Vec<Position>>) -> Result<Vec<CoordList>, GeoJsonError> {
    rs.into_iter().map(positions).collect()
}

/// Convert one object; a feature without geometry converts to `None`.
fn to_geometry(object: GeoJson) -> Result<Option<Geometry>, GeoJsonError> {
    let geometry = match object {
        GeoJson::Point { coordinates } if coordinates.is_empty() => Geometry::Point(Coord::EMPTY),
        GeoJson::Point { coordinates } => Geometry::Point(position(coordinates)?),
        GeoJson::MultiPoint { coordinates } => Geometry::MultiPoint(positions(coordinates)?),
        GeoJson::LineString { coordinates } => Geometry::LineString(positions(coordinates)?),
        GeoJson::MultiLineString { coordinates } => Geometry::MultiLineString(rings(coordinates)?),
        GeoJson::Polygon { coordinates } => Geometry::Polygon(rings(coordinates)?),
        GeoJson::MultiPolygon { coordinates } => Geometry::MultiPolygon(
            coordinates
                .into_iter()
                .map(rings)
                .collect::<Result<_, _>>()?,
        ),
        GeoJson::GeometryCollection { geometries } => {
            Geometry::GeometryCollection(members(geometries)?)
        }
        GeoJson::Feature { geometry } => match geometry {
            Some(inner) => return to_geometry(*inner),
            None => return Ok(None),
        },
        GeoJson::FeatureCollection { features } => {
            Geometry::GeometryCollection(members(features)?)
        }
    };
    Ok(Some(geometry))
}

fn members(objects: Vec<GeoJson>) -> Result<Vec<Geometry>, GeoJsonError> {
    let mut out = Vec::with_capacity(objects.len());
    for object in objects {
        if let Some(g) = to_geometry(object)? {
            out.push(g);
        }
    }
    Ok(out)
}

// ── Writing ───────────────────────────────────────────────────────────────────

fn to_position(c: &Coord) -> Position {
    if c.is_empty() {
        Vec::new()
    } else {
        vec![c.x, c.y]
    }
}

fn to_positions(cs: &[Coord]) -> Vec<Position> {
    cs.iter().map(to_position).collect()
}

fn to_rings(ls: &[CoordList]) -> Vec<Vec<Position>> {
    ls.iter().map(|cs| to_positions(cs)).collect()
}

fn from_geometry(geometry: &Geometry) -> GeoJson {
    match geometry {
        Geometry::Point(c) => GeoJson::Point {
            coordinates: to_position(c),
        },
        Geometry::MultiPoint(cs) => GeoJson::MultiPoint {
            coordinates: to_positions(cs),
        },
        Geometry::LineString(cs) => GeoJson::LineString {
            coordinates: to_positions(cs),
        },
        Geometry::MultiLineString(ls) => GeoJson::MultiLineString {
            coordinates: to_rings(ls),
        },
        Geometry::Polygon(ls) => GeoJson::Polygon {
            coordinates: to_rings(ls),
        },
        Geometry::MultiPolygon(ps) => GeoJson::MultiPolygon {
            coordinates: ps.iter().map(|p| to_rings(p)).collect(),
        },
        Geometry::GeometryCollection(gs) => GeoJson::GeometryCollection {
            geometries: gs.iter().map(from_geometry).collect(),
        },
    }
}
