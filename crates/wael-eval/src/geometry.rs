//! Geometry values and coordinate helpers.
//!
//! Geometries are immutable: every transform rebuilds the structure and
//! returns a new value.

use wael_types::ast::GeometryKind;

/// A single coordinate pair.
///
/// `NaN` coordinates mark an empty point; two `NaN` components compare
/// equal so `POINT EMPTY` round-trips.
#[derive(Debug, Clone, Copy)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const EMPTY: Coord = Coord {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        same(self.x, other.x) && same(self.y, other.y)
    }
}

/// A ring or line: an ordered list of coordinates.
pub type CoordList = Vec<Coord>;

/// Every geometry kind of the language.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(CoordList),
    LineString(CoordList),
    MultiLineString(Vec<CoordList>),
    Polygon(Vec<CoordList>),
    MultiPolygon(Vec<Vec<CoordList>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::new(x, y))
    }

    /// The empty geometry of a kind (`POINT EMPTY`, `LINESTRING EMPTY`, ...).
    pub fn empty(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Point => Geometry::Point(Coord::EMPTY),
            GeometryKind::MultiPoint => Geometry::MultiPoint(Vec::new()),
            GeometryKind::LineString => Geometry::LineString(Vec::new()),
            GeometryKind::MultiLineString => Geometry::MultiLineString(Vec::new()),
            GeometryKind::Polygon => Geometry::Polygon(Vec::new()),
            GeometryKind::MultiPolygon => Geometry::MultiPolygon(Vec::new()),
            GeometryKind::GeometryCollection => Geometry::GeometryCollection(Vec::new()),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(c) => c.is_empty(),
            Geometry::MultiPoint(cs) | Geometry::LineString(cs) => cs.is_empty(),
            Geometry::MultiLineString(ls) | Geometry::Polygon(ls) => ls.is_empty(),
            Geometry::MultiPolygon(ps) => ps.is_empty(),
            Geometry::GeometryCollection(gs) => gs.is_empty(),
        }
    }

    /// Returns the coordinate of a point.
    pub fn as_point(&self) -> Option<Coord> {
        match self {
            Geometry::Point(c) => Some(*c),
            _ => None,
        }
    }

    /// The ordered element sequence of an array-like geometry.
    ///
    /// `LineString` and `MultiPoint` yield one `Point` per coordinate,
    /// `GeometryCollection` yields its members. Other kinds yield `None`.
    pub fn array_items(&self) -> Option<Vec<Geometry>> {
        match self {
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => {
                Some(cs.iter().copied().map(Geometry::Point).collect())
            }
            Geometry::GeometryCollection(gs) => Some(gs.clone()),
            _ => None,
        }
    }

    /// The coordinates of an array-like geometry made only of points.
    ///
    /// Used wherever a collection stands in for a ring or a line.
    pub fn point_list(&self) -> Option<CoordList> {
        match self {
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => Some(cs.clone()),
            Geometry::GeometryCollection(gs) => gs.iter().map(Geometry::as_point).collect(),
            _ => None,
        }
    }

    /// Rebuild the geometry with every coordinate passed through `f`.
    ///
    /// Nested collections are walked recursively; the structure is kept.
    pub fn try_map_coords<E, F>(&self, f: &mut F) -> Result<Geometry, E>
    where
        F: FnMut(Coord) -> Result<Coord, E>,
    {
        fn list<E, F>(cs: &[Coord], f: &mut F) -> Result<CoordList, E>
        where
            F: FnMut(Coord) -> Result<Coord, E>,
        {
            cs.iter().map(|c| f(*c)).collect()
        }
        fn lists<E, F>(ls: &[CoordList], f: &mut F) -> Result<Vec<CoordList>, E>
        where
            F: FnMut(Coord) -> Result<Coord, E>,
        {
            ls.iter().map(|cs| list(cs, f)).collect()
        }

        Ok(match self {
            Geometry::Point(c) => Geometry::Point(f(*c)?),
            Geometry::MultiPoint(cs) => Geometry::MultiPoint(list(cs, f)?),
            Geometry::LineString(cs) => Geometry::LineString(list(cs, f)?),
            Geometry::MultiLineString(ls) => Geometry::MultiLineString(lists(ls, f)?),
            Geometry::Polygon(ls) => Geometry::Polygon(lists(ls, f)?),
            Geometry::MultiPolygon(ps) => Geometry::MultiPolygon(
                ps.iter()
                    .map(|rings| lists(rings, f))
                    .collect::<Result<_, E>>()?,
            ),
            Geometry::GeometryCollection(gs) => Geometry::GeometryCollection(
                gs.iter()
                    .map(|g| g.try_map_coords(f))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }

    /// Infallible form of [`Geometry::try_map_coords`].
    pub fn map_coords(&self, mut f: impl FnMut(Coord) -> Coord) -> Geometry {
        let mapped: Result<Geometry, std::convert::Infallible> =
            self.try_map_coords(&mut |c| Ok(f(c)));
        match mapped {
            Ok(g) => g,
            Err(never) => match never {},
        }
    }

    /// Recursively flatten nested collections into one flat collection.
    ///
    /// Non-collection geometries are returned unchanged.
    pub fn flatten(&self) -> Geometry {
        fn collect(g: &Geometry, out: &mut Vec<Geometry>) {
            match g {
                Geometry::GeometryCollection(gs) => gs.iter().for_each(|g| collect(g, out)),
                other => out.push(other.clone()),
            }
        }
        match self {
            Geometry::GeometryCollection(_) => {
                let mut out = Vec::new();
                collect(self, &mut out);
                Geometry::GeometryCollection(out)
            }
            other => other.clone(),
        }
    }
}
