//! WAEL tree-walking evaluator.
//!
//! Runs parsed WAEL programs over 2D geometry values. A [`Session`] holds
//! the scope arena and its global frame; each call to
//! [`Session::evaluate`] parses one program and returns its last value.
//!
//! ```ignore
//! let mut session = wael_eval::create_global_scope();
//! let value = session.evaluate("Point(1 1) + 1")?;
//! assert_eq!(value.to_string(), "POINT (2 2)");
//! ```

pub mod builtins;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod geojson;
pub mod geometry;
mod import;
pub mod ops;
pub mod session;
pub mod value;
mod wkt;

pub use env::{ScopeId, Scopes};
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use geojson::{parse_geojson, to_geojson, GeoJsonError};
pub use geometry::{Coord, CoordList, Geometry};
pub use session::{create_global_scope, evaluate, EvalOptions, Session, LAST_RESULT};
pub use value::{FunctionValue, ModuleFields, Value, DEFAULT_EXPORT};
