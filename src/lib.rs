//! Feature-selection engine for thematic OSM exports.
//!
//! A mapping document declares named themes; each theme selects tag keys,
//! enables geometry types, and optionally restricts matching elements
//! with a SQL-subset `where` clause (see [`sql`]). A compiled [`Mapping`]
//! classifies elements into themes, one call per node/way/area:
//!
//! ```
//! use std::collections::HashMap;
//! use thematic::{GeomType, Mapping};
//!
//! let mapping = Mapping::parse(
//!     "
//! buildings:
//!   types:
//!     - polygons
//!   select:
//!     - building
//!   where: building = 'yes'
//! ",
//!     false,
//! )
//! .unwrap();
//!
//! let tags: HashMap<String, String> =
//!     [("building".to_string(), "yes".to_string())].into();
//! assert_eq!(mapping.classify(GeomType::Polygon, &tags), vec!["buildings"]);
//! assert!(mapping.classify(GeomType::Point, &tags).is_empty());
//! ```
//!
//! Compiled mappings are immutable and classification is pure, so one
//! mapping can be shared read-only across worker threads for the whole
//! export run. Reading OSM input and writing GIS output are the
//! surrounding pipeline's concern; this crate only decides which themes
//! an element belongs to.

pub mod mapping;
pub mod sql;

pub use mapping::{GeomType, Mapping, Theme};
pub use sql::{CmpOp, Expr, parse_where};
