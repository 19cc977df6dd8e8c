//! Theme registry: mapping document validation and per-element classification.

use std::collections::{BTreeSet, HashMap};

use serde_yaml::Value;

use crate::sql::{Expr, parse_where};

/// Spatial representation an OSM element takes for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomType {
    Point,
    Line,
    Polygon,
}

/// One named output classification rule, compiled from a mapping document.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub points: bool,
    pub lines: bool,
    pub polygons: bool,
    /// Selected tag keys in declaration order, duplicates dropped.
    /// Never empty and never contains the synthetic `osm_id` entry.
    pub keys: Vec<String>,
    /// Emit the element's signed OSM id as a synthetic column.
    pub osm_id: bool,
    /// Compiled tag predicate. With no `where` clause this is the union
    /// of "key present" over every selected key.
    pub matcher: Expr,
    /// Theme keys other than select/where/types, passed through verbatim
    /// for downstream writers.
    pub extra: serde_yaml::Mapping,
}

impl Theme {
    /// Whether this theme emits layers for `geom` at all.
    pub fn enables(&self, geom: GeomType) -> bool {
        match geom {
            GeomType::Point => self.points,
            GeomType::Line => self.lines,
            GeomType::Polygon => self.polygons,
        }
    }

    /// Geometry gate first, then the compiled predicate.
    pub fn matches(&self, geom: GeomType, tags: &HashMap<String, String>) -> bool {
        self.enables(geom) && self.matcher.matches(tags)
    }

    /// Snake-case slug for layer and file names.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for c in self.name.to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }
        slug.trim_end_matches('_').to_string()
    }
}

/// The full ordered collection of themes compiled from one document.
///
/// Declaration order is preserved: it is both classification order and
/// output-layer emission order. Compiled mappings are immutable and may
/// be shared read-only across any number of worker threads.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub themes: Vec<Theme>,
}

impl Mapping {
    /// Parse and validate a mapping document.
    ///
    /// `default_osm_id` decides whether themes emit the synthetic
    /// `osm_id` column when their `select` does not mention it.
    ///
    /// Returns either a fully compiled mapping or a non-empty list of
    /// messages suitable for direct display to the document's author.
    /// Validation stops at the first violation.
    pub fn parse(text: &str, default_osm_id: bool) -> Result<Mapping, Vec<String>> {
        let doc: Value = match serde_yaml::from_str(text) {
            Ok(doc) => doc,
            Err(e) => return Err(vec![e.to_string()]),
        };

        if let Some(error) = find_tagged(&doc) {
            return Err(vec![error]);
        }

        let root = match doc {
            Value::Null => return Err(vec!["YAML cannot be empty".to_string()]),
            Value::Mapping(m) if m.is_empty() => {
                return Err(vec!["YAML cannot be empty".to_string()]);
            }
            Value::Mapping(m) => m,
            _ => return Err(vec!["YAML must be dict, not list".to_string()]),
        };

        let mut themes = Vec::with_capacity(root.len());
        for (name, body) in &root {
            match build_theme(name, body, default_osm_id) {
                Ok(theme) => themes.push(theme),
                Err(error) => return Err(vec![error]),
            }
        }

        tracing::debug!("compiled mapping with {} themes", themes.len());
        Ok(Mapping { themes })
    }

    /// Names of the themes accepting this element, in declaration order.
    /// Checks are independent: an element may land in zero, one, or many
    /// themes.
    pub fn classify(&self, geom: GeomType, tags: &HashMap<String, String>) -> Vec<&str> {
        self.themes
            .iter()
            .filter(|theme| theme.matches(geom, tags))
            .map(|theme| theme.name.as_str())
            .collect()
    }

    /// Sorted union of every selected key plus every key referenced by a
    /// `where` clause, optionally restricted to themes enabling `geom`.
    pub fn key_union(&self, geom: Option<GeomType>) -> Vec<String> {
        let mut keys = BTreeSet::new();
        for theme in &self.themes {
            if let Some(geom) = geom {
                if !theme.enables(geom) {
                    continue;
                }
            }
            keys.extend(theme.keys.iter().cloned());
            keys.extend(theme.matcher.column_names());
        }
        keys.into_iter().collect()
    }

    /// `<slug>_<geometry>` for every enabled geometry type of every
    /// theme, in declaration order. Downstream writers use these to name
    /// output layers and files.
    pub fn layer_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for theme in &self.themes {
            let slug = theme.slug();
            if theme.points {
                names.push(format!("{}_points", slug));
            }
            if theme.lines {
                names.push(format!("{}_lines", slug));
            }
            if theme.polygons {
                names.push(format!("{}_polygons", slug));
            }
        }
        names
    }
}

/// YAML tags would let a document smuggle typed constructors; reject any
/// document containing one before looking at its shape.
fn find_tagged(value: &Value) -> Option<String> {
    match value {
        Value::Tagged(tagged) => Some(format!("YAML tag {} is not allowed", tagged.tag)),
        Value::Sequence(seq) => seq.iter().find_map(find_tagged),
        Value::Mapping(map) => map
            .iter()
            .find_map(|(k, v)| find_tagged(k).or_else(|| find_tagged(v))),
        _ => None,
    }
}

fn valid_theme_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace())
}

/// Render a YAML scalar for an error message.
fn describe(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => serde_yaml::to_string(value)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}

fn build_theme(name: &Value, body: &Value, default_osm_id: bool) -> Result<Theme, String> {
    let name = match name.as_str() {
        Some(s) if valid_theme_name(s) => s.to_string(),
        _ => {
            return Err(
                "Each theme must be named using only characters, numbers, underscores and spaces"
                    .to_string(),
            );
        }
    };

    let body = match body {
        Value::Mapping(m) => m,
        Value::Sequence(_) => {
            return Err(format!(
                "Theme '{}' must be a dict; put 'select' and 'types' under the theme name, not as list items",
                name
            ));
        }
        _ => return Err("Each theme must have a 'select' key".to_string()),
    };

    let mut points = true;
    let mut lines = true;
    let mut polygons = true;
    if let Some(types) = body.get("types") {
        points = false;
        lines = false;
        polygons = false;
        let entries = match types {
            Value::Sequence(entries) => entries,
            other => {
                return Err(format!(
                    "types must be one or more of points, lines or polygons, got: {}",
                    describe(other)
                ));
            }
        };
        for entry in entries {
            match entry.as_str() {
                Some("points") => points = true,
                Some("lines") => lines = true,
                Some("polygons") => polygons = true,
                _ => {
                    return Err(format!(
                        "types must be one or more of points, lines or polygons, got: {}",
                        describe(entry)
                    ));
                }
            }
        }
    }

    let select = body
        .get("select")
        .ok_or_else(|| "Each theme must have a 'select' key".to_string())?;
    let entries = match select {
        Value::Null => return Err("'select' cannot be empty".to_string()),
        Value::Sequence(entries) => entries,
        _ => return Err("'select' children must be list elements (e.g. '- amenity')".to_string()),
    };
    if entries.is_empty() {
        return Err("'select' cannot be empty".to_string());
    }

    let mut keys: Vec<String> = Vec::with_capacity(entries.len());
    let mut osm_id = default_osm_id;
    for entry in entries {
        let key = match entry.as_str() {
            Some(s) if !s.is_empty() => s,
            _ => return Err("Missing OSM key".to_string()),
        };
        // osm_id is a synthetic column, not a tag key
        if key == "osm_id" {
            osm_id = true;
            continue;
        }
        // duplicates collapse to the first occurrence
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    if keys.is_empty() {
        return Err("'select' must include at least one key besides osm_id".to_string());
    }

    let matcher = match body.get("where") {
        Some(where_value) => {
            let clauses: Vec<&str> = match where_value {
                Value::Null => {
                    return Err("if 'where' key is specified, it must not be empty".to_string());
                }
                Value::Sequence(entries) if entries.is_empty() => {
                    return Err("if 'where' key is specified, it must not be empty".to_string());
                }
                Value::Sequence(entries) => {
                    let mut clauses = Vec::with_capacity(entries.len());
                    for entry in entries {
                        match entry.as_str() {
                            Some(clause) => clauses.push(clause),
                            None => {
                                return Err(
                                    "'where' must be a SQL string or list of SQL strings"
                                        .to_string(),
                                );
                            }
                        }
                    }
                    clauses
                }
                other => match other.as_str() {
                    Some(clause) => vec![clause],
                    None => {
                        return Err(
                            "'where' must be a SQL string or list of SQL strings".to_string()
                        );
                    }
                },
            };

            let mut matcher = Expr::null();
            for clause in clauses {
                let expr = parse_where(clause)
                    .map_err(|error| format!("SQL ({}) is invalid: {}", clause, error))?;
                matcher = matcher.union(expr);
            }
            matcher
        }
        None => {
            // any selected tag present
            let mut matcher = Expr::null();
            for key in &keys {
                matcher = matcher.union(Expr::any(key.clone()));
            }
            matcher
        }
    };

    let mut extra = serde_yaml::Mapping::new();
    for (key, value) in body {
        if matches!(key.as_str(), Some("select") | Some("where") | Some("types")) {
            continue;
        }
        extra.insert(key.clone(), value.clone());
    }

    Ok(Theme {
        name,
        points,
        lines,
        polygons,
        keys,
        osm_id,
        matcher,
        extra,
    })
}
