use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;

use thematic::{GeomType, Mapping, Theme};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Mapping file (YAML)
    #[arg(short, long)]
    pub mapping: PathBuf,

    /// Emit osm_id columns for themes that do not override it in 'select'
    #[arg(long)]
    pub osm_id: bool,

    /// Print the theme summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Classify one element instead of printing the summary: its geometry type
    #[arg(long, value_enum)]
    pub geom: Option<GeomArg>,

    /// Tag for the classified element, in key=value form (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum GeomArg {
    Point,
    Line,
    Polygon,
}

impl From<GeomArg> for GeomType {
    fn from(geom: GeomArg) -> GeomType {
        match geom {
            GeomArg::Point => GeomType::Point,
            GeomArg::Line => GeomType::Line,
            GeomArg::Polygon => GeomType::Polygon,
        }
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cli.mapping)
        .with_context(|| format!("CLI: Failed to read mapping file {}", cli.mapping.display()))?;

    let mapping = match Mapping::parse(&text, cli.osm_id) {
        Ok(mapping) => mapping,
        Err(errors) => {
            for error in &errors {
                eprintln!("{}", error);
            }
            bail!("mapping file {} is invalid", cli.mapping.display());
        }
    };

    tracing::info!(
        "Mapping: {} themes, {} distinct keys",
        mapping.themes.len(),
        mapping.key_union(None).len()
    );

    if let Some(geom) = cli.geom {
        let tags = parse_tag_args(&cli.tags)?;
        for name in mapping.classify(geom.into(), &tags) {
            println!("{}", name);
        }
        return Ok(());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summarize(&mapping))?);
    } else {
        print_summary(&mapping);
    }

    Ok(())
}

fn parse_tag_args(args: &[String]) -> Result<HashMap<String, String>> {
    let mut tags = HashMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("CLI: Tag {:?} is not in key=value form", arg))?;
        tags.insert(key.to_string(), value.to_string());
    }
    Ok(tags)
}

fn enabled_types(theme: &Theme) -> Vec<&'static str> {
    let mut types = Vec::new();
    if theme.points {
        types.push("points");
    }
    if theme.lines {
        types.push("lines");
    }
    if theme.polygons {
        types.push("polygons");
    }
    types
}

fn summarize(mapping: &Mapping) -> serde_json::Value {
    let themes: Vec<serde_json::Value> = mapping
        .themes
        .iter()
        .map(|theme| {
            serde_json::json!({
                "name": theme.name,
                "slug": theme.slug(),
                "types": enabled_types(theme),
                "keys": theme.keys,
                "osm_id": theme.osm_id,
                "where": theme.matcher.to_sql(),
            })
        })
        .collect();

    serde_json::json!({
        "themes": themes,
        "layers": mapping.layer_names(),
        "key_union": mapping.key_union(None),
    })
}

fn print_summary(mapping: &Mapping) {
    for theme in &mapping.themes {
        println!("{} [{}]", theme.name, enabled_types(theme).join(", "));
        println!("  keys: {}", theme.keys.join(", "));
        if theme.osm_id {
            println!("  osm_id: true");
        }
        println!("  where: {}", theme.matcher.to_sql());
    }
    println!("layers: {}", mapping.layer_names().join(", "));
    println!("key union: {}", mapping.key_union(None).join(", "));
}
