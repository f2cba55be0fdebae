use crate::config::{AppConfig, ColumnConfig};
use crate::table::{load_table, Table};
use crate::types::{Boundaries, ConnectionRecord};
use anyhow::{Context, Result, anyhow};
use geojson::{FeatureCollection, GeoJson};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Internal name of the registered capacity column after merging.
pub const CAPACITY_COLUMN: &str = "capacity";

pub struct Inputs {
    pub boundaries: Boundaries,
    pub substations: FeatureCollection,
    pub connections: Vec<ConnectionRecord>,
}

pub fn load_inputs(config: &AppConfig) -> Result<Inputs> {
    let boundaries = load_boundaries(&config.input.boundaries, &config.input.region_key)?;
    tracing::info!("Loaded {} regions", boundaries.names.len());

    let substations = load_substations(&config.input.substations)?;
    tracing::info!("Loaded {} substation features", substations.features.len());

    let connections = load_connections(
        &config.input.connections_less_1mw,
        &config.input.connections_more_1mw,
        &config.columns,
    )?;
    tracing::info!("Loaded {} connection records", connections.len());

    Ok(Inputs { boundaries, substations, connections })
}

pub fn load_boundaries(path: &Path, region_key: &str) -> Result<Boundaries> {
    let collection = load_feature_collection(path)?;
    let names = region_names(&collection, region_key)
        .with_context(|| format!("Invalid boundary dataset: {:?}", path))?;
    Ok(Boundaries { collection, names })
}

pub fn load_substations(path: &Path) -> Result<FeatureCollection> {
    load_feature_collection(path)
}

fn load_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    parse_feature_collection(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON file: {:?}", path))
}

pub fn parse_feature_collection<R: Read>(reader: R) -> Result<FeatureCollection> {
    match GeoJson::from_reader(reader)? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(anyhow!("GeoJSON must be a FeatureCollection")),
    }
}

/// Region names in feature order, exactly as written in the properties.
pub fn region_names(collection: &FeatureCollection, region_key: &str) -> Result<Vec<String>> {
    collection.features.iter().enumerate()
        .map(|(i, feature)| match feature.property(region_key) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(anyhow!("Feature {} has non-string '{}': {}", i, region_key, other)),
            None => Err(anyhow!("Feature {} has no '{}' property", i, region_key)),
        })
        .collect()
}

/// Loads both register extracts, normalises the capacity header and merges
/// them: rows of `less` first, then `more`. Nothing is deduplicated.
pub fn load_connections(less: &Path, more: &Path, columns: &ColumnConfig) -> Result<Vec<ConnectionRecord>> {
    let mut less = load_table(less)?;
    let mut more = load_table(more)?;
    less.rename_column(&columns.capacity, CAPACITY_COLUMN);
    more.rename_column(&columns.capacity, CAPACITY_COLUMN);

    let merged = less.concat(more);
    to_records(&merged, columns)
}

pub fn to_records(table: &Table, columns: &ColumnConfig) -> Result<Vec<ConnectionRecord>> {
    let index = |name: &str| {
        table.column_index(name)
            .ok_or_else(|| anyhow!("Column '{}' not found in connection data", name))
    };

    let source = index(&columns.energy_source)?;
    let status = index(&columns.connection_status)?;
    let voltage = index(&columns.poc_voltage)?;
    let capacity = index(CAPACITY_COLUMN)?;
    let lat = index(&columns.latitude)?;
    let lon = index(&columns.longitude)?;

    let records = table.rows.iter()
        .map(|row| ConnectionRecord {
            energy_source: row[source].as_text().map(str::to_string),
            connection_status: row[status].as_text().map(str::to_string),
            poc_voltage: row[voltage].as_number(),
            capacity: row[capacity].as_number(),
            lat: row[lat].as_number(),
            lon: row[lon].as_number(),
        })
        .collect();

    Ok(records)
}
