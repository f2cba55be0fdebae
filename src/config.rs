use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub columns: ColumnConfig,
    pub filter: FilterConfig,
    pub substations: SubstationConfig,
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub boundaries: PathBuf,
    pub substations: PathBuf,
    pub connections_less_1mw: PathBuf,
    pub connections_more_1mw: PathBuf,
    pub region_key: String, // GeoJSON property holding the region name
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            boundaries: PathBuf::from("INPUT/ENWL_LA.geojson"),
            substations: PathBuf::from("INPUT/ENWL_Sub_Location.geojson"),
            connections_less_1mw: PathBuf::from("MANUAL_DATASET/DGDB_less1MW_Cleansed.xlsx"),
            connections_more_1mw: PathBuf::from("MANUAL_DATASET/DGDB_more1MW_Cleansed.xlsx"),
            region_key: "local_authority".to_string(),
        }
    }
}

/// Spreadsheet headers for the connection register.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnConfig {
    pub energy_source: String,
    pub connection_status: String,
    pub poc_voltage: String,
    /// Long source header, renamed to `capacity` on load.
    pub capacity: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            energy_source: "Energy Source 1".to_string(),
            connection_status: "Connection Status".to_string(),
            poc_voltage: "POC Voltage (kV)".to_string(),
            capacity: "Energy Source & Energy Conversion Technology 1 - Registered Capacity (MW)"
                .to_string(),
            latitude: "lat".to_string(),
            longitude: "long".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterConfig {
    pub energy_source: String,
    pub connection_status: String,
    /// Inclusive upper bound in kV; the lower bound is always exclusive zero.
    pub max_poc_voltage_kv: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            energy_source: "PV".to_string(),
            connection_status: "CONNECTED".to_string(),
            max_poc_voltage_kv: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SubstationConfig {
    pub include_substations: bool,
    pub infeed_voltage: String,
    pub voltage_property: String,
    pub label_property: String,
    pub fallback_label: String,
    pub marker_size: f64,
    pub marker_color: String,
    pub marker_opacity: f64,
}

impl Default for SubstationConfig {
    fn default() -> Self {
        Self {
            include_substations: false,
            infeed_voltage: "33kV".to_string(),
            voltage_property: "infeed_voltage".to_string(),
            label_property: "spn".to_string(),
            fallback_label: "Unnamed Substation".to_string(),
            marker_size: 10.0,
            marker_color: "red".to_string(),
            marker_opacity: 0.8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    pub style: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
    pub default_region_value: f64,
    pub region_colorscale: String,
    pub region_opacity: f64,
    pub heatmap_colorscale: String,
    pub heatmap_radius: u32,
    pub heatmap_opacity: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "PV Energy Generation Heatmap with Substations".to_string(),
            style: "open-street-map".to_string(),
            center_lat: 53.483959,
            center_lon: -2.244644,
            zoom: 6.0,
            width: 800,
            height: 900,
            default_region_value: 0.0,
            region_colorscale: "Blues".to_string(),
            region_opacity: 0.6,
            heatmap_colorscale: "Rainbow".to_string(),
            heatmap_radius: 30,
            heatmap_opacity: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8050 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Like `load_from_file`, but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(!config.substations.include_substations);
        assert_eq!(config.map.default_region_value, 0.0);
        assert_eq!(config.map.zoom, 6.0);
        assert_eq!(config.map.width, 800);
        assert_eq!(config.map.height, 900);
        assert_eq!(config.filter.energy_source, "PV");
        assert_eq!(config.filter.max_poc_voltage_kv, 1.0);
        assert_eq!(config.input.region_key, "local_authority");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [substations]
            include_substations = true

            [map]
            zoom = 8.0
            "#,
        )
        .unwrap();
        assert!(config.substations.include_substations);
        assert_eq!(config.substations.infeed_voltage, "33kV");
        assert_eq!(config.map.zoom, 8.0);
        assert_eq!(config.map.style, "open-street-map");
        assert_eq!(config.server.port, 8050);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = Path::new("definitely/not/here.toml");
        assert!(AppConfig::load_from_file(path).is_err());
        assert!(AppConfig::load_or_default(path).is_ok());
    }
}
