//! Declarative description of the map: ordered layers over a shared viewport.
//!
//! Layers are drawn in order, so the choropleth base comes first and the
//! heatmap and substation markers sit on top of it.

use crate::config::{AppConfig, MapConfig, SubstationConfig};
use crate::types::{Boundaries, ConnectionRecord, Region, Substation};
use geojson::FeatureCollection;

#[derive(Debug, Clone)]
pub struct Scene {
    pub layers: Vec<Layer>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone)]
pub enum Layer {
    Choropleth(ChoroplethLayer),
    Heatmap(HeatmapLayer),
    Points(PointLayer),
}

#[derive(Debug, Clone)]
pub struct ChoroplethLayer {
    pub geometry: FeatureCollection,
    pub feature_id_key: String,
    pub regions: Vec<Region>,
    pub colorscale: String,
    pub z_range: (f64, f64),
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct HeatmapLayer {
    pub lat: Vec<Option<f64>>,
    pub lon: Vec<Option<f64>>,
    pub weight: Vec<Option<f64>>,
    pub radius: u32,
    pub colorscale: String,
    pub opacity: f64,
}

impl HeatmapLayer {
    pub fn len(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PointLayer {
    pub name: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub text: Vec<String>,
    pub size: f64,
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    pub title: String,
    pub style: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

pub fn compose(
    boundaries: &Boundaries,
    pv: &[ConnectionRecord],
    substations: &[Substation],
    config: &AppConfig,
) -> Scene {
    let heatmap = heatmap_layer(pv, &config.map);
    if heatmap.is_empty() {
        tracing::warn!("No PV connections passed the filters, heatmap will be empty");
    }

    let mut layers = vec![
        Layer::Choropleth(choropleth_layer(boundaries, &config.input.region_key, &config.map)),
        Layer::Heatmap(heatmap),
    ];

    if config.substations.include_substations {
        layers.push(Layer::Points(substation_layer(substations, &config.substations)));
    }

    tracing::info!("Composed scene with {} layers", layers.len());

    Scene {
        layers,
        viewport: Viewport {
            title: config.map.title.clone(),
            style: config.map.style.clone(),
            center_lat: config.map.center_lat,
            center_lon: config.map.center_lon,
            zoom: config.map.zoom,
            width: config.map.width,
            height: config.map.height,
        },
    }
}

pub fn choropleth_layer(boundaries: &Boundaries, region_key: &str, map: &MapConfig) -> ChoroplethLayer {
    let regions = boundaries.names.iter()
        .map(|name| Region { name: name.clone(), value: map.default_region_value })
        .collect();

    ChoroplethLayer {
        geometry: boundaries.collection.clone(),
        feature_id_key: format!("properties.{}", region_key),
        regions,
        colorscale: map.region_colorscale.clone(),
        z_range: (0.0, 1.0),
        opacity: map.region_opacity,
    }
}

pub fn heatmap_layer(pv: &[ConnectionRecord], map: &MapConfig) -> HeatmapLayer {
    HeatmapLayer {
        lat: pv.iter().map(|r| r.lat).collect(),
        lon: pv.iter().map(|r| r.lon).collect(),
        weight: pv.iter().map(|r| r.capacity).collect(),
        radius: map.heatmap_radius,
        colorscale: map.heatmap_colorscale.clone(),
        opacity: map.heatmap_opacity,
    }
}

pub fn substation_layer(substations: &[Substation], config: &SubstationConfig) -> PointLayer {
    PointLayer {
        name: "Substations".to_string(),
        lat: substations.iter().map(|s| s.position.y()).collect(),
        lon: substations.iter().map(|s| s.position.x()).collect(),
        text: substations.iter().map(|s| s.label.clone()).collect(),
        size: config.marker_size,
        color: config.marker_color.clone(),
        opacity: config.marker_opacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn boundaries(names: &[&str]) -> Boundaries {
        Boundaries {
            collection: FeatureCollection {
                bbox: None,
                features: vec![],
                foreign_members: None,
            },
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn substation(label: &str, lon: f64, lat: f64) -> Substation {
        Substation {
            label: label.to_string(),
            position: Point::new(lon, lat),
            infeed_voltage: "33kV".to_string(),
        }
    }

    #[test]
    fn test_choropleth_uses_boundary_order_and_default_value() {
        let scene = compose(&boundaries(&["Wigan", "Bolton", "Bury"]), &[], &[], &AppConfig::default());

        let Layer::Choropleth(layer) = &scene.layers[0] else {
            panic!("first layer must be the choropleth");
        };
        let names: Vec<&str> = layer.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Wigan", "Bolton", "Bury"]);
        assert!(layer.regions.iter().all(|r| r.value == 0.0));
        assert_eq!(layer.feature_id_key, "properties.local_authority");
        assert_eq!(layer.z_range, (0.0, 1.0));
        assert_eq!(layer.opacity, 0.6);
    }

    #[test]
    fn test_default_region_value_is_configurable() {
        let mut config = AppConfig::default();
        config.map.default_region_value = 0.5;
        let layer = choropleth_layer(&boundaries(&["A"]), "local_authority", &config.map);
        assert_eq!(layer.regions[0].value, 0.5);
    }

    #[test]
    fn test_heatmap_weights_by_capacity() {
        let pv = vec![ConnectionRecord {
            energy_source: Some("PV".into()),
            connection_status: Some("CONNECTED".into()),
            poc_voltage: Some(0.4),
            capacity: Some(0.0035),
            lat: Some(53.7),
            lon: None,
        }];
        let layer = heatmap_layer(&pv, &MapConfig::default());
        assert_eq!(layer.len(), 1);
        assert!(!layer.is_empty());
        assert!(heatmap_layer(&[], &MapConfig::default()).is_empty());
        assert_eq!(layer.weight, vec![Some(0.0035)]);
        assert_eq!(layer.lon, vec![None]);
        assert_eq!(layer.radius, 30);
        assert_eq!(layer.opacity, 0.7);
    }

    #[test]
    fn test_substations_left_out_by_default() {
        let subs = vec![substation("Bredbury", -2.11, 53.42)];
        let scene = compose(&boundaries(&["A"]), &[], &subs, &AppConfig::default());
        assert_eq!(scene.layers.len(), 2);
        assert!(!scene.layers.iter().any(|l| matches!(l, Layer::Points(_))));
    }

    #[test]
    fn test_substation_layer_when_enabled() {
        let mut config = AppConfig::default();
        config.substations.include_substations = true;
        let subs = vec![substation("Bredbury", -2.11, 53.42), substation("Kearsley", -2.37, 53.54)];

        let scene = compose(&boundaries(&["A"]), &[], &subs, &config);
        assert_eq!(scene.layers.len(), 3);
        let Layer::Points(points) = &scene.layers[2] else {
            panic!("last layer must be the substation markers");
        };
        assert_eq!(points.text, vec!["Bredbury", "Kearsley"]);
        assert_eq!(points.lat, vec![53.42, 53.54]);
        assert_eq!(points.lon, vec![-2.11, -2.37]);
        assert_eq!(points.size, 10.0);
        assert_eq!(points.color, "red");
    }

    #[test]
    fn test_viewport_defaults() {
        let scene = compose(&boundaries(&[]), &[], &[], &AppConfig::default());
        let v = &scene.viewport;
        assert_eq!(v.style, "open-street-map");
        assert_eq!((v.center_lat, v.center_lon), (53.483959, -2.244644));
        assert_eq!(v.zoom, 6.0);
        assert_eq!((v.width, v.height), (800, 900));
        assert_eq!(v.title, "PV Energy Generation Heatmap with Substations");
    }
}
