use geo::Point;
use geojson::FeatureCollection;

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub value: f64,
}

/// Boundary polygons as loaded, plus region names in feature order.
#[derive(Debug, Clone)]
pub struct Boundaries {
    pub collection: FeatureCollection,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    pub energy_source: Option<String>,
    pub connection_status: Option<String>,
    // kV, None when blank or not numeric
    pub poc_voltage: Option<f64>,
    pub capacity: Option<f64>, // MW
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Substation {
    pub label: String,
    pub position: Point<f64>, // x = lon, y = lat
    pub infeed_voltage: String,
}
