use crate::config::{FilterConfig, SubstationConfig};
use crate::types::{ConnectionRecord, Substation};
use geojson::FeatureCollection;

/// Keeps connected PV records on low voltage, i.e. with a known point of
/// connection voltage in `(0, max_poc_voltage_kv]`.
///
/// Registered capacity is not bounded here. Records without coordinates are
/// kept; the renderer skips them.
pub fn filter_pv(records: &[ConnectionRecord], config: &FilterConfig) -> Vec<ConnectionRecord> {
    let pv: Vec<ConnectionRecord> = records.iter()
        .filter(|r| r.energy_source.as_deref() == Some(config.energy_source.as_str()))
        .filter(|r| r.connection_status.as_deref() == Some(config.connection_status.as_str()))
        .filter(|r| is_low_voltage(r.poc_voltage, config.max_poc_voltage_kv))
        .cloned()
        .collect();

    tracing::info!("{} of {} connection records kept for the heatmap", pv.len(), records.len());
    pv
}

pub fn is_low_voltage(poc_voltage: Option<f64>, max_kv: f64) -> bool {
    matches!(poc_voltage, Some(kv) if kv > 0.0 && kv <= max_kv)
}

/// Substations whose infeed voltage class equals the configured target, in
/// collection order.
pub fn select_substations(collection: &FeatureCollection, config: &SubstationConfig) -> Vec<Substation> {
    let mut selected = Vec::new();

    for (i, feature) in collection.features.iter().enumerate() {
        let voltage = match feature.property(&config.voltage_property) {
            Some(serde_json::Value::String(v)) if *v == config.infeed_voltage => v.clone(),
            _ => continue,
        };

        let position = match &feature.geometry {
            Some(geom) => match geo::Geometry::<f64>::try_from(geom.value.clone()) {
                Ok(geo::Geometry::Point(p)) => p,
                _ => {
                    tracing::warn!("Substation feature {} is not a point, skipping", i);
                    continue;
                }
            },
            None => {
                tracing::warn!("Substation feature {} has no geometry, skipping", i);
                continue;
            }
        };

        // Null labels are treated like missing ones.
        let label = match feature.property(&config.label_property) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => config.fallback_label.clone(),
            Some(other) => other.to_string(),
        };

        selected.push(Substation { label, position, infeed_voltage: voltage });
    }

    tracing::debug!("Selected {} substations at {}", selected.len(), config.infeed_voltage);
    selected
}
