use crate::scene::{ChoroplethLayer, HeatmapLayer, Layer, PointLayer, Scene, Viewport};
use anyhow::{Context, Result};
use serde_json::{json, Value};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

// ColorBrewer sequential Blues. plotly.js ships a different built-in "Blues"
// that starts at dark blue, so this one is written out stop by stop.
const BLUES: [&str; 9] = [
    "rgb(247,251,255)",
    "rgb(222,235,247)",
    "rgb(198,219,239)",
    "rgb(158,202,225)",
    "rgb(107,174,214)",
    "rgb(66,146,198)",
    "rgb(33,113,181)",
    "rgb(8,81,156)",
    "rgb(8,48,107)",
];

/// Plotly figure (`data` + `layout`) for the scene. Missing heatmap values
/// are written as `null`, which plotly skips.
pub fn to_figure(scene: &Scene) -> Result<Value> {
    let data = scene.layers.iter()
        .map(|layer| match layer {
            Layer::Choropleth(l) => choropleth_trace(l),
            Layer::Heatmap(l) => Ok(density_trace(l)),
            Layer::Points(l) => Ok(scatter_trace(l)),
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(json!({
        "data": data,
        "layout": layout(&scene.viewport),
    }))
}

fn choropleth_trace(layer: &ChoroplethLayer) -> Result<Value> {
    let geojson = serde_json::to_value(&layer.geometry)
        .context("Failed to serialise boundary geometry")?;
    let locations: Vec<&str> = layer.regions.iter().map(|r| r.name.as_str()).collect();
    let z: Vec<f64> = layer.regions.iter().map(|r| r.value).collect();

    Ok(json!({
        "type": "choroplethmapbox",
        "geojson": geojson,
        "featureidkey": layer.feature_id_key,
        "locations": locations,
        "z": z,
        "colorscale": colorscale(&layer.colorscale),
        "zmin": layer.z_range.0,
        "zmax": layer.z_range.1,
        "marker": { "opacity": layer.opacity },
        "hoverinfo": "location",
    }))
}

/// Named scales plotly.js would resolve differently are expanded into
/// explicit `[position, color]` stops; anything else is passed by name.
fn colorscale(name: &str) -> Value {
    match name {
        "Blues" => {
            let last = (BLUES.len() - 1) as f64;
            let stops: Vec<Value> = BLUES.iter().enumerate()
                .map(|(i, color)| json!([i as f64 / last, color]))
                .collect();
            Value::Array(stops)
        }
        _ => Value::String(name.to_string()),
    }
}

fn density_trace(layer: &HeatmapLayer) -> Value {
    json!({
        "type": "densitymapbox",
        "lat": layer.lat,
        "lon": layer.lon,
        "z": layer.weight,
        "radius": layer.radius,
        "colorscale": layer.colorscale,
        "opacity": layer.opacity,
    })
}

fn scatter_trace(layer: &PointLayer) -> Value {
    json!({
        "type": "scattermapbox",
        "mode": "markers",
        "name": layer.name,
        "lat": layer.lat,
        "lon": layer.lon,
        "text": layer.text,
        "hoverinfo": "text",
        "marker": {
            "size": layer.size,
            "color": layer.color,
            "opacity": layer.opacity,
        },
    })
}

fn layout(viewport: &Viewport) -> Value {
    json!({
        "title": { "text": viewport.title },
        "width": viewport.width,
        "height": viewport.height,
        "mapbox": {
            "style": viewport.style,
            "center": { "lat": viewport.center_lat, "lon": viewport.center_lon },
            "zoom": viewport.zoom,
        },
    })
}

/// Standalone page drawing the figure with plotly.js.
pub fn to_html(scene: &Scene) -> Result<String> {
    let figure = to_figure(scene)?;
    // Keep "</script>" inside string values from closing the tag early.
    let figure = serde_json::to_string(&figure)?.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_JS}"></script>
</head>
<body>
<div id="map"></div>
<script>
const figure = {figure};
Plotly.newPlot("map", figure.data, figure.layout);
</script>
</body>
</html>
"#,
        title = escape_html(&scene.viewport.title),
    ))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
