//! Magdump charts as Vega-Lite specifications.
//!
//! A chart is a point plot of simulated cursor and pellet positions next to an interactive legend.
//! Charts are plain JSON so the pages can embed them with vega-embed.
use std::collections::BTreeMap;

use log::debug;
use rand::RngCore;
use serde::Serialize;
use serde_json::{json, Value};

use crate::fire_group::FireGroup;
use crate::simulation::SimulationParams;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

const X: &str = "X";
const Y: &str = "Y";

const BACKGROUND_COLOR: &str = "#343c3d";
const LIGHT_COLOR: &str = "#fff";
const MED_COLOR: &str = "#888";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    Cursor,
    Pellet,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MagdumpPoint {
    #[serde(rename = "FireMode")]
    pub fire_mode: String,
    #[serde(rename = "Time")]
    pub time: u32,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Type")]
    pub point_type: PointType,
}

/// The fixed dimension of a chart.  The other one follows the aspect ratio of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    Height(u32),
    Width(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    /// Bounding box of the points, `None` when there are none.
    #[must_use]
    pub fn of<'a>(points: impl IntoIterator<Item = &'a MagdumpPoint>) -> Option<Extent> {
        points.into_iter().fold(None, |extent, p| {
            Some(match extent {
                None => Extent {
                    min_x: p.x,
                    max_x: p.x,
                    min_y: p.y,
                    max_y: p.y,
                },
                Some(e) => Extent {
                    min_x: e.min_x.min(p.x),
                    max_x: e.max_x.max(p.x),
                    min_y: e.min_y.min(p.y),
                    max_y: e.max_y.max(p.y),
                },
            })
        })
    }

    /// Width and height of a chart of this extent.
    #[must_use]
    pub fn dimensions(&self, sizing: Sizing) -> (u32, u32) {
        let span_x = self.max_x - self.min_x;
        let span_y = self.max_y - self.min_y;
        match sizing {
            Sizing::Height(height) => (scaled(span_x, span_y, height), height),
            Sizing::Width(width) => (width, scaled(span_y, span_x, width)),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(span: f64, fixed_span: f64, size: u32) -> u32 {
    if fixed_span == 0.0 {
        0
    } else {
        (span * f64::from(size) / fixed_span).ceil() as u32
    }
}

/// Vega-Lite config matching the site's dark background.
#[must_use]
pub fn dark_theme() -> Value {
    json!({
        "background": BACKGROUND_COLOR,
        "title": {"color": LIGHT_COLOR},
        "style": {
            "guide-label": {"fill": LIGHT_COLOR},
            "guide-title": {"fill": LIGHT_COLOR},
        },
        "axis": {
            "domainColor": LIGHT_COLOR,
            "gridColor": MED_COLOR,
            "tickColor": LIGHT_COLOR,
        },
    })
}

// Color encoding driven by a legend selection on `field`: unselected values are greyed out.
fn selection_color(field: &str, selection: &str) -> Value {
    json!({
        "condition": {
            "param": selection,
            "field": field,
            "type": "nominal",
            "legend": null,
        },
        "value": "lightgray",
    })
}

/// Point chart of `points` colored by `field`, next to a clickable legend of that field's values.
#[must_use]
pub fn point_chart_with_legend(points: &[MagdumpPoint], field: &str, sizing: Sizing) -> Value {
    let Some(extent) = Extent::of(points) else {
        return Value::Null;
    };
    let (width, height) = extent.dimensions(sizing);
    let selection = format!("{}Selection", field.to_lowercase());
    let color = selection_color(field, &selection);

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "config": dark_theme(),
        "data": {"values": points},
        "hconcat": [
            {
                "mark": "point",
                "params": [{"name": "grid", "select": "interval", "bind": "scales"}],
                "encoding": {
                    "x": {
                        "field": X,
                        "type": "quantitative",
                        "axis": {"title": "horizontal angle (degrees)"},
                        "scale": {"domain": [extent.min_x, extent.max_x], "zero": false},
                    },
                    "y": {
                        "field": Y,
                        "type": "quantitative",
                        "axis": {"title": "vertical angle (degrees)"},
                        "scale": {"domain": [extent.min_y, extent.max_y], "zero": false},
                    },
                    "color": color,
                    "tooltip": [
                        {"field": "Time", "type": "quantitative"},
                        {"field": X, "type": "quantitative"},
                        {"field": Y, "type": "quantitative"},
                    ],
                },
                "width": width,
                "height": height,
            },
            {
                "mark": "point",
                "params": [{
                    "name": selection,
                    "select": {"type": "point", "fields": [field]},
                }],
                "encoding": {
                    "y": {"field": field, "type": "nominal", "axis": {"orient": "right"}},
                    "color": color,
                },
            },
        ],
    })
}

/// Simulate every fire mode of `fire_group` that can fire, `runs` times each, and chart the
/// results.
///
/// Returns the fire group chart of every pellet colored by fire mode, and one chart per simulated
/// fire mode keyed by fire mode id.  Nothing is returned when no fire mode can be simulated.
pub fn generate_magdump_simulation(
    fire_group: &FireGroup,
    runs: u32,
    params: &SimulationParams,
    sizing: Sizing,
    rng: &mut dyn RngCore,
) -> (Option<Value>, BTreeMap<u32, Value>) {
    let mut fire_modes_points: BTreeMap<u32, Vec<MagdumpPoint>> = BTreeMap::new();

    for fire_mode in fire_group
        .fire_modes
        .iter()
        .filter(|fm| fm.max_consecutive_shots > 0)
    {
        let label = fire_mode.legend_label();
        let params = SimulationParams {
            shots: fire_mode.max_consecutive_shots,
            ..params.clone()
        };

        let mut points = Vec::new();
        for _ in 0..runs {
            for sample in fire_mode.simulate_shots(&params, rng) {
                points.push(MagdumpPoint {
                    fire_mode: label.clone(),
                    time: sample.time,
                    x: sample.cursor.0,
                    y: sample.cursor.1,
                    point_type: PointType::Cursor,
                });
                points.extend(sample.pellets.into_iter().map(|(x, y)| MagdumpPoint {
                    fire_mode: label.clone(),
                    time: sample.time,
                    x,
                    y,
                    point_type: PointType::Pellet,
                }));
            }
        }
        fire_modes_points.insert(fire_mode.fire_mode_id, points);
    }

    if fire_modes_points.is_empty() {
        debug!(
            "(generate_magdump_simulation) No fire mode of fire group {} can be simulated.",
            fire_group.fire_group_id
        );
        return (None, BTreeMap::new());
    }

    let fire_modes_charts = fire_modes_points
        .iter()
        .map(|(id, points)| (*id, point_chart_with_legend(points, "Type", sizing)))
        .collect();

    let pellets: Vec<MagdumpPoint> = fire_modes_points
        .into_values()
        .flatten()
        .filter(|p| p.point_type == PointType::Pellet)
        .collect();
    let fire_group_chart = point_chart_with_legend(&pellets, "FireMode", sizing);

    (
        (!fire_group_chart.is_null()).then_some(fire_group_chart),
        fire_modes_charts,
    )
}
