//! Chart parameter validation.
//!
//! Checks that the parameters a chart request carries are complete for its
//! chart type before any data is aggregated. Each chart type declares its
//! required parameters; chart types without a rule are always valid.

use serde::{Deserialize, Serialize};

// ============================================================================
// Core Types
// ============================================================================

/// Chart types that carry required-parameter rules, plus the common types
/// that do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Scatter,
    Pie,
    Wordcloud,
    Heatmap,
    Surface,
    #[serde(rename = "3d_scatter")]
    Scatter3d,
    Maps,
    Candlestick,
    Treemap,
    Funnel,
    Pareto,
}

impl ChartType {
    /// Parse a chart type name; unknown names have no rule and return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "line" => Some(ChartType::Line),
            "bar" => Some(ChartType::Bar),
            "scatter" => Some(ChartType::Scatter),
            "pie" => Some(ChartType::Pie),
            "wordcloud" => Some(ChartType::Wordcloud),
            "heatmap" => Some(ChartType::Heatmap),
            "surface" => Some(ChartType::Surface),
            "3d_scatter" => Some(ChartType::Scatter3d),
            "maps" => Some(ChartType::Maps),
            "candlestick" => Some(ChartType::Candlestick),
            "treemap" => Some(ChartType::Treemap),
            "funnel" => Some(ChartType::Funnel),
            "pareto" => Some(ChartType::Pareto),
            _ => None,
        }
    }

    /// Parameters that must be present for this chart type, given the
    /// parameters already supplied (map rules depend on `map_type`/`loc_mode`).
    ///
    /// Order matters: validation reports the first missing entry.
    pub fn required_params(&self, params: &ChartParams) -> &'static [&'static str] {
        match self {
            ChartType::Maps => match params.map_type.as_deref() {
                Some("choropleth") => match params.loc_mode.as_deref() {
                    Some("geojson-id") => &["loc_mode", "geojson"],
                    _ => &["loc_mode"],
                },
                Some("scattergeo") | Some("mapbox") => &["lat", "lon"],
                _ => &[],
            },
            ChartType::Candlestick => &["cs_x", "cs_open", "cs_close", "cs_high", "cs_low"],
            ChartType::Treemap => &["treemap_value", "treemap_label"],
            ChartType::Funnel => &["funnel_value", "funnel_label"],
            ChartType::Pareto => &["pareto_x", "pareto_bars", "pareto_line"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
            ChartType::Wordcloud => "wordcloud",
            ChartType::Heatmap => "heatmap",
            ChartType::Surface => "surface",
            ChartType::Scatter3d => "3d_scatter",
            ChartType::Maps => "maps",
            ChartType::Candlestick => "candlestick",
            ChartType::Treemap => "treemap",
            ChartType::Funnel => "funnel",
            ChartType::Pareto => "pareto",
        };
        write!(f, "{}", s)
    }
}

/// Chart-type specific parameters of a chart request.
///
/// Every field is optional; which ones are required depends on the chart
/// type. Deserializes from the host's request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartParams {
    pub map_type: Option<String>,
    pub loc_mode: Option<String>,
    pub geojson: Option<serde_json::Value>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub cs_x: Option<String>,
    pub cs_open: Option<String>,
    pub cs_close: Option<String>,
    pub cs_high: Option<String>,
    pub cs_low: Option<String>,
    pub treemap_value: Option<String>,
    pub treemap_label: Option<String>,
    pub funnel_value: Option<String>,
    pub funnel_label: Option<String>,
    pub pareto_x: Option<String>,
    pub pareto_bars: Option<String>,
    pub pareto_line: Option<String>,
}

impl ChartParams {
    /// Whether a named parameter is present (non-null).
    pub fn has(&self, name: &str) -> bool {
        match name {
            "map_type" => self.map_type.is_some(),
            "loc_mode" => self.loc_mode.is_some(),
            "geojson" => self.geojson.as_ref().is_some_and(|g| !g.is_null()),
            "lat" => self.lat.is_some(),
            "lon" => self.lon.is_some(),
            "cs_x" => self.cs_x.is_some(),
            "cs_open" => self.cs_open.is_some(),
            "cs_close" => self.cs_close.is_some(),
            "cs_high" => self.cs_high.is_some(),
            "cs_low" => self.cs_low.is_some(),
            "treemap_value" => self.treemap_value.is_some(),
            "treemap_label" => self.treemap_label.is_some(),
            "funnel_value" => self.funnel_value.is_some(),
            "funnel_label" => self.funnel_label.is_some(),
            "pareto_x" => self.pareto_x.is_some(),
            "pareto_bars" => self.pareto_bars.is_some(),
            "pareto_line" => self.pareto_line.is_some(),
            _ => false,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate a chart request, naming the first missing parameter on failure.
pub fn validate_chart(chart_type: &str, params: &ChartParams) -> std::result::Result<(), String> {
    let Some(chart) = ChartType::parse(chart_type) else {
        return Ok(());
    };

    for param in chart.required_params(params) {
        if !params.has(param) {
            return Err(format!(
                "Chart '{}' requires parameter '{}' but it was not provided",
                chart, param
            ));
        }
    }

    Ok(())
}

/// Whether a chart request has every parameter its chart type requires.
///
/// Never fails: unknown chart types are valid.
pub fn is_valid_chart(chart_type: &str, params: &ChartParams) -> bool {
    validate_chart(chart_type, params).is_ok()
}
