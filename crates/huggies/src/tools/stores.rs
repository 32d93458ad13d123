//! Retailer lookup for the store map.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skybridge::schema_helpers::optional_positive_u32_schema;
use skybridge::{InvocationResult, ToolDescriptor};
use std::sync::Arc;

use super::tool;
use crate::knowledge::{KnowledgeBase, Store};
use crate::widgets;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MapRequest {
    #[schemars(description = "ZIP code or ZIP prefix to search near")]
    #[serde(default)]
    pub zip_code: Option<String>,

    #[schemars(description = "City, street, or store name (used when no zip_code is given)")]
    #[serde(default)]
    pub location: Option<String>,

    #[schemars(description = "Max stores (default: 5, max: 20)")]
    #[schemars(schema_with = "optional_positive_u32_schema")]
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct StoreResults {
    pub results: Vec<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct MapWidget {
    pub widget_type: String,
    pub markers: Vec<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct MapOutput {
    pub text: String,
    pub backend: StoreResults,
    pub widget: MapWidget,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Stores matching the zip prefix, else the location text, else all;
/// nearest first, at most `min(limit, 20)`.
pub fn nearby<'a>(kb: &'a KnowledgeBase, request: &MapRequest) -> Vec<&'a Store> {
    let zip = non_blank(request.zip_code.as_deref());
    let location = non_blank(request.location.as_deref()).map(str::to_lowercase);

    let mut stores: Vec<&Store> = kb
        .stores
        .iter()
        .filter(|store| match (zip, &location) {
            (Some(zip), _) => store.zip.starts_with(zip),
            (None, Some(needle)) => [&store.name, &store.address, &store.city]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            (None, None) => true,
        })
        .collect();

    // sort_by is stable, so equal distances keep table order
    stores.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));

    let limit = request
        .limit
        .map(|l| l as usize)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    stores.truncate(limit);
    stores
}

pub fn locate(kb: &KnowledgeBase, request: &MapRequest) -> MapOutput {
    let results: Vec<Store> = nearby(kb, request).into_iter().cloned().collect();
    let place = non_blank(request.zip_code.as_deref())
        .or_else(|| non_blank(request.location.as_deref()))
        .unwrap_or("your area");

    MapOutput {
        text: format!("Found {} retailers near {}.", results.len(), place),
        widget: MapWidget {
            widget_type: "map".to_string(),
            markers: results.clone(),
        },
        backend: StoreResults { results },
    }
}

pub fn map_widget(kb: Arc<KnowledgeBase>) -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<MapRequest, MapOutput>(
            "map_widget",
            "Find Retailers",
            "Find retailers near a location and display on a map.",
        ),
        move |request: MapRequest| {
            let output = locate(&kb, &request);
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::MAP)
}
