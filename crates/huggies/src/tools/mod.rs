//! The Huggies tool set.
//!
//! Every handler is a pure function over the shared [`KnowledgeBase`]: same
//! arguments, same result, no writes. Registration order here is the order
//! clients see in `tools/list`.

pub mod faq;
pub mod gender;
pub mod names;
pub mod offers;
pub mod sizing;
pub mod stores;

use schemars::JsonSchema;
use serde::Deserialize;
use skybridge::{schema_for, McpError, Tool, ToolAnnotations, ToolDescriptor, ToolRegistry};
use std::sync::Arc;

use crate::knowledge::KnowledgeBase;

/// Arguments for tools that take none.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoArguments {}

/// Tool metadata with schemas derived from the request and output types.
pub(crate) fn tool<Req, Out>(name: &str, title: &str, description: &str) -> Tool
where
    Req: JsonSchema,
    Out: JsonSchema,
{
    Tool::new(name, description)
        .with_title(title)
        .with_input_schema(schema_for::<Req>())
        .with_output_schema(schema_for::<Out>())
        .with_annotations(ToolAnnotations::pure_lookup())
}

/// Every tool descriptor, in advertised order.
pub fn descriptors(kb: Arc<KnowledgeBase>) -> Vec<ToolDescriptor> {
    vec![
        faq::get_faq(Arc::clone(&kb)),
        faq::list_faqs(Arc::clone(&kb)),
        faq::get_item_by_id(Arc::clone(&kb)),
        sizing::diaper_size_calc(),
        stores::map_widget(Arc::clone(&kb)),
        offers::coupons(Arc::clone(&kb)),
        names::suggest_names(kb),
        gender::predict_gender(),
    ]
}

/// A registry holding the full tool set.
pub fn registry(kb: Arc<KnowledgeBase>) -> Result<ToolRegistry, McpError> {
    let mut registry = ToolRegistry::new();
    for descriptor in descriptors(kb) {
        registry.register(descriptor)?;
    }
    tracing::debug!(tools = registry.len(), "Tool registry built");
    Ok(registry)
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
