//! Baby name suggestions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skybridge::schema_helpers::optional_u32_schema;
use skybridge::{InvocationResult, ToolDescriptor};
use std::collections::HashSet;
use std::sync::Arc;

use super::tool;
use crate::knowledge::KnowledgeBase;
use crate::widgets;

const DEFAULT_COUNT: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SuggestNamesRequest {
    #[schemars(description = "Only names starting with this (case-insensitive)")]
    #[serde(default)]
    pub prefix: Option<String>,

    #[schemars(description = "How many names (default: 10)")]
    #[schemars(schema_with = "optional_u32_schema")]
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct NameSuggestions {
    pub names: Vec<String>,
    pub prefix: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct NamesWidget {
    pub widget_type: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SuggestNamesOutput {
    pub text: String,
    pub backend: NameSuggestions,
    pub widget: NamesWidget,
}

/// Names starting with `prefix`, first spelling of each name kept, source
/// order preserved, at most `count`.
pub fn suggest(names: &[String], prefix: Option<&str>, count: usize) -> Vec<String> {
    let prefix = prefix.unwrap_or("").to_lowercase();
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| name.to_lowercase().starts_with(&prefix))
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(count)
        .cloned()
        .collect()
}

pub fn run(kb: &KnowledgeBase, request: &SuggestNamesRequest) -> SuggestNamesOutput {
    let count = request.count.unwrap_or(DEFAULT_COUNT);
    let names = suggest(&kb.names, request.prefix.as_deref(), count as usize);

    SuggestNamesOutput {
        text: format!("Here are {} name suggestions.", names.len()),
        widget: NamesWidget {
            widget_type: "names_list".to_string(),
            names: names.clone(),
        },
        backend: NameSuggestions {
            names,
            prefix: request.prefix.clone(),
            count,
        },
    }
}

pub fn suggest_names(kb: Arc<KnowledgeBase>) -> ToolDescriptor {
    ToolDescriptor::typed(
        tool::<SuggestNamesRequest, SuggestNamesOutput>(
            "suggest_names",
            "Suggest Baby Names",
            "Suggest unique baby names.",
        ),
        move |request: SuggestNamesRequest| {
            let output = run(&kb, &request);
            Ok(InvocationResult::with_output(output.text.clone(), &output))
        },
    )
    .with_output_template(widgets::NAMES)
}
