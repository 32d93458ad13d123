//! JSON Schema helper functions for schemars
//!
//! schemars emits `"format": "uint32"` for Rust unsigned integers, which JSON
//! Schema does not define. These helpers use `type: "integer"` with min/max
//! constraints instead, and [`schema_for`] turns a request or output type into
//! a [`ToolSchema`] with every subschema inlined.

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};

use crate::types::tool::ToolSchema;

/// Generate a ToolSchema from a type that implements schemars::JsonSchema.
///
/// Uses `inline_subschemas` to avoid `$defs`/`$ref`, which some MCP clients
/// don't resolve.
pub fn schema_for<T: JsonSchema>() -> ToolSchema {
    let settings = schemars::generate::SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let gen = settings.into_generator();
    let schema = gen.into_root_schema_for::<T>();
    let value = serde_json::to_value(&schema).unwrap_or_default();
    ToolSchema::from_value(value)
}

/// Schema for Option<u32>
pub fn optional_u32_schema(_gen: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": ["integer", "null"],
        "minimum": 0
    })
}

/// Schema for Option<u32> that must be at least 1 when present
pub fn optional_positive_u32_schema(_gen: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": ["integer", "null"],
        "minimum": 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct Inner {
        label: String,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct Request {
        query: String,
        #[serde(default)]
        #[schemars(schema_with = "optional_positive_u32_schema")]
        limit: Option<u32>,
        inner: Vec<Inner>,
    }

    #[test]
    fn test_schema_for_inlines_subschemas() {
        let schema = schema_for::<Request>();
        let json = serde_json::to_string(&schema).unwrap();

        assert!(!json.contains("$ref"));
        assert!(!json.contains("uint32"));
        let required = schema.required.clone().unwrap();
        assert_eq!(required.len(), 2);
        assert!(required.contains(&"query".to_string()));
        assert!(required.contains(&"inner".to_string()));
        assert_eq!(schema.additional_properties, Some(serde_json::json!(false)));
    }

    #[test]
    fn test_optional_positive_u32_schema() {
        let props = schema_for::<Request>().properties.unwrap();
        assert_eq!(props["limit"]["minimum"], 1);
    }
}
