//! Schema validation tests
//!
//! Widget hosts validate tool schemas strictly. These tests catch
//! unconstrained properties (serde_json::Value) and `$ref` indirection in
//! anything the registry advertises.

use huggies::{tools, KnowledgeBase};
use serde_json::Value;
use std::sync::Arc;

fn advertised_tools() -> Vec<skybridge::Tool> {
    let kb = Arc::new(KnowledgeBase::embedded().unwrap());
    tools::descriptors(kb)
        .iter()
        .map(|descriptor| descriptor.tool().clone())
        .collect()
}

/// Every property must carry a type constraint, recursively.
fn validate_schema_structure(schema: &Value, path: &str) -> Result<(), String> {
    match schema {
        Value::Object(obj) => {
            if let Some(properties) = obj.get("properties").and_then(|v| v.as_object()) {
                for (prop_name, prop_schema) in properties {
                    let prop_path = format!("{}.{}", path, prop_name);

                    if prop_schema.as_bool() == Some(true) {
                        return Err(format!(
                            "Property '{}' has boolean schema 'true' (unconstrained value)",
                            prop_path
                        ));
                    }

                    if let Some(prop_obj) = prop_schema.as_object() {
                        let constrained = ["type", "anyOf", "oneOf", "enum", "const"]
                            .iter()
                            .any(|key| prop_obj.contains_key(*key));
                        if !constrained {
                            return Err(format!(
                                "Property '{}' has no type constraint",
                                prop_path
                            ));
                        }
                        validate_schema_structure(prop_schema, &prop_path)?;
                    }
                }
            }

            if let Some(items) = obj.get("items") {
                validate_schema_structure(items, &format!("{}[]", path))?;
            }

            for key in ["anyOf", "oneOf"] {
                if let Some(variants) = obj.get(key).and_then(|v| v.as_array()) {
                    for (i, variant) in variants.iter().enumerate() {
                        validate_schema_structure(variant, &format!("{}[{}:{}]", path, key, i))?;
                    }
                }
            }

            Ok(())
        }
        _ => Ok(()),
    }
}

#[test]
fn test_all_tool_schemas_are_valid() {
    let mut failures = Vec::new();

    for (index, tool) in advertised_tools().iter().enumerate() {
        let input = serde_json::to_value(&tool.input_schema).unwrap();
        if let Err(e) = validate_schema_structure(&input, &format!("{}.inputSchema", tool.name)) {
            failures.push(format!("Tool #{} '{}' input schema: {}", index, tool.name, e));
        }

        if let Some(output_schema) = &tool.output_schema {
            let output = serde_json::to_value(output_schema).unwrap();
            if let Err(e) = validate_schema_structure(&output, &format!("{}.outputSchema", tool.name))
            {
                failures.push(format!("Tool #{} '{}' output schema: {}", index, tool.name, e));
            }
        }
    }

    if !failures.is_empty() {
        panic!("\n\nSchema validation failures:\n{}\n", failures.join("\n"));
    }
}

#[test]
fn test_no_refs_in_schemas() {
    for tool in advertised_tools() {
        let input = serde_json::to_value(&tool.input_schema).unwrap();
        assert!(
            !input.to_string().contains("\"$ref\""),
            "Tool '{}' input schema contains $ref",
            tool.name
        );

        if let Some(schema) = &tool.output_schema {
            let output = serde_json::to_value(schema).unwrap();
            assert!(
                !output.to_string().contains("\"$ref\""),
                "Tool '{}' output schema contains $ref",
                tool.name
            );
        }
    }
}

#[test]
fn test_every_tool_has_object_schemas_and_a_template() {
    let kb = Arc::new(KnowledgeBase::embedded().unwrap());
    for descriptor in tools::descriptors(kb) {
        let tool = descriptor.tool();
        let input = serde_json::to_value(&tool.input_schema).unwrap();
        assert_eq!(input["type"], "object", "{} input", tool.name);
        assert!(tool.output_schema.is_some(), "{} has no output schema", tool.name);
        assert!(
            descriptor.output_template().is_some(),
            "{} has no widget template",
            tool.name
        );
    }
}
