//! JSON Schema for the user-facing `Rover` resource (§6 external interface:
//! the CLI's `resource get/list --output json` and `apply --file` surfaces
//! validate payloads against this before admission's semantic rules run).
//! There is no `kube::CustomResource` here to derive a CRD schema from, so
//! this calls `schemars` directly on the spec type instead.

use serde_json::Value;

use crate::model::kinds::rover::RoverSpec;

/// The `RoverSpec` schema with `format` annotations stripped -- some
/// validators choke on schemars' non-standard `format` values for enums.
pub fn rover_spec_schema() -> Value {
    let schema = schemars::schema_for!(RoverSpec);
    let mut v = serde_json::to_value(&schema).expect("schema serializes");
    strip_format_keys(&mut v);
    v
}

fn strip_format_keys(v: &mut Value) {
    match v {
        Value::Object(map) => {
            map.remove("format");
            for val in map.values_mut() {
                strip_format_keys(val);
            }
        }
        Value::Array(arr) => {
            for val in arr {
                strip_format_keys(val);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_rover_spec_properties() {
        let schema = rover_spec_schema();
        let properties = schema.get("properties").and_then(Value::as_object).expect("object schema");
        assert!(properties.contains_key("team"));
        assert!(properties.contains_key("subscriptions"));
        assert!(properties.contains_key("exposures"));
    }

    #[test]
    fn schema_has_no_format_keys() {
        fn assert_no_format(v: &Value) {
            match v {
                Value::Object(map) => {
                    assert!(!map.contains_key("format"));
                    for val in map.values() {
                        assert_no_format(val);
                    }
                }
                Value::Array(arr) => arr.iter().for_each(assert_no_format),
                _ => {}
            }
        }
        assert_no_format(&rover_spec_schema());
    }
}
