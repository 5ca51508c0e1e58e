use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Trait for types that can be used as a Gemini response schema.
///
/// Automatically implemented for any type that implements
/// `JsonSchema + DeserializeOwned`.
pub trait GeminiOutput: JsonSchema + DeserializeOwned {
    /// Generate a Gemini-compatible response schema for this type.
    ///
    /// The Gemini API takes an OpenAPI-style schema subset:
    /// 1. `type` names are uppercase (STRING, INTEGER, ARRAY, OBJECT, ...)
    /// 2. No `$ref` references — schemas must be fully inlined
    /// 3. No `additionalProperties`, `$schema`, or `format` keywords
    /// 4. Optionality is expressed with `nullable: true`
    fn gemini_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        inline_refs(&mut value);
        to_gemini_dialect(&mut value);

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
            map.remove("title");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> GeminiOutput for T {}

fn uppercase_type(name: &str) -> Option<&'static str> {
    match name {
        "string" => Some("STRING"),
        "number" => Some("NUMBER"),
        "integer" => Some("INTEGER"),
        "boolean" => Some("BOOLEAN"),
        "array" => Some("ARRAY"),
        "object" => Some("OBJECT"),
        _ => None,
    }
}

fn to_gemini_dialect(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            // schemars emits `"type": ["string", "null"]` for Option<T>;
            // Gemini wants a single uppercase type plus `nullable: true`.
            match map.get("type").cloned() {
                Some(serde_json::Value::String(t)) => {
                    if let Some(upper) = uppercase_type(&t) {
                        map.insert("type".to_string(), upper.into());
                    }
                }
                Some(serde_json::Value::Array(types)) => {
                    let nullable = types.iter().any(|t| t.as_str() == Some("null"));
                    if let Some(t) = types
                        .iter()
                        .filter_map(|t| t.as_str())
                        .find(|t| *t != "null")
                        .and_then(uppercase_type)
                    {
                        map.insert("type".to_string(), t.into());
                    }
                    if nullable {
                        map.insert("nullable".to_string(), true.into());
                    }
                }
                _ => {}
            }

            map.remove("additionalProperties");
            map.remove("format");

            for (_, v) in map.iter_mut() {
                to_gemini_dialect(v);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                to_gemini_dialect(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut serde_json::Value) {
    let definitions = if let serde_json::Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                if ref_path.starts_with("#/definitions/") {
                    let type_name = ref_path.trim_start_matches("#/definitions/");
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            if let Some(serde_json::Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    *value = all_of.into_iter().next().unwrap();
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
