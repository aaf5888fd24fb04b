use loomboard::handler::{FnHandler, HandlerError, HandlerRegistry};
use loomboard::types::{InputValues, OutputValues};
use serde_json::json;

/// Build a value map from literal pairs.
#[allow(dead_code)]
pub fn values(pairs: &[(&str, serde_json::Value)]) -> InputValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Registry with the node types the fixture boards use:
/// `upcase` uppercases its `text`, `tag` appends its configured `suffix` to
/// `text`, `explode` always fails, and `soft-explode` fails via `$error`.
#[allow(dead_code)]
pub fn test_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(
        "upcase",
        FnHandler::new(|inputs: InputValues, _| async move {
            let text = inputs
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or(HandlerError::MissingInput { what: "text" })?
                .to_uppercase();
            Ok(values(&[("text", json!(text))]))
        }),
    );
    registry.register(
        "tag",
        FnHandler::new(|inputs: InputValues, _| async move {
            let text = inputs
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let suffix = inputs
                .get("suffix")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(values(&[("text", json!(format!("{text}{suffix}")))]))
        }),
    );
    registry.register(
        "explode",
        FnHandler::new(|_, _| async move {
            Err::<OutputValues, _>(HandlerError::msg("handler exploded"))
        }),
    );
    registry.register(
        "soft-explode",
        FnHandler::new(|_, _| async move { Ok(values(&[("$error", json!("soft failure"))])) }),
    );
    registry
}
