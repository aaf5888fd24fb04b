use loomboard::protocol::RunMessage;
use loomboard::types::{InvocationPath, OutputValues};

#[allow(dead_code)]
pub fn tags(messages: &[RunMessage]) -> Vec<&'static str> {
    messages.iter().map(RunMessage::tag).collect()
}

/// The `outputs` payload of every `output` message, in order.
#[allow(dead_code)]
pub fn outputs_of(messages: &[RunMessage]) -> Vec<OutputValues> {
    messages
        .iter()
        .filter_map(|m| match m {
            RunMessage::Output { outputs } => Some(outputs.clone()),
            _ => None,
        })
        .collect()
}

/// Paths of every `nodestart` message, in order.
#[allow(dead_code)]
pub fn nodestart_paths(messages: &[RunMessage]) -> Vec<InvocationPath> {
    messages
        .iter()
        .filter_map(|m| match m {
            RunMessage::NodeStart { path } => Some(path.clone()),
            _ => None,
        })
        .collect()
}

/// Wire form of every message with the run-unique parts blanked: resume
/// tickets and error timestamps. Two runs of the same board with the same
/// inputs must produce identical normalized streams.
#[allow(dead_code)]
pub fn normalized_stream(messages: &[RunMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            let mut value = m.to_json_value();
            match m {
                RunMessage::Input { .. } => {
                    if let Some(tuple) = value.as_array_mut() {
                        tuple[2] = serde_json::Value::Null;
                    }
                }
                RunMessage::Error { .. } => {
                    if let Some(data) = value.get_mut(1).and_then(|d| d.as_object_mut()) {
                        data.remove("timestamp");
                    }
                }
                _ => {}
            }
            value
        })
        .collect()
}

#[allow(dead_code)]
pub fn assert_tags(messages: &[RunMessage], expected: &[&str]) {
    let actual = tags(messages);
    assert_eq!(actual, expected, "message stream mismatch: {messages:?}");
}

/// The error code of the final message, which must be an `error`.
#[allow(dead_code)]
pub fn final_error_code(messages: &[RunMessage]) -> Option<String> {
    match messages.last() {
        Some(RunMessage::Error { code, .. }) => code.clone(),
        other => panic!("expected trailing error message, got {other:?}"),
    }
}
