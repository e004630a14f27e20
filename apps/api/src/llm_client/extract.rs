//! Best-effort extraction of a JSON object from free-form model output.
//!
//! Models wrap their JSON in code fences, lead with prose, or trail off with
//! commentary. Rather than slicing from the first `{` to the last `}`, each
//! `{` is handed to serde_json's streaming deserializer in order and the
//! first one that decodes as a complete object wins. Braces inside string
//! values and in trailing prose do not affect the result.
//!
//! This does not validate the shape of the object. Callers apply per-field
//! defaults.

use serde_json::{Deserializer, Map, Value};
use tracing::debug;

/// Returns the first top-level JSON object in `text`, or an empty map.
pub fn extract_json_object(text: &str) -> Map<String, Value> {
    match first_object(text) {
        Some(map) => map,
        None => {
            debug!(
                "No JSON object found in model output: {:?}",
                text.chars().take(80).collect::<String>()
            );
            Map::new()
        }
    }
}

fn first_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}
