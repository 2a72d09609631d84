//! Response pipeline: filter, decode, dispatch.
//!
//! Runs once per terminal success outcome, never on failure or abort.
//! The filter transforms the raw payload before decoding is finalized; a
//! structured decode failure silently degrades to an empty object rather
//! than propagating. Dispatch is by truthiness: an HTTP-success response
//! whose body resolves to a falsy value is an application-level failure.

use serde_json::Value;

use crate::errors::UploadError;
use crate::upload::item::QueueItem;
use crate::upload::options::{DecodeMode, Hooks};

/// JS-style truthiness over a decoded value: `null`, `false`, `0`, and
/// the empty string are falsy; everything else (including an empty object
/// or array) is truthy.
fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Run the pipeline stages over a successfully transported item and
/// dispatch the done or error hook.
pub fn process(item: &mut QueueItem, hooks: &Hooks, mode: DecodeMode) {
    if let Some(filter) = &hooks.response_filter {
        item.filtered_response = Some(filter(item));
    }

    let truthy = match mode {
        DecodeMode::Structured => {
            let decoded = match item.effective_response() {
                // A blank body decodes to null, not to the empty-object
                // degradation below.
                Some(text) if text.trim().is_empty() => Value::Null,
                Some(text) => {
                    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Default::default()))
                }
                None => Value::Null,
            };
            let truthy = value_truthy(&decoded);
            item.decoded = Some(decoded);
            truthy
        }
        DecodeMode::Raw => item.effective_response().is_some_and(|text| !text.is_empty()),
    };

    if truthy {
        if let Some(done) = &hooks.on_done {
            done(item);
        }
    } else {
        item.failure = Some(UploadError::Application);
        if let Some(error) = &hooks.on_error {
            error(item);
        }
    }
}
