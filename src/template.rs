use serde_json::{Map, Value};

/// Substitute `{key}` placeholders in `template` with values from `payload`.
///
/// The template is scanned once, left to right. Substituted text is never
/// rescanned, so a value that itself contains `{other}` is emitted as-is.
/// Every occurrence of a known key is replaced; placeholders naming keys
/// absent from `payload` are kept verbatim. Keys may contain `}`: the
/// shortest known key closed by a `}` wins.
pub fn render(template: &str, payload: &Map<String, Value>) -> String {
    let longest_key = payload.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let placeholder = after_open
            .match_indices('}')
            .map(|(close, _)| close)
            .take_while(|&close| close <= longest_key)
            .find_map(|close| payload.get(&after_open[..close]).map(|value| (close, value)));

        match placeholder {
            Some((close, value)) => {
                out.push_str(&plain(value));
                rest = &after_open[close + 1..];
            }
            None => {
                // Not a placeholder; a later `{` may still open one.
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Default string rendering of a payload value.
///
/// Strings are emitted without quotes, scalars in their usual text form and
/// containers as compact JSON.
pub fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
