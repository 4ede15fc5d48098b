use serde_json::Value;

use super::types::SuggestionError;

/// Parses the service's free text as a JSON array of short strings.
///
/// A single surrounding markdown code fence is tolerated. Anything other than
/// an array of strings is [`SuggestionError::Malformed`].
pub fn parse_suggestion_list(raw: &str) -> Result<Vec<String>, SuggestionError> {
    let body = strip_code_fence(raw.trim());
    let value = serde_json::from_str::<Value>(body)
        .map_err(|error| SuggestionError::Malformed(format!("response is not JSON: {error}")))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(SuggestionError::Malformed(format!(
                "expected a JSON array of strings, got {}",
                value_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match item {
            Value::String(name) => {
                let name = name.trim();
                (!name.is_empty()).then(|| Ok(name.to_string()))
            }
            other => Some(Err(SuggestionError::Malformed(format!(
                "element {position} is {} instead of a string",
                value_kind(&other)
            )))),
        })
        .collect()
}

fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.trim_start_matches(|ch: char| ch.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::parse_suggestion_list;
    use crate::recommendations::SuggestionError;

    #[test]
    fn parses_plain_array() {
        let names = parse_suggestion_list(r#"["Milk", "Butter", "Jam"]"#).expect("valid array");
        assert_eq!(names, vec!["Milk", "Butter", "Jam"]);
    }

    #[test]
    fn parses_fenced_array_and_drops_blank_names() {
        let names = parse_suggestion_list("```json\n[\" Cereal \", \"\", \"Honey\"]\n```")
            .expect("fenced array");
        assert_eq!(names, vec!["Cereal", "Honey"]);
    }

    #[test]
    fn object_response_is_malformed() {
        let error = parse_suggestion_list(r#"{"items": ["Milk"]}"#).expect_err("object");
        assert!(matches!(error, SuggestionError::Malformed(ref msg) if msg.contains("an object")));
    }

    #[test]
    fn prose_response_is_malformed() {
        let error = parse_suggestion_list("Sure! Try milk and cookies.").expect_err("prose");
        assert!(matches!(error, SuggestionError::Malformed(_)));
    }

    #[test]
    fn non_string_element_is_malformed() {
        let error = parse_suggestion_list(r#"["Milk", 42]"#).expect_err("number element");
        assert!(matches!(error, SuggestionError::Malformed(ref msg) if msg.contains("element 1")));
    }
}
