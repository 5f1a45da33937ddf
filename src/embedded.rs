//! Extraction of JSON state that pages inline as `window.<key> = {...};`.

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::ConnectError;

/// Finds `window.<key> = <json>;` in `html` and deserializes the value.
///
/// Escaped quotes (`\"`) inside the assignment are unescaped first. A missing
/// assignment or a `null` value is reported as
/// [`ConnectError::UnexpectedResponse`].
pub fn extract_embedded_json<T: DeserializeOwned>(html: &str, key: &str) -> Result<T, ConnectError> {
    let pattern = format!(r"window\.{} = (.*);", regex::escape(key));
    let re = Regex::new(&pattern)
        .map_err(|e| ConnectError::UnexpectedResponse(format!("invalid key {:?}: {}", key, e)))?;

    let raw = re
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            ConnectError::UnexpectedResponse(format!("window.{} not found in page", key))
        })?;

    let json = raw.replace("\\\"", "\"");
    let value: Option<T> = serde_json::from_str(&json)?;

    value.ok_or_else(|| ConnectError::UnexpectedResponse(format!("window.{} is null", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Data {
        x: i64,
    }

    #[test]
    fn test_extract_escaped_json() {
        let html = r#"window.DATA = {\"x\":1};"#;
        let data: Data = extract_embedded_json(html, "DATA").unwrap();
        assert_eq!(data, Data { x: 1 });
    }

    #[test]
    fn test_extract_plain_json_from_page() {
        let html = r#"<html><head>
<script type="text/javascript">
    window.VIEWER_USERPREFERENCES = {"measurementSystem":"metric","x":42};
    window.OTHER = {"x":7};
</script>
</head></html>"#;

        let data: Data = extract_embedded_json(html, "OTHER").unwrap();
        assert_eq!(data, Data { x: 7 });

        let prefs: serde_json::Value =
            extract_embedded_json(html, "VIEWER_USERPREFERENCES").unwrap();
        assert_eq!(prefs["measurementSystem"], "metric");
    }

    #[test]
    fn test_extract_missing_key() {
        let html = r#"window.DATA = {"x":1};"#;
        let err = extract_embedded_json::<Data>(html, "MISSING").unwrap_err();
        assert!(matches!(err, ConnectError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_extract_key_is_matched_literally() {
        // "." in the key must not match an arbitrary character
        let html = r#"window.AxB = {"x":1};"#;
        let err = extract_embedded_json::<Data>(html, "A.B").unwrap_err();
        assert!(matches!(err, ConnectError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_extract_null_value() {
        let html = "window.DATA = null;";
        let err = extract_embedded_json::<Data>(html, "DATA").unwrap_err();
        assert!(matches!(err, ConnectError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_extract_malformed_json() {
        let html = "window.DATA = {x:1};";
        let err = extract_embedded_json::<Data>(html, "DATA").unwrap_err();
        assert!(matches!(err, ConnectError::Decode(_)));
    }
}
