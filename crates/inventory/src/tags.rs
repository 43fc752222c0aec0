use serde::{Deserialize, Deserializer};

/// Parse comma-separated tags: split, trim, drop empties, keep first occurrence.
pub fn parse_tags(text: &str) -> Vec<String> {
    normalize_tags(text.split(','))
}

/// Trim, drop empty entries and de-duplicate while keeping order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Accepts either `"a, b"` or `["a", "b"]`.
pub(crate) fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TagInput {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<TagInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TagInput::Text(text)) => parse_tags(&text),
        Some(TagInput::List(list)) => normalize_tags(list),
    })
}
