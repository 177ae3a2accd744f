/// Presence-aware deserialization for sparse PATCH bodies
///
/// Partial updates must distinguish three cases for a nullable field:
/// the field is absent (leave untouched), the field is `null` (clear it),
/// or the field carries a value (set it). Plain `Option<T>` collapses the
/// first two, so patchable nullable fields are modeled as
/// `Option<Option<T>>` with this deserializer:
///
/// ```
/// use serde::Deserialize;
/// use sprintbase_shared::models::patch;
///
/// #[derive(Deserialize, Default)]
/// struct UpdateStory {
///     #[serde(default, deserialize_with = "patch::double_option")]
///     description: Option<Option<String>>,
/// }
///
/// let absent: UpdateStory = serde_json::from_str("{}").unwrap();
/// assert_eq!(absent.description, None);
///
/// let cleared: UpdateStory = serde_json::from_str(r#"{"description": null}"#).unwrap();
/// assert_eq!(cleared.description, Some(None));
///
/// let set: UpdateStory = serde_json::from_str(r#"{"description": "x"}"#).unwrap();
/// assert_eq!(set.description, Some(Some("x".to_string())));
/// ```

use serde::{Deserialize, Deserializer};

/// Deserializes a field into `Some(inner)` whenever the field is present,
/// keeping `null` as `Some(None)`. Combine with `#[serde(default)]` so an
/// absent field stays `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        points: Option<Option<i32>>,

        title: Option<String>,
    }

    #[test]
    fn test_absent_field_is_none() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.points, None);
        assert_eq!(patch.title, None);
    }

    #[test]
    fn test_null_field_is_some_none() {
        let patch: Patch = serde_json::from_str(r#"{"points": null}"#).unwrap();
        assert_eq!(patch.points, Some(None));
    }

    #[test]
    fn test_value_field_is_some_some() {
        let patch: Patch = serde_json::from_str(r#"{"points": 5, "title": "t"}"#).unwrap();
        assert_eq!(patch.points, Some(Some(5)));
        assert_eq!(patch.title, Some("t".to_string()));
    }
}
