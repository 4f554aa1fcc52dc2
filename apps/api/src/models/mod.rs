pub mod candidate;
pub mod postable;
pub mod recommendation;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Treats an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An embedding as persisted on an entity, tagged with the model that produced it.
///
/// Vectors are derived data: they are only trusted when the tag matches the
/// active provider model and the recorded dimension matches the vector length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,
}

impl StoredEmbedding {
    /// Record fields holding the embedding. Derived data, never returned to clients.
    pub const FIELDS: &'static [&'static str] = &["embedding", "embedding_model", "embedding_dim"];

    /// Wraps a freshly generated vector. An empty vector yields a cleared record.
    pub fn generated(vector: Vec<f32>, model: &str) -> Self {
        if vector.is_empty() {
            return Self::default();
        }
        Self {
            embedding_dim: Some(vector.len()),
            embedding: Some(vector),
            embedding_model: Some(model.to_string()),
        }
    }

    /// Returns the vector if it can be reused for `model`.
    pub fn usable_for(&self, model: &str) -> Option<&[f32]> {
        let vector = self.embedding.as_deref()?;
        if vector.is_empty()
            || self.embedding_model.as_deref() != Some(model)
            || self.embedding_dim != Some(vector.len())
        {
            return None;
        }
        Some(vector)
    }

    /// Store patch that writes (or clears) all three embedding fields.
    pub fn to_patch(&self) -> Value {
        json!({
            "embedding": self.embedding,
            "embedding_model": self.embedding_model,
            "embedding_dim": self.embedding_dim,
        })
    }
}
