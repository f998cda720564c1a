use serde::{Deserialize, Serialize};

/// Opaque value kept in a [`super::CacheStore`]; callers serialize into `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    pub value: String,
}

impl CacheData {
    pub fn from_json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            value: serde_json::to_string(value)?,
        })
    }

    pub fn to_json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.value)
    }
}
