//! Serde helpers for embedding raw bytes in the textual representation.

/// Serialize bytes as standard, padded base64 strings.
///
/// Deserializes into anything constructible from a `Vec<u8>`, including
/// fixed-size arrays, which reject input of the wrong length.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(encoded).map_err(de::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes)
            .map_err(|_| de::Error::custom(format!("unexpected byte length {}", len)))
    }
}
