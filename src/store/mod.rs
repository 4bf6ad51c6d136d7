//! Persistence layer: the model blob store and the append-only corpus log.

pub mod corpus_log;
pub mod model_store;

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Encode data to bincode bytes.
pub fn to_bincode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| EngineError::Serialization(e.to_string()))
}

/// Decode data from bincode bytes.
pub fn from_bincode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| EngineError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector;

    #[test]
    fn test_bincode_roundtrip() {
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        let bytes = to_bincode(&v).unwrap();
        let decoded: Vector = from_bincode(&bytes).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn test_bincode_garbage_fails() {
        let bytes = [0xFFu8; 3];
        assert!(from_bincode::<Vector>(&bytes).is_err());
    }
}
