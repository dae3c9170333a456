use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashType {
    MD5,
    SHA3,
    #[default]
    SHA256,
    BLAKE2B,
    BLAKE2S,
    BLAKE3,
}
