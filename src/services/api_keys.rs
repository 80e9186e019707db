//! API Key 생성
//!
//! ```text
//! key    = "ag_" + hex(32 random bytes)      (67 chars)
//! prefix = key[..10]                          (목록 화면 표시용)
//! hash   = hex(sha256(key))                   (DB 저장값)
//! ```
//!
//! 평문 키는 생성 응답에서 한 번만 반환

use rand::RngCore;
use sha2::{Digest, Sha256};

pub const KEY_PREFIX: &str = "ag_";
pub const DISPLAY_PREFIX_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub key: String,
    pub prefix: String,
    pub hash: String,
}

pub fn generate_api_key() -> GeneratedKey {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let key = format!("{}{}", KEY_PREFIX, hex::encode(bytes));

    GeneratedKey {
        prefix: key[..DISPLAY_PREFIX_LEN].to_string(),
        hash: hash_api_key(&key),
        key,
    }
}

pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let generated = generate_api_key();
        assert_eq!(generated.key.len(), 3 + 64);
        assert!(generated.key.starts_with("ag_"));
        assert!(generated.key[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(generated.prefix, &generated.key[..10]);
        assert_eq!(generated.hash, hash_api_key(&generated.key));
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_api_key().key, generate_api_key().key);
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
