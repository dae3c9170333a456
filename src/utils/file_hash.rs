use crate::model::error::io::IOError;
use crate::model::error::Error;
use crate::model::hash_type::HashType;
use crate::platform::constants::HASH_BUFFER_SIZE;
use blake2::{Blake2b512, Blake2s256};
use digest::Digest;
use md5::Md5;
use sha2::Sha256;
use sha3::Sha3_256;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub fn file_hash(path: &Path, hash_type: HashType) -> Result<Vec<u8>, Error> {
    let file = File::open(path).map_err(|err| IOError::ReadFileFailed(path, err))?;
    match hash_type {
        HashType::MD5 => digest_file::<Md5>(file, path),
        HashType::SHA3 => digest_file::<Sha3_256>(file, path),
        HashType::SHA256 => digest_file::<Sha256>(file, path),
        HashType::BLAKE2B => digest_file::<Blake2b512>(file, path),
        HashType::BLAKE2S => digest_file::<Blake2s256>(file, path),
        HashType::BLAKE3 => digest_file::<blake3::Hasher>(file, path),
    }
}

fn digest_file<D: Digest>(mut file: File, path: &Path) -> Result<Vec<u8>, Error> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| IOError::ReadFileFailed(path, err))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::file_hash;
    use crate::model::hash_type::HashType;
    use std::fs;

    #[test]
    fn sha256_of_known_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("abc.txt");
        fs::write(&path, b"abc").expect("write");

        let digest = file_hash(&path, HashType::SHA256).expect("hash");
        let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        assert_eq!(
            hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn algorithms_disagree_on_same_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.bin");
        fs::write(&path, vec![7u8; 3 * 1024 * 1024 + 17]).expect("write");

        let sha = file_hash(&path, HashType::SHA256).expect("sha256");
        let blake = file_hash(&path, HashType::BLAKE3).expect("blake3");
        assert_eq!(sha.len(), 32);
        assert_eq!(blake.len(), 32);
        assert_ne!(sha, blake);
        assert_eq!(sha, file_hash(&path, HashType::SHA256).expect("sha256 again"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(file_hash(&dir.path().join("absent"), HashType::MD5).is_err());
    }
}
