//! BLAKE3 checksums for uploaded artifacts

use bpi_errors::{Error, StorageError};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// A BLAKE3 digest of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    bytes: [u8; 32],
}

impl Checksum {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from a 64 character hex string
    ///
    /// # Errors
    /// Returns an error if the input is not hex or not 32 bytes long.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| StorageError::IoError {
            message: format!("invalid checksum hex: {e}"),
        })?;
        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| StorageError::IoError {
            message: format!("checksum must be 32 bytes, got {}", b.len()),
        })?;
        Ok(Self::from_bytes(array))
    }

    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_bytes(*blake3::hash(data).as_bytes())
    }

    /// Stream a file through the hasher
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn of_file(path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;

        let mut hasher = Hasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self::from_bytes(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
