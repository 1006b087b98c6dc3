use std::path::{Path, PathBuf};

use sha3::{Digest, Keccak256};

use crate::{Error, Result};

/// The circuit descriptor and proving key, read once and shared between proofs
///
/// Both are opaque to this crate: they are produced by the circuit compilation pipeline and only
/// interpreted by a [`ProvingSystem`][crate::ProvingSystem].
#[derive(Clone, PartialEq, Eq)]
pub struct Artifacts {
    circuit_path: PathBuf,
    proving_key_path: PathBuf,
    circuit: Vec<u8>,
    proving_key: Vec<u8>,
}

impl core::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Artifacts")
            .field("circuit_path", &self.circuit_path)
            .field("proving_key_path", &self.proving_key_path)
            .field("circuit_len", &self.circuit.len())
            .field("proving_key_len", &self.proving_key.len())
            .finish()
    }
}

impl Artifacts {
    /// Read both artifacts from disk
    #[tracing::instrument(err)]
    pub fn load(circuit_path: &Path, proving_key_path: &Path) -> Result<Self> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|source| Error::Io {
                path: path.to_owned(),
                source,
            })
        };

        let artifacts = Self {
            circuit: read(circuit_path)?,
            proving_key: read(proving_key_path)?,
            circuit_path: circuit_path.to_owned(),
            proving_key_path: proving_key_path.to_owned(),
        };

        tracing::info!(digest = %hex::encode(artifacts.digest()), "loaded circuit artifacts");

        Ok(artifacts)
    }

    /// Artifacts that were not read from disk
    ///
    /// The paths are left empty, so a [`ProvingSystem`][crate::ProvingSystem] that needs files on
    /// disk cannot use them
    #[must_use]
    pub fn from_bytes(circuit: Vec<u8>, proving_key: Vec<u8>) -> Self {
        Self {
            circuit_path: PathBuf::new(),
            proving_key_path: PathBuf::new(),
            circuit,
            proving_key,
        }
    }

    /// The circuit descriptor
    #[must_use]
    pub fn circuit(&self) -> &[u8] {
        &self.circuit
    }

    /// The proving key
    #[must_use]
    pub fn proving_key(&self) -> &[u8] {
        &self.proving_key
    }

    /// Where the circuit descriptor was read from
    #[must_use]
    pub fn circuit_path(&self) -> &Path {
        &self.circuit_path
    }

    /// Where the proving key was read from
    #[must_use]
    pub fn proving_key_path(&self) -> &Path {
        &self.proving_key_path
    }

    /// `keccak256(keccak256(circuit) ‖ keccak256(proving_key))`, identifies a pair of artifacts
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(Keccak256::digest(&self.circuit));
        hasher.update(Keccak256::digest(&self.proving_key));
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn load_reads_both_files() {
        let dir = TempDir::new("artifacts").unwrap();
        let circuit = dir.path().join("withdraw.json");
        let key = dir.path().join("withdraw_proving_key.bin");
        std::fs::write(&circuit, b"circuit").unwrap();
        std::fs::write(&key, b"key").unwrap();

        let artifacts = Artifacts::load(&circuit, &key).unwrap();

        assert_eq!(artifacts.circuit(), b"circuit");
        assert_eq!(artifacts.proving_key(), b"key");
        assert_eq!(
            artifacts.digest(),
            Artifacts::from_bytes(b"circuit".to_vec(), b"key".to_vec()).digest()
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new("artifacts").unwrap();
        let missing = dir.path().join("missing");

        let error = Artifacts::load(&missing, &missing).unwrap_err();

        assert!(matches!(error, Error::Io { path, .. } if path == missing));
    }

    #[test]
    fn digest_depends_on_both() {
        let a = Artifacts::from_bytes(vec![1], vec![2]).digest();
        let b = Artifacts::from_bytes(vec![1], vec![3]).digest();
        let c = Artifacts::from_bytes(vec![2], vec![2]).digest();

        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
