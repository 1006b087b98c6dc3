use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
    sync::Arc,
};

use crate::{Artifacts, CircuitInput, Error, Proof, ProofBundle, PublicArgs, Result};

/// A backend that can turn a circuit assignment into a zero-knowledge proof
///
/// Implementations are CPU heavy and blocking, callers on an async runtime should run them on a
/// blocking thread.
pub trait ProvingSystem: Send + Sync + 'static {
    /// Generate a proof for `input` with the given artifacts
    fn prove<const HEIGHT: usize>(
        &self,
        artifacts: &Artifacts,
        input: &CircuitInput<HEIGHT>,
    ) -> Result<Proof>;
}

/// A proving backend paired with the artifacts it proves against
///
/// Cheap to clone, the artifacts and backend are shared read-only between clones
#[derive(Debug)]
pub struct Prover<P> {
    artifacts: Arc<Artifacts>,
    system: Arc<P>,
}

impl<P> Clone for Prover<P> {
    fn clone(&self) -> Self {
        Self {
            artifacts: Arc::clone(&self.artifacts),
            system: Arc::clone(&self.system),
        }
    }
}

impl<P: ProvingSystem> Prover<P> {
    /// Create a prover
    #[must_use]
    pub fn new(artifacts: Arc<Artifacts>, system: Arc<P>) -> Self {
        Self { artifacts, system }
    }

    /// The artifacts used for every proof
    #[must_use]
    pub fn artifacts(&self) -> &Arc<Artifacts> {
        &self.artifacts
    }

    /// The proving backend
    #[must_use]
    pub fn system(&self) -> &Arc<P> {
        &self.system
    }

    /// Generate a proof and bundle it with its public arguments
    #[tracing::instrument(
        err,
        skip_all,
        fields(root = %input.root, nullifier_hash = %input.nullifier_hash)
    )]
    pub fn prove<const HEIGHT: usize>(&self, input: &CircuitInput<HEIGHT>) -> Result<ProofBundle> {
        let proof = self.system.prove(&self.artifacts, input)?;

        tracing::info!(proof_len = proof.as_bytes().len(), "generated withdrawal proof");

        Ok(ProofBundle {
            proof,
            public_args: PublicArgs::from(input),
        })
    }
}

/// Runs an external prover program
///
/// The program is invoked as `<program> <args...> <circuit path> <proving key path>`, receives the
/// JSON witness from [`CircuitInput::to_json`] on stdin, and must print the proof as hex (with or
/// without `0x`) on stdout. A non-zero exit status is a [`Error::ProofGenerationFailed`] carrying
/// its stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProver {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandProver {
    /// Create a prover that runs `program` with `args` before the artifact paths
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ProvingSystem for CommandProver {
    fn prove<const HEIGHT: usize>(
        &self,
        artifacts: &Artifacts,
        input: &CircuitInput<HEIGHT>,
    ) -> Result<Proof> {
        let io_error = |source| Error::Io {
            path: self.program.clone(),
            source,
        };

        let witness = serde_json::to_vec(&input.to_json())?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(artifacts.circuit_path())
            .arg(artifacts.proving_key_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&witness).map_err(io_error)?;
        }

        let output = child.wait_with_output().map_err(io_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = %output.status, %stderr, "prover process failed");
            return Err(Error::ProofGenerationFailed(stderr.trim().to_owned()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        let bytes = hex::decode(stdout.strip_prefix("0x").unwrap_or(stdout)).map_err(|err| {
            Error::ProofGenerationFailed(format!("prover printed invalid hex: {err}"))
        })?;

        if bytes.is_empty() {
            return Err(Error::ProofGenerationFailed(
                "prover printed an empty proof".to_owned(),
            ));
        }

        Ok(Proof::new(bytes))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use ethereum_types::Address;
    use mixer_note::Deposit;
    use mixer_primitives::Element;
    use mixer_tree::Tree;

    use super::*;

    fn input() -> CircuitInput<3> {
        let deposit = Deposit::derive(Element::new(1), Element::new(2)).unwrap();
        let tree = Tree::<3>::build([deposit.commitment()]).unwrap();

        CircuitInput::new(
            &tree.path(0).unwrap(),
            &deposit,
            Address::repeat_byte(1),
            Address::zero(),
            Element::ZERO,
            Element::ZERO,
        )
        .unwrap()
    }

    fn shell(script: &str) -> Prover<CommandProver> {
        let args = vec!["-c".to_owned(), script.to_owned(), "sh".to_owned()];
        let system = CommandProver::new("sh", args);
        let artifacts = Artifacts::from_bytes(vec![], vec![]);
        Prover::new(Arc::new(artifacts), Arc::new(system))
    }

    #[test]
    fn reads_proof_from_stdout() {
        let prover = shell("cat > /dev/null; echo 0xdeadbeef");

        let bundle = prover.prove(&input()).unwrap();

        assert_eq!(bundle.proof.as_bytes(), [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(bundle.public_args, PublicArgs::from(&input()));
    }

    #[test]
    fn failing_process_is_proof_generation_failure() {
        let prover = shell("cat > /dev/null; echo boom >&2; exit 3");

        let error = prover.prove(&input()).unwrap_err();

        assert!(matches!(error, Error::ProofGenerationFailed(message) if message == "boom"));
    }

    #[test]
    fn garbage_output_is_rejected() {
        let prover = shell("cat > /dev/null; echo not-hex");
        assert!(matches!(
            prover.prove(&input()),
            Err(Error::ProofGenerationFailed(_))
        ));
    }

    #[test]
    fn missing_program_is_io_error() {
        let system = CommandProver::new("/definitely/not/a/prover", vec![]);
        let prover = Prover::new(
            Arc::new(Artifacts::from_bytes(vec![], vec![])),
            Arc::new(system),
        );

        assert!(matches!(prover.prove(&input()), Err(Error::Io { .. })));
    }
}
