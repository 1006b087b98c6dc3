use mixer_note::Deposit;
use sha3::{Digest, Keccak256};

use crate::{Artifacts, CircuitInput, Error, Proof, ProofBundle, ProvingSystem, PublicArgs, Result};

/// A proving system that checks the withdrawal constraints natively instead of proving them
///
/// The "proof" is `keccak256(artifact digest ‖ public args)`, so it binds the public arguments but
/// carries no zero-knowledge guarantees at all. Only for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProver;

impl NativeProver {
    /// Whether `bundle` carries the proof this backend would produce for its public arguments
    #[must_use]
    pub fn verify(artifacts: &Artifacts, bundle: &ProofBundle) -> bool {
        bundle.proof == proof_for(artifacts, &bundle.public_args)
    }
}

impl ProvingSystem for NativeProver {
    fn prove<const HEIGHT: usize>(
        &self,
        artifacts: &Artifacts,
        input: &CircuitInput<HEIGHT>,
    ) -> Result<Proof> {
        let unsatisfied = |what: &str| Error::ProofGenerationFailed(format!("unsatisfied: {what}"));

        let deposit = Deposit::derive(input.nullifier, input.secret)
            .map_err(|_| unsatisfied("nullifier and secret fit in 31 bytes"))?;

        if deposit.nullifier_hash() != input.nullifier_hash {
            return Err(unsatisfied("nullifier hash matches nullifier"));
        }

        let root = mixer_primitives::compute_merkle_root(
            deposit.commitment(),
            core::iter::zip(input.path_elements, input.path_indices),
        );

        if root != input.root {
            return Err(unsatisfied("commitment is in the tree"));
        }

        if !input.fee.is_canonical() || !input.refund.is_canonical() {
            return Err(unsatisfied("fee and refund are field elements"));
        }

        Ok(proof_for(artifacts, &PublicArgs::from(input)))
    }
}

fn proof_for(artifacts: &Artifacts, args: &PublicArgs) -> Proof {
    let mut hasher = Keccak256::new();
    hasher.update(artifacts.digest());

    for element in args.to_elements() {
        hasher.update(element.to_be_bytes());
    }

    Proof::new(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ethereum_types::Address;
    use mixer_primitives::Element;
    use mixer_tree::Tree;

    use super::*;
    use crate::Prover;

    fn setup() -> (Prover<NativeProver>, CircuitInput<8>) {
        let deposit = Deposit::derive(Element::new(7), Element::new(8)).unwrap();
        let leaves = [Element::new(1), Element::new(2), deposit.commitment()];
        let tree = Tree::<8>::build(leaves).unwrap();

        let input = CircuitInput::new(
            &tree.path(2).unwrap(),
            &deposit,
            Address::repeat_byte(0x22),
            Address::zero(),
            Element::ZERO,
            Element::ZERO,
        )
        .unwrap();

        let artifacts = Arc::new(Artifacts::from_bytes(b"circuit".to_vec(), b"key".to_vec()));
        (Prover::new(artifacts, Arc::new(NativeProver)), input)
    }

    #[test]
    fn valid_input_proves_and_verifies() {
        let (prover, input) = setup();

        let bundle = prover.prove(&input).unwrap();

        assert!(NativeProver::verify(prover.artifacts(), &bundle));

        let mut tampered = bundle.clone();
        tampered.public_args.recipient = Address::repeat_byte(0x33);
        assert!(!NativeProver::verify(prover.artifacts(), &tampered));
    }

    #[test]
    fn wrong_root_is_unsatisfied() {
        let (prover, mut input) = setup();
        input.root = Element::new(123);

        assert!(matches!(
            prover.prove(&input),
            Err(Error::ProofGenerationFailed(_))
        ));
    }

    #[test]
    fn wrong_nullifier_hash_is_unsatisfied() {
        let (prover, mut input) = setup();
        input.nullifier_hash = Element::new(123);

        assert!(matches!(
            prover.prove(&input),
            Err(Error::ProofGenerationFailed(_))
        ));
    }

    #[test]
    fn wrong_direction_is_unsatisfied() {
        let (prover, mut input) = setup();
        input.path_indices[0] = !input.path_indices[0];

        assert!(prover.prove(&input).is_err());
    }
}
