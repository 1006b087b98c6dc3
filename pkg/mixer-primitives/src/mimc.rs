use std::sync::OnceLock;

use ff::Field;
use sha3::{Digest, Keccak256};

use crate::{Base, Element};

const ROUNDS: usize = 220;

/// `c[i]` is `keccak256` applied `i + 1` times to this seed, reduced mod p
const SEED: &[u8] = b"mimcsponge";

/// The Feistel round constants, with the first and last fixed to zero
fn round_constants() -> &'static [Base; ROUNDS] {
    static CONSTANTS: OnceLock<[Base; ROUNDS]> = OnceLock::new();

    CONSTANTS.get_or_init(|| {
        let mut constants = [Base::zero(); ROUNDS];
        let mut digest: [u8; 32] = Keccak256::digest(SEED).into();

        for constant in &mut constants[1..ROUNDS - 1] {
            digest = Keccak256::digest(digest).into();

            let mut element = Element::from_be_bytes(digest);
            element.canonicalize();
            *constant = element.to_base();
        }

        constants
    })
}

/// The MiMC Feistel permutation with exponent 5 and key 0
///
/// Every round but the last swaps the halves: `(l, r) -> (r + (l + c)^5, l)`.
fn permute(mut left: Base, mut right: Base) -> (Base, Base) {
    for (round, constant) in round_constants().iter().enumerate() {
        let t = left + *constant;
        let t5 = t.square().square() * t;

        match round == ROUNDS - 1 {
            false => {
                (left, right) = (right + t5, left);
            }
            true => {
                right += t5;
            }
        }
    }

    (left, right)
}

/// Absorb `inputs` one at a time into the rate, permuting after each
pub(crate) fn sponge<const N: usize>(inputs: [Base; N]) -> Base {
    let (rate, _capacity) = inputs
        .into_iter()
        .fold((Base::zero(), Base::zero()), |(rate, capacity), input| {
            permute(rate + input, capacity)
        });

    rate
}
