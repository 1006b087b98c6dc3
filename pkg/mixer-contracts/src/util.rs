use ethereum_types::{H256, U256};
use mixer_primitives::Element;

/// `bytes32` form of an element, big-endian
pub fn element_to_h256(element: Element) -> H256 {
    H256(element.to_be_bytes())
}

pub fn h256_to_element(h256: H256) -> Element {
    Element::from_be_bytes(h256.0)
}

/// `uint256` form of an element
pub fn element_to_u256(element: Element) -> U256 {
    U256::from_big_endian(&element.to_be_bytes())
}

pub fn u256_to_element(u256: U256) -> Element {
    let mut bytes = [0; 32];
    u256.to_big_endian(&mut bytes);
    Element::from_be_bytes(bytes)
}
