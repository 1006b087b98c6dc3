use std::time::Duration;

use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use mixer_primitives::Element;
use mixer_prover::ProofBundle;
use sha3::{Digest, Keccak256};
use web3::{
    contract::Contract,
    signing::{Key, SecretKey, SecretKeyRef},
    transports::Http,
    types::{BlockNumber, Bytes, FilterBuilder, Log},
};

use crate::{
    util::{element_to_h256, element_to_u256, h256_to_element},
    Client, DepositEvent, Error, Ledger, Result,
};

const DEPOSIT_EVENT_SIGNATURE: &str = "Deposit(bytes32,uint32,uint256)";

/// The mixer contract on an EVM chain
#[derive(Clone, Debug)]
pub struct MixerContract {
    pub client: Client,
    pub contract: Contract<Http>,
    signer: Option<(SecretKey, Address)>,
    denomination: U256,
    from_block: u64,
    confirm_interval: Duration,
}

impl MixerContract {
    /// Load the contract at `address`
    ///
    /// Without a `signer` the contract can be queried, but [`Ledger::deposit`] and
    /// [`Ledger::withdraw`] return [`Error::ReadOnly`]. `denomination` is the value in wei sent
    /// with every deposit.
    pub fn load(
        client: Client,
        address: &str,
        signer: Option<SecretKey>,
        denomination: U256,
    ) -> Result<Self> {
        let contract_json = include_str!("../abi/Tornado.json");
        let contract = client.load_contract_from_str(address, contract_json)?;

        let signer = signer.map(|signer| {
            let signer_address = Key::address(&SecretKeyRef::new(&signer));
            (signer, signer_address)
        });

        Ok(Self {
            client,
            contract,
            signer,
            denomination,
            from_block: 0,
            confirm_interval: Duration::from_secs(1),
        })
    }

    /// Only look for deposit events from this block onwards
    #[must_use]
    pub fn from_block(self, from_block: u64) -> Self {
        Self { from_block, ..self }
    }

    /// How often to poll for a submitted transaction
    #[must_use]
    pub fn confirm_interval(self, confirm_interval: Duration) -> Self {
        Self {
            confirm_interval,
            ..self
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|(_, address)| *address)
    }

    async fn call(
        &self,
        func: &str,
        params: impl web3::contract::tokens::Tokenize + Clone,
        value: U256,
    ) -> Result<H256> {
        let (signer, signer_address) = self.signer.as_ref().ok_or(Error::ReadOnly)?;

        let txn_hash = self
            .client
            .send(&self.contract, func, params, value, signer, *signer_address)
            .await?;

        let block = self
            .client
            .wait_for_confirm(txn_hash, self.confirm_interval)
            .await?;

        tracing::info!(?txn_hash, %block, func, "transaction confirmed");

        Ok(txn_hash)
    }
}

#[async_trait]
impl Ledger for MixerContract {
    #[tracing::instrument(err, skip(self))]
    async fn deposit_events(&self) -> Result<Vec<DepositEvent>> {
        let topic = H256::from_slice(&Keccak256::digest(DEPOSIT_EVENT_SIGNATURE));

        let filter = FilterBuilder::default()
            .address(vec![self.contract.address()])
            .topics(Some(vec![topic]), None, None, None)
            .from_block(BlockNumber::Number(self.from_block.into()))
            .to_block(BlockNumber::Latest)
            .build();

        let logs = self.client.logs(filter).await?;
        let events = logs
            .iter()
            .map(parse_deposit_log)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(count = events.len(), "fetched deposit events");

        Ok(events)
    }

    #[tracing::instrument(err, ret, skip(self))]
    async fn is_known_root(&self, root: Element) -> Result<bool> {
        let known = self
            .client
            .query(&self.contract, "isKnownRoot", (element_to_h256(root),))
            .await?;

        Ok(known)
    }

    #[tracing::instrument(err, ret, skip(self))]
    async fn is_spent(&self, nullifier_hash: Element) -> Result<bool> {
        let spent = self
            .client
            .query(&self.contract, "isSpent", (element_to_h256(nullifier_hash),))
            .await?;

        Ok(spent)
    }

    #[tracing::instrument(err, ret, skip(self))]
    async fn deposit(&self, commitment: Element) -> Result<H256> {
        self.call("deposit", (element_to_h256(commitment),), self.denomination)
            .await
    }

    #[tracing::instrument(err, ret, skip_all)]
    async fn withdraw(&self, bundle: &ProofBundle) -> Result<H256> {
        let args = &bundle.public_args;

        if !args.refund.is_zero() {
            return Err(Error::RefundNotSupported);
        }

        self.call(
            "withdraw",
            (
                Bytes::from(bundle.proof.as_bytes()),
                element_to_h256(args.root),
                element_to_h256(args.nullifier_hash),
                args.recipient,
                args.relayer,
                element_to_u256(args.fee),
                element_to_u256(args.refund),
            ),
            U256::zero(),
        )
        .await
    }

    async fn network_id(&self) -> Result<u64> {
        self.client.network_id().await
    }
}

/// `Deposit(bytes32 indexed commitment, uint32 leafIndex, uint256 timestamp)`
fn parse_deposit_log(log: &Log) -> Result<DepositEvent> {
    let commitment = log
        .topics
        .get(1)
        .copied()
        .ok_or(Error::MalformedEvent("missing commitment topic"))?;

    let data = &log.data.0;
    if data.len() != 64 {
        return Err(Error::MalformedEvent("expected 64 bytes of event data"));
    }

    let leaf_index = U256::from_big_endian(&data[..32]);
    let leaf_index = u32::try_from(leaf_index)
        .map_err(|_| Error::MalformedEvent("leaf index does not fit in a uint32"))?;
    let timestamp = U256::from_big_endian(&data[32..]);

    Ok(DepositEvent {
        commitment: h256_to_element(commitment),
        leaf_index,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use mixer_prover::{Proof, PublicArgs};

    use super::*;

    fn log(topics: Vec<H256>, data: Vec<u8>) -> Log {
        Log {
            topics,
            data: Bytes(data),
            ..serde_json::from_value(serde_json::json!({
                "address": "0x0000000000000000000000000000000000000000",
                "topics": [],
                "data": "0x",
            }))
            .unwrap()
        }
    }

    fn event_data(leaf_index: u64, timestamp: u64) -> Vec<u8> {
        let mut data = vec![0; 64];
        U256::from(leaf_index).to_big_endian(&mut data[..32]);
        U256::from(timestamp).to_big_endian(&mut data[32..]);
        data
    }

    #[test]
    fn deposit_topic_matches_abi() {
        let client = Client::new("http://127.0.0.1:8545", None).unwrap();
        let contract = client
            .load_contract_from_str(
                "0x0000000000000000000000000000000000000001",
                include_str!("../abi/Tornado.json"),
            )
            .unwrap();

        let event = contract.abi().event("Deposit").unwrap();

        assert_eq!(
            event.signature(),
            H256::from_slice(&Keccak256::digest(DEPOSIT_EVENT_SIGNATURE))
        );
    }

    #[test]
    fn parses_deposit_logs() {
        let commitment = element_to_h256(Element::new(42));
        let log = log(vec![H256::zero(), commitment], event_data(7, 1_700_000_000));

        let event = parse_deposit_log(&log).unwrap();

        assert_eq!(event.commitment, Element::new(42));
        assert_eq!(event.leaf_index, 7);
        assert_eq!(event.timestamp, U256::from(1_700_000_000u64));
    }

    #[test]
    fn malformed_logs_are_rejected() {
        let commitment = element_to_h256(Element::new(42));

        let missing_topic = log(vec![H256::zero()], event_data(0, 0));
        assert!(matches!(
            parse_deposit_log(&missing_topic),
            Err(Error::MalformedEvent(_))
        ));

        let short = log(vec![H256::zero(), commitment], vec![0; 32]);
        assert!(matches!(
            parse_deposit_log(&short),
            Err(Error::MalformedEvent(_))
        ));

        let mut huge_index = event_data(0, 0);
        huge_index[0] = 1;
        let huge_index = log(vec![H256::zero(), commitment], huge_index);
        assert!(matches!(
            parse_deposit_log(&huge_index),
            Err(Error::MalformedEvent(_))
        ));
    }

    #[test]
    fn embedded_abi_loads() {
        let client = Client::new("http://127.0.0.1:8545", None).unwrap();
        let address = "0x0000000000000000000000000000000000000001";

        let contract = MixerContract::load(client, address, None, U256::exp10(17)).unwrap();

        assert_eq!(contract.address(), Address::from_low_u64_be(1));
        assert_eq!(contract.signer_address(), None);
        assert!(contract.contract.abi().function("withdraw").is_ok());
        assert!(contract.contract.abi().event("Deposit").is_ok());
    }

    #[tokio::test]
    async fn read_only_contract_cannot_deposit() {
        let client = Client::new("http://127.0.0.1:8545", None).unwrap();
        let address = "0x0000000000000000000000000000000000000001";
        let contract = MixerContract::load(client, address, None, U256::exp10(17)).unwrap();

        let result = contract.deposit(Element::ONE).await;

        assert!(matches!(result, Err(Error::ReadOnly)));
    }

    #[tokio::test]
    async fn refunds_are_rejected_before_sending() {
        let client = Client::new("http://127.0.0.1:8545", None).unwrap();
        let address = "0x0000000000000000000000000000000000000001";
        let contract = MixerContract::load(client, address, None, U256::exp10(17)).unwrap();

        let bundle = ProofBundle {
            proof: Proof::new(vec![1]),
            public_args: PublicArgs {
                root: Element::ONE,
                nullifier_hash: Element::new(2),
                recipient: Address::repeat_byte(3),
                relayer: Address::zero(),
                fee: Element::ZERO,
                refund: Element::new(1),
            },
        };

        assert!(!contract.supports_refund());
        assert!(matches!(
            contract.withdraw(&bundle).await,
            Err(Error::RefundNotSupported)
        ));

        let no_refund = ProofBundle {
            public_args: PublicArgs {
                refund: Element::ZERO,
                ..bundle.public_args
            },
            ..bundle
        };
        assert!(matches!(contract.withdraw(&no_refund).await, Err(Error::ReadOnly)));
    }
}
