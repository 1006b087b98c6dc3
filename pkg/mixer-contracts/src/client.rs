use std::{
    future::Future,
    time::{Duration, Instant},
};

use crate::{Error, Result};
use ethereum_types::{Address, H256, U64};
use web3::{
    contract::{
        tokens::{Detokenize, Tokenize},
        Contract, Options,
    },
    ethabi,
    signing::SecretKey,
    transports::Http,
    types::{BlockId, BlockNumber, Filter, Log, TransactionId, U256},
    Web3,
};

/// How long a submitted transaction may be unknown to the node before giving up
const UNKNOWN_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Pauses between attempts when the node cannot be reached
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(5),
    Duration::from_secs(10),
];

const GAS_LIMIT: u64 = 10_000_000;
const GWEI: u64 = 1_000_000_000;

/// A JSON-RPC connection to an EVM node
#[derive(Debug, Clone)]
pub struct Client {
    web3: Web3<Http>,
    minimum_gas_price: Option<U256>,
}

impl Client {
    pub fn new(rpc: &str, minimum_gas_price_gwei: Option<u64>) -> Result<Client> {
        Ok(Client {
            web3: Web3::new(Http::new(rpc)?),
            minimum_gas_price: minimum_gas_price_gwei.map(|gwei| U256::from(gwei) * GWEI),
        })
    }

    pub fn web3(&self) -> &Web3<Http> {
        &self.web3
    }

    /// Bind an ABI to `address`
    ///
    /// `contract_json` is either a bare ABI array or a build artifact with an `abi` field.
    pub fn load_contract_from_str(
        &self,
        address: &str,
        contract_json: &str,
    ) -> Result<Contract<Http>> {
        let mut json = serde_json::from_str::<serde_json::Value>(contract_json)?;
        let abi = match json.get_mut("abi") {
            Some(abi) => abi.take(),
            None => json,
        };

        let abi = serde_json::from_value::<ethabi::Contract>(abi)?;
        let address = address.trim_start_matches("0x").parse()?;

        Ok(Contract::new(self.web3.eth(), address, abi))
    }

    /// The node's `net_version`
    #[tracing::instrument(err, ret, skip(self))]
    pub async fn network_id(&self) -> Result<u64> {
        let version = with_retries(|| self.web3.net().version()).await?;

        match version.trim().parse() {
            Ok(network_id) => Ok(network_id),
            Err(_) => Err(Error::MalformedNetworkId(version)),
        }
    }

    /// Twice the node's suggested gas price, but never below the configured minimum
    pub async fn gas_price(&self) -> Result<U256, web3::Error> {
        let suggested = with_retries(|| self.web3.eth().gas_price()).await?;
        let doubled = suggested.saturating_mul(2.into());

        Ok(match self.minimum_gas_price {
            Some(minimum) => doubled.max(minimum),
            None => doubled,
        })
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256, web3::Error> {
        with_retries(|| {
            self.web3
                .eth()
                .transaction_count(address, Some(BlockNumber::Pending))
        })
        .await
    }

    /// Sign and submit a call to `func`, paying `value` wei
    ///
    /// The gas limit is the node's estimate plus half again.
    #[tracing::instrument(err, ret, skip(self, contract, params, signer))]
    pub async fn send(
        &self,
        contract: &Contract<Http>,
        func: &str,
        params: impl Tokenize + Clone,
        value: U256,
        signer: &SecretKey,
        signer_address: Address,
    ) -> Result<H256> {
        let options = Options {
            gas: Some(GAS_LIMIT.into()),
            gas_price: Some(self.gas_price().await?),
            nonce: Some(self.pending_nonce(signer_address).await?),
            value: Some(value),
            ..Options::default()
        };

        let estimate = with_retries(|| {
            contract.estimate_gas(func, params.clone(), signer_address, options.clone())
        })
        .await?;

        let options = Options {
            gas: Some(estimate + estimate / 2),
            ..options
        };

        let txn_hash = with_retries(|| {
            contract.signed_call(func, params.clone(), options.clone(), signer)
        })
        .await?;

        Ok(txn_hash)
    }

    /// Call a view function at the latest block
    pub async fn query<R, P>(
        &self,
        contract: &Contract<Http>,
        func: &str,
        params: P,
    ) -> Result<R, web3::contract::Error>
    where
        R: Detokenize,
        P: Tokenize + Clone,
    {
        with_retries(|| {
            contract.query(
                func,
                params.clone(),
                None::<Address>,
                Options::default(),
                None::<BlockId>,
            )
        })
        .await
    }

    pub async fn logs(&self, filter: Filter) -> Result<Vec<Log>, web3::Error> {
        with_retries(|| self.web3.eth().logs(filter.clone())).await
    }

    /// Poll every `poll_interval` until the transaction is mined, and return its block number
    ///
    /// Gives up with [`Error::UnknownTransaction`] if the node has not seen the transaction for
    /// 60 seconds. A transaction that was mined but reverted is an [`Error::TransactionReverted`].
    #[tracing::instrument(err, skip(self))]
    pub async fn wait_for_confirm(&self, txn_hash: H256, poll_interval: Duration) -> Result<U64> {
        let deadline = Instant::now() + UNKNOWN_TRANSACTION_TIMEOUT;
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let block_number = loop {
            ticker.tick().await;

            let txn = with_retries(|| self.web3.eth().transaction(TransactionId::Hash(txn_hash)))
                .await?;

            match txn {
                Some(txn) => match txn.block_number {
                    Some(block_number) => break block_number,
                    None => tracing::debug!("transaction is pending"),
                },
                None if Instant::now() > deadline => {
                    return Err(Error::UnknownTransaction(txn_hash));
                }
                None => {}
            }
        };

        let receipt = with_retries(|| self.web3.eth().transaction_receipt(txn_hash)).await?;
        let reverted = receipt
            .and_then(|receipt| receipt.status)
            .is_some_and(|status| status.is_zero());

        match reverted {
            true => Err(Error::TransactionReverted(txn_hash)),
            false => Ok(block_number),
        }
    }
}

/// Errors that mean the node could not be reached, as opposed to the node rejecting a request
trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for web3::Error {
    fn is_transient(&self) -> bool {
        matches!(self, web3::Error::Transport(_))
    }
}

impl Transient for web3::contract::Error {
    fn is_transient(&self) -> bool {
        match self {
            web3::contract::Error::Api(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Run `request`, retrying transport failures after each of [`RETRY_DELAYS`] (16s in total)
async fn with_retries<T, E, F, Fut>(mut request: F) -> Result<T, E>
where
    E: Transient + std::fmt::Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delays = RETRY_DELAYS.iter();

    loop {
        match request().await {
            Err(err) if err.is_transient() => match delays.next() {
                Some(delay) => {
                    tracing::warn!(?err, ?delay, "node unreachable, retrying");
                    tokio::time::sleep(*delay).await;
                }
                None => return Err(err),
            },
            result => return result,
        }
    }
}
