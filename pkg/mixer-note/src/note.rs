use core::{fmt, str::FromStr};

use mixer_primitives::Element;

use crate::{Deposit, Error, Result, PREIMAGE_BYTES, SCALAR_BYTES};

const PREFIX: &str = "tornado";
const HEX_LEN: usize = PREIMAGE_BYTES * 2;

/// The public metadata written into a note alongside the secret
///
/// `currency` must be non-empty and made of ASCII letters, digits and `_`. `amount` must be a
/// non-empty string of ASCII digits and `.`. Anything else would produce a note that cannot be
/// parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawNoteTag"))]
pub struct NoteTag {
    currency: String,
    amount: String,
    network_id: u64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawNoteTag {
    currency: String,
    amount: String,
    network_id: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawNoteTag> for NoteTag {
    type Error = Error;

    fn try_from(raw: RawNoteTag) -> Result<Self> {
        NoteTag::new(raw.currency, raw.amount, raw.network_id)
    }
}

impl NoteTag {
    /// Create a tag, validating `currency` and `amount`
    ///
    /// ```rust
    /// # use mixer_note::*;
    /// assert!(NoteTag::new("eth", "0.1", 1).is_ok());
    /// assert!(NoteTag::new("e-th", "0.1", 1).is_err());
    /// assert!(NoteTag::new("eth", "1e18", 1).is_err());
    /// ```
    pub fn new(
        currency: impl Into<String>,
        amount: impl Into<String>,
        network_id: u64,
    ) -> Result<Self> {
        let currency = currency.into();
        let amount = amount.into();

        if !is_currency(&currency) {
            return Err(Error::InvalidTag("currency must match [A-Za-z0-9_]+"));
        }

        if !is_amount(&amount) {
            return Err(Error::InvalidTag("amount must match [0-9.]+"));
        }

        Ok(Self {
            currency,
            amount,
            network_id,
        })
    }

    /// The currency symbol, e.g. `eth`
    #[inline]
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The denomination, as written in the note, e.g. `0.1`
    #[inline]
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// The id of the network the deposit was made on
    #[inline]
    #[must_use]
    pub fn network_id(&self) -> u64 {
        self.network_id
    }
}

/// A deposit and its tag, in the form a user keeps
///
/// The text form is `tornado-<currency>-<amount>-<networkId>-0x<preimage>`, where `<preimage>` is
/// the 62-byte `LE31(nullifier) ‖ LE31(secret)` as 124 hex characters. Parsing is strict: the
/// whole string must match, and any other number of hex characters is rejected.
///
/// ```rust
/// # use mixer_note::*;
/// # use mixer_primitives::*;
/// let deposit = Deposit::derive(Element::new(1), Element::new(2)).unwrap();
/// let tag = NoteTag::new("eth", "0.1", 1337).unwrap();
///
/// let note = Note::new(tag, deposit);
/// let text = note.to_string();
/// assert!(text.starts_with("tornado-eth-0.1-1337-0x01000000"));
///
/// let parsed: Note = text.parse().unwrap();
/// assert_eq!(parsed, note);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Public metadata
    pub tag: NoteTag,
    /// The secret material and its derived values
    pub deposit: Deposit,
}

impl Note {
    /// Create a note from its parts
    #[inline]
    #[must_use]
    pub fn new(tag: NoteTag, deposit: Deposit) -> Self {
        Self { tag, deposit }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let NoteTag {
            currency,
            amount,
            network_id,
        } = &self.tag;
        let preimage = hex::encode(self.deposit.preimage());

        write!(f, "{PREFIX}-{currency}-{amount}-{network_id}-0x{preimage}")
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('-');

        let mut next = |what| parts.next().ok_or(Error::MalformedNote(what));
        let prefix = next("missing prefix")?;
        let currency = next("missing currency")?;
        let amount = next("missing amount")?;
        let network_id = next("missing network id")?;
        let payload = next("missing preimage")?;

        if parts.next().is_some() {
            return Err(Error::MalformedNote("too many fields"));
        }

        if prefix != PREFIX {
            return Err(Error::MalformedNote("unknown prefix"));
        }

        if !is_currency(currency) {
            return Err(Error::MalformedNote("invalid currency"));
        }

        if !is_amount(amount) {
            return Err(Error::MalformedNote("invalid amount"));
        }

        if network_id.is_empty() || !network_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedNote("invalid network id"));
        }

        let network_id = network_id
            .parse()
            .map_err(|_| Error::MalformedNote("network id is too large"))?;

        let deposit = decode_preimage(payload)?;

        Ok(Self {
            tag: NoteTag {
                currency: currency.to_owned(),
                amount: amount.to_owned(),
                network_id,
            },
            deposit,
        })
    }
}

/// Write a deposit and tag as a note string
#[must_use]
pub fn encode(deposit: &Deposit, tag: &NoteTag) -> String {
    Note::new(tag.clone(), deposit.clone()).to_string()
}

/// Parse a note string and recover its deposit
///
/// The tag is discarded, use [`Note::from_str`] to keep it
pub fn decode(note: &str) -> Result<Deposit> {
    note.parse::<Note>().map(|note| note.deposit)
}

fn decode_preimage(payload: &str) -> Result<Deposit> {
    let hex_digits = payload
        .strip_prefix("0x")
        .ok_or(Error::MalformedNote("preimage must start with 0x"))?;

    if hex_digits.len() != HEX_LEN {
        return Err(Error::MalformedNote("preimage must be 124 hex characters"));
    }

    let mut preimage = [0; PREIMAGE_BYTES];
    hex::decode_to_slice(hex_digits, &mut preimage)
        .map_err(|_| Error::MalformedNote("preimage is not valid hex"))?;

    let (nullifier, secret) = preimage.split_at(SCALAR_BYTES);
    let nullifier =
        Element::from_le_slice(nullifier).ok_or(Error::ScalarOutOfRange { name: "nullifier" })?;
    let secret =
        Element::from_le_slice(secret).ok_or(Error::ScalarOutOfRange { name: "secret" })?;

    Deposit::derive(nullifier, secret)
}

fn is_currency(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_amount(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}
