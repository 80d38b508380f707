//! The source-chain block header and its canonical RLP codec.

use ethnum::U256;
use rlp::{Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

use crate::{
    buf::{Address, Buf32},
    errors::HeaderCodecError,
    keccak::keccak256,
    uint::{from_be_slice, to_minimal_be},
};

/// Hash of the RLP encoding of an empty ommers list.
pub const EMPTY_OMMERS_HASH: Buf32 = Buf32([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// Root hash of an empty Merkle-Patricia trie.
pub const EMPTY_TRIE_ROOT: Buf32 = Buf32([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Length of the logs bloom filter in bytes.
pub const BLOOM_LEN: usize = 256;

/// Number of RLP fields in a header without a base fee.
const LEGACY_FIELD_COUNT: usize = 15;

/// Number of RLP fields covered by the seal hash (everything but `mix_hash` and `nonce`).
const SEAL_FIELD_COUNT: usize = 13;

/// A proof-of-work block header of the source chain.
///
/// The relay treats most fields as opaque; the ones it re-derives validity rules for are
/// `parent_hash`, `number`, `difficulty`, `timestamp`, `gas_limit`, `gas_used`, `mix_hash` and
/// `nonce`, and the trie roots are used as anchors for inclusion proofs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the parent header.
    pub parent_hash: Buf32,

    /// Hash of the ommers (uncles) list.
    pub ommers_hash: Buf32,

    /// Recipient of the block reward.
    pub beneficiary: Address,

    /// Root of the state trie after the block.
    pub state_root: Buf32,

    /// Root of the transactions trie.
    pub transactions_root: Buf32,

    /// Root of the receipts trie.
    pub receipts_root: Buf32,

    /// Bloom filter over the block's logs.
    #[serde(with = "hex::serde")]
    pub logs_bloom: Vec<u8>,

    /// Difficulty of this block.
    #[serde(with = "crate::serde_u256")]
    pub difficulty: U256,

    /// Height of the block.
    pub number: u64,

    /// Gas limit of the block.
    pub gas_limit: u64,

    /// Gas used by the block's transactions.
    pub gas_used: u64,

    /// Unix timestamp in seconds.
    pub timestamp: u64,

    /// Arbitrary extra data chosen by the miner.
    #[serde(with = "hex::serde")]
    pub extra_data: Vec<u8>,

    /// Compressed ethash mix digest.
    pub mix_hash: Buf32,

    /// The PoW nonce, encoded as 8 big-endian bytes.
    pub nonce: u64,

    /// Base fee per gas, present on headers after the fee-market upgrade.
    #[serde(
        default,
        with = "crate::serde_u256::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_fee_per_gas: Option<U256>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            parent_hash: Buf32::zero(),
            ommers_hash: EMPTY_OMMERS_HASH,
            beneficiary: Address::zero(),
            state_root: EMPTY_TRIE_ROOT,
            transactions_root: EMPTY_TRIE_ROOT,
            receipts_root: EMPTY_TRIE_ROOT,
            logs_bloom: vec![0; BLOOM_LEN],
            difficulty: U256::ZERO,
            number: 0,
            gas_limit: 0,
            gas_used: 0,
            timestamp: 0,
            extra_data: Vec::new(),
            mix_hash: Buf32::zero(),
            nonce: 0,
            base_fee_per_gas: None,
        }
    }
}

impl Header {
    /// Computes the header hash: keccak-256 over the full RLP encoding.
    pub fn hash(&self) -> Buf32 {
        keccak256(self.to_rlp())
    }

    /// Computes the seal hash: keccak-256 over the RLP encoding without `mix_hash` and `nonce`.
    ///
    /// This is the pre-image the PoW search runs over.
    pub fn seal_hash(&self) -> Buf32 {
        let mut stream = RlpStream::new_list(SEAL_FIELD_COUNT + self.base_fee_count());
        self.append_unsealed(&mut stream);
        if let Some(base_fee) = &self.base_fee_per_gas {
            stream.append(&RlpUint(base_fee));
        }
        keccak256(stream.out())
    }

    /// Encodes the header as a canonical RLP list.
    pub fn to_rlp(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(LEGACY_FIELD_COUNT + self.base_fee_count());
        self.append_unsealed(&mut stream);
        stream.append(&self.mix_hash);
        stream.append(&self.nonce.to_be_bytes().to_vec());
        if let Some(base_fee) = &self.base_fee_per_gas {
            stream.append(&RlpUint(base_fee));
        }
        stream.out().to_vec()
    }

    /// Decodes a header from its RLP encoding, rejecting trailing bytes and non-canonical
    /// integers.
    pub fn from_rlp(bytes: &[u8]) -> Result<Self, HeaderCodecError> {
        let rlp = Rlp::new(bytes);
        if !rlp.is_list() {
            return Err(HeaderCodecError::NotAList);
        }

        let total = rlp.payload_info()?.total();
        if total != bytes.len() {
            return Err(HeaderCodecError::TrailingBytes(bytes.len().saturating_sub(total)));
        }

        let count = rlp.item_count()?;
        if count != LEGACY_FIELD_COUNT && count != LEGACY_FIELD_COUNT + 1 {
            return Err(HeaderCodecError::FieldCount(count));
        }

        let base_fee_per_gas = if count > LEGACY_FIELD_COUNT {
            Some(decode_u256(&rlp, 15, "base_fee_per_gas")?)
        } else {
            None
        };

        Ok(Self {
            parent_hash: decode_buf32(&rlp, 0, "parent_hash")?,
            ommers_hash: decode_buf32(&rlp, 1, "ommers_hash")?,
            beneficiary: decode_fixed(&rlp, 2, "beneficiary", Address::LEN, Address::from_slice)?,
            state_root: decode_buf32(&rlp, 3, "state_root")?,
            transactions_root: decode_buf32(&rlp, 4, "transactions_root")?,
            receipts_root: decode_buf32(&rlp, 5, "receipts_root")?,
            logs_bloom: decode_fixed(&rlp, 6, "logs_bloom", BLOOM_LEN, |data| {
                (data.len() == BLOOM_LEN).then(|| data.to_vec())
            })?,
            difficulty: decode_u256(&rlp, 7, "difficulty")?,
            number: rlp.val_at(8)?,
            gas_limit: rlp.val_at(9)?,
            gas_used: rlp.val_at(10)?,
            timestamp: rlp.val_at(11)?,
            extra_data: rlp.at(12)?.data()?.to_vec(),
            mix_hash: decode_buf32(&rlp, 13, "mix_hash")?,
            nonce: decode_fixed(&rlp, 14, "nonce", 8, |data| {
                <[u8; 8]>::try_from(data).ok().map(u64::from_be_bytes)
            })?,
            base_fee_per_gas,
        })
    }

    fn base_fee_count(&self) -> usize {
        usize::from(self.base_fee_per_gas.is_some())
    }

    fn append_unsealed(&self, stream: &mut RlpStream) {
        stream
            .append(&self.parent_hash)
            .append(&self.ommers_hash)
            .append(&self.beneficiary)
            .append(&self.state_root)
            .append(&self.transactions_root)
            .append(&self.receipts_root)
            .append(&self.logs_bloom)
            .append(&RlpUint(&self.difficulty))
            .append(&self.number)
            .append(&self.gas_limit)
            .append(&self.gas_used)
            .append(&self.timestamp)
            .append(&self.extra_data);
    }
}

/// Encodes a [`U256`] as a minimal big-endian RLP string.
struct RlpUint<'a>(&'a U256);

impl Encodable for RlpUint<'_> {
    fn rlp_append(&self, stream: &mut RlpStream) {
        stream.encoder().encode_value(&to_minimal_be(self.0));
    }
}

fn decode_fixed<T>(
    rlp: &Rlp<'_>,
    index: usize,
    field: &'static str,
    expected: usize,
    parse: impl FnOnce(&[u8]) -> Option<T>,
) -> Result<T, HeaderCodecError> {
    let data = rlp.at(index)?.data()?;
    let actual = data.len();
    parse(data).ok_or(HeaderCodecError::FieldLength {
        field,
        actual,
        expected,
    })
}

fn decode_buf32(rlp: &Rlp<'_>, index: usize, field: &'static str) -> Result<Buf32, HeaderCodecError> {
    decode_fixed(rlp, index, field, Buf32::LEN, Buf32::from_slice)
}

fn decode_u256(rlp: &Rlp<'_>, index: usize, field: &'static str) -> Result<U256, HeaderCodecError> {
    let data = rlp.at(index)?.data()?;
    if data.first() == Some(&0) {
        return Err(HeaderCodecError::NonCanonicalInteger(field));
    }
    from_be_slice(data).ok_or(HeaderCodecError::NonCanonicalInteger(field))
}
