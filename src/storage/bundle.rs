//! ANS-104 data items, the signed envelope Irys accepts.
//!
//! Layout (little-endian integers):
//!
//! ```text
//! u16 signature type | signature | owner | target flag [+32] | anchor flag [+32]
//! | u64 tag count | u64 tag bytes | avro tags | data
//! ```
//!
//! The signature covers the SHA-384 deep hash of the item's fields. Only the
//! ed25519 signature type is produced here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256, Sha384};
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::solana::Wallet;

/// ed25519 signature type.
pub const SIGNATURE_TYPE_ED25519: u16 = 2;
pub const SIGNATURE_LENGTH: usize = 64;
pub const OWNER_LENGTH: usize = 32;

pub const MAX_TAGS: usize = 128;
pub const MAX_TAG_NAME_BYTES: usize = 1024;
pub const MAX_TAG_VALUE_BYTES: usize = 3072;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("too many tags: {0} (max {MAX_TAGS})", MAX_TAGS = MAX_TAGS)]
    TooManyTags(usize),

    #[error("tag '{0}' exceeds the size limit")]
    TagTooLarge(String),

    #[error("unsupported signature type {0}")]
    UnsupportedSignatureType(u16),

    #[error("malformed data item: {0}")]
    Malformed(&'static str),
}

/// A `name = value` tag attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A signed data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    signature: [u8; SIGNATURE_LENGTH],
    owner: [u8; OWNER_LENGTH],
    target: Option<[u8; 32]>,
    anchor: Option<[u8; 32]>,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

impl DataItem {
    /// Build and sign a data item with a random anchor.
    pub fn sign(wallet: &Wallet, data: Vec<u8>, tags: Vec<Tag>) -> Result<Self, BundleError> {
        Self::sign_with_anchor(wallet, data, tags, Some(rand::random()))
    }

    pub fn sign_with_anchor(
        wallet: &Wallet,
        data: Vec<u8>,
        tags: Vec<Tag>,
        anchor: Option<[u8; 32]>,
    ) -> Result<Self, BundleError> {
        check_tags(&tags)?;
        let mut item = Self {
            signature: [0u8; SIGNATURE_LENGTH],
            owner: wallet.pubkey().to_bytes(),
            target: None,
            anchor,
            tags,
            data,
        };
        let message = item.signing_message();
        let signature = wallet.sign_message(&message);
        item.signature.copy_from_slice(signature.as_ref());
        Ok(item)
    }

    /// Deep hash of the fields covered by the signature.
    pub fn signing_message(&self) -> [u8; 48] {
        let signature_type = SIGNATURE_TYPE_ED25519.to_string();
        let tags = encode_tags(&self.tags);
        let target: &[u8] = self.target.as_ref().map(|t| &t[..]).unwrap_or(&[]);
        let anchor: &[u8] = self.anchor.as_ref().map(|a| &a[..]).unwrap_or(&[]);

        deep_hash(&DeepHashChunk::List(vec![
            DeepHashChunk::Blob(b"dataitem"),
            DeepHashChunk::Blob(b"1"),
            DeepHashChunk::Blob(signature_type.as_bytes()),
            DeepHashChunk::Blob(&self.owner),
            DeepHashChunk::Blob(target),
            DeepHashChunk::Blob(anchor),
            DeepHashChunk::Blob(&tags),
            DeepHashChunk::Blob(&self.data),
        ]))
    }

    /// Check the signature against the owner key.
    pub fn verify(&self) -> bool {
        Signature::from(self.signature).verify(&self.owner, &self.signing_message())
    }

    /// Item id: base64url of the SHA-256 of the signature.
    pub fn id(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(self.signature))
    }

    /// Binary encoding for upload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let tags = encode_tags(&self.tags);
        let mut out = Vec::with_capacity(
            2 + SIGNATURE_LENGTH + OWNER_LENGTH + 66 + 16 + tags.len() + self.data.len(),
        );
        out.extend_from_slice(&SIGNATURE_TYPE_ED25519.to_le_bytes());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.owner);
        for optional in [&self.target, &self.anchor] {
            match optional {
                Some(bytes) => {
                    out.push(1);
                    out.extend_from_slice(bytes);
                }
                None => out.push(0),
            }
        }
        out.extend_from_slice(&(self.tags.len() as u64).to_le_bytes());
        out.extend_from_slice(&(tags.len() as u64).to_le_bytes());
        out.extend_from_slice(&tags);
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse an encoded item.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BundleError> {
        let mut reader = Reader::new(bytes);

        let signature_type = u16::from_le_bytes(reader.array()?);
        if signature_type != SIGNATURE_TYPE_ED25519 {
            return Err(BundleError::UnsupportedSignatureType(signature_type));
        }
        let signature = reader.array::<SIGNATURE_LENGTH>()?;
        let owner = reader.array::<OWNER_LENGTH>()?;
        let target = reader.optional()?;
        let anchor = reader.optional()?;
        let tag_count = u64::from_le_bytes(reader.array()?) as usize;
        let tag_bytes = u64::from_le_bytes(reader.array()?) as usize;
        let tags = decode_tags(reader.take(tag_bytes)?)?;
        if tags.len() != tag_count {
            return Err(BundleError::Malformed("tag count mismatch"));
        }
        let data = reader.rest().to_vec();

        Ok(Self {
            signature,
            owner,
            target,
            anchor,
            tags,
            data,
        })
    }

    pub fn owner(&self) -> &[u8; OWNER_LENGTH] {
        &self.owner
    }

    pub fn anchor(&self) -> Option<&[u8; 32]> {
        self.anchor.as_ref()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn check_tags(tags: &[Tag]) -> Result<(), BundleError> {
    if tags.len() > MAX_TAGS {
        return Err(BundleError::TooManyTags(tags.len()));
    }
    for tag in tags {
        if tag.name.is_empty()
            || tag.name.len() > MAX_TAG_NAME_BYTES
            || tag.value.is_empty()
            || tag.value.len() > MAX_TAG_VALUE_BYTES
        {
            return Err(BundleError::TagTooLarge(tag.name.clone()));
        }
    }
    Ok(())
}

/// Input to [`deep_hash`].
pub enum DeepHashChunk<'a> {
    Blob(&'a [u8]),
    List(Vec<DeepHashChunk<'a>>),
}

/// Arweave deep hash over nested byte lists.
pub fn deep_hash(chunk: &DeepHashChunk<'_>) -> [u8; 48] {
    match chunk {
        DeepHashChunk::Blob(data) => {
            let tag = format!("blob{}", data.len());
            sha384_pair(&Sha384::digest(tag.as_bytes()), &Sha384::digest(data))
        }
        DeepHashChunk::List(chunks) => {
            let tag = format!("list{}", chunks.len());
            let mut acc = [0u8; 48];
            acc.copy_from_slice(&Sha384::digest(tag.as_bytes()));
            for chunk in chunks {
                acc = sha384_pair(&acc, &deep_hash(chunk));
            }
            acc
        }
    }
}

fn sha384_pair(a: &[u8], b: &[u8]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    hasher.update(a);
    hasher.update(b);
    let mut out = [0u8; 48];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Avro encoding of `array<record { name: bytes, value: bytes }>`.
///
/// No tags encode to zero bytes.
pub fn encode_tags(tags: &[Tag]) -> Vec<u8> {
    if tags.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    write_long(&mut out, tags.len() as i64);
    for tag in tags {
        write_long(&mut out, tag.name.len() as i64);
        out.extend_from_slice(tag.name.as_bytes());
        write_long(&mut out, tag.value.len() as i64);
        out.extend_from_slice(tag.value.as_bytes());
    }
    write_long(&mut out, 0);
    out
}

pub fn decode_tags(bytes: &[u8]) -> Result<Vec<Tag>, BundleError> {
    let mut tags = Vec::new();
    if bytes.is_empty() {
        return Ok(tags);
    }
    let mut reader = Reader::new(bytes);
    loop {
        let mut count = reader.long()?;
        if count == 0 {
            break;
        }
        if count < 0 {
            // Negative counts are followed by the block size in bytes.
            count = -count;
            reader.long()?;
        }
        for _ in 0..count {
            let name = reader.avro_string()?;
            let value = reader.avro_string()?;
            tags.push(Tag { name, value });
        }
    }
    Ok(tags)
}

fn write_long(out: &mut Vec<u8>, value: i64) {
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    while zigzag >= 0x80 {
        out.push((zigzag as u8 & 0x7f) | 0x80);
        zigzag >>= 7;
    }
    out.push(zigzag as u8);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], BundleError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(BundleError::Malformed("unexpected end of input"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], BundleError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn optional(&mut self) -> Result<Option<[u8; 32]>, BundleError> {
        match self.take(1)?[0] {
            0 => Ok(None),
            1 => Ok(Some(self.array()?)),
            _ => Err(BundleError::Malformed("invalid presence flag")),
        }
    }

    fn long(&mut self) -> Result<i64, BundleError> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            if shift >= 64 {
                return Err(BundleError::Malformed("varint too long"));
            }
            let byte = self.take(1)?[0];
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(((value >> 1) as i64) ^ -((value & 1) as i64))
    }

    fn avro_string(&mut self) -> Result<String, BundleError> {
        let len = self.long()?;
        if len < 0 {
            return Err(BundleError::Malformed("negative length"));
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| BundleError::Malformed("tag is not utf-8"))
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::keypair::Keypair;

    fn wallet() -> Wallet {
        Wallet::new(Keypair::new())
    }

    #[test]
    fn test_encode_tags_avro() {
        let bytes = encode_tags(&[Tag::new("Content-Type", "image/jpeg")]);
        let mut expected = vec![0x02, 0x18];
        expected.extend_from_slice(b"Content-Type");
        expected.push(0x14);
        expected.extend_from_slice(b"image/jpeg");
        expected.push(0x00);
        assert_eq!(bytes, expected);

        assert!(encode_tags(&[]).is_empty());
    }

    #[test]
    fn test_decode_tags_roundtrip_long_values() {
        let tags = vec![
            Tag::new("Content-Type", "application/json"),
            Tag::new("App-Name", "x".repeat(300)),
        ];
        assert_eq!(decode_tags(&encode_tags(&tags)).unwrap(), tags);
    }

    #[test]
    fn test_zigzag_varint() {
        let mut out = Vec::new();
        write_long(&mut out, 64);
        assert_eq!(out, vec![0x80, 0x01]);

        let mut out = Vec::new();
        write_long(&mut out, -1);
        assert_eq!(out, vec![0x01]);
        assert_eq!(Reader::new(&out).long().unwrap(), -1);
    }

    #[test]
    fn test_deep_hash_distinguishes_structure() {
        let blob = deep_hash(&DeepHashChunk::Blob(b"abc"));
        let list = deep_hash(&DeepHashChunk::List(vec![DeepHashChunk::Blob(b"abc")]));
        assert_ne!(blob, list);
        assert_eq!(blob, deep_hash(&DeepHashChunk::Blob(b"abc")));

        // An empty list hashes to the hash of its tag.
        let empty = Sha384::digest(b"list0");
        assert_eq!(&deep_hash(&DeepHashChunk::List(Vec::new()))[..], &empty[..]);
    }

    #[test]
    fn test_signed_item_layout() {
        let wallet = wallet();
        let anchor = [7u8; 32];
        let item = DataItem::sign_with_anchor(
            &wallet,
            b"hello".to_vec(),
            vec![Tag::new("Content-Type", "text/plain")],
            Some(anchor),
        )
        .unwrap();
        assert!(item.verify());

        let bytes = item.to_bytes();
        assert_eq!(&bytes[..2], &[2, 0]);
        assert_eq!(&bytes[66..98], wallet.pubkey().as_ref());
        assert_eq!(bytes[98], 0); // no target
        assert_eq!(bytes[99], 1); // anchor present
        assert_eq!(&bytes[100..132], &anchor);
        assert_eq!(&bytes[132..140], &1u64.to_le_bytes());
        assert!(bytes.ends_with(b"hello"));

        let parsed = DataItem::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, item);
        assert_eq!(parsed.id(), item.id());
        assert_eq!(parsed.id().len(), 43);
    }

    #[test]
    fn test_tampered_item_fails_verification() {
        let item = DataItem::sign(&wallet(), b"hello".to_vec(), Vec::new()).unwrap();
        let mut bytes = item.to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(!DataItem::from_bytes(&bytes).unwrap().verify());
    }

    #[test]
    fn test_random_anchor_changes_id() {
        let wallet = wallet();
        let a = DataItem::sign(&wallet, b"same".to_vec(), Vec::new()).unwrap();
        let b = DataItem::sign(&wallet, b"same".to_vec(), Vec::new()).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.anchor().is_some());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            DataItem::from_bytes(&[1, 0]),
            Err(BundleError::UnsupportedSignatureType(1))
        );
        assert!(matches!(
            DataItem::from_bytes(&[2, 0, 1]),
            Err(BundleError::Malformed(_))
        ));
        assert_eq!(
            DataItem::sign(&wallet(), Vec::new(), vec![Tag::new("", "x")]),
            Err(BundleError::TagTooLarge(String::new()))
        );
    }
}
