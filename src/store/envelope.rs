//! Tagged JSON envelope over a byte store
//!
//! Every stored value is written as
//! `{"tag": <tag>, "txid": <u64>, "value": <T>}`. The tag names the value
//! type a map was opened with; reading a value written under another tag is
//! a `TypeMismatch`, so typing is resolved once, at the store boundary.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use super::{BackingStore, ByteStore};
use crate::state::{Key, TxId, VersionedValue};

/// Decoded envelope. `Envelope<serde_json::Value>` is the untyped view
/// used by offline inspection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<T> {
    pub tag: String,
    pub txid: TxId,
    pub value: T,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    tag: &'a str,
    txid: TxId,
    value: &'a T,
}

impl Envelope<serde_json::Value> {
    /// Decode without checking the tag or the value type.
    pub fn decode_untyped(key: &Key, bytes: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(bytes).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })
    }
}

/// Adapts a [`ByteStore`] into a typed [`BackingStore`].
pub struct EncodedStore<B, T> {
    inner: B,
    tag: String,
    _marker: PhantomData<fn() -> T>,
}

impl<B, T> EncodedStore<B, T> {
    pub fn new(inner: B, tag: impl Into<String>) -> Self {
        Self {
            inner,
            tag: tag.into(),
            _marker: PhantomData,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B, T: Serialize + DeserializeOwned> EncodedStore<B, T> {
    fn encode(&self, key: &Key, value: &VersionedValue<T>) -> StoreResult<Vec<u8>> {
        let envelope = EnvelopeRef {
            tag: &self.tag,
            txid: value.txid(),
            value: value.value(),
        };
        serde_json::to_vec(&envelope).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })
    }

    fn decode(&self, key: &Key, bytes: &[u8]) -> StoreResult<VersionedValue<T>> {
        let raw = Envelope::decode_untyped(key, bytes)?;
        if raw.tag != self.tag {
            return Err(StoreError::TypeMismatch {
                key: key.to_string(),
                expected: self.tag.clone(),
                found: raw.tag,
            });
        }
        let value = serde_json::from_value(raw.value).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })?;
        Ok(VersionedValue::new(raw.txid, value))
    }
}

impl<B, T> BackingStore<T> for EncodedStore<B, T>
where
    B: ByteStore,
    T: Serialize + DeserializeOwned,
{
    fn multi_get(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<VersionedValue<T>>>> {
        let raw = self.inner.multi_get(keys)?;
        StoreError::check_batch(keys.len(), raw.len())?;

        keys.iter()
            .zip(raw)
            .map(|(key, bytes)| bytes.map(|b| self.decode(key, &b)).transpose())
            .collect()
    }

    fn multi_put(&mut self, keys: &[Key], values: &[VersionedValue<T>]) -> StoreResult<()> {
        StoreError::check_batch(keys.len(), values.len())?;

        let encoded = keys
            .iter()
            .zip(values)
            .map(|(key, value)| self.encode(key, value))
            .collect::<StoreResult<Vec<_>>>()?;

        self.inner.multi_put(keys, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tally {
        count: u64,
        last: String,
    }

    #[test]
    fn test_typed_values_survive_the_byte_store() {
        let dir = TempDir::new().unwrap();
        let mut store: EncodedStore<_, Tally> =
            EncodedStore::new(FileStore::open(dir.path()).unwrap(), "tally");

        let tally = Tally {
            count: 3,
            last: "x".into(),
        };
        store
            .multi_put(&[Key::from("k")], &[VersionedValue::new(TxId::new(4), tally.clone())])
            .unwrap();

        let got = store.multi_get(&[Key::from("k"), Key::from("missing")]).unwrap();
        assert_eq!(got[0], Some(VersionedValue::new(TxId::new(4), tally)));
        assert_eq!(got[1], None);
    }

    #[test]
    fn test_wire_shape_is_tagged() {
        let dir = TempDir::new().unwrap();
        let mut store: EncodedStore<_, u64> =
            EncodedStore::new(FileStore::open(dir.path()).unwrap(), "counter");
        store
            .multi_put(&[Key::from("k")], &[VersionedValue::new(TxId::new(9), 17)])
            .unwrap();

        let bytes = store.inner_mut().multi_get(&[Key::from("k")]).unwrap();
        let json: serde_json::Value = serde_json::from_slice(bytes[0].as_ref().unwrap()).unwrap();
        assert_eq!(json["tag"], "counter");
        assert_eq!(json["txid"], 9);
        assert_eq!(json["value"], 17);
    }

    #[test]
    fn test_foreign_tag_is_type_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut writer: EncodedStore<_, u64> =
            EncodedStore::new(FileStore::open(dir.path()).unwrap(), "counter");
        writer
            .multi_put(&[Key::from("k")], &[VersionedValue::new(TxId::new(1), 1)])
            .unwrap();

        let mut reader: EncodedStore<_, u64> = EncodedStore::new(writer.into_inner(), "gauge");
        let err = reader.multi_get(&[Key::from("k")]).unwrap_err();
        assert_eq!(err.code(), "TXSTATE_STORE_TYPE_MISMATCH");
    }

    #[test]
    fn test_wrong_value_shape_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let mut writer: EncodedStore<_, String> =
            EncodedStore::new(FileStore::open(dir.path()).unwrap(), "value");
        writer
            .multi_put(&[Key::from("k")], &[VersionedValue::new(TxId::new(1), "text".to_string())])
            .unwrap();

        let mut reader: EncodedStore<_, u64> = EncodedStore::new(writer.into_inner(), "value");
        let err = reader.multi_get(&[Key::from("k")]).unwrap_err();
        assert_eq!(err.code(), "TXSTATE_STORE_DECODE_FAILED");
    }
}
