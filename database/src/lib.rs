use core::ops::RangeFrom;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use im::OrdMap;
use snap::raw::{Decoder, Encoder};
use tap::Pipe as _;

/// Ordered key-value store with `snap`-compressed values.
///
/// Batches are applied to a copy of the map that replaces the original only after every pair in
/// the batch has been encoded, so readers never see half of a batch.
#[derive(Default)]
pub struct Database {
    // Values are cloned by `OrdMap::clone` and by iterators, so they should be cheaply
    // cloneable. This disqualifies `Vec<u8>` and `Box<[u8]>`.
    map: Mutex<InMemoryMap>,
}

impl Database {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.map
            .lock()
            .expect("in-memory database mutex is poisoned")
            .contains_key(key.as_ref())
            .pipe(Ok)
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.map
            .lock()
            .expect("in-memory database mutex is poisoned")
            .get(key.as_ref())
            .map(|compressed| decompress(compressed))
            .transpose()
    }

    /// Iterates over a snapshot of the pairs whose keys are greater than or equal to
    /// `range.start`, in ascending key order.
    pub fn iterator_ascending(
        &self,
        range: RangeFrom<impl AsRef<[u8]>>,
    ) -> Result<impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>>> {
        let start = range.start.as_ref();
        let map = self.map.lock().expect("in-memory database mutex is poisoned");
        let start_pair = map.get_key_value(start);
        let (_, mut above) = map.split(start);

        if let Some((key, value)) = start_pair {
            above.insert(Arc::clone(key), Arc::clone(value));
        }

        above
            .into_iter()
            .map(|(key, value)| Ok((key.to_vec(), decompress(&value)?)))
            .pipe(Ok)
    }

    /// Iterates over the pairs whose keys start with `prefix`, in ascending key order.
    pub fn iterator_prefix(
        &self,
        prefix: impl AsRef<[u8]>,
    ) -> Result<impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>>> {
        let prefix = prefix.as_ref().to_vec();

        self.iterator_ascending(prefix.clone()..)?
            .take_while(move |result| match result {
                Ok((key, _)) => key.starts_with(&prefix),
                Err(_) => true,
            })
            .pipe(Ok)
    }

    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        self.put_batch(core::iter::once((key, value)))
    }

    pub fn put_batch(
        &self,
        pairs: impl IntoIterator<Item = (impl AsRef<[u8]>, impl AsRef<[u8]>)>,
    ) -> Result<()> {
        let mut map = self.map.lock().expect("in-memory database mutex is poisoned");
        let mut new_map = map.clone();

        for (key, value) in pairs {
            let key = key.as_ref().into();
            let compressed = compress(value.as_ref())?.into();
            new_map.insert(key, compressed);
        }

        *map = new_map;

        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map
            .lock()
            .expect("in-memory database mutex is poisoned")
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key types whose string form starts with a fixed prefix.
pub trait PrefixableKey {
    const PREFIX: &'static str;

    #[must_use]
    fn has_prefix(bytes: &[u8]) -> bool {
        bytes.starts_with(Self::PREFIX.as_bytes())
    }
}

type InMemoryMap = OrdMap<Arc<[u8]>, Arc<[u8]>>;

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    Encoder::new().compress_vec(data).map_err(Into::into)
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    Decoder::new().decompress_vec(data).map_err(Into::into)
}
