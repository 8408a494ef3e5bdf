use bytes::{Bytes, BytesMut};
use num_traits::CheckedAdd;
use std::collections::{BTreeSet, HashMap};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio::time::{sleep_until, Duration, Instant};

use crate::error::{Error, ERROR_OVERFLOW};

/// The Store is responsible for managing key-value pairs, with optional time-to-live settings for
/// each key. It automatically handles the expiration and removal of keys when their TTLs elapse.
/// The store is designed to be thread-safe, allowing it to be shared and cloned cheaply using
/// reference counting.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    /// Creates an empty store and spawns its expiration task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
            ttls: BTreeSet::new(),
        };

        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
            waker: Notify::new(),
        });

        tokio::spawn({
            let inner = inner.clone();
            async move { remove_expired_keys(inner).await }
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct InnerStore {
    state: Mutex<State>,
    waker: Notify,
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        InnerStoreLocked {
            state: self.state.lock(),
            waker: &self.waker,
        }
    }
}

type Key = String;

/// The shapes a stored value can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    String(Bytes),
    Hash(HashMap<Bytes, Bytes>),
}

impl Data {
    pub fn type_name(&self) -> &'static str {
        match self {
            Data::String(_) => "string",
            Data::Hash(_) => "hash",
        }
    }
}

pub struct Value {
    pub data: Data,
    pub expires_at: Option<Instant>,
}

pub struct State {
    keys: HashMap<Key, Value>,
    ttls: BTreeSet<(Instant, Key)>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
    waker: &'a Notify,
}

impl<'a> InnerStoreLocked<'a> {
    /// Stores a string value, discarding any previous value and TTL.
    pub fn set(&mut self, key: String, data: Bytes) {
        self.insert(key, Data::String(data), None);
    }

    pub fn set_with_ttl(&mut self, key: Key, data: Bytes, ttl: Duration) {
        self.insert(key, Data::String(data), Some(Instant::now() + ttl));
    }

    fn insert(&mut self, key: Key, data: Data, expires_at: Option<Instant>) {
        let previous = self.state.keys.insert(key.clone(), Value { data, expires_at });
        if let Some(Value {
            expires_at: Some(when),
            ..
        }) = previous
        {
            self.state.ttls.remove(&(when, key.clone()));
        }

        if let Some(when) = expires_at {
            self.track_expiration(key, when);
        }
    }

    fn track_expiration(&mut self, key: Key, when: Instant) {
        self.state.ttls.insert((when, key.clone()));

        let next_to_expire = self.state.ttls.iter().next().map(|(_, key)| key);
        if next_to_expire == Some(&key) {
            self.waker.notify_one();
        }
    }

    /// Returns the string stored at `key`, or `WrongType` if the key holds another shape.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
        match self.state.keys.get(key).map(|value| &value.data) {
            None => Ok(None),
            Some(Data::String(data)) => Ok(Some(data.clone())),
            Some(_) => Err(Error::wrong_type()),
        }
    }

    pub fn data(&self, key: &str) -> Option<&Data> {
        self.state.keys.get(key).map(|value| &value.data)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let value = self.state.keys.remove(key)?;
        if let Some(when) = value.expires_at {
            self.state.ttls.remove(&(when, key.to_string()));
        }
        Some(value)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.keys.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.state.keys.len()
    }

    pub fn clear(&mut self) {
        self.state.keys.clear();
        self.state.ttls.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.state.keys.keys()
    }

    /// Sets a timeout on an existing key. Returns `false` if the key does not exist.
    pub fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        let when = Instant::now() + ttl;
        let previous = match self.state.keys.get_mut(key) {
            Some(value) => value.expires_at.replace(when),
            None => return false,
        };

        if let Some(previous) = previous {
            self.state.ttls.remove(&(previous, key.to_string()));
        }
        self.track_expiration(key.to_string(), when);
        true
    }

    pub fn get_ttl(&self, key: &str) -> Option<Duration> {
        self.state
            .keys
            .get(key)
            .and_then(|value| value.expires_at)
            .map(|when| when.saturating_duration_since(Instant::now()))
    }

    pub fn incr_by<T>(&mut self, key: &str, increment: T) -> Result<T, Error>
    where
        T: FromStr + ToString + CheckedAdd + Default,
    {
        let current = match self.get(key)? {
            Some(value) => std::str::from_utf8(value.as_ref())
                .ok()
                .and_then(|s| s.parse::<T>().ok())
                .ok_or_else(Error::not_an_integer)?,
            None => T::default(),
        };

        let value = current
            .checked_add(&increment)
            .ok_or_else(|| Error::Arithmetic(ERROR_OVERFLOW.to_string()))?;

        self.replace(key, value.to_string().into());

        Ok(value)
    }

    /// Replaces the string at `key`, keeping its TTL.
    pub fn replace(&mut self, key: &str, data: Bytes) {
        let expires_at = self.state.keys.get(key).and_then(|value| value.expires_at);
        self.state.keys.insert(
            key.to_string(),
            Value {
                data: Data::String(data),
                expires_at,
            },
        );
    }

    /// Appends `suffix` to the string at `key`, creating it if missing. Returns the new length.
    pub fn append(&mut self, key: &str, suffix: &[u8]) -> Result<usize, Error> {
        match self.state.keys.get_mut(key).map(|value| &mut value.data) {
            Some(Data::String(data)) => {
                let mut appended = BytesMut::with_capacity(data.len() + suffix.len());
                appended.extend_from_slice(data);
                appended.extend_from_slice(suffix);
                *data = appended.freeze();
                Ok(data.len())
            }
            Some(_) => Err(Error::wrong_type()),
            None => {
                self.set(key.to_string(), Bytes::copy_from_slice(suffix));
                Ok(suffix.len())
            }
        }
    }

    /// Sets `field` in the hash at `key`. Returns `true` if the field is new.
    pub fn hset(&mut self, key: &str, field: Bytes, value: Bytes) -> Result<bool, Error> {
        let entry = self
            .state
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value {
                data: Data::Hash(HashMap::new()),
                expires_at: None,
            });

        match &mut entry.data {
            Data::Hash(hash) => Ok(hash.insert(field, value).is_none()),
            _ => Err(Error::wrong_type()),
        }
    }

    pub fn hget(&self, key: &str, field: &[u8]) -> Result<Option<Bytes>, Error> {
        match self.data(key) {
            None => Ok(None),
            Some(Data::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(_) => Err(Error::wrong_type()),
        }
    }

    pub fn hgetall(&self, key: &str) -> Result<Vec<(Bytes, Bytes)>, Error> {
        match self.data(key) {
            None => Ok(vec![]),
            Some(Data::Hash(hash)) => Ok(hash
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect()),
            Some(_) => Err(Error::wrong_type()),
        }
    }

    /// Removes `fields` from the hash at `key`, dropping the key once the hash is empty.
    pub fn hdel(&mut self, key: &str, fields: &[Bytes]) -> Result<usize, Error> {
        let removed = match self.state.keys.get_mut(key).map(|value| &mut value.data) {
            None => return Ok(0),
            Some(Data::Hash(hash)) => {
                let removed = fields
                    .iter()
                    .filter(|field| hash.remove(*field).is_some())
                    .count();
                if !hash.is_empty() {
                    return Ok(removed);
                }
                removed
            }
            Some(_) => return Err(Error::wrong_type()),
        };

        self.remove(key);
        Ok(removed)
    }

    pub fn remove_expired_keys(&mut self) -> Option<Instant> {
        let now = Instant::now();

        let expired_keys: Vec<(Instant, String)> = self
            .state
            .ttls
            .iter()
            .take_while(|(expires_at, _)| expires_at <= &now)
            .cloned()
            .collect();

        for (when, key) in expired_keys {
            self.state.keys.remove(&key);
            self.state.ttls.remove(&(when, key));
        }

        self.state
            .ttls
            .iter()
            .next()
            .map(|&(expires_at, _)| expires_at)
    }
}

async fn remove_expired_keys(store: Arc<InnerStore>) {
    loop {
        let next_expiration = store.lock().remove_expired_keys();

        match next_expiration {
            Some(next_expiration) => {
                tokio::select! {
                    _ = sleep_until(next_expiration) => {}
                    _ = store.waker.notified() => {}
                }
            }
            None => store.waker.notified().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test]
    async fn ttl() {
        time::pause();

        let store = Store::new();

        {
            let mut store = store.lock();

            store.set_with_ttl(
                "key1".to_string(),
                Bytes::from("value1"),
                Duration::from_secs(10),
            );

            store.set_with_ttl(
                "key2".to_string(),
                Bytes::from("value2"),
                Duration::from_secs(20),
            );
        }

        assert_eq!(store.lock().keys().count(), 2);

        time::advance(Duration::from_secs(10)).await;
        time::sleep(Duration::from_millis(1)).await;

        assert_eq!(store.lock().keys().count(), 1);
        assert!(store.lock().exists("key2"));

        time::advance(Duration::from_secs(20)).await;
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(store.lock().keys().count(), 0);
    }

    #[tokio::test]
    async fn set_clears_previous_ttl() {
        time::pause();

        let store = Store::new();
        store.lock().set_with_ttl(
            "key".to_string(),
            Bytes::from("old"),
            Duration::from_secs(10),
        );
        store.lock().set("key".to_string(), Bytes::from("new"));

        time::advance(Duration::from_secs(11)).await;
        time::sleep(Duration::from_millis(1)).await;

        assert_eq!(store.lock().get("key").unwrap(), Some(Bytes::from("new")));
        assert_eq!(store.lock().get_ttl("key"), None);
    }

    #[tokio::test]
    async fn incr_by() {
        let store = Store::new();
        let mut state = store.lock();

        assert_eq!(state.incr_by("counter", 5i64).unwrap(), 5);
        assert_eq!(state.incr_by("counter", -2i64).unwrap(), 3);
        assert_eq!(state.get("counter").unwrap(), Some(Bytes::from("3")));
    }

    #[tokio::test]
    async fn incr_by_rejects_non_integers_and_overflow() {
        let store = Store::new();
        let mut state = store.lock();

        state.set("text".to_string(), Bytes::from("abc"));
        assert!(matches!(
            state.incr_by("text", 1i64),
            Err(Error::InvalidArgument(_))
        ));

        state.set("big".to_string(), Bytes::from(i64::MAX.to_string()));
        assert!(matches!(
            state.incr_by("big", 1i64),
            Err(Error::Arithmetic(_))
        ));
        assert_eq!(
            state.get("big").unwrap(),
            Some(Bytes::from(i64::MAX.to_string()))
        );
    }

    #[tokio::test]
    async fn hashes_and_wrong_type() {
        let store = Store::new();
        let mut state = store.lock();

        assert!(state
            .hset("h", Bytes::from("f"), Bytes::from("v"))
            .unwrap());
        assert!(!state
            .hset("h", Bytes::from("f"), Bytes::from("w"))
            .unwrap());
        assert_eq!(state.hget("h", b"f").unwrap(), Some(Bytes::from("w")));

        assert!(matches!(state.get("h"), Err(Error::WrongType(_))));

        state.set("s".to_string(), Bytes::from("v"));
        assert!(matches!(
            state.hset("s", Bytes::from("f"), Bytes::from("v")),
            Err(Error::WrongType(_))
        ));

        assert_eq!(state.hdel("h", &[Bytes::from("f")]).unwrap(), 1);
        assert!(!state.exists("h"));
    }

    #[tokio::test]
    async fn append_keeps_ttl() {
        let store = Store::new();
        let mut store = store.lock();

        store.set_with_ttl("key".to_string(), Bytes::from("ab"), Duration::from_secs(60));

        assert_eq!(store.append("key", b"cd").unwrap(), 4);
        assert_eq!(store.get("key").unwrap(), Some(Bytes::from("abcd")));
        assert!(store.get_ttl("key").is_some());

        assert_eq!(store.append("fresh", b"xyz").unwrap(), 3);
        assert!(store.get_ttl("fresh").is_none());
    }
}
