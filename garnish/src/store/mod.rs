//! Key-value stores: native storage when it works, cookies otherwise.
//!
//! The two [`KeyValueStore`] variants wrap pluggable backends. In a browser
//! (wasm32) the backends are `window.localStorage` and `document.cookie`;
//! everywhere else they are in memory. [`default_key_value_store`] probes
//! once per thread and hands out the same store afterwards.

mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::{MemoryCookieJar, MemoryStorage};

use crate::debug;
use std::cell::OnceCell;
use std::rc::Rc;

/// Errors raised by stores and their backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend refused the write because it is full.
    #[error("quota exceeded while writing `{key}`")]
    QuotaExceeded { key: String },

    /// The backend exists but cannot be used (disabled, private mode, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other failure reported by the platform.
    #[error("platform error: {0}")]
    Platform(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Which variant a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StorageType {
    LocalStorage = 1,
    Cookies = 2,
}

/// The uniform store interface.
///
/// Absent keys read as `Ok(None)`, which is distinct from `Ok(Some(""))`.
pub trait KeyValueStore {
    fn storage_type(&self) -> StorageType;
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// A Web Storage-like backend (`localStorage`).
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// A cookie backend. The jar owns the clock used for expirations.
pub trait CookieJar {
    fn get(&self, name: &str) -> Result<Option<String>>;
    /// Write a cookie that expires `expires_days` days from now.
    fn set(&self, name: &str, value: &str, expires_days: u32) -> Result<()>;
    fn remove(&self, name: &str) -> Result<()>;
}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Lifetime of cookies written by the cookie store (default: 365 days)
    pub expires_days: u32,
    /// Key written then removed to probe native storage (default: `localStorageTest`)
    pub probe_key: String,
}

/// Key used to probe native storage.
pub const PROBE_KEY: &str = "localStorageTest";

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            expires_days: 365,
            probe_key: PROBE_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expires_days(mut self, days: u32) -> Self {
        self.expires_days = days;
        self
    }

    pub fn probe_key(mut self, key: impl Into<String>) -> Self {
        self.probe_key = key.into();
        self
    }
}

/// Native storage variant: a straight passthrough.
pub struct LocalStorageKeyValueStore {
    backend: Rc<dyn StorageBackend>,
}

impl LocalStorageKeyValueStore {
    pub fn new(backend: Rc<dyn StorageBackend>) -> Self {
        Self { backend }
    }
}

impl KeyValueStore for LocalStorageKeyValueStore {
    fn storage_type(&self) -> StorageType {
        StorageType::LocalStorage
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.backend.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.backend.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.backend.remove_item(key)
    }
}

/// Cookie variant: every write refreshes the expiration.
pub struct CookiesKeyValueStore {
    jar: Rc<dyn CookieJar>,
    expires_days: u32,
}

impl CookiesKeyValueStore {
    pub fn new(jar: Rc<dyn CookieJar>, expires_days: u32) -> Self {
        Self { jar, expires_days }
    }

    pub fn expires_days(&self) -> u32 {
        self.expires_days
    }
}

impl KeyValueStore for CookiesKeyValueStore {
    fn storage_type(&self) -> StorageType {
        StorageType::Cookies
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.jar.get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.jar.set(key, value, self.expires_days)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.jar.remove(key)
    }
}

/// The backends a store can be built on.
#[derive(Clone)]
pub struct StorageEnvironment {
    /// `None` when the platform has no native storage at all
    pub local_storage: Option<Rc<dyn StorageBackend>>,
    pub cookies: Rc<dyn CookieJar>,
}

impl StorageEnvironment {
    pub fn new(local_storage: Option<Rc<dyn StorageBackend>>, cookies: Rc<dyn CookieJar>) -> Self {
        Self {
            local_storage,
            cookies,
        }
    }

    /// Fresh in-memory backends.
    pub fn in_memory() -> Self {
        Self::new(
            Some(Rc::new(MemoryStorage::new())),
            Rc::new(MemoryCookieJar::new()),
        )
    }

    /// `window.localStorage` and `document.cookie`.
    ///
    /// A missing or throwing `localStorage` getter leaves `local_storage`
    /// empty; a missing document is an error.
    #[cfg(target_arch = "wasm32")]
    pub fn browser() -> Result<Self> {
        let local_storage = match web::WebLocalStorage::from_window() {
            Ok(storage) => Some(Rc::new(storage) as Rc<dyn StorageBackend>),
            Err(_err) => {
                debug!(error = %_err, "localStorage not reachable");
                None
            }
        };
        let cookies = Rc::new(web::DocumentCookies::from_window()?);
        Ok(Self::new(local_storage, cookies))
    }
}

/// Is `backend` usable? Writes then removes [`PROBE_KEY`]; any error means no.
pub fn is_local_storage_available(backend: &dyn StorageBackend) -> bool {
    probe(backend, PROBE_KEY)
}

fn probe(backend: &dyn StorageBackend, key: &str) -> bool {
    let result = backend
        .set_item(key, key)
        .and_then(|()| backend.remove_item(key));
    match result {
        Ok(()) => true,
        Err(_err) => {
            debug!(error = %_err, "native storage probe failed");
            false
        }
    }
}

/// Probe `env` and build the matching store. Nothing is cached.
pub fn select_key_value_store(
    env: &StorageEnvironment,
    config: &StoreConfig,
) -> Rc<dyn KeyValueStore> {
    match &env.local_storage {
        Some(backend) if probe(backend.as_ref(), &config.probe_key) => {
            debug!("using native storage");
            Rc::new(LocalStorageKeyValueStore::new(Rc::clone(backend)))
        }
        _ => {
            debug!(expires_days = config.expires_days, "falling back to cookies");
            Rc::new(CookiesKeyValueStore::new(
                Rc::clone(&env.cookies),
                config.expires_days,
            ))
        }
    }
}

thread_local! {
    static DEFAULT_STORE: OnceCell<Rc<dyn KeyValueStore>> = const { OnceCell::new() };
}

/// The store of this thread, selected on the first call.
///
/// Later calls return the same store; their arguments are ignored.
pub fn default_key_value_store(
    env: &StorageEnvironment,
    config: &StoreConfig,
) -> Rc<dyn KeyValueStore> {
    DEFAULT_STORE.with(|cell| Rc::clone(cell.get_or_init(|| select_key_value_store(env, config))))
}
