//! In-memory backends, used natively and in tests.

use super::{CookieJar, Result, StorageBackend, StoreError};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// `localStorage` stand-in with an optional quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<IndexMap<String, String>>,
    /// Maximum total size of keys and values, in bytes
    quota: Option<usize>,
    /// Every access fails, like a storage disabled by the user agent
    disabled: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// A storage whose every operation fails with [`StoreError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    fn check_available(&self) -> Result<()> {
        if self.disabled {
            return Err(StoreError::Unavailable("storage is disabled".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        let mut items = self.items.borrow_mut();

        if let Some(quota) = self.quota {
            let current: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if current + key.len() + value.len() > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.items.borrow_mut().shift_remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    /// Unix timestamp, in seconds
    expires: u64,
}

type Clock = Rc<dyn Fn() -> SystemTime>;

/// Cookie jar with real expirations against an injectable clock.
pub struct MemoryCookieJar {
    cookies: RefCell<HashMap<String, StoredCookie>>,
    clock: Clock,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCookieJar")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl MemoryCookieJar {
    /// A jar on the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemTime::now)
    }

    pub fn with_clock(clock: impl Fn() -> SystemTime + 'static) -> Self {
        Self {
            cookies: RefCell::new(HashMap::new()),
            clock: Rc::new(clock),
        }
    }

    fn now(&self) -> u64 {
        (self.clock)()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Expiration of a stored cookie, if it is still there.
    pub fn expires_at(&self, name: &str) -> Option<SystemTime> {
        self.cookies
            .borrow()
            .get(name)
            .map(|cookie| UNIX_EPOCH + Duration::from_secs(cookie.expires))
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let now = self.now();
        let mut cookies = self.cookies.borrow_mut();
        match cookies.get(name) {
            None => return Ok(None),
            Some(cookie) if cookie.expires > now => return Ok(Some(cookie.value.clone())),
            Some(_) => {}
        }

        // Expired cookies are dropped on read
        cookies.remove(name);
        Ok(None)
    }

    fn set(&self, name: &str, value: &str, expires_days: u32) -> Result<()> {
        let expires = self.now() + u64::from(expires_days) * SECONDS_PER_DAY;
        self.cookies.borrow_mut().insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires,
            },
        );
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.cookies.borrow_mut().remove(name);
        Ok(())
    }
}
