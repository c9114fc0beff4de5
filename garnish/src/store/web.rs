//! Browser backends: `window.localStorage` and `document.cookie`.

use super::{CookieJar, Result, StorageBackend, StoreError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlDocument, Storage};

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

fn js_error(value: JsValue) -> StoreError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .unwrap_or_else(|| format!("{value:?}"));
    StoreError::Platform(message)
}

fn is_quota_error(value: &JsValue) -> bool {
    value
        .dyn_ref::<js_sys::Error>()
        .is_some_and(|err| String::from(err.name()) == "QuotaExceededError")
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| StoreError::Unavailable("no global window".to_string()))
}

/// `window.localStorage`.
pub struct WebLocalStorage {
    storage: Storage,
}

impl WebLocalStorage {
    pub fn from_window() -> Result<Self> {
        let storage = window()?
            .local_storage()
            .map_err(|err| StoreError::Unavailable(js_error(err).to_string()))?
            .ok_or_else(|| StoreError::Unavailable("localStorage is null".to_string()))?;
        Ok(Self { storage })
    }
}

impl StorageBackend for WebLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(|err| {
            if is_quota_error(&err) {
                StoreError::QuotaExceeded {
                    key: key.to_string(),
                }
            } else {
                js_error(err)
            }
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

/// `document.cookie`, with names and values URI-encoded.
pub struct DocumentCookies {
    document: HtmlDocument,
}

impl DocumentCookies {
    pub fn from_window() -> Result<Self> {
        let document = window()?
            .document()
            .ok_or_else(|| StoreError::Unavailable("no document".to_string()))?
            .dyn_into::<HtmlDocument>()
            .map_err(|_| StoreError::Unavailable("not an HTML document".to_string()))?;
        Ok(Self { document })
    }

    fn write(&self, name: &str, value: &str, expires: &js_sys::Date) -> Result<()> {
        let cookie = format!(
            "{}={}; expires={}; path=/",
            String::from(js_sys::encode_uri_component(name)),
            String::from(js_sys::encode_uri_component(value)),
            String::from(expires.to_utc_string()),
        );
        self.document.set_cookie(&cookie).map_err(js_error)
    }
}

fn decode(component: &str) -> String {
    js_sys::decode_uri_component(component)
        .map(String::from)
        .unwrap_or_else(|_| component.to_string())
}

impl CookieJar for DocumentCookies {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let cookies = self.document.cookie().map_err(js_error)?;
        Ok(cookies
            .split(';')
            .map(str::trim_start)
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(key, _)| decode(key) == name)
            .map(|(_, value)| decode(value)))
    }

    fn set(&self, name: &str, value: &str, expires_days: u32) -> Result<()> {
        let now = js_sys::Date::now();
        let expires = js_sys::Date::new(&JsValue::from_f64(
            now + f64::from(expires_days) * MILLIS_PER_DAY,
        ));
        self.write(name, value, &expires)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.write(name, "", &js_sys::Date::new(&JsValue::from_f64(0.0)))
    }
}
