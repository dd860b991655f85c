//! Transport-independent mutable request facade.
//!
//! The adapter wraps whatever its HTTP library hands it into a
//! [`MutableRequest`] once, at interception time. From then on the facade is
//! the single source of truth: checks read from it, sanitizing actions write
//! through it, and the adapter replays the final state downstream.

use std::collections::BTreeMap;

/// A name/value cookie pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Snapshot of one inbound request, mutable in place.
///
/// Headers are case-insensitive and multi-valued; the original spelling of
/// each name is kept in insertion order for enumeration. Parameters are
/// multi-valued. Parameter and cookie enumeration is name-ordered, so
/// validating the same request twice walks fields in the same order.
#[derive(Clone, Debug)]
pub struct MutableRequest {
    method: String,
    uri: String,
    url: String,
    remote_addr: Option<String>,
    header_names: Vec<String>,
    headers: BTreeMap<String, Vec<String>>,
    cookies: BTreeMap<String, Cookie>,
    parameters: BTreeMap<String, Vec<String>>,
}

impl MutableRequest {
    /// A fresh facade with no headers, cookies, or parameters. The full URL
    /// defaults to the URI until [`set_url`](Self::set_url) is called.
    pub fn new(method: &str, uri: &str) -> Self {
        MutableRequest {
            method: method.to_string(),
            uri: uri.to_string(),
            url: uri.to_string(),
            remote_addr: None,
            header_names: Vec::new(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The full request URL, scheme and host included.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    pub fn set_remote_addr(&mut self, addr: &str) {
        self.remote_addr = Some(addr.to_string());
    }

    // ─── Headers ────────────────────────────────────────────────────────────

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// First value of a header, name matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a header, in the order they were added.
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Header names as first seen, in insertion order.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.header_names.iter().map(String::as_str)
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        if !self.headers.contains_key(&key) {
            self.header_names.push(name.to_string());
        }
        self.headers.entry(key).or_default().push(value.to_string());
    }

    // ─── Cookies ────────────────────────────────────────────────────────────

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    /// All cookies, in name order.
    pub fn cookies(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    /// Add a cookie, replacing any existing cookie of the same name.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name().to_string(), cookie);
    }

    // ─── Parameters ─────────────────────────────────────────────────────────

    /// First value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn parameter_values(&self, name: &str) -> &[String] {
        self.parameters.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parameter names, in name order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn add_parameter(&mut self, name: &str, value: &str) {
        self.parameters
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Replace every occurrence of `old` among the parameter's values with
    /// `new`. Used by sanitizing actions to rewrite a value in place.
    pub fn replace_parameter_value(&mut self, name: &str, old: &str, new: &str) {
        if let Some(values) = self.parameters.get_mut(name) {
            for value in values.iter_mut() {
                if value == old {
                    *value = new.to_string();
                }
            }
        }
    }

    pub fn remove_parameter(&mut self, name: &str) {
        self.parameters.remove(name);
    }
}
