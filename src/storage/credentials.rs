use super::Result;
use std::env;

#[cfg(not(test))]
use crate::error::StorageError;
#[cfg(not(test))]
use keyring::Entry;

#[cfg(not(test))]
pub const API_KEY_ENV: &str = "MODSTACK_API_KEY";
#[cfg(test)]
pub const API_KEY_ENV: &str = "TEST_MODSTACK_API_KEY";

#[cfg(not(test))]
const KEYRING_SERVICE: &str = "modstack-relay";
const DEFAULT_ACCOUNT: &str = "api-key";

#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    Flag,
    Environment,
    Keyring,
    Missing,
}

/// The site's API key as held in the OS keyring
#[derive(Debug, Clone)]
pub struct Credentials {
    api_key: Option<String>,
    pub account: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT.to_string())
    }
}

impl Credentials {
    pub fn new(account: String) -> Self {
        Self {
            api_key: None,
            account,
        }
    }

    pub fn load(account: &str) -> Result<Self> {
        let mut credentials = Self::new(account.to_string());
        credentials.api_key = credentials.load_key()?;
        Ok(credentials)
    }

    pub fn load_default() -> Result<Self> {
        Self::load(DEFAULT_ACCOUNT)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn save(&self) -> Result<()> {
        match &self.api_key {
            Some(key) => self.store_key(key),
            None => Ok(()),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.api_key = None;
        self.delete_key()
    }

    /// API key from the environment, if set and non-empty
    pub fn get_api_key() -> Option<String> {
        env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty())
    }

    /// Flag/env value first, then whatever the keyring holds
    pub fn resolve(&self, explicit: Option<&str>) -> (Option<String>, KeySource) {
        if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
            // clap fills the flag from the env var too; report which it was
            let source = if Self::get_api_key().as_deref() == Some(key) {
                KeySource::Environment
            } else {
                KeySource::Flag
            };
            return (Some(key.to_string()), source);
        }
        if let Some(key) = Self::get_api_key() {
            return (Some(key), KeySource::Environment);
        }
        match &self.api_key {
            Some(key) => (Some(key.clone()), KeySource::Keyring),
            None => (None, KeySource::Missing),
        }
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, &self.account)
            .map_err(|e| StorageError::KeyringError(e.to_string()))
    }

    #[cfg(not(test))]
    fn load_key(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(v) => Ok(Some(v)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::KeyringError(e.to_string())),
        }
    }

    #[cfg(not(test))]
    fn store_key(&self, key: &str) -> Result<()> {
        self.entry()?
            .set_password(key)
            .map_err(|e| StorageError::KeyringError(e.to_string()))
    }

    #[cfg(not(test))]
    fn delete_key(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(_) => Ok(()),
            // nothing stored is fine
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::KeyringError(e.to_string())),
        }
    }

    #[cfg(test)]
    fn load_key(&self) -> Result<Option<String>> {
        Ok(None)
    }

    #[cfg(test)]
    fn store_key(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    #[cfg(test)]
    fn delete_key(&self) -> Result<()> {
        Ok(())
    }
}
