//! API-key availability as explicit session context.
//!
//! Some hosts let the user pick a key interactively. When such a host
//! mechanism is present it is consulted once when the session starts and
//! again only on explicit user action; without one a configured key is
//! assumed.

use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Host-provided key selection.
#[async_trait]
pub trait KeySelector: Send + Sync {
    async fn has_selected_key(&self) -> Result<bool>;
    async fn open_select_key(&self) -> Result<()>;
}

pub struct CredentialContext {
    selector: Option<Arc<dyn KeySelector>>,
    has_key: bool,
}

impl CredentialContext {
    /// Context for environments where the key comes from configuration.
    pub fn assume_configured() -> Self {
        Self {
            selector: None,
            has_key: true,
        }
    }

    /// Query the host selector once, at session start.
    pub async fn check(selector: Option<Arc<dyn KeySelector>>) -> Self {
        let mut context = Self {
            selector,
            has_key: true,
        };
        context.refresh().await;
        context
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }

    /// Re-query the host selector; returns the new availability.
    pub async fn refresh(&mut self) -> bool {
        if let Some(selector) = &self.selector {
            self.has_key = match selector.has_selected_key().await {
                Ok(selected) => selected,
                Err(e) => {
                    tracing::warn!("Key selector check failed: {}", e);
                    false
                }
            };
        }
        self.has_key
    }

    /// Mark the current key as unusable after the provider rejected it.
    pub fn invalidate(&mut self) {
        self.has_key = false;
    }

    /// Ask the host to let the user select a key.
    ///
    /// Once the selector closes the key is assumed to be available; the
    /// next provider call is what proves it.
    pub async fn reselect(&mut self) -> Result<()> {
        let selector = self.selector.as_ref().ok_or_else(|| {
            Error::Config("API key selection is not available in this environment.".to_string())
        })?;
        selector.open_select_key().await?;
        self.has_key = true;
        Ok(())
    }
}

/// Scriptable selector for tests and harnesses.
#[derive(Clone, Default)]
pub struct MockKeySelector {
    selected: Arc<AtomicBool>,
    opened: Arc<AtomicUsize>,
    checks: Arc<AtomicUsize>,
}

impl MockKeySelector {
    pub fn new(selected: bool) -> Self {
        let selector = Self::default();
        selector.set_selected(selected);
        selector
    }

    pub fn set_selected(&self, selected: bool) {
        self.selected.store(selected, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySelector for MockKeySelector {
    async fn has_selected_key(&self) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.selected.load(Ordering::SeqCst))
    }

    async fn open_select_key(&self) -> Result<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.selected.store(true, Ordering::SeqCst);
        Ok(())
    }
}
