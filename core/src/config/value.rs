//! Observable, typed settings bound to one store key.
//!
//! A [`ConfigValue`] describes a setting: its key, how to compute its default
//! and optionally how to validate/repair a value. The live state lives in a
//! [`ConfigContext`], which owns the store handle and one `watch` channel per
//! key. Every successful write is broadcast on that channel, so all
//! [`ConfigSubscription`]s for a key converge on the last written value.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::store::ConfigStore;
use crate::error::{ConfigError, Result};

type DefaultFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;
type ValidatorFn<T> = Arc<dyn Fn(T, Arc<ConfigStore>, T) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Bound for anything that can live in the settings store.
pub trait SettingValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> SettingValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the store handle and the per-key change channels.
///
/// Construct one at application start and hand it to whatever needs settings;
/// dropping it closes every subscription.
pub struct ConfigContext {
    store: Arc<ConfigStore>,
    /// `None` until the first broadcast for that key.
    channels: Mutex<HashMap<String, watch::Sender<Option<Value>>>>,
    initialized: Mutex<HashSet<String>>,
}

impl ConfigContext {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store: Arc::new(store),
            channels: Mutex::new(HashMap::new()),
            initialized: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    fn receiver(&self, key: &str) -> watch::Receiver<Option<Value>> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    fn broadcast(&self, key: &str, value: Value) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(value));
    }

    /// Returns `true` for the first caller per key.
    fn claim_initialization(&self, key: &str) -> bool {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        initialized.insert(key.to_string())
    }

    fn release_initialization(&self, key: &str) {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        initialized.remove(key);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscription
// ─────────────────────────────────────────────────────────────────────────────

/// Live view of one setting.
pub struct ConfigSubscription<T> {
    key: &'static str,
    rx: watch::Receiver<Option<Value>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ConfigSubscription<T> {
    /// Last broadcast value, or `None` if nothing has been broadcast yet.
    pub fn current(&self) -> Option<T> {
        let value = self.rx.borrow().clone()?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key = self.key, error = %e, "Broadcast value has the wrong shape");
                None
            }
        }
    }

    /// Wait for the next broadcast. `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        self.current()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value definition
// ─────────────────────────────────────────────────────────────────────────────

/// A named, typed setting.
pub struct ConfigValue<T> {
    key: &'static str,
    default: DefaultFn<T>,
    validator: Option<ValidatorFn<T>>,
}

impl<T> Clone for ConfigValue<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            default: Arc::clone(&self.default),
            validator: self.validator.clone(),
        }
    }
}

impl<T: SettingValue> ConfigValue<T> {
    pub fn new<F, Fut>(key: &'static str, default: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            key,
            default: Arc::new(move || -> BoxFuture<'static, Result<T>> { Box::pin(default()) }),
            validator: None,
        }
    }

    /// Setting whose default is a constant.
    pub fn with_default(key: &'static str, default: T) -> Self {
        Self::new(key, move || {
            let value = default.clone();
            async move { Ok(value) }
        })
    }

    /// Attach a validator, called as `validator(candidate, store, default)`.
    pub fn validated<F, Fut>(mut self, validator: F) -> Self
    where
        F: Fn(T, Arc<ConfigStore>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.validator = Some(Arc::new(
            move |value: T, store: Arc<ConfigStore>, default: T| -> BoxFuture<'static, Result<T>> {
                Box::pin(validator(value, store, default))
            },
        ));
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Stored value, or the default if the key is absent. Never writes.
    pub async fn get(&self, ctx: &ConfigContext) -> Result<T> {
        match ctx.store().get::<T>(self.key)? {
            Some(value) => Ok(value),
            None => (self.default)().await,
        }
    }

    /// Subscribe to this setting.
    ///
    /// The first subscription for the key in `ctx` resolves the effective
    /// value (stored or default, then validated), persists it and broadcasts
    /// it. Later subscriptions only attach to the channel.
    pub async fn subscribe(&self, ctx: &ConfigContext) -> Result<ConfigSubscription<T>> {
        let rx = ctx.receiver(self.key);
        if ctx.claim_initialization(self.key) {
            if let Err(e) = self.initialize(ctx).await {
                ctx.release_initialization(self.key);
                return Err(e);
            }
        }
        Ok(ConfigSubscription {
            key: self.key,
            rx,
            _marker: PhantomData,
        })
    }

    /// Validate (if configured), persist and broadcast `value`.
    ///
    /// Returns the value that was actually stored.
    pub async fn set(&self, ctx: &ConfigContext, value: T) -> Result<T> {
        let value = match &self.validator {
            Some(validator) => {
                let default = (self.default)().await?;
                validator(value, Arc::clone(ctx.store()), default).await?
            }
            None => value,
        };
        self.persist(ctx, value).await
    }

    async fn initialize(&self, ctx: &ConfigContext) -> Result<T> {
        let stored = ctx.store().get::<T>(self.key)?;
        let default = (self.default)().await?;
        let value = match &self.validator {
            Some(validator) => {
                let candidate = stored.unwrap_or_else(|| default.clone());
                validator(candidate, Arc::clone(ctx.store()), default).await?
            }
            None => stored.unwrap_or(default),
        };
        debug!(key = self.key, "Initialized setting");
        self.persist(ctx, value).await
    }

    async fn persist(&self, ctx: &ConfigContext, value: T) -> Result<T> {
        let json = serde_json::to_value(&value).map_err(ConfigError::from)?;
        let store = ctx.store();
        let previous = store.set_raw(self.key, json.clone());
        if let Err(e) = store.save().await {
            store.restore(self.key, previous);
            return Err(e.into());
        }
        ctx.broadcast(self.key, json);
        Ok(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Untyped access
// ─────────────────────────────────────────────────────────────────────────────

/// Key-addressed access to a setting without knowing its type.
pub trait DynSetting: Send + Sync {
    fn key(&self) -> &'static str;

    fn get_json<'a>(&'a self, ctx: &'a ConfigContext) -> BoxFuture<'a, Result<Value>>;

    /// First activation only: resolve, persist and broadcast the value.
    fn activate<'a>(&'a self, ctx: &'a ConfigContext) -> BoxFuture<'a, Result<()>>;

    /// Decode `value` into the setting's type, then [`ConfigValue::set`] it.
    fn set_json<'a>(&'a self, ctx: &'a ConfigContext, value: Value) -> BoxFuture<'a, Result<Value>>;
}

impl<T: SettingValue> DynSetting for ConfigValue<T> {
    fn key(&self) -> &'static str {
        self.key
    }

    fn get_json<'a>(&'a self, ctx: &'a ConfigContext) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let value = self.get(ctx).await?;
            Ok(serde_json::to_value(value).map_err(ConfigError::from)?)
        })
    }

    fn activate<'a>(&'a self, ctx: &'a ConfigContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.subscribe(ctx).await.map(|_| ()) })
    }

    fn set_json<'a>(&'a self, ctx: &'a ConfigContext, value: Value) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let typed: T = serde_json::from_value(value).map_err(|e| ConfigError::Value {
                key: self.key.to_string(),
                source: e,
            })?;
            let stored = self.set(ctx, typed).await?;
            Ok(serde_json::to_value(stored).map_err(ConfigError::from)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> ConfigContext {
        ConfigContext::new(ConfigStore::in_memory())
    }

    #[tokio::test]
    async fn get_falls_back_to_default_without_writing() {
        let ctx = ctx();
        let volume = ConfigValue::with_default("playSoundVolume", 0.8_f64);

        assert_eq!(volume.get(&ctx).await.unwrap(), 0.8);
        assert_eq!(ctx.store().get_raw("playSoundVolume"), None);
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let ctx = ctx();
        let sound = ConfigValue::with_default("playSound", true);

        sound.set(&ctx, false).await.unwrap();
        assert!(!sound.get(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn set_applies_validator() {
        let ctx = ctx();
        let volume = ConfigValue::with_default("playSoundVolume", 0.8_f64)
            .validated(|v: f64, _, _| async move { Ok(v.clamp(0.0, 1.0)) });

        let stored = volume.set(&ctx, 3.0).await.unwrap();
        assert_eq!(stored, 1.0);
        assert_eq!(volume.get(&ctx).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn first_subscription_persists_and_broadcasts() {
        let ctx = ctx();
        let flags = ConfigValue::with_default("showFlagsOverlay", false);

        let sub = flags.subscribe(&ctx).await.unwrap();
        assert_eq!(sub.current(), Some(false));
        assert_eq!(ctx.store().get::<bool>("showFlagsOverlay").unwrap(), Some(false));
    }

    #[tokio::test]
    async fn later_subscriptions_do_not_reinitialize() {
        let ctx = ctx();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let value = ConfigValue::new("fontScale", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(1.0_f64) }
        });

        let _a = value.subscribe(&ctx).await.unwrap();
        let b = value.subscribe(&ctx).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.current(), Some(1.0));
    }

    #[tokio::test]
    async fn set_reaches_every_subscriber() {
        let ctx = ctx();
        let sound = ConfigValue::with_default("playSound", true);

        let mut a = sound.subscribe(&ctx).await.unwrap();
        // `a` was created before the initial broadcast and still has it pending.
        assert_eq!(a.changed().await, Some(true));
        let mut b = sound.subscribe(&ctx).await.unwrap();
        assert_eq!(b.current(), Some(true));

        sound.set(&ctx, false).await.unwrap();
        assert_eq!(a.changed().await, Some(false));
        assert_eq!(b.changed().await, Some(false));
    }

    #[tokio::test]
    async fn failed_save_keeps_last_broadcast_value() {
        let dir = tempfile::tempdir().unwrap();
        let settings_dir = dir.path().join("settings");
        let store = ConfigStore::open(settings_dir.join("config.dat")).await.unwrap();
        // Replace the settings directory with a plain file so every save fails.
        std::fs::remove_dir_all(&settings_dir).unwrap();
        std::fs::write(&settings_dir, "").unwrap();
        let ctx = ConfigContext::new(store);
        let sound = ConfigValue::with_default("playSound", true);

        assert!(sound.subscribe(&ctx).await.is_err());
        assert!(sound.set(&ctx, false).await.is_err());
        assert_eq!(ctx.store().get_raw("playSound"), None);
        assert!(sound.get(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn set_json_rejects_wrong_type() {
        let ctx = ctx();
        let sound = ConfigValue::with_default("playSound", true);
        let err = sound
            .set_json(&ctx, Value::String("loud".into()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::Value { .. })
        ));
    }
}
