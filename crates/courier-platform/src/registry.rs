// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checker registry.
//!
//! The `CheckerRegistry` builds checkers on demand through a `CheckerFactory`
//! and caches them per concrete platform. Composite tokens (`tgwa`, `tgwaba`)
//! resolve to one checker per member.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, warn};

use courier_config::model::CheckerConfig;
use courier_core::{
    CampaignRepository, CourierError, Platform, PlatformChecker, PlatformSet, SessionProvider,
};

use crate::checker::{TelegramChecker, WabaChecker, WhatsAppChecker};
use crate::retry::RetryPolicy;

/// Factory trait for creating the checker of one concrete platform.
pub trait CheckerFactory: Send + Sync + 'static {
    fn create(&self, platform: Platform) -> Result<Arc<dyn PlatformChecker>, CourierError>;
}

impl<F> CheckerFactory for F
where
    F: Fn(Platform) -> Result<Arc<dyn PlatformChecker>, CourierError> + Send + Sync + 'static,
{
    fn create(&self, platform: Platform) -> Result<Arc<dyn PlatformChecker>, CourierError> {
        self(platform)
    }
}

/// Builds session-backed checkers from the registered session providers.
pub struct SessionCheckerFactory {
    providers: HashMap<Platform, Arc<dyn SessionProvider>>,
    campaigns: Arc<dyn CampaignRepository>,
    policy: RetryPolicy,
    cache_ttl: Duration,
}

impl SessionCheckerFactory {
    pub fn new(campaigns: Arc<dyn CampaignRepository>, config: &CheckerConfig) -> Self {
        Self {
            providers: HashMap::new(),
            campaigns,
            policy: RetryPolicy::from_config(config),
            cache_ttl: config.cache_ttl(),
        }
    }

    /// Override the retry policy handed to every checker.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register the session provider for its platform, replacing any previous one.
    pub fn with_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.providers.insert(provider.platform(), provider);
        self
    }

    /// Platforms with a registered provider, sorted.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.providers.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl CheckerFactory for SessionCheckerFactory {
    fn create(&self, platform: Platform) -> Result<Arc<dyn PlatformChecker>, CourierError> {
        let provider = self
            .providers
            .get(&platform)
            .cloned()
            .ok_or_else(|| CourierError::UnsupportedPlatform(platform.to_string()))?;
        let campaigns = self.campaigns.clone();
        let checker: Arc<dyn PlatformChecker> = match platform {
            Platform::Telegram => Arc::new(TelegramChecker::new(
                provider,
                campaigns,
                self.policy,
                self.cache_ttl,
            )),
            Platform::WhatsApp => Arc::new(WhatsAppChecker::new(
                provider,
                campaigns,
                self.policy,
                self.cache_ttl,
            )),
            Platform::Waba => Arc::new(WabaChecker::new(
                provider,
                campaigns,
                self.policy,
                self.cache_ttl,
            )),
        };
        Ok(checker)
    }
}

/// Per-platform checker cache.
pub struct CheckerRegistry {
    factory: Box<dyn CheckerFactory>,
    checkers: DashMap<Platform, Arc<dyn PlatformChecker>>,
}

impl CheckerRegistry {
    pub fn new(factory: impl CheckerFactory) -> Self {
        Self {
            factory: Box::new(factory),
            checkers: DashMap::new(),
        }
    }

    /// The checker for `platform`, constructing it on first use.
    pub fn checker(&self, platform: Platform) -> Result<Arc<dyn PlatformChecker>, CourierError> {
        if let Some(existing) = self.checkers.get(&platform) {
            return Ok(existing.value().clone());
        }
        let created = self.factory.create(platform)?;
        debug!(%platform, "checker constructed");
        // A concurrent caller may have won the race; keep whichever landed first.
        Ok(self.checkers.entry(platform).or_insert(created).value().clone())
    }

    /// Checkers for every member of `set`, in attempt order.
    pub fn checkers_for(
        &self,
        set: PlatformSet,
    ) -> Result<Vec<Arc<dyn PlatformChecker>>, CourierError> {
        set.members()
            .into_iter()
            .map(|platform| self.checker(platform))
            .collect()
    }

    /// Resolve a platform token (`telegram`, `tgwa`, ...) to its checkers.
    pub fn get_checker(&self, token: &str) -> Result<Vec<Arc<dyn PlatformChecker>>, CourierError> {
        let set: PlatformSet = token.parse()?;
        self.checkers_for(set)
    }

    /// Every checker constructed so far, sorted by platform.
    pub fn built(&self) -> Vec<Arc<dyn PlatformChecker>> {
        let mut built: Vec<(Platform, Arc<dyn PlatformChecker>)> = self
            .checkers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        built.sort_by_key(|(platform, _)| *platform);
        built.into_iter().map(|(_, checker)| checker).collect()
    }

    /// Disconnect every constructed checker. Failures are logged, not returned.
    pub async fn disconnect_all(&self) {
        for checker in self.built() {
            if let Err(e) = checker.disconnect().await {
                warn!(platform = %checker.platform(), error = %e, "checker disconnect failed");
            }
        }
    }
}

impl std::fmt::Debug for CheckerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let platforms: Vec<Platform> = self.checkers.iter().map(|e| *e.key()).collect();
        f.debug_struct("CheckerRegistry")
            .field("built", &platforms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use courier_test_utils::{InMemoryStore, MockChecker, MockSessionProvider};

    fn counting_factory(count: Arc<AtomicUsize>) -> impl CheckerFactory {
        move |platform: Platform| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CourierError>(Arc::new(MockChecker::reachable(platform)) as Arc<dyn PlatformChecker>)
        }
    }

    #[test]
    fn checkers_are_constructed_once_per_platform() {
        let count = Arc::new(AtomicUsize::new(0));
        let registry = CheckerRegistry::new(counting_factory(count.clone()));
        registry.checker(Platform::Telegram).unwrap();
        registry.checker(Platform::Telegram).unwrap();
        registry.get_checker("tgwa").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.built().len(), 2);
    }

    #[test]
    fn composite_tokens_expose_both_members() {
        let registry = CheckerRegistry::new(counting_factory(Arc::new(AtomicUsize::new(0))));
        let platforms: Vec<Platform> = registry
            .get_checker("tgwaba")
            .unwrap()
            .iter()
            .map(|c| c.platform())
            .collect();
        assert_eq!(platforms, vec![Platform::Telegram, Platform::Waba]);
    }

    #[test]
    fn unknown_token_is_unsupported() {
        let registry = CheckerRegistry::new(counting_factory(Arc::new(AtomicUsize::new(0))));
        let err = registry.get_checker("icq").err().unwrap();
        assert!(matches!(err, CourierError::UnsupportedPlatform(_)));
    }

    #[test]
    fn session_factory_requires_provider() {
        let store = Arc::new(InMemoryStore::new());
        let factory = SessionCheckerFactory::new(store, &CheckerConfig::default())
            .with_provider(Arc::new(MockSessionProvider::new(Platform::Waba)));
        assert_eq!(factory.platforms(), vec![Platform::Waba]);

        let registry = CheckerRegistry::new(factory);
        assert_eq!(registry.checker(Platform::Waba).unwrap().platform(), Platform::Waba);
        assert!(matches!(
            registry.checker(Platform::WhatsApp),
            Err(CourierError::UnsupportedPlatform(_))
        ));
    }
}
