use std::future::Future;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use log::{debug, info, warn};

use crate::errors::ProviderError;
use crate::models::{Gloss, Resolution};

/// An external source of word definitions.
///
/// A lookup succeeds only when the provider recognises the word; an unknown
/// word is reported as `ProviderError::NotFound`.
pub trait DefinitionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn lookup<'a>(&'a self, word: &'a str) -> LocalBoxFuture<'a, Result<Gloss, ProviderError>>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

/// Run `operation` with every attempt bounded by `timeout`, retrying
/// immediately up to `max_attempts` times. A definitive `NotFound` is
/// returned without retrying.
pub async fn perform<T, F, Fut>(
    mut operation: F,
    timeout: Duration,
    max_attempts: u32,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let attempts = max_attempts.max(1);
    let mut last_err = ProviderError::Timeout(timeout);

    for attempt in 1..=attempts {
        match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(ProviderError::NotFound)) => return Err(ProviderError::NotFound),
            Ok(Err(e)) => {
                debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                last_err = e;
            }
            Err(_) => {
                debug!("Attempt {}/{} timed out after {:?}", attempt, attempts, timeout);
                last_err = ProviderError::Timeout(timeout);
            }
        }
    }

    Err(last_err)
}

/// Tries each provider in order until one recognises the word
pub struct DefinitionResolver {
    providers: Vec<Box<dyn DefinitionProvider>>,
    policy: RetryPolicy,
}

impl DefinitionResolver {
    pub fn new(providers: Vec<Box<dyn DefinitionProvider>>, policy: RetryPolicy) -> Self {
        DefinitionResolver { providers, policy }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn resolve(&self, word: &str) -> Resolution {
        for provider in &self.providers {
            let result = perform(
                || provider.lookup(word),
                self.policy.timeout,
                self.policy.max_attempts,
            )
            .await;

            match result {
                Ok(gloss) => {
                    info!("Provider {} recognised '{}'", provider.name(), word);
                    return Resolution {
                        accepted: true,
                        gloss: Some(gloss),
                    };
                }
                Err(ProviderError::NotFound) => {
                    debug!("Provider {} has no entry for '{}'", provider.name(), word);
                }
                Err(e) => {
                    warn!("Provider {} failed for '{}': {}", provider.name(), word, e);
                }
            }
        }

        debug!("All providers exhausted for '{}'", word);
        Resolution::default()
    }
}
