//! Stack lifecycle management: idempotent upsert, bounded polling, and
//! deletion of a single named stack.
//!
//! The manager holds no state between calls. Within one [`StackManager::wait`]
//! invocation it pins the provider-assigned stack identifier after the first
//! describe, so a same-named stack recreated mid-poll cannot be mistaken for
//! the one being watched.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::provider::{CAPABILITY_IAM, CloudProvider, StackRequest};

mod error;
mod status;


pub use error::StackError;
pub use status::{DeleteClassifier, StatusClassifier, UpsertClassifier};

/// Delay between consecutive status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

const NAME_TAG: &str = "Name";

/// Future returned by [`Clock::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Suspension source used between polls.
pub trait Clock {
    /// Suspends the caller for `duration`.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Clock backed by the Tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Name of a stack plus the provider identifier once it has been observed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackIdentity {
    /// Operator-chosen stack name.
    pub name: String,
    /// Identifier assigned by the provider for this incarnation.
    pub provider_id: Option<String>,
}

impl StackIdentity {
    /// Creates an identity that has not yet been resolved by the provider.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_id: None,
        }
    }

    /// Key used to address the stack: the provider id once pinned, the name
    /// before that.
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        self.provider_id.as_deref().unwrap_or(&self.name)
    }

    /// Records the provider id the first time one is seen. Later ids are
    /// ignored.
    pub fn pin(&mut self, provider_id: Option<&str>) {
        if self.provider_id.is_none() {
            self.provider_id = provider_id.map(str::to_owned);
        }
    }
}

/// Mutation performed by [`StackManager::upsert`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpsertOutcome {
    /// The stack did not exist and a create was submitted.
    Created,
    /// The stack existed and an update was submitted.
    Updated,
    /// The stack already matched the template and parameters.
    Unchanged,
}

/// Drives create, update, wait, and delete for named stacks.
#[derive(Debug)]
pub struct StackManager<P, C = TokioClock> {
    provider: P,
    clock: C,
}

impl<P: CloudProvider> StackManager<P> {
    /// Builds a manager that sleeps on the Tokio timer.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self::with_clock(provider, TokioClock)
    }
}

impl<P: CloudProvider, C: Clock> StackManager<P, C> {
    /// Builds a manager with an explicit clock.
    #[must_use]
    pub const fn with_clock(provider: P, clock: C) -> Self {
        Self { provider, clock }
    }

    /// Returns the provider shared with the other pipeline collaborators.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Creates the stack when it is missing, updates it when it is settled
    /// and healthy, and refuses otherwise.
    ///
    /// An update the provider rejects as having nothing to change counts as
    /// success.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Conflict`] when the stack is mid-transition or
    /// in a rollback or failed state, and [`StackError::Provider`] for any
    /// other remote failure.
    pub async fn upsert(
        &self,
        name: &str,
        template: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Result<UpsertOutcome, StackError> {
        let request = StackRequest {
            name: name.to_owned(),
            template_body: template.to_owned(),
            parameters: parameters.clone(),
            tags: BTreeMap::from([(NAME_TAG.to_owned(), name.to_owned())]),
            capabilities: vec![CAPABILITY_IAM.to_owned()],
        };

        let current = match self.provider.describe_stack(name).await {
            Ok(description) => description,
            Err(err) if err.is_stack_missing() => {
                info!(stack = name, "creating stack");
                self.provider.create_stack(&request).await?;
                return Ok(UpsertOutcome::Created);
            }
            Err(err) => return Err(err.into()),
        };

        let intent = UpsertClassifier;
        if !(intent.is_healthy(&current.status) && intent.is_complete(&current.status)) {
            return Err(StackError::Conflict {
                stack: name.to_owned(),
                status: current.status,
            });
        }

        info!(stack = name, status = %current.status, "updating stack");
        match self.provider.update_stack(&request).await {
            Ok(()) => Ok(UpsertOutcome::Updated),
            Err(err) if err.is_no_op_update() => {
                debug!(stack = name, "stack already up to date");
                Ok(UpsertOutcome::Unchanged)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Polls the stack until the classifier reports it complete.
    ///
    /// Each poll checks health first, then completion, then the elapsed
    /// budget; only then does it sleep for one interval.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Unhealthy`] as soon as an unhealthy status is
    /// observed, [`StackError::Timeout`] once `timeout` has elapsed without
    /// completion, and [`StackError::Provider`] when a describe fails.
    pub async fn wait<K>(
        &self,
        name: &str,
        classifier: &K,
        timeout: Duration,
    ) -> Result<(), StackError>
    where
        K: StatusClassifier + ?Sized,
    {
        let mut identity = StackIdentity::named(name);
        let mut elapsed = Duration::ZERO;

        loop {
            let description = match self.provider.describe_stack(identity.lookup_key()).await {
                Ok(description) => description,
                Err(err) if classifier.accepts_missing() && err.is_stack_missing() => {
                    debug!(stack = name, "stack no longer exists");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            identity.pin(description.stack_id.as_deref());

            let status = description.status;
            debug!(
                stack = name,
                status = %status,
                elapsed_secs = elapsed.as_secs(),
                "polled stack status"
            );

            if !classifier.is_healthy(&status) {
                return Err(StackError::Unhealthy {
                    stack: name.to_owned(),
                    status,
                });
            }
            if classifier.is_complete(&status) {
                info!(stack = name, status = %status, "stack change complete");
                return Ok(());
            }
            if elapsed >= timeout {
                return Err(StackError::Timeout {
                    stack: name.to_owned(),
                    timeout,
                    status,
                });
            }

            self.clock.sleep(POLL_INTERVAL).await;
            elapsed = elapsed.saturating_add(POLL_INTERVAL);
        }
    }

    /// Requests deletion of the stack. A stack that is already gone counts
    /// as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Provider`] when the provider rejects the request.
    pub async fn delete(&self, name: &str) -> Result<(), StackError> {
        info!(stack = name, "deleting stack");
        match self.provider.delete_stack(name).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_stack_missing() => {
                debug!(stack = name, "stack already absent");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
