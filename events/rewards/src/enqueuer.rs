use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use seek_queue::{JobQueue, JobReceipt, JobRequest, QueueError};
use seek_wallet::{AddressValidator, WalletError, WalletValidator};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::eligibility::resolve_event_type;
use crate::types::RewardEvent;

/// Why a reward event was not enqueued.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("application {0:?} is not tracked for rewards")]
    NotEligible(String),

    #[error("invalid wallet: {0}")]
    InvalidWallet(WalletError),

    #[error("queue submission failed: {0}")]
    Queue(#[from] QueueError),
}

/// Turns analytics records into reward jobs on the rewards queue.
pub struct RewardEventEnqueuer<V = WalletValidator> {
    queue: Arc<dyn JobQueue>,
    validator: V,
}

impl RewardEventEnqueuer<WalletValidator> {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self::with_validator(queue, WalletValidator)
    }
}

impl<V: AddressValidator> RewardEventEnqueuer<V> {
    pub fn with_validator(queue: Arc<dyn JobQueue>, validator: V) -> Self {
        Self { queue, validator }
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Resolve eligibility, validate the wallet, then submit.
    ///
    /// Eligibility is checked first so untracked applications never reach
    /// wallet validation. The job carries the normalized address and no
    /// job-level options, so the queue defaults apply.
    pub async fn try_enqueue(
        &self,
        wallet_address: &str,
        application: &str,
        timestamp: &str,
    ) -> Result<JobReceipt, EnqueueError> {
        let event_type = resolve_event_type(application)
            .ok_or_else(|| EnqueueError::NotEligible(application.to_string()))?;

        let wallet = self
            .validator
            .validate_and_normalize(wallet_address)
            .into_result()
            .map_err(EnqueueError::InvalidWallet)?;

        let event = RewardEvent::new(event_type, wallet.address, timestamp);
        let job = JobRequest::new(event_type.as_str(), &event)?;
        let receipt = self.queue.add(job).await?;

        debug!(
            event_type = %event_type,
            wallet_type = %wallet.wallet_type,
            wallet = %event.wallet_address,
            job_id = %receipt.job_id,
            "enqueued reward event"
        );
        Ok(receipt)
    }

    /// Enqueue a reward event, reporting only whether the queue accepted it.
    ///
    /// Never fails: ineligible applications, invalid wallets, broker errors
    /// and a panicking broker client all come back as `false`.
    pub async fn enqueue_reward_event(
        &self,
        wallet_address: &str,
        application: &str,
        timestamp: &str,
    ) -> bool {
        let outcome = AssertUnwindSafe(self.try_enqueue(wallet_address, application, timestamp))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(_)) => true,
            Ok(Err(EnqueueError::NotEligible(_))) => false,
            Ok(Err(EnqueueError::InvalidWallet(err))) => {
                debug!(
                    wallet = %wallet_address,
                    reason = %err,
                    "skipping reward event for invalid wallet"
                );
                false
            }
            Ok(Err(EnqueueError::Queue(err))) => {
                error!(
                    application = %application,
                    wallet = %wallet_address,
                    error = %err,
                    "failed to enqueue reward event"
                );
                false
            }
            Err(_) => {
                error!(
                    application = %application,
                    wallet = %wallet_address,
                    "queue client panicked while enqueuing reward event"
                );
                false
            }
        }
    }

    pub fn is_eligible_application(&self, application: &str) -> bool {
        crate::eligibility::is_eligible_application(application)
    }
}

impl<V: AddressValidator + 'static> RewardEventEnqueuer<V> {
    /// Run [`enqueue_reward_event`](Self::enqueue_reward_event) on a detached task.
    ///
    /// Returns immediately. Dropping the handle leaves the task running.
    pub fn dispatch(
        self: &Arc<Self>,
        wallet_address: impl Into<String>,
        application: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> JoinHandle<bool> {
        let this = Arc::clone(self);
        let wallet_address = wallet_address.into();
        let application = application.into();
        let timestamp = timestamp.into();
        tokio::spawn(async move {
            this.enqueue_reward_event(&wallet_address, &application, &timestamp)
                .await
        })
    }
}
