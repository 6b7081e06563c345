//! Outbound customer notifications.
//!
//! The store builds the message; delivering it is up to the embedding app
//! (open the `wa.me` link, hand it to a gateway, ...).

use tracing::info;

use garage_core::outreach::OutboundMessage;
use garage_core::Job;

/// Receives messages the store wants sent to customers.
pub trait Notifier: Send + Sync {
    /// A job has just moved into `Completed` and the change reached the remote.
    fn job_completed(&self, job: &Job, message: &OutboundMessage);
}

/// Logs each message. The default when no notifier is given.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn job_completed(&self, job: &Job, message: &OutboundMessage) {
        info!(
            job_id = %job.id,
            phone = message.phone.as_deref().unwrap_or("-"),
            link = %message.link,
            "Job completed, customer notification ready"
        );
    }
}

/// Drops every message.
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn job_completed(&self, _job: &Job, _message: &OutboundMessage) {}
}
