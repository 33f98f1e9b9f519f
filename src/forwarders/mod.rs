//! Forwarders ship a batch of samples to an outside service. Whatever owns
//! the batching calls `write` on its own schedule; a forwarder keeps nothing
//! from one write to the next.

pub mod newrelic;

use super::error::ForwardError;
use super::metrics::Sample;

pub trait Forwarder {
    /// Sends one batch. An empty batch is a no-op.
    fn write(&self, samples: &[Sample]) -> Result<(), ForwardError>;

    fn close(&mut self) -> Result<(), ForwardError> {
        Ok(())
    }
}
