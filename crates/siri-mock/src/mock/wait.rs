//! Synchronisation between the test driver and a running mock server.

use super::core::MockServer;
use super::types::MockError;
use tracing::debug;

impl MockServer {
    /// Wait until at least `count` requests have been captured.
    ///
    /// Gives up after the server's wait policy timeout with
    /// `MockError::RequestLimitExceeded`. Returns as soon as the count is
    /// reached, without polling.
    pub async fn wait_request(&self, request_type: &str, count: usize) -> Result<(), MockError> {
        let mut count_rx = self.request_count_tx.subscribe();
        let timeout = self.wait_policy.timeout();

        debug!(
            "Waiting up to {:?} for {} {} request(s) on mock '{}'",
            timeout,
            count,
            request_type,
            self.name()
        );

        let outcome = tokio::time::timeout(timeout, count_rx.wait_for(|received| *received >= count))
            .await
            .map(|reached| reached.map(|_| ()));

        match outcome {
            Ok(Ok(())) => Ok(()),
            _ => Err(MockError::RequestLimitExceeded {
                request_type: request_type.to_string(),
                expected: count,
                received: self.request_count(),
            }),
        }
    }

    /// Whether any request has been captured
    pub fn received_request(&self) -> bool {
        self.request_count() > 0
    }

    /// Whether exactly `count` requests have been captured
    pub fn received_requests(&self, count: usize) -> bool {
        self.request_count() == count
    }
}
