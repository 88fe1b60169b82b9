//! Transaction status polling
//!
//! A submitted user operation resolves asynchronously; this loop polls the
//! order-history endpoint until the order reports an on-chain transaction
//! hash, a terminal status, or the attempt budget runs out. There is no
//! external cancellation token - callers abandon the future to cancel.

use std::time::Duration;

use tracing::{debug, warn};

use crate::api::OktoApi;
use crate::error::ProviderError;

/// Retry budget. With the capped backoff below this allows the loop to run
/// for roughly ten minutes.
const MAX_ATTEMPTS: u32 = 25;
const BASE_DELAY_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 30_000;

fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(exp.min(MAX_DELAY_MS))
}

/// Resolve a submitted intent id to the transaction hash it produced.
pub(crate) async fn wait_for_transaction_hash(
    api: &dyn OktoApi,
    intent_id: &str,
) -> Result<String, ProviderError> {
    let mut attempt = 0u32;

    loop {
        let orders = api.get_orders_history(intent_id).await?;

        if let Some(order) = orders.first() {
            if let Some(hash) = order
                .downstream_transaction_hash
                .first()
                .filter(|hash| !hash.is_empty())
            {
                debug!("intent {intent_id} resolved to {hash} after {attempt} retries");
                return Ok(hash.clone());
            }

            // A SUCCESSFUL order without a hash lands here too and fails
            // permanently. See DESIGN.md.
            if order.status.is_terminal() {
                warn!(
                    "intent {intent_id} reached terminal status {:?} without a transaction hash",
                    order.status
                );
                return Err(ProviderError::TransactionHashNotFound);
            }
        }

        if attempt >= MAX_ATTEMPTS {
            warn!("intent {intent_id} still unresolved after {MAX_ATTEMPTS} retries");
            return Err(ProviderError::TransactionHashNotFound);
        }

        tokio::time::sleep(backoff_delay(attempt)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockOktoApi;
    use okto_client::{Order, OrderStatus};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn order(status: OrderStatus, hashes: &[&str]) -> Order {
        Order {
            intent_id: "0xintent".to_string(),
            status,
            downstream_transaction_hash: hashes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(4), Duration::from_secs(16));
        // Capped from attempt 5 onwards.
        assert_eq!(backoff_delay(5), Duration::from_secs(30));
        assert_eq!(backoff_delay(24), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_after_pending_responses() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut api = MockOktoApi::new();
        {
            let calls = calls.clone();
            api.expect_get_orders_history()
                .times(4)
                .returning(move |_| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 3 {
                        Ok(vec![order(OrderStatus::InProgress, &[])])
                    } else {
                        Ok(vec![order(OrderStatus::Successful, &["0xhash99"])])
                    }
                });
        }

        let started = tokio::time::Instant::now();
        let hash = wait_for_transaction_hash(&api, "0xintent").await.unwrap();

        assert_eq!(hash, "0xhash99");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Exactly three delayed retries: 1s + 2s + 4s of (virtual) backoff.
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_status_fails_without_retry() {
        let mut api = MockOktoApi::new();
        api.expect_get_orders_history()
            .times(1)
            .returning(|_| Ok(vec![order(OrderStatus::Failed, &[])]));

        let started = tokio::time::Instant::now();
        let result = wait_for_transaction_hash(&api, "0xintent").await;

        assert!(matches!(
            result,
            Err(ProviderError::TransactionHashNotFound)
        ));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_without_hash_is_permanent_failure() {
        let mut api = MockOktoApi::new();
        api.expect_get_orders_history()
            .times(1)
            .returning(|_| Ok(vec![order(OrderStatus::Successful, &[""])]));

        let result = wait_for_transaction_hash(&api, "0xintent").await;
        assert!(matches!(
            result,
            Err(ProviderError::TransactionHashNotFound)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_budget_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut api = MockOktoApi::new();
        {
            let calls = calls.clone();
            api.expect_get_orders_history().returning(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![order(OrderStatus::InProgress, &[])])
            });
        }

        let result = wait_for_transaction_hash(&api, "0xintent").await;
        assert!(matches!(
            result,
            Err(ProviderError::TransactionHashNotFound)
        ));
        // Initial query plus 25 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_history_keeps_polling() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut api = MockOktoApi::new();
        {
            let calls = calls.clone();
            api.expect_get_orders_history().returning(move |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    // Order not yet indexed.
                    Ok(vec![])
                } else {
                    Ok(vec![order(OrderStatus::InProgress, &["0xabc123"])])
                }
            });
        }

        let hash = wait_for_transaction_hash(&api, "0xintent").await.unwrap();
        assert_eq!(hash, "0xabc123");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_propagates() {
        let mut api = MockOktoApi::new();
        api.expect_get_orders_history()
            .times(1)
            .returning(|_| Err(okto_client::ClientError::NoSession));

        let result = wait_for_transaction_hash(&api, "0xintent").await;
        assert!(matches!(result, Err(ProviderError::Client(_))));
    }
}
