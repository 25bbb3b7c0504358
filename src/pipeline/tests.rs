//! Pipeline Module Tests
//!
//! ## Test Scopes
//! - **Step lists**: fixed order and per-subject-type shape.
//! - **ETA**: the hard-coded average arithmetic.
//! - **Registry**: registration, lookup, execution, and failure propagation.

#[cfg(test)]
mod tests {
    use crate::pipeline::registry::{StepContext, StepRegistry};
    use crate::pipeline::steps::{avg_step_secs, eta_seconds, steps_for};
    use crate::queue::types::{SubjectRef, SubjectType};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn wallet_ctx() -> StepContext {
        StepContext {
            subject: SubjectRef::new(SubjectType::Wallet, "ethereum", "0xabc"),
        }
    }

    // ============================================================
    // TEST 1: Step lists
    // ============================================================

    #[test]
    fn test_step_lists_are_fixed_and_ordered() {
        assert_eq!(
            steps_for(SubjectType::Wallet),
            &[
                "scan_transactions",
                "resolve_counterparties",
                "compute_flows",
                "score_wallet",
            ]
        );
        assert_eq!(steps_for(SubjectType::Actor).len(), 5);
        assert_eq!(steps_for(SubjectType::Entity).len(), 3);
        assert_eq!(steps_for(SubjectType::Token).len(), 4);
    }

    #[test]
    fn test_step_names_are_unique_within_a_pipeline() {
        for subject_type in SubjectType::ALL {
            let steps = steps_for(subject_type);
            let mut deduped: Vec<_> = steps.to_vec();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), steps.len(), "{} has duplicate steps", subject_type);
        }
    }

    // ============================================================
    // TEST 2: ETA arithmetic
    // ============================================================

    #[test]
    fn test_eta_full_pipeline_when_queued() {
        for subject_type in SubjectType::ALL {
            let total = steps_for(subject_type).len() as u64;
            assert_eq!(eta_seconds(subject_type, 0), avg_step_secs(subject_type) * total);
        }
    }

    #[test]
    fn test_eta_shrinks_with_progress() {
        // Wallet: 4 steps at 20s each.
        assert_eq!(eta_seconds(SubjectType::Wallet, 25), 60);
        assert_eq!(eta_seconds(SubjectType::Wallet, 50), 40);
        assert_eq!(eta_seconds(SubjectType::Wallet, 75), 20);
        assert_eq!(eta_seconds(SubjectType::Wallet, 100), 0);
        // Out-of-range progress behaves like 100.
        assert_eq!(eta_seconds(SubjectType::Wallet, 255), 0);
    }

    // ============================================================
    // TEST 3: Subject context accessors
    // ============================================================

    #[test]
    fn test_subject_ref_exposes_matching_identifier() {
        let wallet = SubjectRef::new(SubjectType::Wallet, "ethereum", "0xAAA");
        assert_eq!(wallet.address(), Some("0xaaa"));
        assert!(wallet.subject_id().is_none());
        assert!(wallet.token_address().is_none());

        let actor = SubjectRef::new(SubjectType::Actor, "ethereum", "actor-1");
        assert_eq!(actor.subject_id(), Some("actor-1"));
        assert!(actor.address().is_none());

        let token = SubjectRef::new(SubjectType::Token, "base", "0xBBB");
        assert_eq!(token.token_address(), Some("0xbbb"));
    }

    // ============================================================
    // TEST 4: Step registry
    // ============================================================

    #[tokio::test]
    async fn test_registry_register_and_run() {
        let registry = StepRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        registry.register("scan_transactions", move |_ctx| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert!(registry.has_handler("scan_transactions"));
        assert_eq!(registry.handler_count(), 1);

        registry.run_step("scan_transactions", wallet_ctx()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_unknown_step_returns_error() {
        let registry = StepRegistry::new();

        let result = registry.run_step("no_such_step", wallet_ctx()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown step handler"));
    }

    #[tokio::test]
    async fn test_registry_handler_failure_propagates() {
        let registry = StepRegistry::new();
        registry.register("compute_flows", |_ctx| async {
            Err(anyhow::anyhow!("upstream returned 503"))
        });

        let result = registry.run_step("compute_flows", wallet_ctx()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_registry_handler_sees_subject() {
        let registry = StepRegistry::new();
        let seen = Arc::new(tokio::sync::Mutex::new(None));
        let seen_clone = seen.clone();

        registry.register("fetch_token_metadata", move |ctx: StepContext| {
            let seen = seen_clone.clone();
            async move {
                *seen.lock().await = Some(ctx.subject.clone());
                Ok(())
            }
        });

        let ctx = StepContext {
            subject: SubjectRef::new(SubjectType::Token, "Base", "0xDEF"),
        };
        registry.run_step("fetch_token_metadata", ctx).await.unwrap();

        let subject = seen.lock().await.clone().unwrap();
        assert_eq!(subject.chain, "base");
        assert_eq!(subject.token_address(), Some("0xdef"));
    }
}
