//! Fixed step lists per subject type and the ETA arithmetic derived from
//! them. Steps run strictly in the order listed; different subject types have
//! different lists and lengths.

use crate::queue::types::SubjectType;

const WALLET_STEPS: &[&str] = &[
    "scan_transactions",
    "resolve_counterparties",
    "compute_flows",
    "score_wallet",
];

const ACTOR_STEPS: &[&str] = &[
    "collect_claims",
    "link_wallets",
    "aggregate_activity",
    "score_actor",
    "publish_profile",
];

const ENTITY_STEPS: &[&str] = &[
    "resolve_members",
    "merge_wallet_graphs",
    "compute_exposure",
];

const TOKEN_STEPS: &[&str] = &[
    "fetch_token_metadata",
    "scan_holders",
    "compute_distribution",
    "index_markets",
];

/// The ordered step list for a subject type.
pub fn steps_for(subject_type: SubjectType) -> &'static [&'static str] {
    match subject_type {
        SubjectType::Wallet => WALLET_STEPS,
        SubjectType::Actor => ACTOR_STEPS,
        SubjectType::Entity => ENTITY_STEPS,
        SubjectType::Token => TOKEN_STEPS,
    }
}

/// Hard-coded average wall-clock seconds per step. Rough figures for UI ETA
/// only; not load-bearing for correctness.
pub fn avg_step_secs(subject_type: SubjectType) -> u64 {
    match subject_type {
        SubjectType::Wallet => 20,
        SubjectType::Actor => 25,
        SubjectType::Entity => 30,
        SubjectType::Token => 15,
    }
}

/// Rough remaining time for a task at the given progress.
///
/// `eta = avg_step_secs * remaining_steps`, where completed steps are derived
/// by rounding `progress` back onto the step grid. A queued task reports the
/// full pipeline.
pub fn eta_seconds(subject_type: SubjectType, progress: u8) -> u64 {
    let total = steps_for(subject_type).len() as u64;
    let completed = (u64::from(progress.min(100)) * total + 50) / 100;
    avg_step_secs(subject_type) * total.saturating_sub(completed)
}
