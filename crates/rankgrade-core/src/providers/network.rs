//! Outbound network policy for live judge calls.
//!
//! `RANKGRADE_NETWORK_POLICY=deny` blocks every live call; a scoped
//! [`NetworkPolicyGuard`] does the same for the lifetime of the guard.

use crate::providers::judge::JudgeError;
use std::sync::{Mutex, OnceLock};

pub const NETWORK_POLICY_ENV: &str = "RANKGRADE_NETWORK_POLICY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkPolicy {
    Allow,
    Deny(String),
}

fn state() -> &'static Mutex<NetworkPolicy> {
    static STATE: OnceLock<Mutex<NetworkPolicy>> = OnceLock::new();
    STATE.get_or_init(|| Mutex::new(NetworkPolicy::Allow))
}

pub struct NetworkPolicyGuard {
    previous: NetworkPolicy,
}

impl NetworkPolicyGuard {
    pub fn set(policy: NetworkPolicy) -> Self {
        let mut current = state().lock().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *current, policy);
        Self { previous }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::set(NetworkPolicy::Deny(reason.into()))
    }
}

impl Drop for NetworkPolicyGuard {
    fn drop(&mut self) {
        let mut current = state().lock().unwrap_or_else(|e| e.into_inner());
        *current = self.previous.clone();
    }
}

pub fn check_outbound(target: &str) -> Result<(), JudgeError> {
    match effective_policy() {
        NetworkPolicy::Allow => Ok(()),
        NetworkPolicy::Deny(reason) => Err(JudgeError::NetworkBlocked {
            target: target.to_string(),
            reason,
        }),
    }
}

fn effective_policy() -> NetworkPolicy {
    if let Ok(raw) = std::env::var(NETWORK_POLICY_ENV) {
        if raw.trim().eq_ignore_ascii_case("deny") {
            return NetworkPolicy::Deny(format!("{}=deny", NETWORK_POLICY_ENV));
        }
    }
    state().lock().unwrap_or_else(|e| e.into_inner()).clone()
}
