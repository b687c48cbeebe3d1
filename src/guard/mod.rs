//! Usage guard for the protected TCDS mode.
//!
//! A [`Guard`] loads the persisted [`SecurityState`] once on construction and
//! then owns it. Callers run [`Guard::guard_usage`] before any protected code
//! path and report suspicious activity through [`Guard::register_event`],
//! which drives the `Normal -> Alert -> Locked` escalation:
//!
//! | Current state | `info` | `yellow` | `red`  | other  |
//! |---------------|--------|----------|--------|--------|
//! | Normal        | Normal | Alert    | Locked | Normal |
//! | Alert         | Alert  | Locked   | Locked | Alert  |
//! | Locked        | Locked | Locked   | Locked | Locked |
//!
//! Every event is audited, whatever its effect. Storage and audit failures
//! are logged through `tracing` and otherwise ignored so that filesystem
//! problems can neither crash nor bypass the gate.

pub mod policy;
pub mod severity;
pub mod state;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditLog, AuditRecord, AuditSink};
use crate::config::GuardConfig;
use crate::store::{JsonFileStore, StateStore};

pub use policy::UsagePolicy;
pub use severity::Severity;
pub use state::{GuardStatus, SecurityState};

/// Label used when the caller supplies no origin or region.
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Fallback text when a state carries no recorded reason.
const UNSPECIFIED_REASON: &str = "not specified";

/// Reasons a protected call is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// The guard was permanently locked by an earlier event.
    #[error(
        "TCDS_LOCK_PERMANENT: TCDS mode was disabled due to malicious or unauthorized use \
         ({reason}). Operate in normal mode only."
    )]
    PermanentlyLocked {
        /// Recorded lock reason.
        reason: String,
    },

    /// The origin or region is on the deny-list.
    #[error(
        "TCDS_POLICY_BLOCK: TCDS mode is not allowed for origin '{origin}' / region '{region}'. \
         Operate in normal mode only."
    )]
    PolicyBlocked {
        /// Origin of the refused guard.
        origin: String,
        /// Region of the refused guard.
        region: String,
    },
}

impl GuardError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermanentlyLocked { .. } => "TCDS_LOCK_PERMANENT",
            Self::PolicyBlocked { .. } => "TCDS_POLICY_BLOCK",
        }
    }
}

/// Escalating usage guard bound to one process session.
pub struct Guard {
    session_id: String,
    origin: String,
    region: String,
    state: SecurityState,
    policy: UsagePolicy,
    store: Box<dyn StateStore>,
    audit: Box<dyn AuditSink>,
}

impl Guard {
    /// Guard using the default state file and audit log in the working directory.
    pub fn new(origin: Option<&str>, region: Option<&str>) -> Self {
        Self::with_components(
            origin,
            region,
            Box::new(JsonFileStore::default()),
            Box::new(AuditLog::default()),
            UsagePolicy::default(),
        )
    }

    /// Guard using the state and audit paths from `config`.
    pub fn from_config(config: &GuardConfig, origin: Option<&str>, region: Option<&str>) -> Self {
        Self::with_components(
            origin,
            region,
            Box::new(JsonFileStore::new(&config.paths.state_file)),
            Box::new(AuditLog::new(&config.paths.audit_log)),
            UsagePolicy::default(),
        )
    }

    /// Guard with injected collaborators. Loads state from `store` immediately.
    pub fn with_components(
        origin: Option<&str>,
        region: Option<&str>,
        store: Box<dyn StateStore>,
        audit: Box<dyn AuditSink>,
        policy: UsagePolicy,
    ) -> Self {
        let state = match store.load() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to load guard state, starting clean");
                SecurityState::default()
            }
        };

        let guard = Self {
            session_id: Uuid::new_v4().to_string(),
            origin: context_label(origin),
            region: context_label(region),
            state,
            policy,
            store,
            audit,
        };
        debug!(
            session_id = %guard.session_id,
            status = guard.status().label(),
            "guard initialised"
        );
        guard
    }

    /// Anonymous session token for this instance.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Logical origin label.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Logical region label.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Current in-memory state.
    pub fn state(&self) -> &SecurityState {
        &self.state
    }

    /// Current tri-state status.
    pub fn status(&self) -> GuardStatus {
        self.state.status()
    }

    /// Whether protected use is permanently disabled.
    pub fn is_locked(&self) -> bool {
        self.state.lock_permanent
    }

    /// Whether the deny-list permits this origin and region.
    pub fn policy_allows_usage(&self) -> bool {
        self.policy.allows(&self.origin, &self.region)
    }

    /// Mandatory pre-check for every protected call path.
    ///
    /// The lock is checked before the policy. A successful check has no side
    /// effects and writes no audit record.
    ///
    /// # Errors
    ///
    /// [`GuardError::PermanentlyLocked`] if the guard is locked, otherwise
    /// [`GuardError::PolicyBlocked`] if the origin or region is denied.
    pub fn guard_usage(&self) -> Result<(), GuardError> {
        if self.state.lock_permanent {
            warn!(session_id = %self.session_id, "protected use refused: permanently locked");
            return Err(GuardError::PermanentlyLocked {
                reason: self.reason_or_unspecified().to_owned(),
            });
        }

        if !self.policy_allows_usage() {
            warn!(
                session_id = %self.session_id,
                origin = %self.origin,
                region = %self.region,
                "protected use refused by policy"
            );
            return Err(GuardError::PolicyBlocked {
                origin: self.origin.clone(),
                region: self.region.clone(),
            });
        }

        Ok(())
    }

    /// Alias of [`Guard::guard_usage`] under the name collaborators call.
    ///
    /// # Errors
    ///
    /// Same as [`Guard::guard_usage`].
    pub fn guard_tcds_usage(&self) -> Result<(), GuardError> {
        self.guard_usage()
    }

    /// Run `protected` if the gate allows it, otherwise `fallback` with the refusal.
    ///
    /// The protected path is never retried after a refusal.
    pub fn run_protected<T>(
        &self,
        protected: impl FnOnce() -> T,
        fallback: impl FnOnce(GuardError) -> T,
    ) -> T {
        match self.guard_usage() {
            Ok(()) => protected(),
            Err(e) => fallback(e),
        }
    }

    /// Report a security event and apply the escalation rules.
    ///
    /// `severity` is trimmed and lower-cased. Unrecognised severities change
    /// nothing but are still audited. State is persisted only when it changes.
    pub fn register_event(&mut self, severity: &str, reason: &str) {
        let severity = Severity::parse(severity);
        let changed = self.escalate(&severity, reason);

        if changed {
            info!(
                session_id = %self.session_id,
                severity = %severity,
                status = self.status().label(),
                "guard state escalated"
            );
            if let Err(e) = self.store.save(&self.state) {
                warn!(error = %e, "failed to persist guard state");
            }
        }

        self.audit(&severity, reason);
    }

    /// Apply the transition table. Returns whether the state changed.
    fn escalate(&mut self, severity: &Severity, reason: &str) -> bool {
        if self.state.lock_permanent {
            return false;
        }

        match severity {
            Severity::Info | Severity::Unknown(_) => false,
            Severity::Yellow if self.state.alert_flag => {
                self.state.lock_permanent = true;
                self.state.lock_reason = Some(format!(
                    "recidivism after yellow-level alert; last reason: {reason}"
                ));
                true
            }
            Severity::Yellow => {
                self.state.alert_flag = true;
                self.state.lock_reason = Some(format!("first yellow-level alert: {reason}"));
                true
            }
            Severity::Red => {
                self.state.lock_permanent = true;
                self.state.lock_reason = Some(format!("immediate lockout (red level): {reason}"));
                true
            }
        }
    }

    fn audit(&self, severity: &Severity, reason: &str) {
        let record = AuditRecord::new(
            &self.session_id,
            &self.origin,
            &self.region,
            severity.as_str(),
            reason,
            &self.state,
        );
        if let Err(e) = self.audit.append(&record) {
            warn!(error = %e, "failed to append audit record");
        }
    }

    /// Short human-readable summary of the current state. Performs no I/O.
    pub fn explain_state(&self) -> String {
        explain(&self.state)
    }

    fn reason_or_unspecified(&self) -> &str {
        self.state
            .lock_reason
            .as_deref()
            .unwrap_or(UNSPECIFIED_REASON)
    }
}

/// Summary text for a state, as returned by [`Guard::explain_state`].
pub fn explain(state: &SecurityState) -> String {
    let reason = state.lock_reason.as_deref().unwrap_or(UNSPECIFIED_REASON);
    match state.status() {
        GuardStatus::Locked => {
            format!("TCDS mode permanently LOCKED.\nRecorded reason: {reason}")
        }
        GuardStatus::Alert => {
            format!("TCDS mode ACTIVE but in alert state (yellow level).\nLast reason: {reason}")
        }
        GuardStatus::Normal => "TCDS mode ACTIVE in normal state (green level).".to_owned(),
    }
}

fn context_label(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_owned(),
        _ => UNKNOWN_CONTEXT.to_owned(),
    }
}
