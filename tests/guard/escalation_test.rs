//! Escalation state machine tests.

use tcds_guard::audit::MemoryAuditSink;
use tcds_guard::guard::UsagePolicy;
use tcds_guard::store::MemoryStore;
use tcds_guard::{Guard, GuardStatus, SecurityState};

const SEVERITIES: [&str; 4] = ["info", "yellow", "red", "orange"];

fn fresh_guard(store: &MemoryStore, audit: &MemoryAuditSink) -> Guard {
    Guard::with_components(
        None,
        None,
        Box::new(store.clone()),
        Box::new(audit.clone()),
        UsagePolicy::default(),
    )
}

/// Every severity sequence of the given length, e.g. length 2 yields 16.
fn sequences(len: usize) -> Vec<Vec<&'static str>> {
    let mut out: Vec<Vec<&'static str>> = vec![Vec::new()];
    for _ in 0..len {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                SEVERITIES.iter().map(move |sev| {
                    let mut next = prefix.clone();
                    next.push(*sev);
                    next
                })
            })
            .collect();
    }
    out
}

#[test]
fn single_yellow_from_normal_is_alert() {
    let mut guard = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    guard.register_event("yellow", "ambiguous request");

    assert_eq!(guard.status(), GuardStatus::Alert);
    assert!(guard.state().alert_flag);
    assert!(!guard.is_locked());
}

#[test]
fn two_yellows_from_normal_lock() {
    let mut guard = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    guard.register_event("yellow", "first");
    assert!(!guard.is_locked());
    guard.register_event("yellow", "second");
    assert!(guard.is_locked());
    assert_eq!(guard.status(), GuardStatus::Locked);
}

#[test]
fn yellows_separated_by_info_still_lock() {
    let mut guard = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    guard.register_event("yellow", "first");
    guard.register_event("info", "routine");
    guard.register_event("unexpected", "noise");
    guard.register_event("yellow", "second");
    assert!(guard.is_locked());
}

#[test]
fn red_locks_from_normal_and_from_alert() {
    let mut from_normal = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    from_normal.register_event("red", "harm");
    assert!(from_normal.is_locked());

    let mut from_alert = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    from_alert.register_event("yellow", "warning");
    from_alert.register_event("red", "harm");
    assert!(from_alert.is_locked());
    assert!(from_alert.state().alert_flag);
    assert_eq!(
        from_alert.state().lock_reason.as_deref(),
        Some("immediate lockout (red level): harm")
    );
}

#[test]
fn severity_is_normalised_before_dispatch() {
    let audit = MemoryAuditSink::new();
    let mut guard = fresh_guard(&MemoryStore::new(), &audit);
    guard.register_event("  YeLLoW\t", "mixed case");
    assert_eq!(guard.status(), GuardStatus::Alert);
    assert_eq!(audit.records()[0].severity, "yellow");
}

#[test]
fn unknown_severity_is_audited_not_rejected() {
    let store = MemoryStore::new();
    let audit = MemoryAuditSink::new();
    let mut guard = fresh_guard(&store, &audit);
    guard.register_event(" Critical ", "unmapped");

    assert_eq!(guard.status(), GuardStatus::Normal);
    assert_eq!(store.saved(), None);
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, "critical");
    assert_eq!(records[0].reason, "unmapped");
}

#[test]
fn audit_snapshot_reflects_state_after_event() {
    let audit = MemoryAuditSink::new();
    let mut guard = fresh_guard(&MemoryStore::new(), &audit);
    guard.register_event("yellow", "a");
    guard.register_event("yellow", "b");

    let records = audit.records();
    assert!(records[0].alert_flag);
    assert!(!records[0].lock_permanent);
    assert!(records[1].alert_flag);
    assert!(records[1].lock_permanent);
    assert!(records
        .iter()
        .all(|r| r.session_id == guard.session_id() && r.origin == "unknown"));
}

#[test]
fn lock_is_monotonic_and_every_event_is_audited() {
    for len in 1..=4 {
        for seq in sequences(len) {
            let audit = MemoryAuditSink::new();
            let mut guard = fresh_guard(&MemoryStore::new(), &audit);
            let mut was_locked = false;
            let mut locked_state: Option<SecurityState> = None;

            for (i, sev) in seq.iter().enumerate() {
                guard.register_event(sev, "reason");

                assert!(
                    !(was_locked && !guard.is_locked()),
                    "lock reverted in sequence {seq:?}"
                );
                if let Some(frozen) = &locked_state {
                    assert_eq!(guard.state(), frozen, "locked state changed in {seq:?}");
                }
                if guard.is_locked() && locked_state.is_none() {
                    locked_state = Some(guard.state().clone());
                }
                was_locked = guard.is_locked();
                assert_eq!(audit.records().len(), i + 1, "audit count in {seq:?}");
            }
        }
    }
}

#[test]
fn alert_flag_never_reverts() {
    for seq in sequences(4) {
        let mut guard = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
        let mut seen_alert = false;
        for sev in &seq {
            guard.register_event(sev, "reason");
            if seen_alert {
                assert!(guard.state().alert_flag, "alert reverted in {seq:?}");
            }
            seen_alert = guard.state().alert_flag;
        }
    }
}

#[test]
fn explain_state_is_determined_by_state_alone() {
    let mut a = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    let mut b = fresh_guard(&MemoryStore::new(), &MemoryAuditSink::new());
    assert_eq!(a.explain_state(), b.explain_state());

    a.register_event("yellow", "same");
    b.register_event("yellow", "same");
    assert_eq!(a.explain_state(), b.explain_state());
    assert!(a.explain_state().contains("first yellow-level alert: same"));

    a.register_event("red", "x");
    assert_ne!(a.explain_state(), b.explain_state());
    assert!(a.explain_state().starts_with("TCDS mode permanently LOCKED."));
}
