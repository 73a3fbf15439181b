//! Property-based invariant tests for the label graph.
//!
//! Random sequences of create/link/parent/delete operations must always
//! leave the session in a state where:
//!
//! 1. Every id ever allocated is in the arena exactly once, and ids run
//!    1..=last_label_id.
//! 2. No item lists (or selects) a deleted label.
//! 3. Valid labels link only to valid labels, chain links point strictly
//!    forward in the item sequence and agree in both directions.
//! 4. A valid label never has a deleted parent.
//! 5. A full delete removes the whole chain and every valid descendant.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::model::{BoxGeometry, LabelId, LabelShape, LabelTemplate};
use crate::state::{DeletePolicy, Session};

const ITEMS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Create(usize),
    Link(usize, usize),
    Parent(usize, usize),
    Delete(usize),
    EndTrack(usize),
    Discard(usize),
    Track(usize, usize),
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ITEMS).prop_map(Op::Create),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Link(a, b)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Parent(a, b)),
        2 => (any::<usize>(), 0..ITEMS).prop_map(|(a, item)| Op::Track(a, item)),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => any::<usize>().prop_map(Op::EndTrack),
        1 => any::<usize>().prop_map(Op::Discard),
    ]
}

/// Map an arbitrary number onto an allocated id (valid or not).
fn pick(session: &Session, n: usize) -> Option<LabelId> {
    let last = session.last_label_id() as usize;
    (last > 0).then(|| (n % last + 1) as LabelId)
}

fn build(ops: &[Op]) -> Session {
    let mut session = Session::new("prop");
    for i in 0..ITEMS {
        session.add_item(format!("{}.jpg", i));
    }
    let template = LabelTemplate::new("obj");

    // Rejected operations are part of the exercise; only the state matters
    for op in ops {
        match *op {
            Op::Create(item) => {
                let shape = LabelShape::Box(BoxGeometry::new(1.0, 1.0, 20.0, 20.0));
                let _ = session.create_label_on(item, &template, Some(shape));
            }
            Op::Link(a, b) => {
                if let (Some(a), Some(b)) = (pick(&session, a), pick(&session, b)) {
                    let _ = session.link_labels(a, b);
                }
            }
            Op::Parent(a, b) => {
                if let (Some(a), Some(b)) = (pick(&session, a), pick(&session, b)) {
                    let _ = session.set_parent(a, b);
                }
            }
            Op::Track(a, item) => {
                if let Some(a) = pick(&session, a) {
                    let _ = session.propagate_track(a, item);
                }
            }
            Op::Delete(a) => {
                if let Some(a) = pick(&session, a) {
                    let _ = session.delete_label(a, DeletePolicy::Full);
                }
            }
            Op::EndTrack(a) => {
                if let Some(a) = pick(&session, a) {
                    let _ = session.end_track(a);
                }
            }
            Op::Discard(a) => {
                if let Some(a) = pick(&session, a) {
                    let _ = session.discard_label(a);
                }
            }
        }
    }
    session
}

/// Valid descendants reachable through valid labels.
fn valid_descendants(session: &Session, id: LabelId, out: &mut HashSet<LabelId>) {
    let Some(node) = session.label(id) else {
        return;
    };
    for child in &node.children {
        if session.label(*child).is_some_and(|c| c.valid) && out.insert(*child) {
            valid_descendants(session, *child, out);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Id uniqueness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ids_are_unique_and_dense(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let session = build(&ops);
        let mut ids: Vec<LabelId> = session.label_ids().collect();
        ids.sort_unstable();
        let expected: Vec<LabelId> = (1..=session.last_label_id()).collect();
        prop_assert_eq!(ids, expected);
        for id in session.label_ids() {
            prop_assert_eq!(session.label(id).map(|l| l.id), Some(id));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Items never reference deleted labels
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn items_reference_only_valid_labels(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let session = build(&ops);
        let mut placed = HashSet::new();
        for item in session.items() {
            for id in &item.label_refs {
                let label = session.label(*id);
                prop_assert!(label.is_some_and(|l| l.valid), "item {} lists deleted label {}", item.index, id);
                prop_assert_eq!(label.and_then(|l| l.item_index), Some(item.index));
                prop_assert!(placed.insert(*id), "label {} placed twice", id);
            }
            if let Some(selected) = item.selected_label {
                prop_assert!(item.label_refs.contains(&selected));
            }
        }
        prop_assert_eq!(placed.len(), session.num_valid_labels());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Chains run forward between valid labels
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn chains_are_monotonic(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let session = build(&ops);
        for label in session.labels() {
            if let Some(next_id) = label.next_label_id {
                let next = session.label(next_id);
                prop_assert!(next.is_some_and(|n| n.valid), "{} links forward to deleted {}", label.id, next_id);
                let next = next.unwrap();
                prop_assert!(next.item_index > label.item_index, "{} -> {} goes backwards", label.id, next.id);
                prop_assert_eq!(next.previous_label_id, Some(label.id));
            }
            if let Some(prev_id) = label.previous_label_id {
                let prev = session.label(prev_id);
                prop_assert!(prev.is_some_and(|p| p.valid), "{} links back to deleted {}", label.id, prev_id);
                prop_assert_eq!(prev.unwrap().next_label_id, Some(label.id));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Parents outlive their valid children
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn parents_of_valid_labels_are_valid(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let session = build(&ops);
        for label in session.labels() {
            if let Some(parent) = label.parent {
                prop_assert!(
                    session.label(parent).is_some_and(|p| p.valid),
                    "{} has deleted parent {}",
                    label.id,
                    parent
                );
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Cascade completeness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn full_delete_is_complete(
        ops in prop::collection::vec(op_strategy(), 1..80),
        target in any::<usize>(),
    ) {
        let mut session = build(&ops);
        let valid: Vec<LabelId> = session.labels().map(|l| l.id).collect();
        if valid.is_empty() {
            return Ok(());
        }
        let id = valid[target % valid.len()];

        let chain = session.chain_of(id);
        let mut doomed: HashSet<LabelId> = HashSet::new();
        for link in &chain {
            if session.label(*link).is_some_and(|l| l.valid) {
                doomed.insert(*link);
                valid_descendants(&session, *link, &mut doomed);
            }
        }

        let removed: HashSet<LabelId> = session
            .delete_label(id, DeletePolicy::Full)
            .unwrap()
            .into_iter()
            .collect();
        for gone in &doomed {
            prop_assert!(removed.contains(gone), "label {} survived", gone);
            prop_assert!(!session.label(*gone).unwrap().valid);
        }
        for item in session.items() {
            for listed in &item.label_refs {
                prop_assert!(!removed.contains(listed));
            }
        }
    }
}
