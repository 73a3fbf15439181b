//! Session encoding and two-phase decoding.
//!
//! Decoding runs in two passes over the whole document:
//!
//! 1. [`decode_variables`] builds every label with its scalar fields (id,
//!    category, attributes, shape, previous/next ids) and the item list.
//! 2. [`decode_pointers`] resolves `parent`, `children` and item label lists
//!    through the now complete id map.
//!
//! A label may point at a label that appears later in the array, so no
//! reference can be resolved during the first pass.

use std::collections::HashSet;

use crate::format::document::{ItemEntry, LabelEntry, SessionDocument, from_wire, to_wire};
use crate::model::{EventAction, Item, LabelId, LabelNode, SessionEvent, now_millis};
use crate::state::{Session, SessionError};

/// Serialize a session to a pretty-printed JSON document.
pub fn to_json(session: &Session) -> Result<String, SessionError> {
    serde_json::to_string_pretty(&encode(session)).map_err(SessionError::Json)
}

/// Build a session from a JSON document.
pub fn from_json(json: &str) -> Result<Session, SessionError> {
    let doc: SessionDocument = serde_json::from_str(json)?;
    decode(&doc)
}

/// Convert a session to its wire document. Deleted labels are left out.
pub fn encode(session: &Session) -> SessionDocument {
    let items = session
        .items()
        .iter()
        .map(|item| ItemEntry {
            url: item.url.clone(),
            index: item.index as i64,
            label_ids: item.label_refs.iter().map(|id| i64::from(*id)).collect(),
        })
        .collect();

    let labels = session
        .labels()
        .map(|label| encode_label(session, label))
        .collect();

    SessionDocument {
        project_name: session.project_name.clone(),
        start_time: session.start_time,
        task_index: Some(session.task_index),
        items,
        labels,
        categories: session.categories.clone(),
        events: session.events().to_vec(),
        user_agent: session.user_agent.clone(),
        ip_info: session.ip_info.clone(),
        last_label_id: Some(session.last_label_id()),
    }
}

fn encode_label(session: &Session, label: &LabelNode) -> LabelEntry {
    let children: Vec<i64> = label
        .children
        .iter()
        .filter(|id| session.label(**id).is_some_and(|c| c.valid))
        .map(|id| i64::from(*id))
        .collect();

    LabelEntry {
        id: label.id,
        category_path: label.category_path.clone(),
        parent: to_wire(label.parent),
        children: (!children.is_empty()).then_some(children),
        previous_label_id: to_wire(label.previous_label_id),
        next_label_id: to_wire(label.next_label_id),
        attributes: label.attributes.clone(),
        shape: label.shape.clone(),
    }
}

/// Rebuild a session from a wire document.
pub fn decode(doc: &SessionDocument) -> Result<Session, SessionError> {
    let mut session = decode_variables(doc)?;
    decode_pointers(doc, &mut session);
    Ok(session)
}

/// First pass: construct items and labels with scalar fields only.
///
/// Fails if two labels share an id.
pub fn decode_variables(doc: &SessionDocument) -> Result<Session, SessionError> {
    let mut session = Session::new(doc.project_name.clone());
    session.start_time = doc.start_time;
    session.task_index = doc.task_index.unwrap_or(0);
    session.categories = doc.categories.clone();
    session.user_agent = doc.user_agent.clone();
    session.ip_info = doc.ip_info.clone();
    session.events = doc.events.clone();

    for (position, entry) in doc.items.iter().enumerate() {
        if entry.index != position as i64 {
            log::warn!(
                "Item '{}' claims index {} but sits at position {}; using position",
                entry.url,
                entry.index,
                position
            );
        }
        let mut item = Item::new(position, entry.url.clone());
        item.active = position == 0;
        session.items.push(item);
    }

    let mut max_id: LabelId = 0;
    for entry in &doc.labels {
        if session.label_by_id.contains_key(&entry.id) {
            return Err(SessionError::malformed(format!(
                "label id {} appears more than once",
                entry.id
            )));
        }

        let mut node = LabelNode::new(entry.id, entry.category_path.clone());
        node.attributes = entry.attributes.clone();
        node.shape = entry.shape.clone();
        node.previous_label_id = from_wire(entry.previous_label_id);
        node.next_label_id = from_wire(entry.next_label_id);

        max_id = max_id.max(entry.id);
        session.labels.push(entry.id);
        session.label_by_id.insert(entry.id, node);
    }
    session.last_label_id = doc.last_label_id.unwrap_or(0).max(max_id);

    Ok(session)
}

/// Second pass: resolve parent/children links and item label lists.
///
/// Unresolvable ids are dropped and recorded; they never fail the load.
pub fn decode_pointers(doc: &SessionDocument, session: &mut Session) {
    for entry in &doc.labels {
        let parent = match from_wire(entry.parent) {
            Some(p) if session.label_by_id.contains_key(&p) => Some(p),
            Some(p) => {
                record_dangling(session, None, Some(entry.id), i64::from(p), "parent");
                None
            }
            None => None,
        };

        let mut children = Vec::new();
        for raw in entry.children.iter().flatten() {
            match from_wire(*raw).filter(|c| session.label_by_id.contains_key(c)) {
                Some(child) if !children.contains(&child) => children.push(child),
                Some(_) => {}
                None => record_dangling(session, None, Some(entry.id), *raw, "child"),
            }
        }

        for (link, side) in [
            (entry.previous_label_id, "previous"),
            (entry.next_label_id, "next"),
        ] {
            if let Some(id) = from_wire(link).filter(|id| !session.label_by_id.contains_key(id)) {
                log::warn!(
                    "Label {} has {} link to missing label {}; chain ends there",
                    entry.id,
                    side,
                    id
                );
                session.log_event(
                    SessionEvent::new(now_millis(), EventAction::OrphanedChain)
                        .with_label(entry.id),
                );
            }
        }

        if let Some(node) = session.label_by_id.get_mut(&entry.id) {
            node.parent = parent;
            node.children = children;
        }
    }

    reconcile_parents(session);

    let mut placed: HashSet<LabelId> = HashSet::new();
    for (position, entry) in doc.items.iter().enumerate() {
        let mut refs = Vec::new();
        for raw in &entry.label_ids {
            let Some(id) = from_wire(*raw).filter(|id| session.label_by_id.contains_key(id)) else {
                record_dangling(session, Some(position), None, *raw, "item label");
                continue;
            };
            if !placed.insert(id) {
                log::warn!(
                    "Label {} is listed on more than one item; keeping the first",
                    id
                );
                continue;
            }
            refs.push(id);
        }

        for id in &refs {
            if let Some(node) = session.label_by_id.get_mut(id) {
                node.item_index = Some(position);
            }
        }
        session.items[position].label_refs = refs;
    }
}

/// Make parent and children lists agree: a child naming a parent is listed by
/// it, and a listed child points back at its parent.
fn reconcile_parents(session: &mut Session) {
    let mut pairs: Vec<(LabelId, LabelId)> = Vec::new();
    for node in session.label_by_id.values() {
        if let Some(parent) = node.parent {
            pairs.push((parent, node.id));
        }
        for child in &node.children {
            pairs.push((node.id, *child));
        }
    }
    // Deterministic order keeps children lists stable across loads
    pairs.sort_unstable();

    for (parent, child) in pairs {
        let child_parent = session.label_by_id.get(&child).and_then(|c| c.parent);
        match child_parent {
            Some(p) if p != parent => {
                log::warn!(
                    "Label {} lists child {} whose parent is {}; dropping the entry",
                    parent,
                    child,
                    p
                );
                if let Some(node) = session.label_by_id.get_mut(&parent) {
                    node.children.retain(|c| *c != child);
                }
                continue;
            }
            None => {
                if let Some(node) = session.label_by_id.get_mut(&child) {
                    node.parent = Some(parent);
                }
            }
            Some(_) => {}
        }
        if let Some(node) = session.label_by_id.get_mut(&parent) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
    }
}

fn record_dangling(
    session: &mut Session,
    item: Option<usize>,
    owner: Option<LabelId>,
    missing: i64,
    what: &str,
) {
    log::warn!("Dropping {} reference to missing label {}", what, missing);
    let mut event = SessionEvent::new(now_millis(), EventAction::DanglingReference);
    if let Some(index) = item {
        event = event.with_item(index);
    }
    if let Some(id) = owner {
        event = event.with_label(id);
    }
    session.log_event(event);
}
