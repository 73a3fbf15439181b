//! Label graph operations.
//!
//! Two structures overlay the label arena:
//! - **composition**: `parent`/`children` trees (e.g. a traffic light box
//!   owning a "light color" sub-label);
//! - **tracking**: `previous_label_id`/`next_label_id` chains linking the
//!   same real-world object across items, always from an earlier item to a
//!   later one.
//!
//! Deletion cascades through both. A full delete removes the label, its
//! subtree, any parent left without valid children, and every label on its
//! tracking chain. Ending a track removes the label and the later part of
//! its chain only.

use std::collections::HashSet;

use crate::color_utils::palette_color;
use crate::model::{
    EventAction, LabelId, LabelNode, LabelShape, LabelTemplate, SessionEvent, now_millis,
};
use crate::state::error::SessionError;
use crate::state::session::Session;

/// How far a deletion reaches along the tracking chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete the label and its whole chain, each link with full
    /// parent/child cascade.
    Full,
    /// Delete the label with its subtree and any parent left empty. For each
    /// label deleted, the later links of its chain are dropped from their
    /// items without cascading through them. Earlier links survive as a
    /// shortened track.
    EndTrack,
}

/// Direction of a chain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

/// Result of walking a chain in one direction.
struct ChainWalk {
    /// Links in walk order, excluding the start label.
    links: Vec<LabelId>,
    /// Id the walk stopped at because no such label exists.
    orphan: Option<LabelId>,
}

impl Session {
    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a label on the active item.
    pub fn create_label(
        &mut self,
        template: &LabelTemplate,
        shape: Option<LabelShape>,
    ) -> Result<LabelId, SessionError> {
        let index = self.current_item;
        self.create_label_on(index, template, shape)
    }

    /// Create a label on a specific item. This is the only place ids are
    /// allocated.
    pub fn create_label_on(
        &mut self,
        item_index: usize,
        template: &LabelTemplate,
        shape: Option<LabelShape>,
    ) -> Result<LabelId, SessionError> {
        if item_index >= self.items.len() {
            return Err(SessionError::InvalidNavigation);
        }

        let id = self.last_label_id + 1;
        self.last_label_id = id;

        let position = shape.as_ref().map(|s| {
            let b = s.bounds();
            vec![b.x, b.y, b.w, b.h]
        });
        let mut node = LabelNode::new(id, Some(template.category_path.clone()));
        node.attributes = template.attributes.clone();
        node.item_index = Some(item_index);
        node.shape = shape;

        self.labels.push(id);
        self.label_by_id.insert(id, node);
        self.items[item_index].label_refs.push(id);

        log::debug!(
            "Created label {} ({}) on item {}",
            id,
            template.category_path,
            item_index
        );
        let mut event = SessionEvent::new(now_millis(), EventAction::CreateLabel)
            .with_item(item_index)
            .with_label(id);
        if let Some(position) = position {
            event = event.with_position(position);
        }
        self.log_event(event);
        self.touch();
        Ok(id)
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Make `child` a sub-label of `parent`, moving it out of any previous
    /// parent.
    pub fn set_parent(&mut self, child: LabelId, parent: LabelId) -> Result<(), SessionError> {
        self.require_valid(child)?;
        self.require_valid(parent)?;
        if child == parent {
            return Err(SessionError::invalid_link(format!(
                "label {} cannot be its own parent",
                child
            )));
        }
        if self.ancestors(parent).contains(&child) {
            return Err(SessionError::invalid_link(format!(
                "label {} is an ancestor of {}",
                child, parent
            )));
        }

        if let Some(old) = self.label_by_id.get(&child).and_then(|c| c.parent) {
            if let Some(old_parent) = self.label_mut(old) {
                old_parent.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = self.label_mut(parent) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
        if let Some(node) = self.label_mut(child) {
            node.parent = Some(parent);
        }

        log::debug!("Label {} is now a child of {}", child, parent);
        self.touch();
        Ok(())
    }

    /// Number of valid children. Always derived, never cached.
    pub fn num_children(&self, id: LabelId) -> usize {
        self.label(id)
            .map(|node| {
                node.children
                    .iter()
                    .filter(|c| self.label(**c).is_some_and(|c| c.valid))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Top-most ancestor of a label (the label itself if it has no parent).
    pub fn get_root(&self, id: LabelId) -> Option<LabelId> {
        self.label(id)?;
        Some(self.ancestors(id).last().copied().unwrap_or(id))
    }

    /// Parent, grandparent, ... of a label, nearest first. Stops on a cycle
    /// or a missing id.
    fn ancestors(&self, id: LabelId) -> Vec<LabelId> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut cursor = self.label(id).and_then(|l| l.parent);
        while let Some(parent) = cursor {
            if !seen.insert(parent) || self.label(parent).is_none() {
                break;
            }
            out.push(parent);
            cursor = self.label(parent).and_then(|l| l.parent);
        }
        out
    }

    // ========================================================================
    // Tracking chains
    // ========================================================================

    /// Link two labels as consecutive observations of one object.
    ///
    /// `previous` must sit on an earlier item than `next`, and neither may
    /// already be linked on that side.
    pub fn link_labels(&mut self, previous: LabelId, next: LabelId) -> Result<(), SessionError> {
        let prev_node = self.require_valid(previous)?;
        let next_node = self.require_valid(next)?;

        let (Some(prev_item), Some(next_item)) = (prev_node.item_index, next_node.item_index) else {
            return Err(SessionError::invalid_link(
                "both labels must be placed on an item",
            ));
        };
        if prev_item >= next_item {
            return Err(SessionError::invalid_link(format!(
                "label {} (item {}) must precede label {} (item {})",
                previous, prev_item, next, next_item
            )));
        }
        if let Some(existing) = prev_node.next_label_id {
            return Err(SessionError::invalid_link(format!(
                "label {} already continues as {}",
                previous, existing
            )));
        }
        if let Some(existing) = next_node.previous_label_id {
            return Err(SessionError::invalid_link(format!(
                "label {} already follows {}",
                next, existing
            )));
        }

        if let Some(node) = self.label_mut(previous) {
            node.next_label_id = Some(next);
        }
        if let Some(node) = self.label_mut(next) {
            node.previous_label_id = Some(previous);
        }

        log::debug!("Linked label {} -> {}", previous, next);
        self.log_event(
            SessionEvent::new(now_millis(), EventAction::LinkLabels)
                .with_item(next_item)
                .with_label(next),
        );
        self.touch();
        Ok(())
    }

    /// Carry a tracked label forward: copy it onto a later item and link the
    /// copy as its successor. Returns the new label's id.
    pub fn propagate_track(&mut self, id: LabelId, target_item: usize) -> Result<LabelId, SessionError> {
        let node = self.require_valid(id)?;
        let template = LabelTemplate {
            category_path: node.category_path.clone().unwrap_or_default(),
            attributes: node.attributes.clone(),
        };
        let shape = node.shape.clone();
        let source_item = node.item_index;

        if node.next_label_id.is_some() {
            return Err(SessionError::invalid_link(format!(
                "label {} is already tracked forward",
                id
            )));
        }
        if source_item.is_none_or(|source| source >= target_item) {
            return Err(SessionError::invalid_link(format!(
                "item {} is not after the item of label {}",
                target_item, id
            )));
        }

        let copy = self.create_label_on(target_item, &template, shape)?;
        self.link_labels(id, copy)?;
        Ok(copy)
    }

    /// Whole tracking chain containing `id`, earliest item first.
    pub fn chain_of(&self, id: LabelId) -> Vec<LabelId> {
        if self.label(id).is_none() {
            return Vec::new();
        }
        let back = self.walk_chain(id, Direction::Backward);
        let forward = self.walk_chain(id, Direction::Forward);

        let mut chain: Vec<LabelId> = back.links.into_iter().rev().collect();
        chain.push(id);
        chain.extend(forward.links);
        // A looped chain is seen from both directions
        let mut seen = HashSet::new();
        chain.retain(|link| seen.insert(*link));
        chain
    }

    /// Display color of a label. Every link of a tracking chain shares the
    /// color of the chain's first label, so an object keeps its color from
    /// item to item.
    pub fn display_color(&self, id: LabelId) -> Option<[u8; 3]> {
        let root = self.get_root(id)?;
        let head = self.chain_of(root).first().copied().unwrap_or(root);
        Some(palette_color(head as usize))
    }

    fn walk_chain(&self, start: LabelId, direction: Direction) -> ChainWalk {
        let step = |node: &LabelNode| match direction {
            Direction::Backward => node.previous_label_id,
            Direction::Forward => node.next_label_id,
        };

        let mut seen = HashSet::from([start]);
        let mut links = Vec::new();
        let mut cursor = self.label(start).and_then(step);
        while let Some(link) = cursor {
            let Some(node) = self.label(link) else {
                return ChainWalk {
                    links,
                    orphan: Some(link),
                };
            };
            if !seen.insert(link) {
                log::warn!("Tracking chain through label {} loops; stopping", start);
                break;
            }
            links.push(link);
            cursor = step(node);
        }
        ChainWalk {
            links,
            orphan: None,
        }
    }

    /// Walk a chain, recording a missing link as an orphaned chain end.
    fn walk_chain_logged(&mut self, start: LabelId, direction: Direction) -> Vec<LabelId> {
        let walk = self.walk_chain(start, direction);
        if let Some(orphan) = walk.orphan {
            log::warn!(
                "Chain of label {} points at missing label {}; treating it as the end",
                start,
                orphan
            );
            self.log_event(
                SessionEvent::new(now_millis(), EventAction::OrphanedChain).with_label(start),
            );
        }
        walk.links
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select a label on the active item, or clear the selection.
    pub fn select_label(&mut self, id: Option<LabelId>) -> Result<(), SessionError> {
        let Some(item) = self.items.get(self.current_item) else {
            return Err(SessionError::InvalidNavigation);
        };
        if let Some(id) = id {
            if !item.label_refs.contains(&id) {
                return Err(SessionError::LabelNotFound { id });
            }
        }
        if item.selected_label != id {
            self.items[self.current_item].selected_label = id;
            self.touch();
        }
        Ok(())
    }

    /// Select the tracked object a label belongs to on every item its chain
    /// reaches. The chain followed is that of the label's root, so selecting
    /// a sub-label selects the whole tracked composite. Returns how many
    /// items changed selection.
    pub fn propagate_selection(&mut self, id: LabelId) -> usize {
        let Some(root) = self.get_root(id) else {
            return 0;
        };
        let mut chain = self.walk_chain_logged(root, Direction::Backward);
        chain.reverse();
        chain.push(root);
        chain.extend(self.walk_chain_logged(root, Direction::Forward));
        if chain.len() < 2 {
            return 0;
        }

        let mut changed = 0;
        for link in chain {
            let Some(index) = self.label(link).filter(|n| n.valid).and_then(|n| n.item_index)
            else {
                continue;
            };
            let Some(item) = self.items.get_mut(index) else {
                continue;
            };
            if item.label_refs.contains(&link) && item.selected_label != Some(link) {
                item.selected_label = Some(link);
                changed += 1;
            }
        }
        if changed > 0 {
            log::debug!("Selection of label {} propagated to {} items", root, changed);
            self.touch();
        }
        changed
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete a label. Returns every label invalidated by the cascade.
    /// Deleting an already deleted label is a no-op.
    pub fn delete_label(&mut self, id: LabelId, policy: DeletePolicy) -> Result<Vec<LabelId>, SessionError> {
        let node = self
            .label(id)
            .ok_or(SessionError::LabelNotFound { id })?;
        if !node.valid {
            return Ok(Vec::new());
        }
        let item_index = node.item_index;

        let mut removed = Vec::new();
        self.cascade_delete(id, policy, &mut removed);

        let action = match policy {
            DeletePolicy::Full => EventAction::DeleteLabel,
            DeletePolicy::EndTrack => EventAction::EndTrack,
        };
        let mut event = SessionEvent::new(now_millis(), action).with_label(id);
        if let Some(index) = item_index {
            event = event.with_item(index);
        }
        self.log_event(event);

        log::debug!(
            "Deleted label {} ({:?}): {} labels invalidated",
            id,
            policy,
            removed.len()
        );
        self.touch();
        Ok(removed)
    }

    /// End the track of a label here. Shorthand for
    /// [`DeletePolicy::EndTrack`].
    pub fn end_track(&mut self, id: LabelId) -> Result<Vec<LabelId>, SessionError> {
        self.delete_label(id, DeletePolicy::EndTrack)
    }

    /// Throw away a label that never became a usable annotation (a degenerate
    /// box). The label is cut out of its tracking chain, so its neighbours
    /// survive, then deleted with its subtree and dropped from the ordered
    /// label list. Its id stays allocated.
    pub fn discard_label(&mut self, id: LabelId) -> Result<Vec<LabelId>, SessionError> {
        let item_index = self.require_valid(id)?.item_index;
        self.unlink_chain(id);

        let mut removed = Vec::new();
        self.cascade_delete(id, DeletePolicy::Full, &mut removed);
        self.labels.retain(|l| *l != id);

        let mut event = SessionEvent::new(now_millis(), EventAction::DiscardLabel).with_label(id);
        if let Some(index) = item_index {
            event = event.with_item(index);
        }
        self.log_event(event);

        log::debug!("Discarded degenerate label {}", id);
        self.touch();
        Ok(removed)
    }

    /// Detach a label from both chain neighbours.
    fn unlink_chain(&mut self, id: LabelId) {
        let Some(node) = self.label_mut(id) else {
            return;
        };
        let previous = node.previous_label_id.take();
        let next = node.next_label_id.take();

        if let Some(prev) = previous.and_then(|p| self.label_mut(p)) {
            if prev.next_label_id == Some(id) {
                prev.next_label_id = None;
            }
        }
        if let Some(next) = next.and_then(|n| self.label_mut(n)) {
            if next.previous_label_id == Some(id) {
                next.previous_label_id = None;
            }
        }
    }

    /// Replace a label's geometry in place.
    pub fn update_shape(
        &mut self,
        id: LabelId,
        update: impl FnOnce(&mut LabelShape),
    ) -> Result<(), SessionError> {
        self.require_valid(id)?;
        let Some(shape) = self.label_mut(id).and_then(|n| n.shape.as_mut()) else {
            return Ok(());
        };
        update(shape);
        self.touch();
        Ok(())
    }

    /// Invalidate a label, its subtree and any parent left empty, removing
    /// each from its item's render list. Every label invalidated this way
    /// has its tracking chain handled by `policy`, so no valid label is left
    /// linked to a deleted one.
    fn cascade_delete(&mut self, id: LabelId, policy: DeletePolicy, removed: &mut Vec<LabelId>) {
        let Some((parent, children)) = self.retire(id, removed) else {
            return;
        };

        if let Some(parent) = parent {
            let parent_valid = self.label(parent).is_some_and(|p| p.valid);
            if parent_valid && self.num_children(parent) == 0 {
                self.cascade_delete(parent, policy, removed);
            }
        }

        for child in children {
            self.cascade_delete(child, policy, removed);
        }

        match policy {
            DeletePolicy::Full => {
                let mut chain = self.walk_chain_logged(id, Direction::Backward);
                chain.extend(self.walk_chain_logged(id, Direction::Forward));
                for link in chain {
                    self.cascade_delete(link, policy, removed);
                }
            }
            DeletePolicy::EndTrack => {
                for link in self.walk_chain_logged(id, Direction::Forward) {
                    self.retire(link, removed);
                }
                let previous = self.label(id).and_then(|n| n.previous_label_id);
                if let Some(prev) = previous.and_then(|p| self.label_mut(p)) {
                    if prev.next_label_id == Some(id) {
                        prev.next_label_id = None;
                    }
                }
            }
        }
    }

    /// Invalidate one label, take it off its item and detach its children,
    /// with no cascade. Returns its parent and children, or `None` if it was
    /// already gone.
    fn retire(
        &mut self,
        id: LabelId,
        removed: &mut Vec<LabelId>,
    ) -> Option<(Option<LabelId>, Vec<LabelId>)> {
        let node = self.label_mut(id).filter(|n| n.valid)?;
        node.valid = false;
        let parent = node.parent;
        let children = node.children.clone();
        let item_index = node.item_index;

        if let Some(item) = item_index.and_then(|i| self.items.get_mut(i)) {
            item.detach_label(id);
        }
        for child in &children {
            if let Some(node) = self.label_mut(*child).filter(|c| c.parent == Some(id)) {
                node.parent = None;
            }
        }
        removed.push(id);
        Some((parent, children))
    }

    fn require_valid(&self, id: LabelId) -> Result<&LabelNode, SessionError> {
        self.label(id)
            .filter(|n| n.valid)
            .ok_or(SessionError::LabelNotFound { id })
    }
}
