//! Reconciliation of discovered capabilities against registered handlers.
//!
//! [`reconcile`] only computes what has to change; applying the plan to a
//! registry is up to the caller. Handlers whose source type is still offered
//! are left untouched even when their target set changed: a provider's
//! targets are fixed for its lifetime, so new targets for an existing source
//! only appear once that source has been dropped and offered again.

use std::collections::{BTreeMap, BTreeSet};

use crate::capability::CapabilityMap;
use crate::media_type::MediaType;
use crate::registry::HandlerId;

/// A handler the plan wants to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedHandler {
    pub id: HandlerId,
    pub source: MediaType,
    pub targets: BTreeSet<MediaType>,
}

/// Changes needed to bring one service's handlers in line with its map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_remove: Vec<HandlerId>,
    pub to_add: Vec<PlannedHandler>,
    pub unchanged: Vec<HandlerId>,
}

impl ReconcilePlan {
    /// Whether applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Diff `capabilities` for `service` against the `live` handler IDs.
///
/// Only IDs carrying the service's prefix are considered for removal, so
/// handlers of other services are never touched.
pub fn reconcile(
    service: &str,
    capabilities: &CapabilityMap,
    live: &BTreeSet<HandlerId>,
) -> ReconcilePlan {
    let wanted: BTreeMap<HandlerId, (&MediaType, &BTreeSet<MediaType>)> = capabilities
        .iter()
        .map(|(source, targets)| (HandlerId::derive(service, source), (source, targets)))
        .collect();

    let to_remove = live
        .iter()
        .filter(|id| id.belongs_to(service) && !wanted.contains_key(*id))
        .cloned()
        .collect();

    let mut to_add = Vec::new();
    let mut unchanged = Vec::new();
    for (id, (source, targets)) in wanted {
        if live.contains(&id) {
            unchanged.push(id);
        } else {
            to_add.push(PlannedHandler {
                id,
                source: source.clone(),
                targets: targets.clone(),
            });
        }
    }

    ReconcilePlan {
        to_remove,
        to_add,
        unchanged,
    }
}
