//! Subtree watcher that removes tracking scripts however they got attached.

use super::deny_list::DenyList;
use crate::observability::{BlockPath, ConsentEvent, Observer};
use crate::page::document::{AttachedNode, Document, MutationListener};
use std::sync::Arc;

pub struct ScriptRemovalListener {
    deny_list: Arc<DenyList>,
    observer: Arc<dyn Observer>,
}

impl ScriptRemovalListener {
    pub fn new(deny_list: Arc<DenyList>, observer: Arc<dyn Observer>) -> Self {
        Self {
            deny_list,
            observer,
        }
    }
}

impl MutationListener for ScriptRemovalListener {
    fn on_nodes_added(&self, document: &dyn Document, added: &[AttachedNode]) {
        for node in added.iter().filter(|node| node.is_script()) {
            let Some(src) = node.src() else {
                continue;
            };
            if self.deny_list.matches_script(src) && document.remove(node.id) {
                self.observer.record_event(&ConsentEvent::ScriptBlocked {
                    src: src.to_string(),
                    path: BlockPath::Observer,
                });
            }
        }
    }
}
