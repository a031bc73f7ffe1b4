use std::collections::HashMap;
use std::sync::Arc;

use crate::model::instance::Model;

/// The model lifecycle events.
///
/// "Before" events (`creating`, `updating`, `saving`, `deleting`) run with
/// halt semantics: a hook may veto the operation before any network call
/// is made. "After" events are notifications only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Creating,
    Created,
    Updating,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
}

impl ModelEvent {
    pub fn name(self) -> &'static str {
        match self {
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Saving => "saving",
            ModelEvent::Saved => "saved",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
        }
    }

    /// Whether a `Cancel` from a hook aborts the triggering operation.
    pub fn halts(self) -> bool {
        matches!(
            self,
            ModelEvent::Creating | ModelEvent::Updating | ModelEvent::Saving | ModelEvent::Deleting
        )
    }
}

/// What a lifecycle hook wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// Keep going: run the remaining hooks, then the operation.
    Continue,
    /// Veto the operation. Only honored for halting events.
    Cancel,
}

/// A registered lifecycle callback.
pub type Hook = Arc<dyn Fn(&mut Model) -> HookResult + Send + Sync>;

/// Ordered hook lists, one per lifecycle event.
///
/// Hooks run in registration order. For halting events the first `Cancel`
/// short-circuits the rest.
#[derive(Clone, Default)]
pub struct EventHandlers {
    hooks: HashMap<ModelEvent, Vec<Hook>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event: ModelEvent, hook: Hook) {
        self.hooks.entry(event).or_default().push(hook);
    }

    pub fn fire(&self, event: ModelEvent, model: &mut Model) -> HookResult {
        let halt = event.halts();

        for hook in self.hooks.get(&event).map(Vec::as_slice).unwrap_or(&[]) {
            if hook(model) == HookResult::Cancel && halt {
                return HookResult::Cancel;
            }
        }

        HookResult::Continue
    }

    pub fn handler_count(&self, event: ModelEvent) -> usize {
        self.hooks.get(&event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event, hooks) in &self.hooks {
            map.entry(&event.name(), &hooks.len());
        }
        map.finish()
    }
}
