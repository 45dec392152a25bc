//! Debugging hooks exposed to the host.
//!
//! The compiler never prints. Diagnostics go to [`DebugHandler`] sinks,
//! object removal is announced to [`ObjectDeleteListener`]s, and a debugger
//! UI polls the [`BreakpointHandler`] for the values of a paused class.

use std::collections::BTreeSet;

use snex_core::{NamespacedIdentifier, TypeInfo};

/// Sink for compiler diagnostics.
pub trait DebugHandler {
    fn log_message(&mut self, message: &str);
}

/// Notified when a host object is deregistered from the global scope.
pub trait ObjectDeleteListener {
    fn object_deleted(&mut self, id: &NamespacedIdentifier);
}

/// Collects every message. Handy for tests and for hosts that render a log
/// after compilation.
#[derive(Debug, Clone, Default)]
pub struct MessageCollector {
    pub messages: Vec<String>,
}

impl DebugHandler for MessageCollector {
    fn log_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// One row of the variable table shown while paused.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugEntry {
    pub id: NamespacedIdentifier,
    pub type_info: TypeInfo,
    pub value: String,
}

impl DebugEntry {
    pub fn new(id: NamespacedIdentifier, type_info: TypeInfo, value: impl Into<String>) -> Self {
        Self {
            id,
            type_info,
            value: value.into(),
        }
    }
}

/// Line breakpoints and the variable table of the last hit.
#[derive(Debug, Clone, Default)]
pub struct BreakpointHandler {
    enabled: bool,
    breakpoints: BTreeSet<u32>,
    paused_at: Option<u32>,
    entries: Vec<DebugEntry>,
}

impl BreakpointHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Breakpoints only fire while the handler is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.resume();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_breakpoint(&mut self, line: u32) {
        self.breakpoints.insert(line);
    }

    pub fn remove_breakpoint(&mut self, line: u32) -> bool {
        self.breakpoints.remove(&line)
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.breakpoints.iter().copied()
    }

    /// Whether execution is currently paused at a breakpoint.
    pub fn is_active(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn paused_at(&self) -> Option<u32> {
        self.paused_at
    }

    /// Called when execution reaches `line`. Pauses and returns `true` if a
    /// breakpoint is set there.
    pub fn break_at(&mut self, line: u32) -> bool {
        if !self.enabled || !self.breakpoints.contains(&line) {
            return false;
        }
        tracing::debug!(target: "snex::jit", line, "breakpoint hit");
        self.paused_at = Some(line);
        true
    }

    /// Replace the variable table.
    pub fn update_entries(&mut self, entries: Vec<DebugEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[DebugEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &NamespacedIdentifier) -> Option<&DebugEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn resume(&mut self) {
        self.paused_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snex_core::TypeId;

    #[test]
    fn breakpoints_fire_only_when_enabled() {
        let mut handler = BreakpointHandler::new();
        handler.set_breakpoint(12);
        assert!(!handler.break_at(12));

        handler.set_enabled(true);
        assert!(!handler.break_at(11));
        assert!(handler.break_at(12));
        assert!(handler.is_active());
        assert_eq!(handler.paused_at(), Some(12));

        handler.resume();
        assert!(!handler.is_active());
    }

    #[test]
    fn disabling_resumes() {
        let mut handler = BreakpointHandler::new();
        handler.set_enabled(true);
        handler.set_breakpoint(3);
        handler.break_at(3);
        handler.set_enabled(false);
        assert!(!handler.is_active());
    }

    #[test]
    fn remove_breakpoint() {
        let mut handler = BreakpointHandler::new();
        handler.set_breakpoint(4);
        handler.set_breakpoint(2);
        assert_eq!(handler.breakpoints().collect::<Vec<_>>(), vec![2, 4]);
        assert!(handler.remove_breakpoint(4));
        assert!(!handler.remove_breakpoint(4));
    }

    #[test]
    fn entries_lookup() {
        let mut handler = BreakpointHandler::new();
        let id = NamespacedIdentifier::from_string("Main::gain");
        handler.update_entries(vec![DebugEntry::new(
            id.clone(),
            TypeInfo::new(TypeId::Float),
            "0.5f",
        )]);
        assert_eq!(handler.entry(&id).map(|e| e.value.as_str()), Some("0.5f"));
        assert!(handler.entry(&NamespacedIdentifier::new("x")).is_none());
    }

    #[test]
    fn collector_keeps_order() {
        let mut collector = MessageCollector::default();
        collector.log_message("a");
        collector.log_message("b");
        assert_eq!(collector.messages, vec!["a", "b"]);
    }
}
