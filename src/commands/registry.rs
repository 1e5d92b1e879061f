//! Command registry
//!
//! Centralized registry for all available commands.
//! This allows loose coupling between command implementations and the dispatcher.

use super::{admin, counter, key, string, Command};
use std::sync::Arc;

/// Registry of all available commands
pub struct CommandRegistry {
    /// Checked in registration order
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new command registry and register all commands
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: Vec::new(),
        };

        // Register string commands
        registry.register(Arc::new(string::GetCommand));
        registry.register(Arc::new(string::SetCommand));

        // Register key commands
        registry.register(Arc::new(key::DelCommand));

        // Register counter commands
        registry.register(Arc::new(counter::IncrCommand));

        // Register admin commands
        registry.register(Arc::new(admin::QuitCommand));

        registry
    }

    /// Register a command
    fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Find the command selected by a request line
    pub fn resolve(&self, line: &[u8]) -> Option<Arc<dyn Command>> {
        self.commands
            .iter()
            .find(|command| command.matches(line))
            .cloned()
    }

    /// Get all command names
    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|command| command.name()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(line: &[u8]) -> Option<&'static str> {
        CommandRegistry::new().resolve(line).map(|command| command.name())
    }

    #[test]
    fn test_resolve_by_prefix() {
        assert_eq!(resolved(b"GET a"), Some("GET"));
        assert_eq!(resolved(b"SET a b"), Some("SET"));
        assert_eq!(resolved(b"DEL a"), Some("DEL"));
        assert_eq!(resolved(b"INCR a"), Some("INCR"));
    }

    #[test]
    fn test_short_lines_never_match() {
        assert_eq!(resolved(b"GET"), None);
        assert_eq!(resolved(b"INCR"), None);
        assert_eq!(resolved(b"DEL"), None);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(resolved(b"get a"), None);
        assert_eq!(resolved(b"quit"), None);
    }

    #[test]
    fn test_quit_exact_match() {
        assert_eq!(resolved(b"QUIT"), Some("QUIT"));
        assert_eq!(resolved(b"QUIT "), None);
        assert_eq!(resolved(b"QUITS"), None);
    }

    #[test]
    fn test_command_names() {
        assert_eq!(
            CommandRegistry::new().command_names(),
            vec!["GET", "SET", "DEL", "INCR", "QUIT"]
        );
    }
}
