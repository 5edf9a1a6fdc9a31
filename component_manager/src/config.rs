//! Manager configuration

use core_types::ManagerId;
use platform_api::MessagingError;
use serde::{Deserialize, Serialize};

/// Configuration of one component manager
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "manager_id": 2, "inbox_capacity": 1024 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Id of this manager
    pub manager_id: ManagerId,
    /// Id of the manager that places requested components
    pub initial_manager: ManagerId,
    /// Maximum number of queued messages; unbounded if unset
    pub inbox_capacity: Option<usize>,
    /// Maximum number of messages dispatched per slice; unbounded if unset
    pub max_slice_messages: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            manager_id: ManagerId::INITIAL,
            initial_manager: ManagerId::INITIAL,
            inbox_capacity: None,
            max_slice_messages: None,
        }
    }
}

impl ManagerConfig {
    /// Creates a configuration for `manager_id`
    pub fn new(manager_id: ManagerId) -> Self {
        Self {
            manager_id,
            ..Self::default()
        }
    }

    pub fn with_initial_manager(mut self, initial_manager: ManagerId) -> Self {
        self.initial_manager = initial_manager;
        self
    }

    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = Some(capacity);
        self
    }

    pub fn with_max_slice_messages(mut self, max: usize) -> Self {
        self.max_slice_messages = Some(max);
        self
    }

    /// Checks if this manager places requested components
    pub fn is_initial(&self) -> bool {
        self.manager_id == self.initial_manager
    }

    /// Parses a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, MessagingError> {
        serde_json::from_str(json).map_err(|err| MessagingError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_initial() {
        let config = ManagerConfig::default();
        assert!(config.is_initial());
        assert_eq!(config.inbox_capacity, None);
    }

    #[test]
    fn test_builders() {
        let config = ManagerConfig::new(ManagerId::new(3))
            .with_inbox_capacity(8)
            .with_max_slice_messages(2);
        assert!(!config.is_initial());
        assert_eq!(config.initial_manager, ManagerId::INITIAL);
        assert_eq!(config.inbox_capacity, Some(8));
        assert_eq!(config.max_slice_messages, Some(2));
    }

    #[test]
    fn test_from_partial_json() {
        let config = ManagerConfig::from_json(r#"{ "manager_id": 2, "inbox_capacity": 16 }"#).unwrap();
        assert_eq!(config.manager_id, ManagerId::new(2));
        assert_eq!(config.initial_manager, ManagerId::INITIAL);
        assert_eq!(config.inbox_capacity, Some(16));
    }

    #[test]
    fn test_from_invalid_json() {
        assert!(matches!(
            ManagerConfig::from_json("{ manager_id: "),
            Err(MessagingError::Config(_))
        ));
    }
}
