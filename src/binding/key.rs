use serde::{Deserialize, Serialize};
use std::fmt;

pub const KEY_PREFIX: &str = "Task:";
pub const SEGMENT_SEPARATOR: char = '-';

/// Composite (service, module, function) address of a registry slot
///
/// Empty module/function segments are stored as absent, so `""` and `None`
/// address the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingKey {
    service: String,
    module: Option<String>,
    function: Option<String>,
}

impl BindingKey {
    /// Build a key; empty `module` or `function` means the segment is absent
    pub fn new(service: &str, module: &str, function: &str) -> Self {
        Self::service(service).with_module(module).with_function(function)
    }

    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            module: None,
            function: None,
        }
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.module = non_empty(module);
        self
    }

    pub fn with_function(mut self, function: &str) -> Self {
        self.function = non_empty(function);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Single comparable string used as the registry slot.
    ///
    /// Segments are joined with `-` unescaped: a segment that itself contains
    /// `-` can collide with a different triple, e.g. `("a-b", "c", "")` and
    /// `("a", "b-c", "")` share `Task:a-b-c-`.
    pub fn canonical(&self) -> String {
        format!(
            "{KEY_PREFIX}{}{SEGMENT_SEPARATOR}{}{SEGMENT_SEPARATOR}{}",
            self.service,
            self.module().unwrap_or(""),
            self.function().unwrap_or(""),
        )
    }

    /// Whether any segment contains the separator and may collide
    pub fn is_ambiguous(&self) -> bool {
        [Some(self.service.as_str()), self.module(), self.function()]
            .into_iter()
            .flatten()
            .any(|segment| segment.contains(SEGMENT_SEPARATOR))
    }
}

fn non_empty(segment: &str) -> Option<String> {
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{service={},module={},function={}}}",
            self.service,
            self.module().unwrap_or(""),
            self.function().unwrap_or(""),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form() {
        let key = BindingKey::new("orders", "", "create");
        assert_eq!(key.canonical(), "Task:orders--create");

        let key = BindingKey::new("orders", "billing", "refund");
        assert_eq!(key.canonical(), "Task:orders-billing-refund");

        assert_eq!(BindingKey::service("orders").canonical(), "Task:orders--");
    }

    #[test]
    fn test_segments_from_owned_strings() {
        let (service, module, function) = (
            "orders".to_string(),
            "billing".to_string(),
            String::new(),
        );
        let key = BindingKey::new(&service, &module, &function);

        assert_eq!(key.service_name(), "orders");
        assert_eq!(key.module(), Some("billing"));
        assert_eq!(key.function(), None);
    }

    #[test]
    fn test_empty_and_absent_are_equal() {
        let explicit = BindingKey::new("orders", "", "");
        let absent = BindingKey::service("orders");
        assert_eq!(explicit, absent);
        assert_eq!(explicit.canonical(), absent.canonical());
    }

    #[test]
    fn test_separator_collision_is_detectable() {
        let left = BindingKey::new("a-b", "c", "");
        let right = BindingKey::new("a", "b-c", "");

        assert_ne!(left, right);
        assert_eq!(left.canonical(), right.canonical());
        assert!(left.is_ambiguous());
        assert!(right.is_ambiguous());
        assert!(!BindingKey::new("a", "b", "c").is_ambiguous());
    }
}
