use super::key::BindingKey;
use crate::task::Handle;

/// Service/module binding with the handlers declared under it
///
/// Mirrors how discovery code groups registrations: service and module are
/// declared once for a component, each handler adds its function segment.
/// A handler bound with [`BindingDecl::bind`] has no function segment.
#[derive(Debug, Clone)]
pub struct BindingDecl {
    service: String,
    module: String,
    handlers: Vec<(String, Handle)>,
}

impl BindingDecl {
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            module: String::new(),
            handlers: Vec::new(),
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Bind `handle` under this service/module and `function`
    pub fn handler(mut self, function: impl Into<String>, handle: Handle) -> Self {
        self.handlers.push((function.into(), handle));
        self
    }

    /// Bind `handle` directly under this service/module
    pub fn bind(self, handle: Handle) -> Self {
        self.handler("", handle)
    }

    pub fn keys(&self) -> impl Iterator<Item = BindingKey> + '_ {
        self.handlers
            .iter()
            .map(move |(function, _)| BindingKey::new(self.service.as_str(), &self.module, function))
    }

    pub(crate) fn into_bindings(self) -> impl Iterator<Item = (BindingKey, Handle)> {
        let Self {
            service,
            module,
            handlers,
        } = self;
        handlers.into_iter().map(move |(function, handle)| {
            (BindingKey::new(service.as_str(), &module, &function), handle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Registry;

    #[test]
    fn test_decl_expands_to_keys() {
        let decl = BindingDecl::service("orders")
            .module("billing")
            .handler("charge", Handle::function("charge", |amount: u64| amount))
            .handler("refund", Handle::function("refund", |amount: u64| amount))
            .bind(Handle::function("billing_entry", || "ok"));

        let keys: Vec<String> = decl.keys().map(|key| key.canonical()).collect();
        assert_eq!(
            keys,
            vec![
                "Task:orders-billing-charge",
                "Task:orders-billing-refund",
                "Task:orders-billing-",
            ]
        );
    }

    #[test]
    fn test_register_binding() {
        let registry = Registry::new();
        let decl = BindingDecl::service("orders")
            .handler("create", Handle::function("create", || 42))
            .handler("cancel", Handle::function("cancel", |_id: u64| true));

        let handles = registry.register_binding(decl);

        assert_eq!(handles.len(), 2);
        assert!(registry.contains(&BindingKey::new("orders", "", "create")));
        assert!(registry.contains(&BindingKey::new("orders", "", "cancel")));
    }
}
