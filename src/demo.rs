//! Sample services wired through the registry, driven by `taskbind demo`

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

use crate::binding::{BindingDecl, BindingKey};
use crate::executor::{Dispatcher, ExecuteOptions};
use crate::task::{AnyError, Handle, TaskError};

pub const SERVICE: &str = "orders";

/// Order intake; owns the handlers bound under `orders`
#[derive(Debug, Default)]
pub struct OrderService {
    created: AtomicU64,
}

impl OrderService {
    pub fn create(&self) -> u64 {
        self.created.fetch_add(1, Ordering::SeqCst);
        42
    }

    pub fn lookup(&self, id: u64) -> Result<u64, AnyError> {
        if id == 0 {
            return Err("order id must be positive".into());
        }
        Ok(id)
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }
}

/// Audit trail; also listens on `orders` `create`
#[derive(Debug, Default)]
pub struct AuditService;

impl AuditService {
    pub fn record_create(&self) -> u64 {
        7
    }
}

pub fn create_key() -> BindingKey {
    BindingKey::new(SERVICE, "", "create")
}

pub fn lookup_key() -> BindingKey {
    BindingKey::new(SERVICE, "", "lookup")
}

pub fn export_key() -> BindingKey {
    BindingKey::new(SERVICE, "reports", "export")
}

/// Register the sample handlers on `dispatcher`'s registry
pub fn install(
    dispatcher: &Dispatcher,
    orders: &Arc<OrderService>,
    audit: &Arc<AuditService>,
    export_delay: Duration,
) {
    let registry = dispatcher.registry();

    registry.register_binding(
        BindingDecl::service(SERVICE)
            .handler("create", Handle::method(orders, "create", OrderService::create))
            .handler("create", Handle::method(audit, "record_create", AuditService::record_create))
            .handler("lookup", Handle::try_method(orders, "lookup", OrderService::lookup)),
    );

    registry.register_binding(BindingDecl::service(SERVICE).module("reports").handler(
        "export",
        Handle::function("export", move || {
            std::thread::sleep(export_delay);
            "exported"
        }),
    ));

    info!(
        keys = registry.len(),
        handles = registry.handle_count(),
        "Demo handlers registered"
    );
}

/// Outcome summary printed by the CLI
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub lookup: serde_json::Value,
    pub lookup_error: String,
    pub create_values: Vec<serde_json::Value>,
    pub export: Vec<String>,
}

/// Exercise exactly-one and fan-out dispatch against the installed handlers
pub async fn run(dispatcher: &Dispatcher, timeout: Option<Duration>) -> Result<DemoReport, TaskError> {
    let lookup = dispatcher.execute_one(&lookup_key(), crate::args![17])?;

    let lookup_error = match dispatcher.execute_one(&create_key(), vec![]) {
        Ok(value) => format!("unexpected single result {value}"),
        Err(e) => e.to_string(),
    };

    let mut create_values: Vec<_> = dispatcher
        .execute_all(&create_key(), vec![])
        .await?
        .into_iter()
        .filter_map(|result| result.value().cloned())
        .collect();
    create_values.sort_by_key(|value| value.as_u64());

    let options = ExecuteOptions::builder().maybe_timeout(timeout).build();
    let export = dispatcher
        .execute_all_with(&export_key(), vec![], options)
        .await?
        .into_iter()
        .map(|result| match result.error() {
            Some(e) => format!("{}: {e}", result.handle()),
            None => format!("{}: ok in {:?}", result.handle(), result.elapsed()),
        })
        .collect();

    Ok(DemoReport {
        lookup,
        lookup_error,
        create_values,
        export,
    })
}
