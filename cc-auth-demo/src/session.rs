//! Scripted walk through the form, the way the interactive demo page drives it.

use std::sync::Arc;

use cc_auth::bus::{NotificationBus, Subscription};
use cc_auth::config::MethodConfig;
use cc_auth::event::{ComponentEvent, Notification};
use cc_auth::method::AuthorizationMethod;
use cc_auth::settings::CcSettings;
use cc_auth::view::Navigation;
use cc_auth::CcAuthorizationMethod;
use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::generator::generate_certificates;
use crate::store::{CertificateStore, StoreError};

/// Settings key of the demo options.
pub const OPTIONS_KEY: &str = "demo.options";

/// Settings key of the last serialized form.
pub const SELECTION_KEY: &str = "demo.selection";

/// Options of the demo, persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoOptions {
    /// Offer the "none" entry.
    pub allow_none: bool,
    /// Compatibility style.
    pub compatibility: bool,
    /// Outlined style.
    pub outlined: bool,
    /// Number of certificates to generate.
    pub size: usize,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            allow_none: false,
            compatibility: false,
            outlined: false,
            size: 15,
        }
    }
}

impl DemoOptions {
    /// Apply `--allow-none`, `--compatibility`, `--outlined` and `--size=N`.
    pub fn apply_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        for arg in args {
            match arg.as_str() {
                "--allow-none" => self.allow_none = true,
                "--compatibility" => self.compatibility = true,
                "--outlined" => self.outlined = true,
                other => {
                    if let Some(size) = other.strip_prefix("--size=").and_then(|s| s.parse().ok()) {
                        self.size = size;
                    }
                }
            }
        }
        self
    }

    /// Form configuration for these options.
    pub fn method_config(&self) -> MethodConfig {
        MethodConfig::new()
            .with_none(self.allow_none)
            .with_compatibility(self.compatibility)
            .with_outlined(self.outlined)
    }
}

/// Run the scripted session.
pub async fn run(
    store: Arc<CertificateStore>,
    bus: NotificationBus,
    options: DemoOptions,
) -> Result<(), StoreError> {
    let mut method = CcAuthorizationMethod::new(Arc::clone(&store), options.method_config());
    let mut changes = method.subscribe_changes();
    let mut requests = bus.subscribe();

    method.activate(&bus);
    method.settle().await;
    print_form("Initial state", &method);

    // Generate data
    let imported = store.import(generate_certificates(options.size)).await?;
    info!("Session: generated {} certificate(s)", imported);
    bus.publish(Notification::DataImported);
    method.settle().await;
    print_form("After generating data", &method);

    if let Some(saved) = store.get_setting::<CcSettings>(SELECTION_KEY).await? {
        info!("Session: restoring {:?}", saved);
        method.restore(saved);
    }

    method.navigate(Navigation::Down);
    method.navigate(Navigation::Down);
    let settings = method.serialize();
    store.set_setting(SELECTION_KEY, &settings).await?;
    print_form("After picking a certificate", &method);
    println!("serialize() -> {}", serde_json::to_string(&settings)?);

    let selected = method
        .selected()
        .and_then(|selection| selection.certificate_id())
        .and_then(|id| method.items()?.iter().find(|item| item.id == id))
        .cloned();

    if let Some(record) = selected {
        bus.publish(Notification::CertificateUpserted {
            record: record.renamed(format!("{} (renamed)", record.name)),
            cancelable: true,
        });
        serve_requests(&store, &mut requests).await?;
        method.settle().await;
        print_form("After renaming the selected certificate", &method);

        bus.publish(Notification::CertificateDeleted {
            id: record.id.clone(),
            cancelable: true,
        });
        serve_requests(&store, &mut requests).await?;
        method.settle().await;
        print_form("After deleting the selected certificate", &method);
        println!("serialize() -> {}", serde_json::to_string(&method.serialize())?);
    }

    // Clear data
    store.destroy().await?;
    method.settle().await;
    print_form("After clearing data", &method);

    println!("Change events counter: {}", count_changes(&mut changes));
    method.deactivate();
    Ok(())
}

/// Let the store take over every queued request.
async fn serve_requests(
    store: &CertificateStore,
    requests: &mut Subscription,
) -> Result<(), StoreError> {
    while let Some(notification) = requests.try_recv() {
        store.handle_request(notification).await?;
    }
    Ok(())
}

fn count_changes(changes: &mut mpsc::UnboundedReceiver<ComponentEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = changes.try_recv() {
        if event.is_change() {
            count += 1;
        }
    }
    count
}

fn print_form(title: &str, method: &CcAuthorizationMethod) {
    info!("Session: {} ({:?})", title, method.list_state());
    println!("== {}", title);
    for line in method.render() {
        println!("   {}", line);
    }
}
