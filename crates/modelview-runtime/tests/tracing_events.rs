//! Lifecycle diagnostics emitted through `tracing`.

#![forbid(unsafe_code)]

use std::fmt::Debug;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use modelview_core::{ModelsMap, Props, Record};
use modelview_runtime::{ConnectOptions, Connector, component_fn};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Debug)]
struct Captured {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

impl Captured {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        let text = format!("{value:?}");
        if field.name() == "message" {
            self.message = text;
        } else {
            self.fields.push((field.name().to_owned(), text));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.push((field.name().to_owned(), value.to_owned()));
        }
    }
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureLayer {
    fn events(&self) -> Vec<Captured> {
        self.events.lock().expect("capture lock").clone()
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().expect("capture lock").push(Captured {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Captured>) {
    let layer = CaptureLayer::default();
    let subscriber = Registry::default().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, layer.events())
}

fn view() -> impl modelview_runtime::Component<Output = Props> {
    component_fn(|p: &Props| p.clone()).named("Counter")
}

#[test]
fn mount_and_teardown_are_logged_at_debug() {
    let record = Rc::new(Record::new());
    let ((), events) = capture(|| {
        let instance = Connector::with_options(ConnectOptions::new().events("r", ["change"]))
            .wrap(view())
            .mount_with_models(ModelsMap::new().with("r", record.clone()))
            .expect("mount");
        instance.unmount();
    });

    let mounted = events
        .iter()
        .find(|e| e.message == "connected component mounted")
        .expect("mount event");
    assert_eq!(mounted.level, Level::DEBUG);
    assert_eq!(mounted.field("component"), Some("connect(Counter)"));
    assert_eq!(mounted.field("subscriptions"), Some("1"));

    let torn = events
        .iter()
        .find(|e| e.message == "connected component torn down")
        .expect("teardown event");
    assert_eq!(torn.level, Level::DEBUG);
    assert_eq!(torn.field("released"), Some("1"));
    assert_eq!(torn.field("cancelled_pending"), Some("false"));
}

#[test]
fn missing_models_map_warns() {
    let (instance, events) = capture(|| {
        Connector::default()
            .wrap(view())
            .mount(None, None)
            .expect("mount")
    });
    assert!(instance.models().is_empty());

    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("warning");
    assert!(warning.message.contains("no models map"));
    assert_eq!(warning.field("component"), Some("connect(Counter)"));
}

#[test]
fn reprojection_is_traced() {
    let record = Rc::new(Record::new());
    let instance = Connector::with_options(ConnectOptions::new().events("r", ["change"]))
        .wrap(view())
        .mount_with_models(ModelsMap::new().with("r", record.clone()))
        .expect("mount");

    let (_, events) = capture(|| record.set("n", 1));
    let traced: Vec<_> = events
        .iter()
        .filter(|e| e.message == "re-projected")
        .collect();
    assert_eq!(traced.len(), 1);
    assert_eq!(traced[0].level, Level::TRACE);
    assert_eq!(traced[0].field("version"), Some("1"));
    assert_eq!(
        traced[0].field("listener"),
        Some(instance.listener_id().get().to_string().as_str())
    );
}
