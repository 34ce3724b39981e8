//! Routes `tracing` events from the cropper to the browser console.
//!
//! Nothing is printed until the page calls [`init_logging`]. Events at
//! `ERROR`, `WARN` and `INFO` go to the matching console method; `DEBUG` and
//! `TRACE` go to `console.debug`.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::console;

type Sink = Arc<dyn Fn(Level, &str) + Send + Sync>;

/// Install the console layer as the global subscriber.
///
/// `max_level` is one of `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`
/// (default `"warn"`). Returns `false` if a subscriber was already installed.
///
/// ```typescript
/// init_logging("debug");
/// ```
#[wasm_bindgen]
pub fn init_logging(max_level: Option<String>) -> bool {
    let level = parse_level(max_level.as_deref());
    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(level));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

fn parse_level(value: Option<&str>) -> Level {
    value
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::WARN)
}

/// Extracts message and structured fields from a tracing event.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}

/// `[LEVEL target] message key=value ...`
fn format_line(level: Level, target: &str, visitor: EventVisitor) -> String {
    let mut line = format!("[{} {}] {}", level, target, visitor.message.unwrap_or_default());
    for (key, value) in visitor.fields {
        let _ = write!(line, " {}={}", key, value);
    }
    line
}

fn console_sink(level: Level, line: &str) {
    let value = JsValue::from_str(line);
    if level == Level::ERROR {
        console::error_1(&value);
    } else if level == Level::WARN {
        console::warn_1(&value);
    } else if level == Level::INFO {
        console::info_1(&value);
    } else {
        console::debug_1(&value);
    }
}

/// Layer that formats each event as one line and hands it to a sink.
pub struct ConsoleLayer {
    max_level: Level,
    sink: Sink,
}

impl ConsoleLayer {
    pub fn new(max_level: Level) -> Self {
        Self::with_sink(max_level, Arc::new(console_sink))
    }

    fn with_sink(max_level: Level, sink: Sink) -> Self {
        Self { max_level, sink }
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering: TRACE is the most verbose and compares greatest
        if *metadata.level() > self.max_level {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let line = format_line(*metadata.level(), metadata.target(), visitor);
        (self.sink)(*metadata.level(), &line);
    }
}
