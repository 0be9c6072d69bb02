//! Logging setup.
//!
//! The library only emits `tracing` events. Hosts pick how they surface:
//!
//! - [`init`]: plain fmt subscriber on stderr for native hosts and tooling.
//! - [`init_with_console`]: forwards events to a host console callback
//!   (the browser's `console.log` in the extension), prefixed with
//!   [`LOG_PREFIX`] and with structured fields appended.
//!
//! Both honour `RUST_LOG` and fall back to the given default directive.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::Level;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub const LOG_PREFIX: &str = "[BetterCodex]";

/// Severity handed to a console sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Error,
    Warn,
    Info,
    Debug,
}

type ConsoleSink = Arc<dyn Fn(ConsoleLevel, String) + Send + Sync>;

/// A tracing layer that renders each event as one prefixed line and hands
/// it to the host console.
pub struct ConsoleLayer {
    sink: ConsoleSink,
}

impl ConsoleLayer {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(ConsoleLevel, String) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }
}

/// Collects the message and `key=value` pairs of an event.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        let _ = write!(self.fields, " {name}={value}");
    }

    fn into_line(self) -> String {
        format!("{LOG_PREFIX} {}{}", self.message, self.fields)
    }
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let level = match *event.metadata().level() {
            Level::ERROR => ConsoleLevel::Error,
            Level::WARN => ConsoleLevel::Warn,
            Level::INFO => ConsoleLevel::Info,
            Level::DEBUG => ConsoleLevel::Debug,
            Level::TRACE => return,
        };
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        (self.sink)(level, visitor.into_line());
    }
}

fn env_filter(default_directive: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive)
            .with_context(|| format!("invalid log directive {default_directive:?}")),
    }
}

/// Install a stderr fmt subscriber as the global default.
pub fn init(default_directive: &str) -> Result<()> {
    let filter = env_filter(default_directive)?;
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Install a [`ConsoleLayer`] feeding `sink` as the global default.
pub fn init_with_console<F>(default_directive: &str, sink: F) -> Result<()>
where
    F: Fn(ConsoleLevel, String) + Send + Sync + 'static,
{
    let filter = env_filter(default_directive)?;
    Registry::default()
        .with(ConsoleLayer::new(sink).with_filter(filter))
        .try_init()
        .context("installing console subscriber")
}
