/*!

Logging with customizable verbosity thresholds. The log level (critical, error, warning, info,
debug, trace) describes what _kind_ of message is logged; the numeric threshold describes its
_verbosity_. A message is emitted iff its threshold is at most the global logging threshold, so
threshold 0 messages are always emitted. The global threshold (default 3) is adjusted at runtime
with [`set_global_logging_threshold`].

Syntax of the macros:

```ignore
// With threshold
info!(2, "matched {} patterns", count);

// Without threshold (threshold 0, always emitted)
warning!("unexpected shape: {}", pattern);
```

The backing implementation is the `tracing` crate. The subscriber is installed lazily the first
time a macro fires; no explicit initialization is required. The global threshold is an atomic,
so the logging interface is thread safe even though the matchers themselves are single-threaded.

*/

mod macros;

use std::{
  fmt::{Debug, Write as _},
  sync::atomic::{AtomicU8, Ordering},
};

use once_cell::sync::Lazy;
use tracing::{
  field::{Field, Visit},
  Event,
  Subscriber,
};
use tracing_subscriber::{
  field::RecordFields,
  fmt::{format::Writer, FormatFields},
  layer::{Context, SubscriberExt},
  registry::LookupSpan,
  Layer,
  Registry,
};

pub use crate::{critical, debug, error, info, trace, warning};

static GLOBAL_LOGGING_THRESHOLD: AtomicU8 = AtomicU8::new(3);

/// Sets the global threshold. Messages logged at a greater threshold are not emitted.
pub fn set_global_logging_threshold(new_threshold: u8) {
  GLOBAL_LOGGING_THRESHOLD.store(new_threshold, Ordering::SeqCst);
}

/// Retrieves the global threshold.
pub fn get_global_logging_threshold() -> u8 {
  GLOBAL_LOGGING_THRESHOLD.load(Ordering::SeqCst)
}

/// Used for implicit initialization.
static INIT_LOGGER: Lazy<()> = Lazy::new(|| {
  let subscriber = Registry::default().with(ThresholdFilterLayer).with(
    tracing_subscriber::fmt::layer()
        .fmt_fields(FieldFormatter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stdout),
  );

  // A failure here means the host installed its own subscriber first; defer to it.
  let _ = tracing::subscriber::set_global_default(subscriber);
});

/// Does not need to be called directly; the logging macros call it on every use.
pub fn init_logger() {
  Lazy::force(&INIT_LOGGER);
}

/// A layer that drops events logged at a threshold above the global logging threshold. This
/// baroque machinery is how the `tracing` crate does things: the threshold travels as an event
/// field and is fished back out with a visitor.
struct ThresholdFilterLayer;

impl<S> Layer<S> for ThresholdFilterLayer
where
  S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
  fn event_enabled(&self, event: &Event<'_>, _ctx: Context<'_, S>) -> bool {
    let mut visitor = ThresholdVisitor { threshold: None };
    event.record(&mut visitor);
    match visitor.threshold {
      Some(threshold) => threshold <= get_global_logging_threshold(),
      // No threshold field; treat as threshold 0 and emit.
      None => true,
    }
  }
}

struct ThresholdVisitor {
  threshold: Option<u8>,
}

impl Visit for ThresholdVisitor {
  fn record_u64(&mut self, field: &Field, value: u64) {
    if field.name() == "threshold" && value <= u8::MAX as u64 {
      self.threshold = Some(value as u8);
    }
  }

  fn record_i64(&mut self, field: &Field, value: i64) {
    if value >= 0 {
      self.record_u64(field, value as u64);
    }
  }

  fn record_debug(&mut self, _field: &Field, _value: &dyn Debug) {}
}

/// Renders event fields, hiding the internal `threshold` field and turning the `critical` flag
/// into a `[CRITICAL]` prefix.
struct FieldFormatter;

impl<'writer> FormatFields<'writer> for FieldFormatter {
  fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> std::fmt::Result {
    let mut visitor = FieldVisitor { writer };
    fields.record(&mut visitor);
    Ok(())
  }
}

struct FieldVisitor<'writer> {
  writer: Writer<'writer>,
}

impl<'writer> Visit for FieldVisitor<'writer> {
  fn record_bool(&mut self, field: &Field, value: bool) {
    if field.name() == "critical" {
      if value {
        let _ = write!(self.writer, "[CRITICAL] ");
      }
    } else {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_i64(&mut self, field: &Field, value: i64) {
    if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
    if field.name() == "message" {
      let _ = write!(self.writer, "{:?}", value);
    } else if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={:?} ", field.name(), value);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threshold_round_trips() {
    set_global_logging_threshold(3);
    assert_eq!(get_global_logging_threshold(), 3);

    // Emitted: threshold 2 <= 3.
    info!(2, "processing {} operands", 42);
    // Not emitted: threshold 4 > 3.
    debug!(4, "suppressed");
    // Default threshold 0 is always emitted.
    warning!("an unexpected condition occurred");

    set_global_logging_threshold(5);
    assert_eq!(get_global_logging_threshold(), 5);
    // Now emitted.
    debug!(4, "no longer suppressed");
  }
}
