//! crates/logtree/src/clock.rs
//! Ambient time values stamped on every record.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::record::Value;

/// Supplies the value stored under [`TIME_KEY`](crate::record::TIME_KEY) when a
/// record is built. Invoked once per record that passes the level filter.
pub trait Clock: Send + Sync {
    /// Returns the current time as a record value.
    fn now(&self) -> Value;
}

/// Wall clock rendering UTC timestamps in RFC 3339 with nanoseconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Value {
        let now = OffsetDateTime::now_utc();
        match now.format(&Rfc3339) {
            Ok(text) => Value::Str(text),
            Err(_) => Value::Int(now.unix_timestamp()),
        }
    }
}

/// Clock that always reports the same value; useful for reproducible output.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedClock(Value);

impl FixedClock {
    /// Creates a clock reporting `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Value {
        self.0.clone()
    }
}
