//! crates/logtree/src/macros.rs
//! Call-site capture and record construction macros.

/// Captures the current call site.
///
/// Each expansion owns a distinct static [`SiteInfo`](crate::SiteInfo), so
/// the returned [`CallSite`](crate::CallSite) has an identity that is stable
/// for the life of the process. The qualified name is the enclosing module
/// path in package-path form followed by `.`, then the function name when one
/// is given.
///
/// ```
/// let site = logtree::callsite!("connect");
/// let name = site.info().map(|info| info.qualified_name()).unwrap_or_default();
/// assert!(name.ends_with(".connect"));
/// ```
#[macro_export]
macro_rules! callsite {
    () => {{
        static __LOGTREE_SITE: $crate::SiteInfo =
            $crate::SiteInfo::new(::core::module_path!(), ::core::option::Option::None);
        $crate::CallSite::from_static(&__LOGTREE_SITE)
    }};
    ($function:literal) => {{
        static __LOGTREE_SITE: $crate::SiteInfo =
            $crate::SiteInfo::new(::core::module_path!(), ::core::option::Option::Some($function));
        $crate::CallSite::from_static(&__LOGTREE_SITE)
    }};
}

/// Builds a [`Record`](crate::Record) from `key => value` pairs.
///
/// Values go through `Into<Value>`; a later pair replaces an earlier one with
/// the same key.
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($key, $value); )+
        record
    }};
}

/// Logs `key => value` pairs through a logger at an explicit level, capturing
/// the call site. Evaluates to whether the record passed the level filter.
///
/// Field expressions are evaluated before the filter runs; wrap expensive ones
/// in a [`LazyValue`](crate::LazyValue).
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log($level, $crate::callsite!(), &$crate::record! { $($key => $value),* })
    };
}

/// Logs at [`Level::DEBUG`](crate::Level::DEBUG); see [`log!`](crate::log!).
#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::DEBUG $(, $key => $value)*)
    };
}

/// Logs at [`Level::INFO`](crate::Level::INFO); see [`log!`](crate::log!).
#[macro_export]
macro_rules! info {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::INFO $(, $key => $value)*)
    };
}

/// Logs at [`Level::WARN`](crate::Level::WARN); see [`log!`](crate::log!).
#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::WARN $(, $key => $value)*)
    };
}

/// Logs at [`Level::ERROR`](crate::Level::ERROR); see [`log!`](crate::log!).
#[macro_export]
macro_rules! error {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::ERROR $(, $key => $value)*)
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{FixedClock, Level, Logger, MemoryRoute, Value};

    #[test]
    fn callsite_names_the_enclosing_module() {
        let site = crate::callsite!("connect");
        let info = site.info().expect("static site");
        assert_eq!(info.module_path(), module_path!());
        assert_eq!(info.qualified_name(), "logtree/macros/tests.connect");
    }

    #[test]
    fn each_expansion_is_a_distinct_site() {
        let a = crate::callsite!();
        let b = crate::callsite!();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn same_expansion_keeps_its_identity() {
        let ids: Vec<_> = (0..3).map(|_| crate::callsite!().id()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn record_macro_keeps_last_value_for_duplicate_keys() {
        let record = crate::record! { "k" => 1, "k" => 2, };
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("k"), Some(&Value::Int(2)));
    }

    #[test]
    fn level_macros_log_through_the_logger() {
        let sink = Arc::new(MemoryRoute::new());
        let root = Logger::root(FixedClock::new("now"), sink.clone());

        assert!(crate::info!(root, "msg" => "hi"));
        assert!(!crate::debug!(root, "msg" => "dropped"));
        assert!(crate::log!(root, Level::ERROR));

        let records = sink.drain();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("msg"), Some(&Value::from("hi")));
        assert_eq!(records[1].level(), Some(Level::ERROR));
    }
}
