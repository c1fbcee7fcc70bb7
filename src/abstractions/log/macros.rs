//! Macros for generating log messages.

/// Shared expansion for the level-specific macros. Not meant to be used directly.
#[macro_export]
#[doc(hidden)]
macro_rules! __log_event {
    ($level:expr, $critical:expr, $threshold:expr, $($arg:tt)+) => {
        {
            $crate::log::init_logger();
            tracing::event!(
                $level,
                critical = $critical,
                threshold = $threshold,
                message = format_args!($($arg)+)
            );
        }
    };
}

#[macro_export]
macro_rules! critical {
    ($threshold:literal, $fmt:literal $($arg:tt)*) => {
        $crate::__log_event!(tracing::Level::ERROR, true, $threshold, $fmt $($arg)*)
    };
    ($($arg:tt)+) => {
        $crate::__log_event!(tracing::Level::ERROR, true, 0u8, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($threshold:literal, $fmt:literal $($arg:tt)*) => {
        $crate::__log_event!(tracing::Level::ERROR, false, $threshold, $fmt $($arg)*)
    };
    ($($arg:tt)+) => {
        $crate::__log_event!(tracing::Level::ERROR, false, 0u8, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning {
    ($threshold:literal, $fmt:literal $($arg:tt)*) => {
        $crate::__log_event!(tracing::Level::WARN, false, $threshold, $fmt $($arg)*)
    };
    ($($arg:tt)+) => {
        $crate::__log_event!(tracing::Level::WARN, false, 0u8, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($threshold:literal, $fmt:literal $($arg:tt)*) => {
        $crate::__log_event!(tracing::Level::INFO, false, $threshold, $fmt $($arg)*)
    };
    ($($arg:tt)+) => {
        $crate::__log_event!(tracing::Level::INFO, false, 0u8, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($threshold:literal, $fmt:literal $($arg:tt)*) => {
        $crate::__log_event!(tracing::Level::DEBUG, false, $threshold, $fmt $($arg)*)
    };
    ($($arg:tt)+) => {
        $crate::__log_event!(tracing::Level::DEBUG, false, 0u8, $($arg)+)
    };
}

#[macro_export]
macro_rules! trace {
    ($threshold:literal, $fmt:literal $($arg:tt)*) => {
        $crate::__log_event!(tracing::Level::TRACE, false, $threshold, $fmt $($arg)*)
    };
    ($($arg:tt)+) => {
        $crate::__log_event!(tracing::Level::TRACE, false, 0u8, $($arg)+)
    };
}
