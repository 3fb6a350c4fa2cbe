//! Error macros for shallowize

/// Macro for returning a usage error
#[macro_export]
macro_rules! bail_usage {
    ($msg:expr) => {
        return Err($crate::error::ShallowizeError::UsageError($msg.to_string()))
    };
}

/// Macro for returning a compaction error for a failed step
#[macro_export]
macro_rules! bail_compaction {
    ($step:expr, $output:expr, $reason:expr) => {
        return Err($crate::error::ShallowizeError::compaction(
            $step, $output, $reason,
        ))
    };
}
