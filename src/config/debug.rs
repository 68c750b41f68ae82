//! Debugging feature flags.

pub struct LogFlags {
    /// Activate trace_time macro (for scope-level timing)
    pub log_performance: bool,

    /// Every request/response pair going through the backend client.
    pub log_backend_requests: bool,

    /// Engine state transitions (Idle/Fetching/Settled/Failed).
    pub log_engine_core: bool,

    /// Debounce scheduling and generation bookkeeping for instrument switches.
    pub log_debounce: bool,
}

pub const DF: LogFlags = LogFlags {
    log_performance: false,
    log_backend_requests: false,
    log_engine_core: true,
    log_debounce: false,
};
