use super::Runtime;

/// Number of tasks polled per tick when not configured.
const DEFAULT_TICK_BUDGET: usize = 64;

/// Runtime parameters collected by [`RuntimeBuilder`].
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Ready tasks polled before timers are checked again.
    pub(crate) tick_budget: usize,

    /// Whether `block_on` gives up when nothing can make progress.
    pub(crate) stall_detection: bool,
}

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .tick_budget(32)
///     .build();
/// ```
pub struct RuntimeBuilder {
    config: Config,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// By default, 64 tasks are polled per tick and stall detection is on.
    pub fn new() -> Self {
        Self {
            config: Config {
                tick_budget: DEFAULT_TICK_BUDGET,
                stall_detection: true,
            },
        }
    }

    /// Sets how many ready tasks are polled before due timers are fired.
    ///
    /// Lower values make timers more punctual under load; higher values
    /// favour throughput.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn tick_budget(mut self, n: usize) -> Self {
        assert!(n > 0, "tick_budget must be > 0");

        self.config.tick_budget = n;
        self
    }

    /// Enables or disables stall detection.
    ///
    /// With stall detection on, [`Runtime::block_on`] panics (and
    /// [`Runtime::try_block_on`] returns an error) when no task is ready,
    /// no timer is armed and the future has not completed. Turn it off if
    /// tasks are woken from other threads; the runtime then parks until
    /// such a wake-up arrives.
    pub fn stall_detection(mut self, enabled: bool) -> Self {
        self.config.stall_detection = enabled;
        self
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Runtime {
        Runtime::new(self.config)
    }
}

impl Default for RuntimeBuilder {
    /// Creates a default `RuntimeBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
