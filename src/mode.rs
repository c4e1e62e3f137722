//! Runtime mode detection
//!
//! Developers skip cassette management entirely during local iterative work
//! by exporting `VCR_MODE=local`. The lookup is behind a trait so tests can
//! pin a mode instead of mutating the process environment.

/// Name of the environment variable consulted by [`EnvMode`]
pub const MODE_VAR: &str = "VCR_MODE";

/// Mode value that turns the whole lifecycle into a no-op
pub const LOCAL_MODE: &str = "local";

/// Supplies the current run mode
pub trait ModeProvider {
    /// The active mode, if any
    fn current(&self) -> Option<String>;

    /// Whether the global "skip cassette management" override is active
    fn is_local(&self) -> bool {
        self.current().as_deref() == Some(LOCAL_MODE)
    }
}

/// Reads the mode from the process environment on every call
#[derive(Debug, Default)]
pub struct EnvMode;

impl ModeProvider for EnvMode {
    fn current(&self) -> Option<String> {
        std::env::var(MODE_VAR).ok()
    }
}

/// Always reports a preset mode; for deterministic tests
#[derive(Debug)]
pub struct FixedMode(pub Option<String>);

impl FixedMode {
    pub fn local() -> Self {
        Self(Some(LOCAL_MODE.to_string()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl ModeProvider for FixedMode {
    fn current(&self) -> Option<String> {
        self.0.clone()
    }
}
