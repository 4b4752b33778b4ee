/// Per-composition settings carried by every [`Builder`](super::Builder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Fail with `UnusedArgument` when an enumerable argument source holds a
    /// key that no placeholder referenced.
    pub validate_unused: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            validate_unused: true,
        }
    }
}

impl ComposeOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with every validation turned off.
    pub fn lenient() -> Self {
        Self {
            validate_unused: false,
        }
    }

    /// Enable or disable unused-argument validation.
    pub fn validate_unused(mut self, enabled: bool) -> Self {
        self.validate_unused = enabled;
        self
    }
}
