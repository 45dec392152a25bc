//! Compiler configuration.

use snex_core::OverloadPolicy;

/// Settings shared by every compilation run against one
/// [`GlobalScope`](crate::GlobalScope).
///
/// ```
/// use snex_core::OverloadPolicy;
/// use snex_jit::CompilerConfig;
///
/// let config = CompilerConfig::new()
///     .with_root_class_capacity(64)
///     .with_overload_policy(OverloadPolicy::FirstMatch)
///     .with_optimisation_pass("ConstantFolding");
/// assert_eq!(config.root_class_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Number of variable slots of every class data table.
    pub root_class_capacity: usize,
    pub overload_policy: OverloadPolicy,
    /// Identifiers of the optimisation passes handed to the backend.
    pub optimisation_passes: Vec<String>,
    /// Track breakpoint entries and log every compilation phase.
    pub debug_mode: bool,
}

impl CompilerConfig {
    pub const DEFAULT_ROOT_CLASS_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self {
            root_class_capacity: Self::DEFAULT_ROOT_CLASS_CAPACITY,
            overload_policy: OverloadPolicy::Strict,
            optimisation_passes: Vec::new(),
            debug_mode: false,
        }
    }

    pub fn with_root_class_capacity(mut self, capacity: usize) -> Self {
        self.root_class_capacity = capacity;
        self
    }

    pub fn with_overload_policy(mut self, policy: OverloadPolicy) -> Self {
        self.overload_policy = policy;
        self
    }

    pub fn with_optimisation_pass<S: Into<String>>(mut self, pass: S) -> Self {
        self.optimisation_passes.push(pass.into());
        self
    }

    pub fn with_optimisation_passes<I, S>(mut self, passes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optimisation_passes
            .extend(passes.into_iter().map(Into::into));
        self
    }

    pub fn with_debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.root_class_capacity, 1024);
        assert_eq!(config.overload_policy, OverloadPolicy::Strict);
        assert!(config.optimisation_passes.is_empty());
        assert!(!config.debug_mode);
    }

    #[test]
    fn builder() {
        let config = CompilerConfig::new()
            .with_optimisation_passes(["Inline", "DeadCode"])
            .with_optimisation_pass("LoopOpt")
            .with_debug_mode(true);
        assert_eq!(config.optimisation_passes, vec!["Inline", "DeadCode", "LoopOpt"]);
        assert!(config.debug_mode);
    }
}
