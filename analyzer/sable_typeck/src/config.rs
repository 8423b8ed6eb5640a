//! Analysis toggles read by the checker

/// Flags changing how strictly code is checked. Build one with
/// [`AnalysisConfig::default`] and adjust fields as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalysisConfig {
    /// Whether docblock types override signature types when both exist
    pub use_docblock_types: bool,
    /// Whether a `string` offset on an `array<int, T>` is only a coercion
    pub allow_scalar_array_key_coercion: bool,
    /// Whether no-argument method calls are tracked like variables, so that
    /// narrowing `$a->foo()` survives to the next identical call
    pub memoize_method_calls: bool,
    /// Whether undefined variables are reported. When off, they are `mixed`.
    pub check_variables: bool,
    /// Whether property types narrowed by assignment survive a method call on
    /// the same object
    pub remember_property_assignments_after_call: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_docblock_types: true,
            allow_scalar_array_key_coercion: true,
            memoize_method_calls: false,
            check_variables: true,
            remember_property_assignments_after_call: true,
        }
    }
}
