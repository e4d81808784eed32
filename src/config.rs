/// Options threaded through every translation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspileConfig {
    /// Target the Unity 2.6 era built-ins (`glstate.matrix.mvp`, `POSITION`)
    /// instead of the `UNITY_MATRIX_*` macros and `SV_POSITION`.
    pub legacy: bool,
    /// Number of tabs each spliced line is indented by.
    pub indent_depth: usize,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        Self {
            legacy: false,
            indent_depth: 3,
        }
    }
}
