// SPDX-License-Identifier: (MIT OR Apache-2.0)

/// Layout and naming knobs for a [`Code`](crate::Code) buffer.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Spaces per block level.
    pub indent_width: usize,
    /// Line written into a block that received no lines.
    pub placeholder: String,
    /// Label reported in compile errors and tracebacks.
    pub label: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            placeholder: "pass".to_string(),
            label: "<codegen>".to_string(),
        }
    }
}
