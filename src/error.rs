use thiserror::Error;

/// Rejected engine parameters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    /// A round constant has bits above the configured word size.
    #[error("round constant {index} ({value:#x}) does not fit in {word_bits} bits")]
    ConstantOutOfRange { index: usize, value: u64, word_bits: u32 },
}
