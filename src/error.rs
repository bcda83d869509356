use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Malformed lattice text. `line` is 1-based.
    #[error("bad lattice format at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("unknown output class: {class}")]
    UnknownOutputClass { class: String },
    #[error("segment label {label} does not fit in 16 bits")]
    SegmentOverflow { label: u32 },
    #[error(
        "decoder returned mismatched arrays: {inputs} inputs, {outputs} outputs, {costs} costs"
    )]
    DecoderContract {
        inputs: usize,
        outputs: usize,
        costs: usize,
    },
    #[error("unknown {kind} component '{name}'")]
    UnknownComponent { kind: &'static str, name: String },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("invalid state: {message}")]
    InvalidState { message: String },
}

impl LatticeError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unknown_class(class: impl Into<String>) -> Self {
        Self::UnknownOutputClass {
            class: class.into(),
        }
    }

    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}
