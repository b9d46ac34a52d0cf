//! Errors raised while loading or applying the evaluation network.

/// Everything that can go wrong between an archive on disk and a score.
///
/// Shape and archive problems surface at load time; the only call-time error
/// is a wrongly sized input.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Weight, bias or inter-layer dimensions disagree.
    #[error("shape mismatch in layer `{layer}`: {reason}")]
    ShapeMismatch { layer: String, reason: String },

    /// A required named array is absent from the archive.
    #[error("archive entry `{name}` is missing")]
    MissingArchiveEntry { name: String },

    /// A caller-supplied sequence has the wrong length.
    #[error("expected {expected} values, found {found}")]
    InputLengthMismatch { expected: usize, found: usize },

    /// The array is not made of 4-byte floats.
    #[error("array `{name}` has element type `{descr}`, expected 4-byte floats")]
    UnsupportedElementWidth { name: String, descr: String },

    /// The array bytes could not be decoded.
    #[error("malformed array `{name}`: {reason}")]
    MalformedArray { name: String, reason: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("zip container error: {source}")]
    Zip {
        #[from]
        source: zip::result::ZipError,
    },
}

impl EvalError {
    pub(crate) fn shape(layer: &str, reason: impl Into<String>) -> Self {
        EvalError::ShapeMismatch { layer: layer.to_string(), reason: reason.into() }
    }

    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        EvalError::MalformedArray { name: name.to_string(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::EvalError;

    #[test]
    fn display() {
        let err = EvalError::shape("global", "14 weight columns but 15 biases");
        assert_eq!(
            err.to_string(),
            "shape mismatch in layer `global`: 14 weight columns but 15 biases"
        );
        let err = EvalError::InputLengthMismatch { expected: 323, found: 322 };
        assert_eq!(err.to_string(), "expected 323 values, found 322");
    }

    #[test]
    fn io_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(EvalError::from(io), EvalError::Io { .. }));
    }
}
