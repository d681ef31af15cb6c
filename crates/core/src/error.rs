use crate::store::LayerKind;

/// Result alias that carries the custom [`SceneError`] type.
pub type Result<T> = std::result::Result<T, SceneError>;

/// Common error type for the core crate.
///
/// Every variant is fatal for a run: the pipeline never continues with a
/// partially assembled scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A layer name could not be resolved through the store.
    #[error("{kind} map <{name}> not found")]
    NotFound { kind: LayerKind, name: String },
    /// A numeric or color literal could not be parsed.
    #[error("invalid {what} <{value}>")]
    Parse { what: &'static str, value: String },
    /// Output format tag outside of the supported set.
    #[error("unsupported output format <{0}>")]
    UnsupportedFormat(String),
    /// The off-screen render target could not be created.
    #[error("unable to create render context: {0}")]
    RenderContext(String),
    /// Output dimensions or path rejected before rendering.
    #[error("invalid output: {0}")]
    InvalidOutput(String),
    /// Free-form message for collaborator failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Raster decoding or image encoding failure.
    #[error("{0}")]
    Image(#[from] image::ImageError),
    /// Malformed JSON in a vector layer or configuration file.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl SceneError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn not_found(kind: LayerKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn parse(what: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            what,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_kind_and_layer() {
        let err = SceneError::not_found(LayerKind::Raster, "elevation");
        assert_eq!(err.to_string(), "raster map <elevation> not found");

        let err = SceneError::not_found(LayerKind::Vector, "roads");
        assert_eq!(err.to_string(), "vector map <roads> not found");
    }

    #[test]
    fn parse_error_quotes_the_offending_input() {
        let err = SceneError::parse("color", "chartreuse-ish");
        assert!(err.to_string().contains("<chartreuse-ish>"));
    }

    #[test]
    fn io_errors_convert() {
        let err: SceneError = std::io::Error::other("boom").into();
        assert!(matches!(err, SceneError::Io(_)));
        assert!(err.to_string().contains("boom"));
    }
}
