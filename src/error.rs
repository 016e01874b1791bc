//! The top-level error type.
//!
//! Every template-level fault carries the template name it occurred in;
//! nothing is retried and partial output is never returned — callers get a
//! complete rendered string or an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeftError {
    /// Engine setup is wrong: no dialect, conflicting dialect metadata, or
    /// a mutation attempted after initialization. Raised eagerly.
    #[error("invalid engine configuration: {0}")]
    Configuration(String),

    /// No configured resolver could locate (and read) the template.
    #[error("template \"{name}\" could not be resolved by any configured template resolver")]
    TemplateResolution { name: String },

    #[error("could not parse template \"{name}\": {source}")]
    Parse {
        name: String,
        #[source]
        source: weft_parser::ParseError,
    },

    /// A dispatch, strict-mode, expression or processing fault raised
    /// while transforming the template tree.
    #[error("error processing template \"{name}\": {source}")]
    Processing {
        name: String,
        #[source]
        source: weft_engine::EngineError,
    },

    #[error("could not serialize template \"{name}\": {source}")]
    Write {
        name: String,
        #[source]
        source: weft_dom::DomError,
    },
}

impl WeftError {
    pub(crate) fn processing(name: &str, source: weft_engine::EngineError) -> Self {
        WeftError::Processing {
            name: name.to_string(),
            source,
        }
    }
}
