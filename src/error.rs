use thiserror::Error;

/// Failures while turning the option stream into exposition text.
///
/// All of them are fatal: the run stops at the first one and nothing is
/// written out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("--value given but no metric name is set, use --name first")]
    MissingName,

    #[error("option --{flag} is only valid for histograms, but the type is set to '{declared}'")]
    TypeConflict { flag: &'static str, declared: String },

    #[error("--count {0} has no preceding --le")]
    MissingBound(String),

    #[error("--le {0} must be immediately followed by its --count")]
    UnmatchedBound(String),

    #[error("histogram '{0}' needs --total-count before --value")]
    MissingTotalCount(String),

    #[error("--total-count given more than once for the current histogram")]
    DuplicateTotalCount,

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("malformed label '{0}', expected NAME=VALUE")]
    MalformedLabel(String),

    #[error("unrecognized option '{0}'")]
    UnknownOption(String),

    #[error("missing argument to option '--{0}'")]
    MissingArgument(String),
}

pub type Result<T> = std::result::Result<T, TranslateError>;
