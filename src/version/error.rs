use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Version number {0} is invalid")]
pub struct MalformedVersionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Build id {0} is invalid")]
pub struct MalformedBuildIdError(pub String);
