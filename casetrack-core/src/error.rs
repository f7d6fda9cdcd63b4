use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    #[error("invalid deadline date '{0}'")]
    InvalidDate(String),

    #[error("unknown case status: {0}")]
    UnknownStatus(String),

    #[error("case {case_id} already has the maximum of {max} extensions")]
    ExtensionLimit { case_id: String, max: usize },
}
