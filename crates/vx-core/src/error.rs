use thiserror::Error;

pub type VxResult<T> = Result<T, VxError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VxError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },
}
