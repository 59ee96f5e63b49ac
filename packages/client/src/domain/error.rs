//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// The integer is not one of the known `msgtype` discriminants
    #[error("unknown msgtype: {0}")]
    UnknownMsgType(i64),
}
