//! Core domain types for pathing requests.
//!
//! These types are independent of HTTP and storage and are valid by
//! construction where possible.

mod coordinate;
mod record;
mod token;

pub use coordinate::{
    Coordinate, DEFAULT_MAX_POINTS, InvalidCoordinate, PathValidation, Rejection, validate_path,
};
pub use record::{
    FailureCause, FailureRecord, PathingRecord, RequestStatus, Solution, StoredRequest,
    UNKNOWN_ERROR_MESSAGE,
};
pub use token::{
    EntropySource, InvalidToken, OsEntropy, RequestToken, TOKEN_LEN, TokenError, TokenIssuer,
};
