//! Services layer - Business logic
//!
//! Services implement the business rules on top of the repositories:
//! validation, ownership checks, credential handling. They return typed
//! errors that the API layer maps onto HTTP responses.

pub mod listing;
pub mod password;
pub mod rate_limiter;
pub mod token;
pub mod user;

pub use listing::{ListingService, ListingServiceError};
pub use password::{hash_password, verify_password};
pub use rate_limiter::{SigninRateLimiter, ThrottleDecision};
pub use token::{Claims, TokenService};
pub use user::{GoogleInput, SigninInput, SignupInput, UserService, UserServiceError};
