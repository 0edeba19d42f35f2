mod middleware;
mod password;

pub use middleware::{AuthorizationHeader, resolve_client};
pub use password::{AuthError, Credentials, validate_credentials};
