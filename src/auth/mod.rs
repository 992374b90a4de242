//! Authentication and authorization module

pub mod credential;
pub mod dispatcher;
pub mod method;
pub mod middleware;
pub mod password;
pub mod request;
pub mod resolver;
pub mod token;

pub use credential::{Credential, ProviderProfile};
pub use dispatcher::{AuthContext, AuthDispatcher};
pub use method::{check_action, select_method, Action, AuthMethod};
pub use middleware::{bearer_auth_middleware, AuthenticatedUser};
pub use password::PasswordHasher;
pub use request::{HttpRequestContext, RequestContext, ResponseSink, StatusSink};
pub use resolver::CredentialResolver;
pub use token::{Claims, TokenCodec, TokenError};
