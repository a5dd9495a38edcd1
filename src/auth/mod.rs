pub mod retry;
pub mod session;

pub use retry::RetryPolicy;
pub use session::{Credentials, SessionManager};
