mod session;

pub use session::SessionManager;
pub use session::is_expired;
