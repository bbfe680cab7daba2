pub mod chat;
pub mod error;
pub mod feedback;
pub mod session;
pub mod speech;
