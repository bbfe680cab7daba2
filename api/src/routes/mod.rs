pub mod ask;
pub mod feedback;
pub mod health;
