pub mod health;
pub mod query;
