pub mod db;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod trigger;
