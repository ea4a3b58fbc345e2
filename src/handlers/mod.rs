pub mod books;
pub mod health;
pub mod metrics_handler;
pub mod pages;
