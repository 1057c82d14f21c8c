pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod mailer;
pub mod memory_repo;
pub mod user_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use mailer::{BrevoDispatcher, ConsoleDispatcher};
pub use memory_repo::InMemoryStore;
pub use user_repo::PgUserRepository;
