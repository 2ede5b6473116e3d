pub mod broadcast;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod keyboard;
pub mod leaderboard;
pub mod messenger;
pub mod providers;
pub mod runner;
pub mod schema;
pub mod state;
pub mod waiter;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
