pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod infra;
pub mod logging;
pub mod push;
pub mod server;

pub use config::ServerConfig;
pub use domain::NotificationEvent;
pub use error::{Result, ServerError};
pub use http::{ExpoController, PushHttpServer};
pub use infra::EventBus;
pub use push::{
    DeliveryOutcome, ExpoChannel, ExpoGateway, ExpoMessage, ExpoNotification, ExpoPriority,
    Interest, MockGateway, Notifiable, PushGateway, PushToken,
};
pub use server::PushServer;
