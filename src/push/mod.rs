pub mod types;
pub mod registry;
pub mod gateway;
pub mod channel;

pub use types::{ExpoMessage, ExpoPriority, GatewayResponse, Interest, PushTicket, PushToken};
pub use registry::InterestRegistry;
pub use gateway::{ExpoGateway, MockGateway, PushGateway};
pub use channel::{DeliveryOutcome, ExpoChannel, ExpoNotification, Notifiable};
