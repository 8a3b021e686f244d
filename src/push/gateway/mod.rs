pub mod expo;
pub mod gateway_trait;
pub mod mock;

pub use expo::{ExpoGateway, EXPO_PUSH_URL};
pub use gateway_trait::PushGateway;
pub use mock::{MockGateway, SentPush};
