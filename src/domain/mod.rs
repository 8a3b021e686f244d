pub mod events;

pub use events::{NotificationEvent, EXPO_CHANNEL};
