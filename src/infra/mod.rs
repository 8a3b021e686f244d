// Infrastructure layer - 基础设施层

pub mod event_bus;

pub use event_bus::EventBus;
