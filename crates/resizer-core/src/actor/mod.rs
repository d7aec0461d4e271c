//! Actor implementations

pub mod dispatcher;
pub mod resize;

pub use dispatcher::{DispatcherActor, DispatcherActorArgs, ProviderFactory};
pub use resize::{ResizeActor, ResizeActorArgs};
