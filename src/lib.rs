pub mod config;
pub mod decorator;
pub mod errors;
pub mod object;
pub mod plugin;
pub mod sink;

// Re-export commonly used items for convenience
pub use config::DecoratorConfig;
pub use decorator::{ConstructorWrapper, ObjectDecorator, ObjectInterceptor, Texture};
pub use errors::{CallError, CallResult, DecoratorError, DecoratorResult};
pub use object::{Bean, Constructor, DynamicBean, Function, Promise, Value};
pub use plugin::global_registry;
pub use sink::{CollectingSink, LogEvent, LogLevel, LogSink, TracingSink};
