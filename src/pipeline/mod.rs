pub mod builder;
pub mod defaults;
pub mod recognizer;
pub mod registry;
pub mod runtime;
pub mod traits;
