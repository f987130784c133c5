#[cfg(feature = "server")]
pub mod api;
pub mod audit;
pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod normalize;
pub mod paths;
pub mod persist;
pub mod registry;
pub mod selection;
pub mod settings;
pub mod state;
pub mod upstream;
pub mod util;
