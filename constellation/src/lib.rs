pub mod assets;
pub mod capture;
pub mod config;
pub mod effects;
pub mod experience;
pub mod gesture;
pub mod layout;
pub mod overlay;
pub mod path;
pub mod quote;
pub mod render;
pub mod scene;
pub mod starfield;
pub mod telemetry;
pub mod timers;

pub use experience::Experience;
