//! Sales console core: leads, opportunities, and the state that ties them
//! together. Front ends drive everything through [`console::SalesConsole`].

pub mod config;
pub mod console;
pub mod debounce;
pub mod error;
pub mod forms;
pub mod preferences;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;
pub mod view;

pub use console::SalesConsole;
pub use error::{ConsoleError, ValidationError};
