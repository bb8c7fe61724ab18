//! Application-Layer: Controller, State und Host-Benachrichtigungen.

pub mod controller;
pub mod notifications;
pub mod state;

pub use controller::EditorController;
pub use notifications::HostNotification;
pub use state::EditorState;
