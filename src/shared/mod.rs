//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Enthält Konfiguration und Konstanten, die zwischen `app`, `core`
//! und dem einbettenden Host geteilt werden.

pub mod options;

pub use options::EditorOptions;
pub use options::{
    DEFAULT_FORWARD_OFFSET_METERS, DEFAULT_GRID_SIZE_METERS, DEFAULT_ROTATION_SNAP_DEGREES,
    MAJOR_GRID_METERS,
};
