//! Drone Track Editor Library.
//! Kern-Funktionalität des Streckeneditors als Library exportiert für
//! Hosts und Tests: Katalog, Szene, Snapping, Attachments und XML-I/O.

pub mod app;
pub mod core;
pub mod error;
pub mod shared;
pub mod xml;

pub use app::{EditorController, EditorState, HostNotification};
pub use core::{
    find_config, AttachSide, Attachment, GridFrame, ObjectTypeConfig, PlacedObject, PlacementKind,
    SceneRegistry, SnapSettings, OBJECT_CATALOG,
};
pub use error::EditorError;
pub use shared::EditorOptions;
pub use xml::{import_scene, write_track_xml, GlobalTransform};
