//! Core-Domänentypen: Katalog, Grid, Szene, Snapping, Attachments.

pub mod attachment;
pub mod catalog;
pub mod grid;
pub mod placed_object;
pub mod scene;
pub mod snap;

pub use catalog::{find_config, resolve_config, ObjectTypeConfig, PlacementKind, OBJECT_CATALOG};
pub use grid::{anchor_offset_px, GridFrame, PixelPlacement, PIXELS_PER_METER};
pub use placed_object::{AttachSide, Attachment, PlacedObject, MAX_STACK_COUNT};
pub use scene::SceneRegistry;
pub use snap::{resnap_scene, snap_object, snap_transform, SnapSettings};
