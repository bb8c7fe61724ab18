//! XML Import/Export für Track-Dokumente.
//!
//! Dieses Modul implementiert das Schreiben und verlustfreie Wiedereinlesen
//! von Track-XML-Dokumenten. Editor-Zustand, den das Zielformat nicht
//! kennt, reist in EditorMeta-JSON-Kommentaren mit.

pub mod meta;
pub mod parser;
pub mod writer;

pub use meta::{EditorMeta, GlobalTransform};
pub use parser::import_scene;
pub use writer::write_track_xml;
