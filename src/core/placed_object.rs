//! Ein platziertes Objekt der Szene (reines Datenmodell).
//!
//! Render-Handles verwaltet der Host getrennt und verknuepft sie nur
//! ueber die Objekt-ID.

use super::catalog::ObjectTypeConfig;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Maximale Anzahl gestapelter Gates an einer Position.
pub const MAX_STACK_COUNT: u8 = 3;

/// Seite, auf der ein Pole an ein Gate angeheftet wird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachSide {
    /// Links der Gate-Vorwaertsrichtung
    Left,
    /// Rechts der Gate-Vorwaertsrichtung
    Right,
}

/// Attachment-Referenz eines pole-artigen Objekts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    /// ID des Ziel-Gates
    pub target: u64,
    /// Seite relativ zur Gate-Vorwaertsrichtung
    pub side: AttachSide,
    /// Stack-Level am Ziel-Gate, immer in [1, stack_count]
    pub level: u8,
}

/// Ein in der Szene platziertes Objekt.
#[derive(Debug, Clone)]
pub struct PlacedObject {
    /// Eindeutige, ueber Export/Import stabile ID
    pub id: u64,
    /// Katalog-Konfiguration des Typs
    pub config: &'static ObjectTypeConfig,
    /// Vergebener Entity-Name (`prefix` + laufende Nummer)
    pub entity_name: String,
    /// Position in Metern (x lateral, y vorwaerts)
    pub position: Vec2,
    /// Drehwinkel in Grad
    pub angle: f32,
    /// Hoehe ueber dem Boden in Metern
    pub altitude: f32,
    /// Attachment-Referenz, falls an ein Gate angeheftet
    pub attachment: Option<Attachment>,
    /// Stack-Count (nur fuer stapelbare Gates belegt)
    pub stack_count: Option<u8>,
}

impl PlacedObject {
    /// Effektiver Stack-Count, auf [1, 3] geklemmt.
    pub fn stack_count(&self) -> u8 {
        if !self.config.is_stackable_gate() {
            return 1;
        }
        self.stack_count.unwrap_or(1).clamp(1, MAX_STACK_COUNT)
    }

    /// Vertikaler Abstand gestapelter Instanzen in Metern.
    pub fn stack_spacing(&self) -> f32 {
        self.config.stack_spacing()
    }

    /// Angeheftete Objekte folgen vollstaendig dem Ziel-Gate; der Host
    /// reduziert ihre Deckkraft als visuellen Hinweis.
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }
}
