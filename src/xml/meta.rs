//! EditorMeta-Kommentare: Editor-Zustand im XML-Dokument.
//!
//! Das Zielformat kennt keine Editor-Begriffe wie IDs, Attachments oder
//! Stack-Counts. Der Writer legt deshalb vor jedem Objekt-Transform einen
//! JSON-Kommentar ab, den der Importer wieder einliest. Ein Dokument ohne
//! diese Kommentare bleibt trotzdem importierbar, nur eben ohne
//! Editor-Zustand.

use crate::core::placed_object::AttachSide;
use serde::{Deserialize, Serialize};

/// Kommentar-Marker, an dem der Importer Meta-Kommentare erkennt.
pub const META_MARKER: &str = "EditorMeta:";

/// Globaler Export-Transform: Welt-Offset und -Drehung der Strecke.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalTransform {
    /// Vorwaerts-Offset in Metern (Welt-X)
    pub offset_forward: f32,
    /// Lateral-Offset in Metern (Welt-Y)
    pub offset_lateral: f32,
    /// Drehung in Grad
    pub rotation_degrees: f32,
}

/// Serialisierte Form des globalen Transforms im Dokument-Kopf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlobalMeta {
    scope: String,
    global_offset_x: f32,
    global_offset_y: f32,
    global_rotation: f32,
}

/// Pro-Objekt-Metadaten im Kommentar vor dem Transform.
///
/// Die Gruppen-Felder sind nur bei Stack- bzw. Composite-Records belegt;
/// alle Records einer Gruppe tragen dieselbe Gruppen-ID, sodass der
/// Importer sie zu einem Objekt deduplizieren kann.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorMeta {
    /// Katalog-Typ des Objekts
    pub type_id: String,
    /// Objekt-ID, stabil ueber Export/Import
    pub id: u64,
    /// Vergebener Entity-Name
    pub entity_name: String,
    /// ID des Gates, an das das Objekt angeheftet ist
    pub attached_to: Option<u64>,
    /// Attachment-Seite
    pub attachment_side: Option<AttachSide>,
    /// Attachment-Stack-Level
    pub attached_level: Option<u8>,
    /// Stack-Count stapelbarer Gates
    pub stack_count: Option<u8>,

    /// Gruppen-ID bei Stack-Records (== Objekt-ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_group_id: Option<u64>,
    /// 1-basierter Index innerhalb des Stacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_index: Option<u8>,
    /// Gruppen-ID bei Composite-Records (== Objekt-ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_group_id: Option<u64>,
    /// 1-basierter Index innerhalb des Composites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_index: Option<u8>,
    /// Anzahl der Composite-Teile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_count: Option<u8>,
}

/// Baut die Kommentar-Zeile fuer ein Objekt-Meta.
pub fn build_object_comment(meta: &EditorMeta) -> String {
    // Serialisierung eines reinen Datenstructs ohne Map-Keys schlaegt
    // nicht fehl; der Fallback haelt den Writer trotzdem infallibel.
    let json = serde_json::to_string(meta).unwrap_or_default();
    format!("      <!-- {META_MARKER} {json} -->")
}

/// Baut die Kommentar-Zeile fuer den globalen Transform.
pub fn build_global_comment(global: &GlobalTransform) -> String {
    let meta = GlobalMeta {
        scope: "global".to_string(),
        global_offset_x: global.offset_forward,
        global_offset_y: global.offset_lateral,
        global_rotation: global.rotation_degrees,
    };
    let json = serde_json::to_string(&meta).unwrap_or_default();
    format!("      <!-- {META_MARKER} {json} -->")
}

/// Geparster Inhalt eines Meta-Kommentars.
#[derive(Debug, Clone)]
pub enum ParsedMeta {
    /// Globaler Transform aus dem Dokument-Kopf
    Global(GlobalTransform),
    /// Objekt-Metadaten
    Object(EditorMeta),
}

/// Parst einen Kommentar-Text auf Meta-Inhalt.
///
/// Kommentare ohne Marker sind kein Fehler (gewoehnliche XML-Kommentare);
/// Kommentare mit Marker aber kaputtem JSON werden mit Warnung ignoriert,
/// der Import laeuft weiter.
pub fn parse_comment(text: &str) -> Option<ParsedMeta> {
    let index = text.find(META_MARKER)?;
    let json_text = text[index + META_MARKER.len()..].trim();
    if json_text.is_empty() {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(json_text) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("EditorMeta-Kommentar nicht lesbar, ignoriert: {}", e);
            return None;
        }
    };

    if value.get("scope").and_then(|s| s.as_str()) == Some("global") {
        return match serde_json::from_value::<GlobalMeta>(value) {
            Ok(meta) => Some(ParsedMeta::Global(GlobalTransform {
                offset_forward: meta.global_offset_x,
                offset_lateral: meta.global_offset_y,
                rotation_degrees: meta.global_rotation,
            })),
            Err(e) => {
                log::warn!("Globales EditorMeta unvollstaendig, ignoriert: {}", e);
                None
            }
        };
    }

    match serde_json::from_value::<EditorMeta>(value) {
        Ok(meta) => Some(ParsedMeta::Object(meta)),
        Err(e) => {
            log::warn!("Objekt-EditorMeta unvollstaendig, ignoriert: {}", e);
            None
        }
    }
}
