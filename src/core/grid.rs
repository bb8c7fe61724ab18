//! Koordinatensystem des Editors: Pixel ↔ Meter.
//!
//! Der Grid-Ursprung liegt nicht in der Viewport-Mitte, sondern auf dem
//! vorderen Startpunkt: horizontal zentriert, vertikal um einen festen
//! Bodenabstand ueber der Unterkante. X ist lateral (rechts positiv),
//! Y ist vorwaerts (im Pixelraum nach oben).

use super::catalog::{AnchorOffset, ObjectTypeConfig};
use glam::Vec2;

/// Fester Massstab des Plans.
pub const PIXELS_PER_METER: f32 = 40.0;
/// Abstand des Grid-Ursprungs von der Viewport-Unterkante in Pixeln.
pub const GRID_BOTTOM_MARGIN_PX: f32 = 160.0;
/// Standard-Viewportgroesse, falls der Host noch keine gemeldet hat.
pub const DEFAULT_VIEWPORT: Vec2 = Vec2::new(1280.0, 800.0);

/// Platzierung im Pixelraum des Hosts: Anker-Position plus Drehwinkel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPlacement {
    /// Horizontale Anker-Position (Pixel, nach rechts)
    pub left: f32,
    /// Vertikale Anker-Position (Pixel, nach unten)
    pub top: f32,
    /// Drehwinkel in Grad
    pub angle: f32,
}

/// Umrechnungsrahmen zwischen Host-Pixeln und metrischen Koordinaten.
#[derive(Debug, Clone, Copy)]
pub struct GridFrame {
    /// Viewportgroesse in Pixeln
    pub viewport: Vec2,
}

impl GridFrame {
    /// Erstellt einen Rahmen fuer die gegebene Viewportgroesse.
    pub fn new(viewport: Vec2) -> Self {
        Self { viewport }
    }

    /// Grid-Ursprung in Pixelkoordinaten (vorderer Startpunkt).
    pub fn origin(&self) -> Vec2 {
        Vec2::new(
            self.viewport.x / 2.0,
            self.viewport.y - GRID_BOTTOM_MARGIN_PX,
        )
    }

    /// Metrische Position → Pixel-Platzierung des Render-Ankers.
    ///
    /// Der Anker-Offset wird wieder aufaddiert, da das Asset nicht an
    /// seinem Bodenkontaktpunkt aufgehaengt ist.
    pub fn meters_to_pixels(&self, position: Vec2, angle: f32, anchor_offset_px: f32) -> PixelPlacement {
        let origin = self.origin();
        PixelPlacement {
            left: origin.x + position.x * PIXELS_PER_METER,
            top: origin.y - position.y * PIXELS_PER_METER + anchor_offset_px,
            angle,
        }
    }

    /// Pixel-Platzierung → metrische Position des Bodenkontaktpunkts.
    pub fn pixels_to_meters(&self, placement: &PixelPlacement, anchor_offset_px: f32) -> Vec2 {
        let origin = self.origin();
        let base_top = placement.top - anchor_offset_px;
        Vec2::new(
            (placement.left - origin.x) / PIXELS_PER_METER,
            (origin.y - base_top) / PIXELS_PER_METER,
        )
    }

    /// Freier Zeiger-Punkt (ohne Anker-Korrektur) → Meter.
    pub fn pointer_to_meters(&self, point: Vec2) -> Vec2 {
        let origin = self.origin();
        Vec2::new(
            (point.x - origin.x) / PIXELS_PER_METER,
            (origin.y - point.y) / PIXELS_PER_METER,
        )
    }
}

impl Default for GridFrame {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT)
    }
}

/// Anker-Offset eines Objekttyps in Pixeln.
///
/// Ratio-Offsets werden auf zwei Nachkommastellen gerundet, damit
/// wiederholtes Snapping nicht an Float-Drift scheitert.
pub fn anchor_offset_px(config: &ObjectTypeConfig) -> f32 {
    match config.anchor_offset {
        Some(AnchorOffset::Meters(meters)) => meters * PIXELS_PER_METER,
        Some(AnchorOffset::IconRatio(ratio)) => {
            let rendered_height_px = config.visual_height() * PIXELS_PER_METER;
            (ratio * rendered_height_px * 100.0).round() / 100.0
        }
        None => 0.0,
    }
}
