//! Snap- und Abstands-Engine.
//!
//! Zustandslose Transform-Korrekturen nach jeder Nutzer-Bewegung sowie
//! als Bulk-Pass nach Einstellungs-Aenderungen oder Import. Die Rechnung
//! laeuft bewusst im Pixelraum, damit die abschliessende Rundung auf
//! ganze Pixel das Snapping unter wiederholten Durchlaeufen bitstabil
//! (idempotent) macht.

use super::catalog::ObjectTypeConfig;
use super::grid::{anchor_offset_px, GridFrame, PixelPlacement, PIXELS_PER_METER};
use super::scene::SceneRegistry;
use crate::shared::options::{DEFAULT_GRID_SIZE_METERS, DEFAULT_ROTATION_SNAP_DEGREES};
use glam::Vec2;

/// Anteil der Gridweite, innerhalb dessen magnetisch eingerastet wird.
/// Ausserhalb bleibt die freie Platzierung erhalten.
pub const SNAP_TOLERANCE_FACTOR: f32 = 0.4;

/// Konfigurierbare Snap-Einstellungen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    /// Gridweite in Metern
    pub grid_size_meters: f32,
    /// Rotations-Rastung in Grad
    pub rotation_snap_degrees: f32,
}

impl SnapSettings {
    /// Klemmt Nutzereingaben auf sinnvolle Werte (positive Schrittweiten).
    pub fn sanitized(grid_size_meters: f32, rotation_snap_degrees: f32) -> Self {
        Self {
            grid_size_meters: if grid_size_meters.is_finite() && grid_size_meters > 0.0 {
                grid_size_meters
            } else {
                DEFAULT_GRID_SIZE_METERS
            },
            rotation_snap_degrees: if rotation_snap_degrees.is_finite()
                && rotation_snap_degrees > 0.0
            {
                rotation_snap_degrees
            } else {
                DEFAULT_ROTATION_SNAP_DEGREES
            },
        }
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            grid_size_meters: DEFAULT_GRID_SIZE_METERS,
            rotation_snap_degrees: DEFAULT_ROTATION_SNAP_DEGREES,
        }
    }
}

/// Abstands-Korrektur fuer Gates: schiebt die Kandidaten-Position von
/// jedem anderen Gate weg, das naeher als eine Gate-Breite liegt.
/// Korrekturen mehrerer Nachbarn addieren sich.
pub fn gate_spacing_adjust(
    config: &ObjectTypeConfig,
    candidate: Vec2,
    other_gates: &[Vec2],
) -> Vec2 {
    if !config.is_gate() {
        return Vec2::ZERO;
    }
    let min_spacing = config.width;
    let mut adjust = Vec2::ZERO;
    for other in other_gates {
        let delta = candidate - *other;
        let distance = delta.length();
        if distance > 0.0 && distance < min_spacing {
            adjust += delta / distance * (min_spacing - distance);
        }
    }
    adjust
}

/// Rastet Position und Winkel eines Objekts ein.
///
/// 1. Pro Achse zum naechsten Gridpunkt, aber nur innerhalb der Toleranz.
/// 2. Gate-Mindestabstand zu allen anderen Gates erzwingen.
/// 3. Winkel immer auf das Rotations-Raster runden.
/// 4. Finale Pixel-Platzierung auf ganze Pixel runden.
pub fn snap_transform(
    frame: &GridFrame,
    settings: &SnapSettings,
    config: &ObjectTypeConfig,
    position: Vec2,
    angle: f32,
    other_gates: &[Vec2],
) -> (Vec2, f32) {
    let anchor = anchor_offset_px(config);
    let grid_px = settings.grid_size_meters * PIXELS_PER_METER;
    let tolerance = grid_px * SNAP_TOLERANCE_FACTOR;

    // Position relativ zum Ursprung in Pixeln (x rechts, y vorwaerts)
    let current = position * PIXELS_PER_METER;

    let grid_x = (current.x / grid_px).round() * grid_px;
    let grid_y = (current.y / grid_px).round() * grid_px;

    let mut snapped_x = if (current.x - grid_x).abs() <= tolerance {
        grid_x
    } else {
        current.x
    };
    let mut snapped_y = if (current.y - grid_y).abs() <= tolerance {
        grid_y
    } else {
        current.y
    };

    let candidate_m = Vec2::new(snapped_x, snapped_y) / PIXELS_PER_METER;
    let spacing = gate_spacing_adjust(config, candidate_m, other_gates);
    snapped_x += spacing.x * PIXELS_PER_METER;
    snapped_y += spacing.y * PIXELS_PER_METER;

    let origin = frame.origin();
    let snapped_angle =
        (angle / settings.rotation_snap_degrees).round() * settings.rotation_snap_degrees;
    let placement = PixelPlacement {
        left: (origin.x + snapped_x).round(),
        top: (origin.y - snapped_y + anchor).round(),
        angle: snapped_angle,
    };

    (frame.pixels_to_meters(&placement, anchor), snapped_angle)
}

/// Rastet ein einzelnes Szenen-Objekt ein (angeheftete Objekte bleiben
/// unberuehrt, deren Transform ist vom Gate abgeleitet).
pub fn snap_object(scene: &mut SceneRegistry, frame: &GridFrame, settings: &SnapSettings, id: u64) {
    let Some(object) = scene.find(id) else {
        return;
    };
    if object.is_attached() {
        return;
    }
    let others = scene.other_gate_positions(id);
    let (position, angle) = snap_transform(
        frame,
        settings,
        object.config,
        object.position,
        object.angle,
        &others,
    );
    if let Some(object) = scene.find_mut(id) {
        object.position = position;
        object.angle = angle;
    }
}

/// Bulk-Resnap der gesamten Szene in Einfuege-Reihenfolge, danach werden
/// abgeleitete Transforms angehefteter Objekte neu berechnet.
pub fn resnap_scene(scene: &mut SceneRegistry, frame: &GridFrame, settings: &SnapSettings) {
    let ids = scene.ids();
    for id in &ids {
        snap_object(scene, frame, settings, *id);
    }
    for id in &ids {
        super::attachment::refresh_attached(scene, *id);
    }
}
