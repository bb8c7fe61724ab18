//! Attachment-Resolver: Pole ↔ Gate.
//!
//! Eine gerichtete, einstufige Beziehung: ein pole-artiges Objekt zeigt
//! auf genau ein Gate, eine Seite und ein Stack-Level. Der Transform des
//! Poles ist im angehefteten Zustand vollstaendig vom Gate abgeleitet.
//! Die Beziehung ist nicht transitiv verkettbar, die Neuberechnung nach
//! Gate-Aenderungen bleibt deshalb ein flacher Ein-Ebenen-Fan-out.

use super::placed_object::{AttachSide, Attachment, PlacedObject, MAX_STACK_COUNT};
use super::scene::SceneRegistry;
use crate::error::EditorError;
use glam::Vec2;

/// Momentaufnahme der fuer die Ableitung relevanten Gate-Daten.
#[derive(Debug, Clone, Copy)]
struct GateSnapshot {
    position: Vec2,
    angle: f32,
    altitude: f32,
    width: f32,
    height: f32,
    stack_spacing: f32,
    stack_count: u8,
}

fn gate_snapshot(scene: &SceneRegistry, gate_id: u64) -> Option<GateSnapshot> {
    let gate = scene.find(gate_id)?;
    if !gate.config.is_gate() {
        return None;
    }
    Some(GateSnapshot {
        position: gate.position,
        angle: gate.angle,
        altitude: gate.altitude,
        width: gate.config.width,
        height: gate.config.height,
        stack_spacing: gate.stack_spacing(),
        stack_count: gate.stack_count(),
    })
}

/// Abgeleiteter Transform eines angehefteten Poles.
///
/// Die Seite waehlt den um ±90° gedrehten Senkrechtvektor zur
/// Gate-Vorwaertsrichtung; der Pole sitzt eine halbe Gate-Breite neben
/// der Gate-Mitte. Hoehe: Gate-Altitude + Gate-Hoehe + Anheft-Offset +
/// Stack-Abstand × (Level − 1).
fn derive_transform(
    gate: &GateSnapshot,
    pole: &PlacedObject,
    side: AttachSide,
    level: u8,
) -> (Vec2, f32, f32) {
    let angle_rad = gate.angle.to_radians();
    let offset_distance = gate.width / 2.0;

    // Vorwaertsrichtung bei Winkel θ ist (sin θ, cos θ) in (x, y);
    // links = Vorwaertsvektor um −90° gedreht, rechts um +90°
    let offset = match side {
        AttachSide::Left => Vec2::new(
            -angle_rad.cos() * offset_distance,
            angle_rad.sin() * offset_distance,
        ),
        AttachSide::Right => Vec2::new(
            angle_rad.cos() * offset_distance,
            -angle_rad.sin() * offset_distance,
        ),
    };

    let height_offset = pole.config.attach_height_offset.unwrap_or(0.0);
    let altitude = gate.altitude
        + gate.height
        + height_offset
        + gate.stack_spacing * f32::from(level - 1);

    (gate.position + offset, gate.angle, altitude)
}

/// Heftet einen Pole an ein Gate und berechnet seinen Transform sofort neu.
///
/// Das Level wird selbstheilend in [1, stack_count] geklemmt; ein
/// ungueltiges Ziel (fehlend oder kein Gate) bricht dagegen ab, ohne die
/// Szene zu veraendern.
pub fn attach(
    scene: &mut SceneRegistry,
    pole_id: u64,
    gate_id: u64,
    side: AttachSide,
    level: u8,
) -> Result<(), EditorError> {
    let pole = scene
        .find(pole_id)
        .ok_or(EditorError::MissingObject(pole_id))?;
    if !pole.config.is_attachable() {
        return Err(EditorError::InvalidAttachmentTarget(pole_id));
    }
    let gate = gate_snapshot(scene, gate_id)
        .ok_or(EditorError::InvalidAttachmentTarget(gate_id))?;

    let clamped_level = level.clamp(1, gate.stack_count);
    if clamped_level != level {
        log::warn!(
            "Attachment-Level {} ausserhalb [1, {}], geklemmt auf {}",
            level,
            gate.stack_count,
            clamped_level
        );
    }

    let Some(pole) = scene.find_mut(pole_id) else {
        return Err(EditorError::MissingObject(pole_id));
    };
    pole.attachment = Some(Attachment {
        target: gate_id,
        side,
        level: clamped_level,
    });
    let (position, angle, altitude) = derive_transform(&gate, pole, side, clamped_level);
    pole.position = position;
    pole.angle = angle;
    pole.altitude = altitude;
    Ok(())
}

/// Loest ein Attachment. Die zuletzt abgeleitete Position bleibt als neue
/// freie Position erhalten.
pub fn detach(scene: &mut SceneRegistry, pole_id: u64) {
    if let Some(pole) = scene.find_mut(pole_id) {
        pole.attachment = None;
    }
}

/// Berechnet den abgeleiteten Transform eines angehefteten Objekts neu.
///
/// Fehlt das Ziel-Gate inzwischen, wird das Attachment selbstheilend
/// geloescht statt haengen gelassen.
pub fn refresh_attached(scene: &mut SceneRegistry, pole_id: u64) {
    let Some(pole) = scene.find(pole_id) else {
        return;
    };
    let Some(attachment) = pole.attachment else {
        return;
    };

    let Some(gate) = gate_snapshot(scene, attachment.target) else {
        log::warn!(
            "Attachment von Objekt {} zeigt auf fehlendes Gate {} — geloest",
            pole_id,
            attachment.target
        );
        detach(scene, pole_id);
        return;
    };

    let level = attachment.level.clamp(1, gate.stack_count);
    let Some(pole) = scene.find_mut(pole_id) else {
        return;
    };
    pole.attachment = Some(Attachment { level, ..attachment });
    let (position, angle, altitude) = derive_transform(&gate, pole, attachment.side, level);
    pole.position = position;
    pole.angle = angle;
    pole.altitude = altitude;
}

/// Berechnet alle an ein Gate angehefteten Objekte neu (flacher Fan-out
/// nach jeder Gate-Mutation).
pub fn refresh_dependents(scene: &mut SceneRegistry, gate_id: u64) -> Vec<u64> {
    let dependents = scene.dependents_of(gate_id);
    for id in &dependents {
        refresh_attached(scene, *id);
    }
    dependents
}

/// Setzt den Stack-Count eines stapelbaren Gates (geklemmt auf [1, 3]).
/// Levels abhaengiger Poles werden mitgeklemmt und neu abgeleitet.
pub fn set_stack_count(
    scene: &mut SceneRegistry,
    gate_id: u64,
    count: u8,
) -> Result<(), EditorError> {
    let gate = scene
        .find(gate_id)
        .ok_or(EditorError::MissingObject(gate_id))?;
    if !gate.config.is_stackable_gate() {
        return Err(EditorError::InvalidAttachmentTarget(gate_id));
    }
    let clamped = count.clamp(1, MAX_STACK_COUNT);
    if let Some(gate) = scene.find_mut(gate_id) {
        gate.stack_count = Some(clamped);
    }
    refresh_dependents(scene, gate_id);
    Ok(())
}
