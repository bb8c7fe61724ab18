//! Writer für Track-XML-Dokumente.
//!
//! Das Dokument besteht aus festem Geruest (Location-Includes, Macros,
//! Canopy-Gruppe, Track-Wrapper mit Matte und Launch-Stand) und einem
//! Record-Block pro platziertem Objekt. Vor jedem Record steht ein
//! EditorMeta-Kommentar, damit der Import verlustfrei bleibt.

use super::meta::{build_global_comment, build_object_comment, EditorMeta, GlobalTransform};
use crate::core::catalog::PlacementKind;
use crate::core::placed_object::PlacedObject;
use crate::core::scene::SceneRegistry;
use glam::Vec2;
use std::collections::HashMap;

/// Feste Include-Zeilen am Dokument-Kopf.
const HEADER_INCLUDES: &[&str] = &[
    "  <Include file=\"/Data/Simulations/Multirotor/Locations/BaylandsPark.xml\"/>",
    "  <Include file=\"/Data/Simulations/Multirotor/DroneTrackInstanceGroups.xml\"/>",
    "  <Include file=\"/Data/Simulations/Multirotor/Gates/PoleGates.xml\"/>",
];

/// Macro-Definitionen fuer zentrierte Gates: das Roh-Asset haengt am
/// linken Pfosten, der Transform verschiebt es um die halbe Gate-Breite.
const CENTERED_GATE_MACROS: &[&str] = &[
    "  <Macro name=\"Centered5x5StartFinishGate\">",
    "    <Transform x=\"-1.05\">",
    "      <Include file=\"/Data/Simulations/Multirotor/5x5StartFinishGate.xml\"/>",
    "    </Transform>",
    "  </Macro>",
    "  <Macro name=\"Centered5x5Gate\">",
    "    <Transform x=\"-1.05\">",
    "      <Include file=\"/Data/Simulations/Multirotor/5x5Gate.xml\"/>",
    "    </Transform>",
    "  </Macro>",
];

/// Feste Canopy-Gruppe neben der Strecke.
const CANOPY_BLOCK: &[&str] = &[
    "  <Transform x=\"25\" y=\"-85\" rz=\"-1\" angleDegrees=\"110\">",
    "    <Transform x=\"9\" y=\"-4\" rz=\"1\" angleDegrees=\"-30\">",
    "      <Include file=\"/Data/Simulations/Multirotor/Furniture/ShadeCanopy.xml\"/>",
    "    </Transform>",
    "    <Transform x=\"10\" y=\"0\">",
    "      <Include file=\"/Data/Simulations/Multirotor/Furniture/ShadeCanopy.xml\"/>",
    "    </Transform>",
    "    <Transform x=\"10\" y=\"4\" rz=\"1\" angleDegrees=\"3\">",
    "      <Include file=\"/Data/Simulations/Multirotor/Furniture/ShadeCanopy.xml\"/>",
    "    </Transform>",
    "    <Transform x=\"9.8\" y=\"8\" rz=\"1\" angleDegrees=\"0\">",
    "      <Include file=\"/Data/Simulations/Multirotor/Furniture/ShadeCanopy.xml\"/>",
    "    </Transform>",
    "  </Transform>",
];

/// Oeffnende Zeilen des Track-Wrappers inklusive Start-Matte und
/// Launch-Stand, die jede Strecke traegt.
const TRACK_WRAPPER_OPEN: &[&str] = &[
    "  <Transform x=\"30\" y=\"-60\">",
    "    <Entity name=\"Track\">",
    "      <Transform x=\"0\" y=\"0\" rz=\"-1\" angleDegrees=\"0\">",
    "        <Transform>",
    "          <Include file=\"/Data/Simulations/Multirotor/7x7Mat.xml\"/>",
    "        </Transform>",
    "        <Transform z=\".025\" rz=\"-1\" angleDegrees=\"90\">",
    "          <Include file=\"/Data/Simulations/Multirotor/LaunchStands/MetalLaunchStand.xml\"/>",
    "        </Transform>",
    "      </Transform>",
];

/// Normalisiert einen Winkel auf [0, 360).
fn normalize_angle(angle_degrees: f32) -> f32 {
    let mut angle = angle_degrees % 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

/// Editor-Position → Welt-Koordinaten des Dokuments (globale Drehung und
/// Offsets angewandt; Welt-X zeigt vorwaerts, Welt-Y lateral gespiegelt).
fn to_world(position: Vec2, global: &GlobalTransform) -> Vec2 {
    let rotation_rad = global.rotation_degrees.to_radians();
    let (sin_r, cos_r) = rotation_rad.sin_cos();
    let forward = position.y;
    let lateral = position.x;
    let rotated_forward = forward * cos_r - lateral * sin_r;
    let rotated_lateral = forward * sin_r + lateral * cos_r;
    Vec2::new(
        rotated_forward + global.offset_forward,
        -(rotated_lateral - global.offset_lateral),
    )
}

/// Erzwingt den Gate-Mindestabstand in Welt-Koordinaten: jedes Gate wird
/// von allen bereits festgelegten frueheren Gates weggeschoben. Das erste
/// Gate bewegt sich nie.
fn adjusted_gate_positions(
    scene: &SceneRegistry,
    global: &GlobalTransform,
) -> HashMap<u64, Vec2> {
    let mut fixed: Vec<Vec2> = Vec::new();
    let mut adjusted = HashMap::new();

    for object in scene.all() {
        if !object.config.is_gate() {
            continue;
        }
        let mut world = to_world(object.position, global);
        let min_spacing = object.config.width;
        for existing in &fixed {
            let delta = world - *existing;
            let distance = delta.length();
            if distance > 0.0 && distance < min_spacing {
                world += delta / distance * (min_spacing - distance);
            }
        }
        fixed.push(world);
        adjusted.insert(object.id, world);
    }

    adjusted
}

fn object_meta(object: &PlacedObject) -> EditorMeta {
    EditorMeta {
        type_id: object.config.id.to_string(),
        id: object.id,
        entity_name: object.entity_name.clone(),
        attached_to: object.attachment.map(|a| a.target),
        attachment_side: object.attachment.map(|a| a.side),
        attached_level: object.attachment.map(|a| a.level),
        stack_count: object.stack_count,
        stack_group_id: None,
        stack_index: None,
        composite_group_id: None,
        composite_index: None,
        composite_count: None,
    }
}

/// Ein `<Transform><Entity>…</Entity></Transform>`-Record.
fn push_record(
    lines: &mut Vec<String>,
    world: Vec2,
    altitude: f32,
    angle: f32,
    entity_name: &str,
    payload: &str,
) {
    lines.push(format!(
        "      <Transform x=\"{:.3}\" y=\"{:.3}\" z=\"{:.3}\" angleDegrees=\"{:.1}\" rz=\"-1\">",
        world.x, world.y, altitude, angle
    ));
    lines.push(format!("        <Entity name=\"{}\">", entity_name));
    lines.push(format!("          {}", payload));
    lines.push("        </Entity>".to_string());
    lines.push("      </Transform>".to_string());
}

fn placement_payload(object: &PlacedObject) -> String {
    match (object.config.placement, object.config.macro_name) {
        (PlacementKind::Macro, Some(name)) => format!("<Instance macro=\"{}\"/>", name),
        _ => format!(
            "<Include file=\"{}\"/>",
            object.config.include_file.unwrap_or_default()
        ),
    }
}

/// Schreibt die Szene als vollstaendiges Track-XML-Dokument.
pub fn write_track_xml(scene: &SceneRegistry, global: &GlobalTransform) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("<Simulation>".to_string());
    lines.push(build_global_comment(global));
    lines.extend(HEADER_INCLUDES.iter().map(|s| s.to_string()));
    lines.push(String::new());
    lines.extend(CENTERED_GATE_MACROS.iter().map(|s| s.to_string()));
    lines.push(String::new());
    lines.extend(CANOPY_BLOCK.iter().map(|s| s.to_string()));
    lines.push(String::new());
    lines.extend(TRACK_WRAPPER_OPEN.iter().map(|s| s.to_string()));
    if !scene.is_empty() {
        lines.push(String::new());
    }

    let gate_positions = adjusted_gate_positions(scene, global);

    for object in scene.all() {
        let world = gate_positions
            .get(&object.id)
            .copied()
            .unwrap_or_else(|| to_world(object.position, global));
        let angle = normalize_angle(object.angle + global.rotation_degrees + 90.0);
        let altitude = object.altitude;
        let base_meta = object_meta(object);

        let stack_count = object.stack_count();
        if object.config.is_stackable_gate() && stack_count > 1 {
            let spacing = object.stack_spacing();
            for index in 1..=stack_count {
                let mut meta = base_meta.clone();
                meta.stack_group_id = Some(object.id);
                meta.stack_index = Some(index);
                meta.stack_count = Some(stack_count);
                lines.push(build_object_comment(&meta));

                let entity_name = if index == 1 {
                    object.entity_name.clone()
                } else {
                    format!("{}_stack{}", object.entity_name, index)
                };
                let stack_altitude = altitude + spacing * f32::from(index - 1);
                push_record(
                    &mut lines,
                    world,
                    stack_altitude,
                    angle,
                    &entity_name,
                    &placement_payload(object),
                );
            }
            continue;
        }

        if object.config.placement == PlacementKind::Composite {
            let parts = object.config.composite_parts;
            for (index, part) in parts.iter().enumerate() {
                // Payload zuerst: ein Teil ohne Macro und Include darf
                // auch keinen verwaisten Meta-Kommentar hinterlassen
                let payload = match (part.macro_name, part.include_file) {
                    (Some(name), _) => format!("<Instance macro=\"{}\"/>", name),
                    (None, Some(file)) => format!("<Include file=\"{}\"/>", file),
                    (None, None) => continue,
                };
                let mut meta = base_meta.clone();
                meta.composite_group_id = Some(object.id);
                meta.composite_index = Some(index as u8 + 1);
                meta.composite_count = Some(parts.len() as u8);
                lines.push(build_object_comment(&meta));

                let entity_name = if index == 0 {
                    object.entity_name.clone()
                } else {
                    format!("{}_{}", object.entity_name, index + 1)
                };
                push_record(
                    &mut lines,
                    world,
                    altitude + part.altitude,
                    angle,
                    &entity_name,
                    &payload,
                );
            }
            continue;
        }

        lines.push(build_object_comment(&base_meta));
        push_record(
            &mut lines,
            world,
            altitude,
            angle,
            &object.entity_name,
            &placement_payload(object),
        );
    }

    lines.push("    </Entity>".to_string());
    lines.push("  </Transform>".to_string());
    lines.push("</Simulation>".to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneRegistry;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle_range() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(-90.0), 270.0);
        assert_relative_eq!(normalize_angle(450.0), 90.0);
        assert_relative_eq!(normalize_angle(360.0), 0.0);
    }

    #[test]
    fn test_world_transform_identity() {
        let global = GlobalTransform::default();
        // Editor (lateral 3, vorwaerts 16) → Welt (x=vorwaerts, y=-lateral)
        let world = to_world(Vec2::new(3.0, 16.0), &global);
        assert_relative_eq!(world.x, 16.0, epsilon = 1e-5);
        assert_relative_eq!(world.y, -3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_world_transform_with_rotation_and_offset() {
        let global = GlobalTransform {
            offset_forward: 10.0,
            offset_lateral: -5.0,
            rotation_degrees: 90.0,
        };
        // Bei 90° wandert vorwaerts vollstaendig in die Lateral-Achse
        let world = to_world(Vec2::new(0.0, 16.0), &global);
        assert_relative_eq!(world.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(world.y, -21.0, epsilon = 1e-4);
    }

    #[test]
    fn test_document_scaffold() {
        let scene = SceneRegistry::new();
        let xml = write_track_xml(&scene, &GlobalTransform::default());

        assert!(xml.starts_with("<Simulation>"));
        assert!(xml.ends_with("</Simulation>"));
        assert!(xml.contains("\"scope\":\"global\""));
        assert!(xml.contains("Locations/BaylandsPark.xml"));
        assert!(xml.contains("<Macro name=\"Centered5x5Gate\">"));
        assert!(xml.contains("<Entity name=\"Track\">"));
        assert!(xml.contains("7x7Mat.xml"));
        assert!(xml.contains("MetalLaunchStand.xml"));
    }

    #[test]
    fn test_single_object_record() {
        let mut scene = SceneRegistry::new();
        scene.create("gate-7x7", Vec2::new(0.0, 16.0)).unwrap();
        let xml = write_track_xml(&scene, &GlobalTransform::default());

        assert!(xml.contains("\"typeId\":\"gate-7x7\""));
        assert!(xml.contains(
            "<Transform x=\"16.000\" y=\"-0.000\" z=\"0.000\" angleDegrees=\"90.0\" rz=\"-1\">"
        ));
        assert!(xml.contains("<Entity name=\"gate1\">"));
        assert!(xml.contains("<Include file=\"/Data/Simulations/Multirotor/7x7Gate.xml\"/>"));
    }

    #[test]
    fn test_macro_object_uses_instance() {
        let mut scene = SceneRegistry::new();
        scene.create("pipe-cube", Vec2::ZERO).unwrap();
        let xml = write_track_xml(&scene, &GlobalTransform::default());
        assert!(xml.contains("<Instance macro=\"PipeCube\"/>"));
    }

    #[test]
    fn test_stacked_gate_emits_one_record_per_level() {
        let mut scene = SceneRegistry::new();
        let id = scene.create("gate-5x5", Vec2::new(0.0, 16.0)).unwrap();
        scene.find_mut(id).unwrap().stack_count = Some(3);
        let xml = write_track_xml(&scene, &GlobalTransform::default());

        assert!(xml.contains("<Entity name=\"gate1\">"));
        assert!(xml.contains("<Entity name=\"gate1_stack2\">"));
        assert!(xml.contains("<Entity name=\"gate1_stack3\">"));
        // Stack-Abstand = Gate-Hoehe 2.1 m
        assert!(xml.contains("z=\"0.000\""));
        assert!(xml.contains("z=\"2.100\""));
        assert!(xml.contains("z=\"4.200\""));
        assert!(xml.contains("\"stackGroupId\":1"));
        assert_eq!(xml.matches("\"stackIndex\"").count(), 3);
    }

    #[test]
    fn test_composite_emits_all_parts() {
        let mut scene = SceneRegistry::new();
        scene.create("pipe-flag", Vec2::new(0.0, 10.0)).unwrap();
        let xml = write_track_xml(&scene, &GlobalTransform::default());

        assert!(xml.contains("<Entity name=\"pipeflag1\">"));
        assert!(xml.contains("<Entity name=\"pipeflag1_2\">"));
        assert!(xml.contains("<Instance macro=\"PipeCube\"/>"));
        assert!(xml.contains("<Include file=\"/Data/Simulations/Multirotor/FlagPassLeft.xml\"/>"));
        assert!(xml.contains("\"compositeCount\":2"));
    }

    #[test]
    fn test_every_meta_comment_followed_by_record() {
        let mut scene = SceneRegistry::new();
        scene.create("pipe-flag", Vec2::new(0.0, 10.0)).unwrap();
        scene.create("gate-5x5", Vec2::new(0.0, 16.0)).unwrap();
        let xml = write_track_xml(&scene, &GlobalTransform::default());

        // Jeder Objekt-Kommentar muss direkt vor seinem Record stehen,
        // verwaiste Kommentare wuerden beim Import falsch binden
        let lines: Vec<&str> = xml.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.contains("\"typeId\"") {
                let next = lines.get(i + 1).copied().unwrap_or("");
                assert!(
                    next.trim_start().starts_with("<Transform "),
                    "Kommentar ohne Record in Zeile {i}: {line}"
                );
            }
        }
    }

    #[test]
    fn test_export_gate_spacing_enforced() {
        let mut scene = SceneRegistry::new();
        scene.create("gate-5x5", Vec2::new(0.0, 16.0)).unwrap();
        // Zweites Gate deutlich zu nah am ersten
        scene.create("gate-5x5", Vec2::new(0.5, 16.0)).unwrap();
        let global = GlobalTransform::default();
        let xml = write_track_xml(&scene, &global);

        // Erster Record bleibt unbewegt, zweiter wird weggeschoben
        assert!(xml.contains("x=\"16.000\" y=\"-0.000\""));
        assert!(xml.contains("y=\"-2.100\""));
    }
}
