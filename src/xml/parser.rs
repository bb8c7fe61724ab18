//! Parser und Importer für Track-XML-Dokumente.
//!
//! Der Parser liest das Dokument als Event-Strom und sammelt Records:
//! ein Record ist ein `<Transform>` mit einem direkten `<Entity>`-Kind,
//! dessen direktes Kind wiederum ein `<Include>` oder eine `<Instance>`
//! ist. Das feste Export-Geruest (Header-Includes, Macros, Canopy-Gruppe,
//! Track-Wrapper) erfuellt diese Form nicht und faellt dadurch von selbst
//! heraus. Der Importer ersetzt die Szene erst, wenn das gesamte Dokument
//! fehlerfrei gelesen wurde.

use super::meta::{parse_comment, EditorMeta, GlobalTransform, ParsedMeta};
use crate::core::catalog::resolve_config;
use crate::core::placed_object::{Attachment, PlacedObject};
use crate::core::scene::SceneRegistry;
use crate::core::snap::{resnap_scene, SnapSettings};
use crate::core::{attachment, GridFrame};
use crate::error::EditorError;
use anyhow::{Context, Result};
use glam::Vec2;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;

/// Ein importierbarer Objekt-Record aus dem Dokument.
#[derive(Debug, Clone)]
struct PlacementRecord {
    meta: Option<EditorMeta>,
    entity_name: Option<String>,
    include_file: Option<String>,
    macro_name: Option<String>,
    x: f32,
    y: f32,
    z: f32,
    angle_degrees: f32,
}

/// Element-Rahmen auf dem Parser-Stack.
enum Frame {
    Transform {
        x: f32,
        y: f32,
        z: f32,
        angle_degrees: f32,
        meta: Option<EditorMeta>,
    },
    Entity {
        name: Option<String>,
        include_file: Option<String>,
        macro_name: Option<String>,
    },
    Other,
}

fn float_attr(reader: &Reader<&[u8]>, e: &BytesStart, wanted: &str) -> Result<Option<f32>> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?;
        if key == wanted {
            let value = attr.unescape_value()?;
            let parsed = value
                .trim()
                .parse::<f32>()
                .with_context(|| format!("Ungueltiger Attributwert {}='{}'", wanted, value))?;
            return Ok(Some(parsed));
        }
    }
    Ok(None)
}

fn string_attr(reader: &Reader<&[u8]>, e: &BytesStart, wanted: &str) -> Result<Option<String>> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?;
        if key == wanted {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn open_frame(
    reader: &Reader<&[u8]>,
    e: &BytesStart,
    pending_meta: &mut Option<EditorMeta>,
) -> Result<Frame> {
    let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let frame = match tag.as_str() {
        "Transform" => Frame::Transform {
            x: float_attr(reader, e, "x")?.unwrap_or(0.0),
            y: float_attr(reader, e, "y")?.unwrap_or(0.0),
            z: float_attr(reader, e, "z")?.unwrap_or(0.0),
            angle_degrees: float_attr(reader, e, "angleDegrees")?.unwrap_or(0.0),
            meta: pending_meta.take(),
        },
        "Entity" => Frame::Entity {
            name: string_attr(reader, e, "name")?,
            include_file: None,
            macro_name: None,
        },
        _ => {
            // Meta-Kommentare gelten nur fuer den unmittelbar folgenden
            // Transform
            *pending_meta = None;
            Frame::Other
        }
    };
    Ok(frame)
}

/// Liest das Dokument vollstaendig und liefert den globalen Transform
/// plus alle Objekt-Records in Dokument-Reihenfolge.
fn parse_track_xml(xml_content: &str) -> Result<(GlobalTransform, Vec<PlacementRecord>)> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut buffer = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut pending_meta: Option<EditorMeta> = None;
    let mut global = GlobalTransform::default();
    let mut records: Vec<PlacementRecord> = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                stack.push(open_frame(&reader, e, &mut pending_meta)?);
            }
            Ok(Event::Empty(ref e)) => {
                let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
                // Include/Instance zaehlen nur als direktes Entity-Kind;
                // Geruest-Includes unter Transforms werden ignoriert
                if let Some(Frame::Entity {
                    include_file,
                    macro_name,
                    ..
                }) = stack.last_mut()
                {
                    match tag.as_str() {
                        "Include" => {
                            *include_file = string_attr(&reader, e, "file")?;
                        }
                        "Instance" => {
                            *macro_name = string_attr(&reader, e, "macro")?;
                        }
                        _ => {}
                    }
                }
                pending_meta = None;
            }
            Ok(Event::Comment(ref e)) => {
                let text = e.xml_content()?;
                match parse_comment(&text) {
                    Some(ParsedMeta::Global(parsed)) => global = parsed,
                    Some(ParsedMeta::Object(meta)) => pending_meta = Some(meta),
                    None => {}
                }
            }
            Ok(Event::End(_)) => {
                let Some(closed) = stack.pop() else {
                    anyhow::bail!("Unbalanciertes XML-Dokument");
                };
                if let Frame::Entity {
                    name,
                    include_file,
                    macro_name,
                } = closed
                {
                    if let Some(Frame::Transform {
                        x,
                        y,
                        z,
                        angle_degrees,
                        meta,
                    }) = stack.last_mut()
                    {
                        records.push(PlacementRecord {
                            meta: meta.take(),
                            entity_name: name,
                            include_file,
                            macro_name,
                            x: *x,
                            y: *y,
                            z: *z,
                            angle_degrees: *angle_degrees,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err).context("Fehler beim Parsen des XML"),
            _ => {}
        }

        buffer.clear();
    }

    Ok((global, records))
}

/// Normalisiert einen Winkel auf (-180, 180].
fn normalize_editor_angle(angle_degrees: f32) -> f32 {
    let mut angle = angle_degrees % 360.0;
    if angle < -180.0 {
        angle += 360.0;
    }
    if angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

/// Welt-Koordinaten des Dokuments → Editor-Position (Inverse des
/// Export-Transforms).
fn to_editor(x: f32, y: f32, global: &GlobalTransform) -> Vec2 {
    let rotation_rad = global.rotation_degrees.to_radians();
    let (sin_r, cos_r) = rotation_rad.sin_cos();
    let rotated_forward = x - global.offset_forward;
    let rotated_lateral = -(y - global.offset_lateral);
    let forward = rotated_forward * cos_r + rotated_lateral * sin_r;
    let lateral = -rotated_forward * sin_r + rotated_lateral * cos_r;
    Vec2::new(lateral, forward)
}

/// Importiert ein Track-XML-Dokument und ersetzt die Szene.
///
/// Das Dokument wird erst vollstaendig geparst, bevor die Szene geleert
/// wird: ein fatal fehlerhaftes Dokument laesst die bestehende Szene
/// unveraendert. Unbekannte Objekttypen werden mit Warnung uebersprungen,
/// haengende Attachments geloest. Liefert den globalen Transform aus dem
/// Dokument-Kopf.
pub fn import_scene(
    xml_content: &str,
    scene: &mut SceneRegistry,
    frame: &GridFrame,
    settings: &SnapSettings,
) -> Result<GlobalTransform, EditorError> {
    let (global, records) = parse_track_xml(xml_content)
        .map_err(|e| EditorError::MalformedDocument(format!("{e:#}")))?;

    scene.clear();

    let mut seen_stack_groups: HashSet<u64> = HashSet::new();
    let mut seen_composite_groups: HashSet<u64> = HashSet::new();

    for record in records {
        // Stack- und Composite-Gruppen: nur der erste Record der Gruppe
        // traegt den Basis-Zustand, die uebrigen sind abgeleitete Kopien
        if let Some(meta) = &record.meta {
            if let Some(group) = meta.stack_group_id {
                if !seen_stack_groups.insert(group) {
                    continue;
                }
            }
            if let Some(group) = meta.composite_group_id {
                if !seen_composite_groups.insert(group) {
                    continue;
                }
            }
        }

        let Some(config) = resolve_config(
            record.meta.as_ref().map(|m| m.type_id.as_str()),
            record.include_file.as_deref(),
            record.macro_name.as_deref(),
        ) else {
            log::warn!(
                "Import: Objekttyp nicht aufloesbar (Entity {:?}, Include {:?}, Macro {:?}), Record uebersprungen",
                record.entity_name,
                record.include_file,
                record.macro_name
            );
            continue;
        };

        let position = to_editor(record.x, record.y, &global);
        let angle =
            normalize_editor_angle(record.angle_degrees - global.rotation_degrees - 90.0);

        let meta = record.meta.as_ref();
        let entity_name = meta
            .map(|m| m.entity_name.clone())
            .or(record.entity_name)
            .unwrap_or_else(|| scene.allocate_entity_name(config.entity_prefix));

        let attachment = meta.and_then(|m| {
            let target = m.attached_to?;
            let side = m.attachment_side?;
            Some(Attachment {
                target,
                side,
                level: m.attached_level.unwrap_or(1),
            })
        });

        let object = PlacedObject {
            id: meta.map(|m| m.id).unwrap_or(0),
            config,
            entity_name,
            position,
            angle,
            altitude: record.z,
            attachment,
            stack_count: config
                .is_stackable_gate()
                .then(|| meta.and_then(|m| m.stack_count).unwrap_or(1)),
        };
        scene.insert_imported(object);
    }

    // Attachments erst aufloesen, wenn alle Objekte existieren
    for id in scene.ids() {
        let Some(object) = scene.find(id) else {
            continue;
        };
        let Some(att) = object.attachment else {
            continue;
        };
        if scene.find(att.target).is_none() {
            log::warn!(
                "Import: Attachment von {} zeigt auf fehlendes Objekt {}, geloest",
                id,
                att.target
            );
            if let Some(object) = scene.find_mut(id) {
                object.attachment = None;
            }
        } else {
            attachment::refresh_attached(scene, id);
        }
    }

    resnap_scene(scene, frame, settings);

    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_editor_angle() {
        assert_relative_eq!(normalize_editor_angle(270.0), -90.0);
        assert_relative_eq!(normalize_editor_angle(-270.0), 90.0);
        assert_relative_eq!(normalize_editor_angle(180.0), 180.0);
        assert_relative_eq!(normalize_editor_angle(0.0), 0.0);
    }

    #[test]
    fn test_editor_transform_inverts_world_transform() {
        let global = GlobalTransform {
            offset_forward: 30.0,
            offset_lateral: -60.0,
            rotation_degrees: 35.0,
        };
        // Welt (x=vorwaerts, y=-lateral): Editor (3.5, 16.1) hinschicken
        // und zurueckholen
        let rad = global.rotation_degrees.to_radians();
        let (s, c) = rad.sin_cos();
        let (forward, lateral) = (16.1_f32, 3.5_f32);
        let world_x = forward * c - lateral * s + global.offset_forward;
        let world_y = -(forward * s + lateral * c) + global.offset_lateral;

        let editor = to_editor(world_x, world_y, &global);
        assert_relative_eq!(editor.x, lateral, epsilon = 1e-4);
        assert_relative_eq!(editor.y, forward, epsilon = 1e-4);
    }

    #[test]
    fn test_parse_collects_only_entity_records() {
        let xml = r#"<Simulation>
  <Include file="/Data/Simulations/Multirotor/Locations/BaylandsPark.xml"/>
  <Macro name="Centered5x5Gate">
    <Transform x="-1.05">
      <Include file="/Data/Simulations/Multirotor/5x5Gate.xml"/>
    </Transform>
  </Macro>
  <Transform x="30" y="-60">
    <Entity name="Track">
      <Transform x="0" y="0">
        <Transform>
          <Include file="/Data/Simulations/Multirotor/7x7Mat.xml"/>
        </Transform>
      </Transform>
      <Transform x="16.000" y="0.000" z="0.000" angleDegrees="90.0" rz="-1">
        <Entity name="gate1">
          <Include file="/Data/Simulations/Multirotor/5x5Gate.xml"/>
        </Entity>
      </Transform>
    </Entity>
  </Transform>
</Simulation>"#;

        let (_, records) = parse_track_xml(xml).unwrap();
        // Track-Wrapper hat kein direktes Include und zaehlt als Record
        // ohne aufloesbaren Typ; gate1 ist der einzige echte Objekt-Record
        let resolvable: Vec<_> = records
            .iter()
            .filter(|r| {
                resolve_config(
                    r.meta.as_ref().map(|m| m.type_id.as_str()),
                    r.include_file.as_deref(),
                    r.macro_name.as_deref(),
                )
                .is_some()
            })
            .collect();
        assert_eq!(resolvable.len(), 1);
        assert_eq!(resolvable[0].entity_name.as_deref(), Some("gate1"));
        assert_relative_eq!(resolvable[0].x, 16.0);
        assert_relative_eq!(resolvable[0].angle_degrees, 90.0);
    }

    #[test]
    fn test_comment_meta_binds_to_next_transform() {
        let xml = r#"<Simulation>
      <!-- EditorMeta: {"scope":"global","globalOffsetX":5.0,"globalOffsetY":-2.0,"globalRotation":0.0} -->
  <Transform>
    <Entity name="Track">
      <!-- EditorMeta: {"typeId":"gate-5x5","id":7,"entityName":"gate7","attachedTo":null,"attachmentSide":null,"attachedLevel":null,"stackCount":1} -->
      <Transform x="16.0" y="0.0" z="0.0" angleDegrees="90.0">
        <Entity name="gate7">
          <Include file="/Data/Simulations/Multirotor/5x5Gate.xml"/>
        </Entity>
      </Transform>
    </Entity>
  </Transform>
</Simulation>"#;

        let (global, records) = parse_track_xml(xml).unwrap();
        assert_relative_eq!(global.offset_forward, 5.0);
        assert_relative_eq!(global.offset_lateral, -2.0);

        let record = records
            .iter()
            .find(|r| r.entity_name.as_deref() == Some("gate7"))
            .unwrap();
        let meta = record.meta.as_ref().unwrap();
        assert_eq!(meta.type_id, "gate-5x5");
        assert_eq!(meta.id, 7);
    }

    #[test]
    fn test_malformed_document_rejected_without_clearing_scene() {
        let mut scene = SceneRegistry::new();
        scene.create("gate-5x5", Vec2::new(0.0, 16.0)).unwrap();

        let err = import_scene(
            "<Simulation><Transform></Simulation>",
            &mut scene,
            &GridFrame::default(),
            &SnapSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::MalformedDocument(_)));
        assert_eq!(scene.len(), 1, "Szene muss unveraendert bleiben");
    }

    #[test]
    fn test_unknown_type_skipped_with_remaining_imported() {
        let xml = r#"<Simulation>
  <Transform>
    <Entity name="Track">
      <Transform x="16.0" y="0.0" z="0.0" angleDegrees="90.0">
        <Entity name="mystery1">
          <Include file="/Data/Unbekannt.xml"/>
        </Entity>
      </Transform>
      <Transform x="20.0" y="0.0" z="0.0" angleDegrees="90.0">
        <Entity name="gate1">
          <Include file="/Data/Simulations/Multirotor/5x5Gate.xml"/>
        </Entity>
      </Transform>
    </Entity>
  </Transform>
</Simulation>"#;

        let mut scene = SceneRegistry::new();
        import_scene(
            xml,
            &mut scene,
            &GridFrame::default(),
            &SnapSettings::default(),
        )
        .unwrap();
        assert_eq!(scene.len(), 1);
        let object = scene.all().next().unwrap();
        assert_eq!(object.config.id, "gate-5x5");
        assert_eq!(object.entity_name, "gate1");
    }

    #[test]
    fn test_dangling_attachment_cleared_on_import() {
        let xml = r#"<Simulation>
  <Transform>
    <Entity name="Track">
      <!-- EditorMeta: {"typeId":"padded-pole","id":2,"entityName":"pole1","attachedTo":99,"attachmentSide":"left","attachedLevel":1,"stackCount":null} -->
      <Transform x="16.0" y="0.0" z="2.25" angleDegrees="90.0">
        <Entity name="pole1">
          <Include file="/Data/Simulations/Multirotor/PaddedPole.xml"/>
        </Entity>
      </Transform>
    </Entity>
  </Transform>
</Simulation>"#;

        let mut scene = SceneRegistry::new();
        import_scene(
            xml,
            &mut scene,
            &GridFrame::default(),
            &SnapSettings::default(),
        )
        .unwrap();
        let pole = scene.all().next().unwrap();
        assert!(pole.attachment.is_none());
    }

    #[test]
    fn test_stack_records_deduplicated() {
        let record = |name: &str, index: u8, z: f32| {
            format!(
                r#"      <!-- EditorMeta: {{"typeId":"gate-5x5","id":4,"entityName":"gate4","attachedTo":null,"attachmentSide":null,"attachedLevel":null,"stackCount":2,"stackGroupId":4,"stackIndex":{index}}} -->
      <Transform x="16.0" y="0.0" z="{z}" angleDegrees="90.0">
        <Entity name="{name}">
          <Include file="/Data/Simulations/Multirotor/5x5Gate.xml"/>
        </Entity>
      </Transform>"#
            )
        };
        let xml = format!(
            "<Simulation>\n  <Transform>\n    <Entity name=\"Track\">\n{}\n{}\n    </Entity>\n  </Transform>\n</Simulation>",
            record("gate4", 1, 0.0),
            record("gate4_stack2", 2, 2.1),
        );

        let mut scene = SceneRegistry::new();
        import_scene(
            &xml,
            &mut scene,
            &GridFrame::default(),
            &SnapSettings::default(),
        )
        .unwrap();

        assert_eq!(scene.len(), 1, "Stack-Gruppe muss zu einem Objekt werden");
        let gate = scene.all().next().unwrap();
        assert_eq!(gate.entity_name, "gate4");
        assert_eq!(gate.stack_count, Some(2));
        assert_relative_eq!(gate.altitude, 0.0);
    }

    #[test]
    fn test_import_raises_name_counters() {
        let xml = r#"<Simulation>
  <Transform>
    <Entity name="Track">
      <Transform x="16.0" y="0.0" z="0.0" angleDegrees="90.0">
        <Entity name="gate9">
          <Include file="/Data/Simulations/Multirotor/5x5Gate.xml"/>
        </Entity>
      </Transform>
    </Entity>
  </Transform>
</Simulation>"#;

        let mut scene = SceneRegistry::new();
        import_scene(
            xml,
            &mut scene,
            &GridFrame::default(),
            &SnapSettings::default(),
        )
        .unwrap();
        let fresh = scene.create("gate-5x5", Vec2::new(4.2, 16.0)).unwrap();
        assert_eq!(scene.find(fresh).unwrap().entity_name, "gate10");
    }
}
