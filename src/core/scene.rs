//! Die Szenen-Registry: besitzt alle platzierten Objekte.
//!
//! Objekte liegen in einer `IndexMap`, damit `all()` die
//! Einfuege-Reihenfolge liefert — der Export ist dadurch deterministisch.

use super::catalog::{find_config, ObjectTypeConfig};
use super::placed_object::PlacedObject;
use crate::error::EditorError;
use glam::Vec2;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Entity-Namen enden auf eine laufende Nummer (`gate12` → `gate` + 12).
static ENTITY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(\d+)$").expect("statische Regex"));

/// Besitzt die platzierten Objekte sowie die Namens- und ID-Vergabe.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    objects: IndexMap<u64, PlacedObject>,
    entity_counters: HashMap<String, u32>,
    next_id: u64,
}

impl SceneRegistry {
    /// Erstellt eine leere Szene.
    pub fn new() -> Self {
        Self {
            objects: IndexMap::new(),
            entity_counters: HashMap::new(),
            next_id: 1,
        }
    }

    /// Vergibt die naechste freie Objekt-ID (atomar, kein Suspendieren
    /// zwischen Lesen und Erhoehen).
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Vergibt den naechsten Entity-Namen fuer einen Prefix.
    /// Nummern werden nie wiederverwendet, auch nicht nach Loeschungen.
    pub fn allocate_entity_name(&mut self, prefix: &str) -> String {
        let counter = self.entity_counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}{counter}")
    }

    /// Hebt den Namens-Zaehler mindestens auf die Nummer eines importierten
    /// Namens an, damit spaeter vergebene Namen nicht kollidieren.
    pub fn raise_counter_from_name(&mut self, name: &str) {
        let Some(caps) = ENTITY_NAME_RE.captures(name) else {
            return;
        };
        let prefix = &caps[1];
        let Ok(number) = caps[2].parse::<u32>() else {
            return;
        };
        let counter = self.entity_counters.entry(prefix.to_string()).or_insert(0);
        *counter = (*counter).max(number);
    }

    /// Erstellt ein neues Objekt aus dem Katalog an der gegebenen Position.
    pub fn create(&mut self, type_id: &str, position: Vec2) -> Result<u64, EditorError> {
        let config = find_config(type_id)
            .ok_or_else(|| EditorError::UnknownType(type_id.to_string()))?;
        let id = self.allocate_id();
        let entity_name = self.allocate_entity_name(config.entity_prefix);
        let object = PlacedObject {
            id,
            config,
            entity_name,
            position,
            angle: 0.0,
            altitude: config.altitude,
            attachment: None,
            stack_count: config.is_stackable_gate().then_some(1),
        };
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Fuegt ein per Import rekonstruiertes Objekt ein. ID und Entity-Name
    /// bleiben erhalten; Zaehler werden angehoben. Kollidierende IDs
    /// erhalten selbstheilend eine frische ID.
    pub fn insert_imported(&mut self, mut object: PlacedObject) -> u64 {
        if object.id == 0 {
            // Record ohne Metadaten, der Normalfall bei fremden Dokumenten
            object.id = self.allocate_id();
            log::debug!("Import: Objekt ohne ID-Metadaten, vergebe {}", object.id);
        } else if self.objects.contains_key(&object.id) {
            let fresh = self.allocate_id();
            log::warn!(
                "Import: Objekt-ID {} kollidiert, vergebe {}",
                object.id,
                fresh
            );
            object.id = fresh;
        }
        self.next_id = self.next_id.max(object.id + 1);
        self.raise_counter_from_name(&object.entity_name);
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Dupliziert ein Objekt an versetzter Position.
    ///
    /// Attachment- und Stack-Zustand werden mitkopiert; das Attachment-Ziel
    /// bleibt dasselbe Gate wie beim Original, zwei Poles koennen danach
    /// also auf ein Gate zeigen.
    pub fn duplicate(&mut self, source_id: u64, offset: Vec2) -> Result<u64, EditorError> {
        let source = self
            .objects
            .get(&source_id)
            .ok_or(EditorError::MissingObject(source_id))?;
        let mut clone = source.clone();
        clone.position += offset;

        let id = self.allocate_id();
        clone.id = id;
        clone.entity_name = self.allocate_entity_name(clone.config.entity_prefix);
        self.objects.insert(id, clone);
        Ok(id)
    }

    /// Entfernt ein Objekt. Attachments anderer Objekte, die darauf zeigen,
    /// werden vorher geloescht — nie haengen gelassen.
    pub fn remove(&mut self, id: u64) -> Option<PlacedObject> {
        if !self.objects.contains_key(&id) {
            return None;
        }
        for object in self.objects.values_mut() {
            if object.attachment.is_some_and(|a| a.target == id) {
                object.attachment = None;
            }
        }
        self.objects.shift_remove(&id)
    }

    /// IDs aller Objekte, die an das gegebene Ziel angeheftet sind.
    pub fn dependents_of(&self, target_id: u64) -> Vec<u64> {
        self.objects
            .values()
            .filter(|o| o.attachment.is_some_and(|a| a.target == target_id))
            .map(|o| o.id)
            .collect()
    }

    /// Entfernt alle Objekte und setzt die Namens-Zaehler zurueck.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.entity_counters.clear();
        self.next_id = 1;
    }

    /// Findet ein Objekt per ID.
    pub fn find(&self, id: u64) -> Option<&PlacedObject> {
        self.objects.get(&id)
    }

    /// Findet ein Objekt per ID (mutabel).
    pub fn find_mut(&mut self, id: u64) -> Option<&mut PlacedObject> {
        self.objects.get_mut(&id)
    }

    /// Alle Objekte in Einfuege-Reihenfolge.
    pub fn all(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.values()
    }

    /// IDs aller Objekte in Einfuege-Reihenfolge.
    pub fn ids(&self) -> Vec<u64> {
        self.objects.keys().copied().collect()
    }

    /// Positionen aller Gates ausser dem angegebenen Objekt.
    pub fn other_gate_positions(&self, excluded_id: u64) -> Vec<Vec2> {
        self.objects
            .values()
            .filter(|o| o.id != excluded_id && o.config.is_gate())
            .map(|o| o.position)
            .collect()
    }

    /// Anzahl der Objekte.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Prueft ob die Szene leer ist.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Katalog-Konfiguration eines Objekts, falls vorhanden.
    pub fn config_of(&self, id: u64) -> Option<&'static ObjectTypeConfig> {
        self.objects.get(&id).map(|o| o.config)
    }
}
