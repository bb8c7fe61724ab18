//! Application State — zentrale Datenhaltung.

use crate::core::{GridFrame, SceneRegistry, SnapSettings};
use crate::xml::meta::GlobalTransform;

/// Gesamter veraenderlicher Editor-Zustand.
pub struct EditorState {
    /// Szene mit allen platzierten Objekten
    pub scene: SceneRegistry,
    /// Pixel↔Meter-Umrechnungsrahmen des Hosts
    pub frame: GridFrame,
    /// Aktive Snap-Einstellungen
    pub settings: SnapSettings,
    /// Globaler Export-Transform
    pub global: GlobalTransform,
    /// Aktuell selektiertes Objekt
    pub selected: Option<u64>,
}

impl EditorState {
    /// Erstellt den Startzustand mit leerer Szene und Defaults.
    pub fn new() -> Self {
        Self {
            scene: SceneRegistry::new(),
            frame: GridFrame::default(),
            settings: SnapSettings::default(),
            global: GlobalTransform::default(),
            selected: None,
        }
    }

    /// Leert Szene und Selektion. Der globale Export-Transform ist eine
    /// Dokument-Einstellung des Nutzers und ueberlebt das Leeren.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.selected = None;
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}
