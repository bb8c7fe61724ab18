//! Zentrale Konfiguration für den Track-Editor.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

// ── Grid & Snapping ─────────────────────────────────────────────────

/// Standard-Gridweite in Metern.
pub const DEFAULT_GRID_SIZE_METERS: f32 = 0.7;
/// Standard-Rotations-Rastung in Grad.
pub const DEFAULT_ROTATION_SNAP_DEGREES: f32 = 5.0;
/// Hauptgitter-Abstand in Metern (entspricht einer Gate-Breite).
pub const MAJOR_GRID_METERS: f32 = 2.1;

// ── Platzierung ─────────────────────────────────────────────────────

/// Vorwaerts-Abstand neuer Objekte vom Startpunkt in Metern.
pub const DEFAULT_FORWARD_OFFSET_METERS: f32 = 16.0;

/// Alle zur Laufzeit änderbaren Editor-Optionen.
/// Wird als `drone_track_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorOptions {
    // ── Grid ────────────────────────────────────────────────────
    /// Gridweite in Metern
    pub grid_size_meters: f32,
    /// Rotations-Rastung in Grad
    pub rotation_snap_degrees: f32,

    // ── Globaler Export-Transform ───────────────────────────────
    /// Vorwaerts-Offset des Welt-Ursprungs in Metern
    pub global_offset_forward: f32,
    /// Lateral-Offset des Welt-Ursprungs in Metern
    pub global_offset_lateral: f32,
    /// Globale Drehung der Strecke in Grad
    pub global_rotation_degrees: f32,

    // ── Darstellung ─────────────────────────────────────────────
    /// Referenz-Layout als Hintergrund-Layer anzeigen
    #[serde(default)]
    pub show_reference_layout: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            grid_size_meters: DEFAULT_GRID_SIZE_METERS,
            rotation_snap_degrees: DEFAULT_ROTATION_SNAP_DEGREES,
            global_offset_forward: 0.0,
            global_offset_lateral: 0.0,
            global_rotation_degrees: 0.0,
            show_reference_layout: false,
        }
    }
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("drone_track_editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("drone_track_editor.toml")
    }
}
