//! Statischer Katalog aller platzierbaren Objekttypen.
//!
//! Reine Daten, kein Verhalten: alle anderen Komponenten lesen den Katalog
//! nur. Die Eintraege spiegeln die Include-Dateien bzw. Macros des
//! Simulators wider.

/// Art der Platzierung im exportierten Dokument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    /// Direkter `<Include file="..."/>`-Verweis
    Include,
    /// `<Instance macro="..."/>`-Kurzform
    Macro,
    /// Mehrere fest gekoppelte Teile mit relativen Hoehen-Offsets
    Composite,
}

/// Ein Teil eines Composite-Objekts.
#[derive(Debug, Clone, Copy)]
pub struct CompositePart {
    /// Include-Datei des Teils (alternativ zu `macro_name`)
    pub include_file: Option<&'static str>,
    /// Macro-Name des Teils (alternativ zu `include_file`)
    pub macro_name: Option<&'static str>,
    /// Hoehen-Offset relativ zur Basis-Altitude des Objekts (Meter)
    pub altitude: f32,
}

/// Korrektur zwischen Render-Anker und tatsaechlichem Bodenkontaktpunkt.
#[derive(Debug, Clone, Copy)]
pub enum AnchorOffset {
    /// Expliziter Offset in Metern
    Meters(f32),
    /// Anteil der gerenderten Icon-Hoehe in Pixeln
    IconRatio(f32),
}

/// Baseline-Anteil des Gate-Icons (Kontaktpunkt liegt 50 von 638 Pixeln
/// ueber der Unterkante des Bildes).
pub const GATE_ICON_BASELINE: f32 = 50.0 / 638.0;
/// Baseline-Anteil des Flaggen-Icons.
pub const FLAG_ICON_BASELINE: f32 = 285.0 / 2000.0;
/// Baseline-Anteil der Cube-/Ladder-Icons.
pub const CUBE_ICON_BASELINE: f32 = 70.0 / 500.0;

/// Unveraenderliche Konfiguration eines platzierbaren Objekttyps.
#[derive(Debug)]
pub struct ObjectTypeConfig {
    /// Typ-Identifier (z.B. `gate-5x5`)
    pub id: &'static str,
    /// Anzeigename fuer die Palette
    pub label: &'static str,
    /// Prefix fuer die fortlaufende Entity-Namensvergabe
    pub entity_prefix: &'static str,
    /// Art der Platzierung im Export
    pub placement: PlacementKind,
    /// Include-Datei (bei `PlacementKind::Include`)
    pub include_file: Option<&'static str>,
    /// Macro-Name (bei `PlacementKind::Macro`)
    pub macro_name: Option<&'static str>,
    /// Nominale Breite in Metern
    pub width: f32,
    /// Nominale Hoehe in Metern
    pub height: f32,
    /// Abweichende Darstellungsbreite (Meter), falls das Icon groesser ist
    pub visual_width: Option<f32>,
    /// Abweichende Darstellungshoehe (Meter)
    pub visual_height: Option<f32>,
    /// Feste Basis-Altitude in Metern
    pub altitude: f32,
    /// Anker-Korrektur des Icons
    pub anchor_offset: Option<AnchorOffset>,
    /// Vertikaler Abstand gestapelter Instanzen; Default ist `height`
    pub stack_spacing: Option<f32>,
    /// Zusaetzlicher Hoehen-Offset beim Anheften an ein Gate
    pub attach_height_offset: Option<f32>,
    /// Teile eines Composite-Objekts (leer fuer alle anderen)
    pub composite_parts: &'static [CompositePart],
    /// In der Palette ausgeblendet (reines Host-Flag, vom Kern ignoriert)
    pub palette_hidden: bool,
}

impl ObjectTypeConfig {
    /// Darstellungsbreite in Metern (Fallback: nominale Breite).
    pub fn visual_width(&self) -> f32 {
        self.visual_width.unwrap_or(self.width)
    }

    /// Darstellungshoehe in Metern (Fallback: nominale Hoehe).
    pub fn visual_height(&self) -> f32 {
        self.visual_height.unwrap_or(self.height)
    }

    /// Gate-Typen unterliegen Mindestabstand und Attachments.
    pub fn is_gate(&self) -> bool {
        matches!(self.id, "gate-5x5" | "gate-7x7" | "start-finish-5x5")
    }

    /// Stapelbare Gates duerfen einen Stack-Count von 1–3 tragen.
    pub fn is_stackable_gate(&self) -> bool {
        matches!(self.id, "gate-5x5" | "start-finish-5x5")
    }

    /// Anheftbare (pole-artige) Objekte.
    pub fn is_attachable(&self) -> bool {
        self.id == "padded-pole"
    }

    /// Vertikaler Abstand gestapelter Instanzen in Metern.
    pub fn stack_spacing(&self) -> f32 {
        self.stack_spacing.unwrap_or(self.height)
    }
}

const fn include_entry(
    id: &'static str,
    label: &'static str,
    entity_prefix: &'static str,
    include_file: &'static str,
    width: f32,
    height: f32,
    anchor_offset: Option<AnchorOffset>,
) -> ObjectTypeConfig {
    ObjectTypeConfig {
        id,
        label,
        entity_prefix,
        placement: PlacementKind::Include,
        include_file: Some(include_file),
        macro_name: None,
        width,
        height,
        visual_width: None,
        visual_height: None,
        altitude: 0.0,
        anchor_offset,
        stack_spacing: None,
        attach_height_offset: None,
        composite_parts: &[],
        palette_hidden: false,
    }
}

const fn macro_entry(
    id: &'static str,
    label: &'static str,
    entity_prefix: &'static str,
    macro_name: &'static str,
) -> ObjectTypeConfig {
    ObjectTypeConfig {
        id,
        label,
        entity_prefix,
        placement: PlacementKind::Macro,
        include_file: None,
        macro_name: Some(macro_name),
        width: 2.1,
        height: 2.1,
        visual_width: None,
        visual_height: None,
        altitude: 0.0,
        anchor_offset: Some(AnchorOffset::IconRatio(CUBE_ICON_BASELINE)),
        stack_spacing: None,
        attach_height_offset: None,
        composite_parts: &[],
        palette_hidden: false,
    }
}

/// Teile des Pipe-Flag-Composites: Cube-Sockel plus Flagge obendrauf.
const PIPE_FLAG_PARTS: &[CompositePart] = &[
    CompositePart {
        include_file: None,
        macro_name: Some("PipeCube"),
        altitude: 0.0,
    },
    CompositePart {
        include_file: Some("/Data/Simulations/Multirotor/FlagPassLeft.xml"),
        macro_name: None,
        altitude: 2.1,
    },
];

/// Geordneter Katalog aller Objekttypen. Die Reihenfolge bestimmt die
/// Palette im Host.
pub const OBJECT_CATALOG: &[ObjectTypeConfig] = &[
    include_entry(
        "start-finish-5x5",
        "5x5 Start/Finish Gate",
        "gate",
        "/Data/Simulations/Multirotor/5x5StartFinishGate.xml",
        2.1,
        2.1,
        Some(AnchorOffset::IconRatio(GATE_ICON_BASELINE)),
    ),
    include_entry(
        "gate-5x5",
        "5x5 Gate",
        "gate",
        "/Data/Simulations/Multirotor/5x5Gate.xml",
        2.1,
        2.1,
        Some(AnchorOffset::IconRatio(GATE_ICON_BASELINE)),
    ),
    ObjectTypeConfig {
        palette_hidden: true,
        ..include_entry(
            "c-gate-5x5",
            "c-5x5 Gate",
            "gate",
            "/Data/Simulations/Multirotor/Centered5x5Gate.xml",
            2.1,
            2.1,
            None,
        )
    },
    include_entry(
        "gate-7x7",
        "7x7 Gate",
        "gate",
        "/Data/Simulations/Multirotor/7x7Gate.xml",
        2.1,
        2.1,
        Some(AnchorOffset::IconRatio(GATE_ICON_BASELINE)),
    ),
    include_entry(
        "shade-canopy",
        "Shade Canopy",
        "shade",
        "/Data/Simulations/Multirotor/Furniture/ShadeCanopy.xml",
        6.0,
        6.0,
        None,
    ),
    include_entry(
        "flag-pass-right",
        "Flag Pass Right",
        "flag",
        "/Data/Simulations/Multirotor/FlagPassRight.xml",
        1.0,
        2.0,
        Some(AnchorOffset::IconRatio(FLAG_ICON_BASELINE)),
    ),
    include_entry(
        "flag-pass-left",
        "Flag Pass Left",
        "flag",
        "/Data/Simulations/Multirotor/FlagPassLeft.xml",
        1.0,
        2.0,
        Some(AnchorOffset::IconRatio(FLAG_ICON_BASELINE)),
    ),
    macro_entry("pipe-double-cube", "Pipe Double Cube", "cube", "PipeDoubleCube"),
    macro_entry("pipe-cube", "Pipe Cube", "cube", "PipeCube"),
    macro_entry("pipe-ladder", "Pipe Ladder", "ladder", "PipeLadder"),
    macro_entry(
        "pipe-quadruple-ladder",
        "Pipe Quadruple Ladder",
        "ladder",
        "PipeQuadrupleLadder",
    ),
    include_entry(
        "metal-launch-stand",
        "Metal Launch Stand",
        "launch",
        "/Data/Simulations/Multirotor/LaunchStands/MetalLaunchStand.xml",
        2.0,
        2.0,
        None,
    ),
    include_entry(
        "mat-7x7",
        "7x7 Mat",
        "mat",
        "/Data/Simulations/Multirotor/7x7Mat.xml",
        7.0,
        7.0,
        None,
    ),
    ObjectTypeConfig {
        attach_height_offset: Some(0.15),
        ..include_entry(
            "padded-pole",
            "Padded Pole",
            "pole",
            "/Data/Simulations/Multirotor/PaddedPole.xml",
            0.6,
            2.0,
            Some(AnchorOffset::IconRatio(FLAG_ICON_BASELINE)),
        )
    },
    ObjectTypeConfig {
        id: "pipe-flag",
        label: "Pipe Flag",
        entity_prefix: "pipeflag",
        placement: PlacementKind::Composite,
        include_file: None,
        macro_name: None,
        width: 2.1,
        height: 2.1,
        visual_width: None,
        visual_height: Some(4.2),
        altitude: 0.0,
        anchor_offset: Some(AnchorOffset::IconRatio(CUBE_ICON_BASELINE)),
        stack_spacing: None,
        attach_height_offset: None,
        composite_parts: PIPE_FLAG_PARTS,
        palette_hidden: false,
    },
];

/// Sucht einen Katalogeintrag per Typ-Identifier.
pub fn find_config(type_id: &str) -> Option<&'static ObjectTypeConfig> {
    OBJECT_CATALOG.iter().find(|entry| entry.id == type_id)
}

/// Prioritisierte Typ-Aufloesung fuer den Import:
/// Typ-Identifier → Include-Datei → Macro-Name.
pub fn resolve_config(
    type_id: Option<&str>,
    include_file: Option<&str>,
    macro_name: Option<&str>,
) -> Option<&'static ObjectTypeConfig> {
    if let Some(id) = type_id {
        if let Some(config) = find_config(id) {
            return Some(config);
        }
    }
    if let Some(file) = include_file {
        if let Some(config) = OBJECT_CATALOG
            .iter()
            .find(|entry| entry.include_file == Some(file))
        {
            return Some(config);
        }
    }
    if let Some(name) = macro_name {
        if let Some(config) = OBJECT_CATALOG
            .iter()
            .find(|entry| entry.macro_name == Some(name))
        {
            return Some(config);
        }
    }
    None
}
