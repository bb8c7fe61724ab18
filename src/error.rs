//! Fehlertypen des Editors.
//!
//! Strukturelle Fehler (unbekannter Typ, kaputtes Dokument) brechen die
//! jeweilige Operation ab und werden an den Host gemeldet. Semantische
//! Inkonsistenzen (haengende Attachments, Level ausserhalb des Stacks)
//! heilen sich dagegen selbst und erzeugen nur ein `log::warn!`.

use thiserror::Error;

/// Fehler, die der Editor-Kern an den Host meldet.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Typ-Identifier ist nicht im Objektkatalog registriert
    #[error("Unbekannter Objekttyp: {0}")]
    UnknownType(String),

    /// Dokument konnte nicht als XML geparst werden — Import wird
    /// abgebrochen, bevor die Szene veraendert wird
    #[error("Dokument konnte nicht geparst werden: {0}")]
    MalformedDocument(String),

    /// Objekt-ID existiert nicht in der Szene
    #[error("Objekt {0} existiert nicht in der Szene")]
    MissingObject(u64),

    /// Attachment-Ziel ist kein Gate oder Quelle ist nicht anheftbar
    #[error("Objekt {0} ist kein gueltiges Attachment-Ziel")]
    InvalidAttachmentTarget(u64),
}
