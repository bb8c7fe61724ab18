//! Benachrichtigungen an den einbettenden Host.
//!
//! Der Controller mutiert nur den Kern-Zustand; der Host liest die Queue
//! nach jedem Aufruf aus und synchronisiert seine Render-Objekte anhand
//! der Objekt-IDs.

/// Eine Zustandsaenderung, auf die der Host reagieren muss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNotification {
    /// Neues Objekt, Render-Darstellung anlegen
    ObjectCreated(u64),
    /// Transform, Altitude oder Attachment-Zustand geaendert
    ObjectUpdated(u64),
    /// Objekt entfernt, Render-Darstellung abbauen
    ObjectRemoved(u64),
    /// Szene komplett ersetzt (Import oder Clear), alles neu aufbauen
    SceneReplaced,
    /// Selektion geaendert
    SelectionChanged(Option<u64>),
}
