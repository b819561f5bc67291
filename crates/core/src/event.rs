use crate::state::Snapshot;

/// Messages published by the background monitor task.
///
/// Sources:
/// - Sampler tick          → `Snapshot`, `TickSkipped`
/// - Config watcher task   → `ConfigReloaded`
#[derive(Debug, Clone)]
pub enum Message {
    // ── Sampler ───────────────────────────────────────────────────────────────
    /// Fresh battery snapshot, published once per successful tick.
    Snapshot(Snapshot),
    /// The driver read failed; no sample was pushed this tick.
    TickSkipped(String),

    // ── Config ────────────────────────────────────────────────────────────────
    /// Config file changed on disk and was applied; sample history restarts.
    ConfigReloaded,
}
