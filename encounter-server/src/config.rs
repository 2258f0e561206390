//! Compile-time settings shared by the tracker, renderer and launcher.

/// Most verbose level forwarded to the browser console.
pub const LOG_LEVEL: log::Level = log::Level::Info;

/// Session storage key holding the round counter.
pub const ROUND_STORAGE_KEY: &str = "current_round";

/// Exported encounter files are named `<prefix><timestamp>.json`.
pub const EXPORT_PREFIX: &str = "encounter_";
pub const EXPORT_MIME: &str = "application/json";

/// Window name and features for `a[target=popup]` links.
pub const POPUP_WINDOW: &str = "popup";
pub const POPUP_FEATURES: &str = "width=400,height=450";

/// Window the encounter launcher opens the tracker in.
pub const LAUNCH_WINDOW: &str = "initiative";
pub const ENCOUNTER_ENDPOINT: &str = "/encounter";

/// Keyboard key that advances the turn.
pub const NEXT_TURN_KEY: &str = "n";

/// Die rolled for reinforcement initiative (plus the creature's modifier).
pub const INITIATIVE_DIE: u32 = 20;

/// Upper bound on a single reinforcement request.
pub const MAX_REINFORCEMENTS: u32 = 50;

/// Largest dice count and die size accepted in a size expression.
pub const MAX_DICE_COUNT: u32 = 100;
pub const MAX_DICE_SIDES: u32 = 1000;
