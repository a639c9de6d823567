/*!
Persistence: mirrors the in-memory annotation set into key/value storage.

Storage never originates data. Every public operation here degrades to a
sentinel (`false`, empty list, zero) instead of returning an error.

- `storage.rs` - `Storage` trait, in-memory and file-backed implementations
- `store.rs` - per-origin annotation save/load, retention, global sweep
- `autosave.rs` - debounced background writer
- `settings.rs` - settings and theme keys
*/

mod autosave;
mod settings;
mod storage;
mod store;

pub use autosave::{AutoSaver, DEFAULT_DEBOUNCE};
pub use settings::{load_settings, load_theme, save_settings, save_theme, SETTINGS_KEY, THEME_KEY};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{storage_key, sweep_expired, AnnotationStore, ANNOTATIONS_KEY_PREFIX, DEFAULT_RETENTION};
