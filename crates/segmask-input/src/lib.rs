#![forbid(unsafe_code)]

//! Input translation for segmask.
//!
//! Hosts convert platform events into [`InputEvent`]s and call
//! [`translate`] to obtain the patch operations to apply. Platform-specific
//! modifier conventions are resolved here through [`Platform`]; the engine
//! only ever sees resolved directions, levels, and spin modifiers.
//!
//! # Terminal hosts
//!
//! Terminals deliver typed characters as key events only. Translate the key
//! first; if nothing was handled, feed [`KeyEvent::text`] back in as an
//! [`InputEvent::Text`].

pub mod event;
pub mod translate;

pub use event::{
    InputEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers, Platform, SelectionSnapshot,
};
pub use translate::{Translation, translate};

/// Translate a key, falling back to its text when the key itself was not
/// handled.
#[must_use]
pub fn translate_key_with_text(
    key: KeyEvent,
    state: &segmask_core::MaskState,
    definition: &segmask_core::MaskDefinition,
    derived: Option<&segmask_core::MaskDerivedState>,
    platform: Platform,
) -> Translation {
    let translation = translate(&InputEvent::Key(key), state, definition, derived, platform);
    if translation.suppress_default || key.kind == KeyEventKind::Release {
        return translation;
    }
    match key.text() {
        Some(data) => translate(
            &InputEvent::Text {
                data,
                composing: false,
            },
            state,
            definition,
            derived,
            platform,
        ),
        None => translation,
    }
}
