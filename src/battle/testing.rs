//! Shared fixtures for unit tests

use std::sync::Arc;

use crate::battle::engine::{Battle, PartyMemberSetup, PartySetup};
use crate::battle::interface::ScriptedSelector;
use crate::content::ContentRegistry;
use crate::core::rng::FixedRng;

/// The bundled content file
pub(crate) fn sample_content() -> Arc<ContentRegistry> {
    let content = ContentRegistry::from_toml_str(include_str!("../../data/content.toml"))
        .expect("bundled content must load");
    Arc::new(content)
}

/// Scott at level 10 against an encounter, every roll landing low
pub(crate) fn battle_with(encounter: &str) -> Battle {
    let party = PartySetup::new(vec![PartyMemberSetup::new("scott", 10)]);
    Battle::new(
        sample_content(),
        encounter,
        &party,
        Box::new(FixedRng::new(0.0)),
    )
    .expect("fixture encounter must build")
    .with_move_selector(Box::new(ScriptedSelector::new()))
}

pub(crate) trait FrameDriverExt {
    /// Run frames until a player turn is parked; false if none came up
    fn wait_for_input(&mut self, frames: usize) -> bool;
}

impl FrameDriverExt for Battle {
    fn wait_for_input(&mut self, frames: usize) -> bool {
        for _ in 0..frames {
            if self.pending_input().is_some() {
                return true;
            }
            match self.update() {
                Ok(true) => {}
                _ => return false,
            }
        }
        self.pending_input().is_some()
    }
}
