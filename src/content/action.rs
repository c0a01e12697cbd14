//! Actions and move effects as authored in content data

use serde::{Deserialize, Serialize};

/// Damage families; each maps to an attack and a defense stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Physical,
    Sword,
    Bow,
    Magic,
}

impl DamageType {
    /// Tag carried by damage of this type
    pub fn tag(&self) -> &'static str {
        match self {
            DamageType::Physical => "physical",
            DamageType::Sword => "sword",
            DamageType::Bow => "bow",
            DamageType::Magic => "magic",
        }
    }
}

/// Hit-roll families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyType {
    Physical,
    Sword,
    Bow,
    Magic,
}

/// Who an effect lands on once the action resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetHint {
    /// Every target that was hit
    #[default]
    Selected,
    /// One target picked at random from those hit
    Random,
    /// The acting unit, before any hit roll
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    AddCondition {
        condition: String,
    },
    AddStatus {
        status: String,
    },
    Damage {
        damage_type: DamageType,
        power: f64,
        #[serde(default)]
        element: Option<String>,
        #[serde(default)]
        add_status: Option<String>,
        /// Percent chance of `add_status` landing
        #[serde(default)]
        status_chance: Option<f64>,
        /// Fraction of the damage dealt back to the user
        #[serde(default)]
        recoil: Option<f64>,
    },
    Devour,
    FullRecover,
    Heal {
        power: f64,
        #[serde(default)]
        add_status: Option<String>,
        #[serde(default)]
        status_chance: Option<f64>,
    },
    InstaKill {
        damage_type: DamageType,
    },
    LiftStatus {
        statuses: Vec<String>,
    },
    LiftStatusTags {
        tags: Vec<String>,
    },
    /// Restore a percentage of max HP
    RecoverHp {
        strength: f64,
    },
    RecoverMp,
    Revive {
        #[serde(default)]
        heal_to_full: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(default)]
    pub target_hint: TargetHint,
    #[serde(flatten)]
    pub kind: EffectKind,
    /// Set by hooks to drop this effect from the current resolution
    #[serde(skip)]
    pub suppressed: bool,
}

impl Effect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            target_hint: TargetHint::Selected,
            kind,
            suppressed: false,
        }
    }

    pub fn with_hint(mut self, hint: TargetHint) -> Self {
        self.target_hint = hint;
        self
    }

    pub fn is_damage(&self) -> bool {
        matches!(self.kind, EffectKind::Damage { .. })
    }

    pub fn element(&self) -> Option<&str> {
        match &self.kind {
            EffectKind::Damage { element, .. } => element.as_deref(),
            _ => None,
        }
    }

    /// Scale the power of a damage or heal effect
    pub fn scale_power(&mut self, factor: f64) {
        match &mut self.kind {
            EffectKind::Damage { power, .. } | EffectKind::Heal { power, .. } => {
                *power = (*power * factor).round().max(1.0);
            }
            _ => {}
        }
    }

    pub fn power(&self) -> Option<f64> {
        match &self.kind {
            EffectKind::Damage { power, .. } | EffectKind::Heal { power, .. } => Some(*power),
            _ => None,
        }
    }
}

fn default_rank() -> u32 {
    2
}

fn default_accuracy_rate() -> f64 {
    1.0
}

/// One resolvable step of a move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub announce_as: Option<String>,
    #[serde(default = "default_rank")]
    pub rank: u32,
    #[serde(default)]
    pub accuracy_type: Option<AccuracyType>,
    #[serde(default = "default_accuracy_rate")]
    pub accuracy_rate: f64,
    #[serde(default)]
    pub is_melee: bool,
    #[serde(default)]
    pub preserve_guard: bool,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Action {
    pub fn new(rank: u32) -> Self {
        Self {
            announce_as: None,
            rank,
            accuracy_type: None,
            accuracy_rate: 1.0,
            is_melee: false,
            preserve_guard: false,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Iterate live damage effects of one element
    pub fn element_effects_mut<'a>(
        &'a mut self,
        element: &'a str,
    ) -> impl Iterator<Item = &'a mut Effect> + 'a {
        self.effects
            .iter_mut()
            .filter(move |e| !e.suppressed && e.element() == Some(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_parses_from_toml() {
        let effect: Effect = toml::from_str(
            r#"
            type = "damage"
            damage_type = "sword"
            power = 5.0
            element = "fire"
            "#,
        )
        .unwrap();
        assert_eq!(effect.target_hint, TargetHint::Selected);
        assert_eq!(effect.element(), Some("fire"));
        assert_eq!(effect.power(), Some(5.0));
    }

    #[test]
    fn test_action_defaults() {
        let action: Action = toml::from_str("announce_as = \"Slash\"").unwrap();
        assert_eq!(action.rank, 2);
        assert_eq!(action.accuracy_rate, 1.0);
        assert!(action.effects.is_empty());
    }

    #[test]
    fn test_scale_power_floors_at_one() {
        let mut effect = Effect::new(EffectKind::Heal {
            power: 2.0,
            add_status: None,
            status_chance: None,
        });
        effect.scale_power(0.1);
        assert_eq!(effect.power(), Some(1.0));
    }

    #[test]
    fn test_element_filter_skips_suppressed() {
        let fire = Effect::new(EffectKind::Damage {
            damage_type: DamageType::Magic,
            power: 10.0,
            element: Some("fire".into()),
            add_status: None,
            status_chance: None,
            recoil: None,
        });
        let mut suppressed = fire.clone();
        suppressed.suppressed = true;
        let mut action = Action::new(2).with_effect(fire).with_effect(suppressed);
        assert_eq!(action.element_effects_mut("fire").count(), 1);
        assert_eq!(action.element_effects_mut("ice").count(), 0);
    }
}
