//! Logical actions, control bindings and per-tick input frames

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Opaque host key identifier. The core never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

/// Default key identifiers used by the stock bindings.
pub mod keys {
    use super::KeyCode;

    pub const A: KeyCode = KeyCode(97);
    pub const D: KeyCode = KeyCode(100);
    pub const W: KeyCode = KeyCode(119);
    pub const S: KeyCode = KeyCode(115);
    pub const F: KeyCode = KeyCode(102);
    pub const G: KeyCode = KeyCode(103);
    pub const SPACE: KeyCode = KeyCode(32);

    pub const ARROW_LEFT: KeyCode = KeyCode(1_073_741_904);
    pub const ARROW_RIGHT: KeyCode = KeyCode(1_073_741_903);
    pub const ARROW_UP: KeyCode = KeyCode(1_073_741_906);
    pub const ARROW_DOWN: KeyCode = KeyCode(1_073_741_905);
    pub const PERIOD: KeyCode = KeyCode(46);
    pub const SLASH: KeyCode = KeyCode(47);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(1_073_742_053);
}

/// Logical fighter actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Left,
    Right,
    Jump,
    Attack,
    Block,
    Special,
    Dash,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Left,
        Action::Right,
        Action::Jump,
        Action::Attack,
        Action::Block,
        Action::Special,
        Action::Dash,
    ];

    /// Attack, special and dash fire once per key press rather than while held
    pub fn is_edge_triggered(self) -> bool {
        matches!(self, Action::Attack | Action::Special | Action::Dash)
    }
}

/// Binding from each logical action to a host key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub left: KeyCode,
    pub right: KeyCode,
    pub jump: KeyCode,
    pub attack: KeyCode,
    pub block: KeyCode,
    pub special: KeyCode,
    pub dash: KeyCode,
}

impl Controls {
    /// WASD side of the keyboard
    pub fn player_one() -> Self {
        Self {
            left: keys::A,
            right: keys::D,
            jump: keys::W,
            attack: keys::F,
            block: keys::S,
            special: keys::G,
            dash: keys::SPACE,
        }
    }

    /// Arrow-key side of the keyboard
    pub fn player_two() -> Self {
        Self {
            left: keys::ARROW_LEFT,
            right: keys::ARROW_RIGHT,
            jump: keys::ARROW_UP,
            attack: keys::PERIOD,
            block: keys::ARROW_DOWN,
            special: keys::SLASH,
            dash: keys::RIGHT_SHIFT,
        }
    }

    pub fn key(&self, action: Action) -> KeyCode {
        match action {
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Jump => self.jump,
            Action::Attack => self.attack,
            Action::Block => self.block,
            Action::Special => self.special,
            Action::Dash => self.dash,
        }
    }

    pub fn owns(&self, key: KeyCode) -> bool {
        Action::ALL.iter().any(|&action| self.key(action) == key)
    }

    /// Translate raw keys into the logical input combat code works with
    pub fn decode(&self, frame: &InputFrame) -> FighterInput {
        let mut input = FighterInput::default();
        for action in Action::ALL {
            let key = self.key(action);
            *input.flag_mut(action) = if action.is_edge_triggered() {
                frame.was_pressed(key)
            } else {
                frame.is_held(key)
            };
        }
        input
    }
}

/// Keys held this tick plus keys that went down this tick.
///
/// A pressed key is always also held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFrame {
    held: BTreeSet<KeyCode>,
    pressed: BTreeSet<KeyCode>,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as held without a fresh press
    pub fn hold(&mut self, key: KeyCode) -> &mut Self {
        self.held.insert(key);
        self
    }

    /// Mark a key as pressed this tick (and therefore held)
    pub fn press(&mut self, key: KeyCode) -> &mut Self {
        self.held.insert(key);
        self.pressed.insert(key);
        self
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Copy of this frame with fresh presses of keys bound in `controls` removed.
    /// The keys stay held.
    pub fn without_presses(&self, controls: &Controls) -> InputFrame {
        InputFrame {
            held: self.held.clone(),
            pressed: self
                .pressed
                .iter()
                .filter(|k| !controls.owns(**k))
                .copied()
                .collect(),
        }
    }

    /// Combine the host frame with a synthesized one for a single fighter.
    ///
    /// With no synthetic frame the real input is untouched. Otherwise the
    /// synthetic frame fully decides the state of every key bound in
    /// `controls` (an empty one releases them all); keys outside the binding
    /// keep their real state.
    pub fn merge(real: &InputFrame, synthetic: Option<&InputFrame>, controls: &Controls) -> InputFrame {
        let Some(synthetic) = synthetic else {
            return real.clone();
        };

        let keep = |key: KeyCode| !controls.owns(key);
        let take = |key: KeyCode| controls.owns(key);

        InputFrame {
            held: real
                .held
                .iter()
                .filter(|k| keep(**k))
                .chain(synthetic.held.iter().filter(|k| take(**k)))
                .copied()
                .collect(),
            pressed: real
                .pressed
                .iter()
                .filter(|k| keep(**k))
                .chain(synthetic.pressed.iter().filter(|k| take(**k)))
                .copied()
                .collect(),
        }
    }
}

/// Decoded per-fighter input for one tick.
///
/// Movement, jump and block are level-triggered; attack, special and dash
/// are true only on the tick their key went down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FighterInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub block: bool,
    pub attack: bool,
    pub special: bool,
    pub dash: bool,
}

impl FighterInput {
    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Jump => &mut self.jump,
            Action::Attack => &mut self.attack,
            Action::Block => &mut self.block,
            Action::Special => &mut self.special,
            Action::Dash => &mut self.dash,
        }
    }

    /// Logical actions asserted in this input
    pub fn actions(&self) -> Vec<Action> {
        let flags = [
            (Action::Left, self.left),
            (Action::Right, self.right),
            (Action::Jump, self.jump),
            (Action::Attack, self.attack),
            (Action::Block, self.block),
            (Action::Special, self.special),
            (Action::Dash, self.dash),
        ];
        flags
            .into_iter()
            .filter_map(|(action, on)| on.then_some(action))
            .collect()
    }
}
