#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

/// Number of digit keys mapped to inventory slots.
pub const SLOT_KEY_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Quit => 4,
        }
    }
}

/// One-tick key presses. Each is true only for the tick after the key went
/// down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PressEdges {
    pub(crate) select_slot: Option<usize>,
    pub(crate) drop: bool,
    pub(crate) pick_up: bool,
    pub(crate) use_item: bool,
    pub(crate) dump_state: bool,
}
