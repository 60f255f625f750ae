//! Follow-up input the scheduler is waiting for.

use spirit_crypt_core::ItemId;

/// What a direction will be applied to once the player supplies one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionIntent {
    /// Operate the furniture in that cell.
    Activate,
    /// Shove whatever occupies that cell one step further.
    Push,
    /// Describe what is known about that cell.
    Describe,
}

/// What a numbered choice or item action will be applied to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemIntent {
    /// Pick one of several floor items.
    PickUp(Vec<ItemId>),
    /// Use, drop or move the item in an inventory slot.
    SlotMenu {
        /// Zero-based slot index.
        slot: usize,
    },
    /// Swap the item in `from` with the slot chosen next.
    MoveSlot {
        /// Zero-based source slot index.
        from: usize,
    },
    /// Spend an orb on one of three upgrades.
    OrbUpgrade,
}

/// Scheduler state between commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Prompt {
    /// Ready for a fresh command.
    #[default]
    Idle,
    /// Waiting for a direction.
    AwaitingDirection(DirectionIntent),
    /// Waiting for a numbered choice or an item action.
    AwaitingItemChoice(ItemIntent),
}
