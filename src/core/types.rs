//! Core type definitions used throughout the codebase

/// Dense index of one scheduled item (a population cell / organism slot)
pub type ItemId = usize;

/// Index of a deme (contiguous block of items)
pub type DemeId = usize;

/// Check that `id` addresses one of `count` items
pub(crate) fn check_item(id: ItemId, count: usize) -> crate::core::error::Result<()> {
    if id < count {
        Ok(())
    } else {
        Err(crate::core::error::ScheduleError::ItemOutOfRange { id, count })
    }
}
