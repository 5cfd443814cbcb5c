//! Point lookup and the selection set.

mod locator;
mod selection_set;

pub use locator::locate;
pub use selection_set::SelectionSet;
