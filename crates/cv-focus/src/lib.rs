//! CustomViews Focus
//!
//! Pure planning for the "show only these sections", "hide these sections"
//! and "highlight these sections" views of a page. Nothing here touches the
//! DOM; callers apply the returned sets.
//!
//! - `hidden`: which siblings to hide so only the targets (and their
//!   ancestor chain) remain
//! - `divider`: collapsing runs of hidden siblings into expandable dividers
//! - `highlight`: merging target boxes into overlay rectangles

mod hidden;
mod divider;
mod highlight;

pub use hidden::{determine_hidden_elements, ExclusionRules, SHARE_IGNORE_ATTR};
pub use divider::{calculate_divider_groups, DividerGroup};
pub use highlight::{calculate_merged_rects, group_by_parent, HIGHLIGHT_PADDING};
