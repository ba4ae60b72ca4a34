//! Step components of the wizard.
//!
//! Each step receives only its slice of the document and hands back a
//! replacement value; none of them reads another step's state.

pub mod customer;
pub mod items;
pub mod preview;

pub use customer::{CustomerInfoStep, ImageSlot};
pub use items::{delete_item, move_item, ItemDialog, ItemsStep, MoveDirection};
pub use preview::{DocumentView, PreviewStep};
