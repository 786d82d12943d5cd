//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use errcatch::prelude::*;
//!
//! let catcher = Catcher::plain();
//! errorf!(catcher, "retry {} of {}", 3, 3);
//! catcher.add(&catcher.errors()[0]);
//!
//! assert_eq!(catcher.len(), 2);
//! ```
//!
//! # What's Included
//!
//! - **[`Catcher`]** and **[`Format`]**: the collector and its renderings
//! - **[`Caught`]**, **[`Message`]** and **[`Resolved`]**: the error types
//! - **[`Aggregate`]** and **[`IntoCaught`]**: the traits collectors accept
//! - **[`errorf!`]**, **[`errorf_when!`]** and **[`caught!`]**: message macros
//! - **[`ErrorChannel`]**: the event-driven collector, with the `channel`
//!   feature

#[cfg(feature = "channel")]
pub use crate::ErrorChannel;
pub use crate::{
    Aggregate, Catcher, Caught, Format, IntoCaught, Message, Resolved, caught, errorf, errorf_when,
};
