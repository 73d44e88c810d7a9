/// Shared modules for the Rates Board binaries
pub mod clock;
pub mod ticker;
pub mod view;
pub mod widget;
