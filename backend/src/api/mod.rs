//! Search calls made on behalf of the widget.

pub mod search;
