//! Serializable state carried outside the widget.

pub mod state_token;
