//! Low level search engine access.

pub mod search_engine_utils;
