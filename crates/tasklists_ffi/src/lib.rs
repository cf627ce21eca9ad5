//! Flutter bridge for the TaskLists core.

pub mod api;
