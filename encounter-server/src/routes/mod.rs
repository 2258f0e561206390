//! HTTP-style route handlers. Each takes the query or form body and returns
//! an HTML fragment for HTMX to swap.

pub mod encounter;
pub mod popup;
pub mod tracker;
pub mod util;
