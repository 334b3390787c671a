//! URL handling module for Sumi-Harvest
//!
//! Links read from list items and "next page" elements are usually relative;
//! this module resolves them against the page they were found on and decides
//! when two URLs refer to the same page (the pagination loop guard).

mod resolve;

pub use resolve::{resolve_link, same_page};
