//! Live attraction adapter reading the "most visited museums" Wikipedia page.

mod provider;
mod response;
pub mod wikitext;

pub use provider::WikipediaAttractions;
