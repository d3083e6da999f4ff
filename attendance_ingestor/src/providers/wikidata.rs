//! Live population adapter backed by Wikidata `wbgetentities`.

mod provider;
mod response;

pub use provider::WikidataPopulations;
