//! Minimal content reference model.
//!
//! The catalogue itself lives elsewhere; decisions only read identity, publisher,
//! structural kind, broadcasts and container membership through [`EquivalenceContent`].

pub mod model;

#[cfg(test)]
mod tests;

pub use model::{
    Broadcast, Content, ContentId, ContentKind, EquivalenceContent, Hierarchy, Publisher,
};
