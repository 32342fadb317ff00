//! Box-drawing outlines of twig trees.

mod render;

pub use crate::render::{label, Outline, Render};
