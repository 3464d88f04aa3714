//! Slide extraction backend for reveal.js / slides.com presentation pages.
//!
//! Walks a presentation page (through the [`SlideNode`] / [`SlideDocument`]
//! traits) and produces structured, searchable slides.

pub mod document;
pub mod parser;

pub use document::{HtmlDocument, SlideDocument, SlideNode};
pub use parser::{extract_current_slide, extract_slides, SlideExtractor};
