//! Editing state: the path machine and the annotation editor.

mod annotation;
mod path_machine;

pub use annotation::{AnnotationEditor, AnnotationPalette, AnnotationPolicy, EditMode};
pub use path_machine::{DrawingPhase, FeedbackColor, PathEffect, PathEvent, PathState, Step};
