//! The type model: atomics, unions and the operations between them

mod atomic;
mod combine;
pub mod comparator;
mod expand;
pub mod parser;
pub mod template;
mod union;

pub use atomic::{Atomic, ShapeKey};
pub use combine::{
    combine, combine_atomics, combine_atomics_keeping_literals, combine_many,
    combine_many_keeping_literals, generalize_shape,
};
pub use comparator::{is_contained_by, is_simple_contained_by, TypeComparisonResult};
pub use expand::{flesh_out_and_combine, flesh_out_type, ExpandContext};
pub use parser::{parse_type, TypeParseError};
pub use template::{infer_templates, replace_templates, TemplateResult, TemplateType};
pub use union::Union;
