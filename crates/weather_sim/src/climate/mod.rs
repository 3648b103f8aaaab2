//! Climate data: seasonal profiles, the authoring template format and the
//! built-in template library. Pure data, no generation logic.

mod builtin;
pub mod profile;
pub mod template;

pub use profile::{ClimateProfile, ClimateProfileSpec, SeasonalTable, SeasonalTableSpec, SeasonalValue};
pub use template::{ClimateTemplate, TemplateLibrary, TemplateParameters};
