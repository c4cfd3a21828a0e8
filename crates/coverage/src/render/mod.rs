//! Console and HTML report rendering
//!
//! Both renderers classify percentages through `Threshold::classify`.

pub mod console;
pub mod html;
