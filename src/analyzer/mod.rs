// Analyzer module: the field registry, criteria and the admit/reject decision.

pub mod criteria;
pub mod decision;
pub mod fields;
pub mod report;

pub use criteria::{CriteriaSet, Criterion};
pub use decision::evaluate;
pub use fields::Field;
pub use report::render_report;
