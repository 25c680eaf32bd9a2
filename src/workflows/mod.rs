pub mod assessment;
pub mod matrix;
