pub mod iterative;
pub mod single_pass;
pub(crate) mod slots;
