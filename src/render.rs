pub mod backend;
pub mod cpu;
pub mod scratch_pool;
