pub mod net;
pub mod perf;
