//! Background loops for continuous processing.

pub mod session_sweep_loop;
