pub mod assembler;
pub mod cluster;
pub mod dwelling;
pub mod probability;
pub mod sampling;
pub mod use_spec;
