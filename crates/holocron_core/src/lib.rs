pub mod adversary;
pub mod convert;
pub mod core_api;
pub mod grid;
pub mod heuristics;
pub mod markup;
pub mod oggdude;
pub mod reader;
pub mod reference;
