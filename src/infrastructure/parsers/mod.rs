pub mod input_models;
pub mod json_parser;

pub use json_parser::{RosterError, RosterInputParser};
