pub mod chars;
pub mod qualified;
