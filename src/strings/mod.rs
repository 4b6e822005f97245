mod fixed_size_string;
mod sized_string;
mod string_encoding;

pub use fixed_size_string::*;
pub use sized_string::*;
pub use string_encoding::*;
