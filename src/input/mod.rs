pub mod validators;

pub use validators::Check;
