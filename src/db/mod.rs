pub mod ordering;
pub mod snapshot;
pub mod source;
pub mod table;
