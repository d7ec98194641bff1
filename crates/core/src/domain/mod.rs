pub mod prediction;
pub mod row;
pub mod ticker;
