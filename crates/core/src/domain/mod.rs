pub mod level;
pub mod product;
