pub mod hash;
pub mod jwt;
pub mod participation;
pub mod school;
