pub mod storage;
pub mod tmdb;
pub mod usage;
