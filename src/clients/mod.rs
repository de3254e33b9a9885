pub mod cinesearch;
pub mod tmdb;
