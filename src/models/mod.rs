pub mod results;
pub mod review;
pub mod user;
