// src/models/user.rs
pub const EMAIL: &str = "email";

/// Reply sent instead of an insert result when the email is already taken.
pub const USER_EXISTS_MESSAGE: &str = "User already exists";
