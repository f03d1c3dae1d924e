pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod game_user_map;
pub mod company;

#[cfg(test)]
mod tests;
