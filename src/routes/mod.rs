// # Routes Module
//
// - HTTP route handlers for the token_vesting server.
// - Routes are organized by functionality into separate submodules.
//
//  ## Available Route Modules
// - `health`: Health check endpoint
// - `token_vesting`: feature view, queries and mutations for the program

/// Health check endpoint
pub mod health;

/// token_vesting program endpoints
pub mod token_vesting;
