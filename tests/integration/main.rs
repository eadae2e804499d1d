//! End-to-end tests over the HTTP router with in-memory stores.

mod helpers;

mod admin_test;
mod auth_test;
mod file_test;
mod storage_test;
