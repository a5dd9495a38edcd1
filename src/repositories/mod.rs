pub mod pocketbase;

pub use pocketbase::{DataStore, PocketBaseClient};
