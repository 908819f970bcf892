pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod plot;
pub mod router;
pub mod session;
pub mod table;

pub use error::DeckError;
pub use router::{DeckState, deck_router};
