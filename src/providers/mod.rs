pub mod cbr;
pub mod feed;

pub use cbr::CbrProvider;
