pub mod bridge;
pub mod error;
pub mod locator;
pub mod logger;
pub mod msg;
pub mod sync;

#[cfg(test)]
mod test;

pub type Result<T> = std::result::Result<T, error::Error>;
