pub mod blockscout;
pub mod twitter;
pub mod wallet;

#[cfg(test)]
mod tests;
