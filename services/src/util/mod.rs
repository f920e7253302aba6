pub mod server;
#[cfg(test)]
pub(crate) mod tests;
