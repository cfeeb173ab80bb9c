pub mod config_cache;
pub mod engagement;
pub mod guest_session;
pub mod notifications;

#[cfg(test)]
pub(crate) mod test_support;
