//! Configuration access port trait.
//!
//! Getters with a default never fail; malformed values fall back to the
//! default and are caught by `config_validation` before a run.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
