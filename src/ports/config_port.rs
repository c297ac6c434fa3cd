//! Configuration access port trait.
//!
//! Lookups return `Ok(None)` for an absent key and `Err` with a reason when a
//! key is present but does not parse as the requested type.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
}
