//! Environment variable handling
//!
//! Prefix-aware lookups with defaults, used to build endpoints from the
//! process environment. The lookup function is injectable so configuration
//! can be exercised without touching the real environment.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{PoolError, PoolResult};

/// Function resolving a variable name to its value
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable reader with optional prefix support
#[derive(Clone)]
pub struct Env {
	/// Optional prefix for variable names (e.g. `"APP_"`)
	pub prefix: Option<String>,
	lookup: EnvLookup,
}

impl Env {
	/// Read from the process environment
	pub fn new() -> Self {
		Self {
			prefix: None,
			lookup: Arc::new(|key| std::env::var(key).ok()),
		}
	}

	/// Read through a custom lookup function
	///
	/// # Examples
	///
	/// ```
	/// use poolkeeper_core::Env;
	/// use std::collections::HashMap;
	///
	/// let vars = HashMap::from([("VALKEY_PORT".to_string(), "6380".to_string())]);
	/// let env = Env::from_lookup(move |key| vars.get(key).cloned());
	///
	/// assert_eq!(env.parse_with_default("VALKEY_PORT", 6379u16).unwrap(), 6380);
	/// assert_eq!(env.str_with_default("VALKEY_HOST", "localhost"), "localhost");
	/// ```
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String> + Send + Sync + 'static,
	{
		Self {
			prefix: None,
			lookup: Arc::new(lookup),
		}
	}

	/// Set a prefix for all lookups
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	fn key_name(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	/// Raw lookup; empty values count as unset.
	pub fn get(&self, key: &str) -> Option<String> {
		(self.lookup)(&self.key_name(key)).filter(|value| !value.is_empty())
	}

	pub fn str_with_default(&self, key: &str, default: &str) -> String {
		self.get(key).unwrap_or_else(|| default.to_string())
	}

	/// Parse a value, falling back to `default` when the variable is unset.
	///
	/// A value that is set but does not parse is an error, not a fallback.
	pub fn parse_with_default<T>(&self, key: &str, default: T) -> PoolResult<T>
	where
		T: FromStr,
		T::Err: fmt::Display,
	{
		match self.get(key) {
			Some(raw) => raw.trim().parse::<T>().map_err(|e| {
				PoolError::Config(format!(
					"invalid value for {}: {:?} ({})",
					self.key_name(key),
					raw,
					e
				))
			}),
			None => Ok(default),
		}
	}
}

impl Default for Env {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Env {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Env")
			.field("prefix", &self.prefix)
			.finish_non_exhaustive()
	}
}
