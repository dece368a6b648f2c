//! Positional query arguments

use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;

/// Parameter type of a typed `NULL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
	Bool,
	Int,
	BigInt,
	Double,
	Text,
	Bytes,
	Json,
}

/// One positional argument (`$1`, `$2`, ...) forwarded unmodified to the
/// server through sqlx's parameter binding.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	/// SQL `NULL`, sent as a text-typed parameter.
	///
	/// PostgreSQL rejects it for non-text columns (`INSERT ... VALUES ($1)`
	/// into an `INT` column) unless the query casts it. Prefer
	/// [`SqlValue::TypedNull`], which `None::<T>` converts to.
	Null,
	/// SQL `NULL` sent with the parameter type of a concrete value
	TypedNull(SqlType),
	Bool(bool),
	Int(i32),
	BigInt(i64),
	Double(f64),
	Text(String),
	Bytes(Vec<u8>),
	Json(serde_json::Value),
}

impl SqlValue {
	pub(crate) fn bind<'q>(
		self,
		query: Query<'q, Postgres, PgArguments>,
	) -> Query<'q, Postgres, PgArguments> {
		match self {
			SqlValue::Null | SqlValue::TypedNull(SqlType::Text) => query.bind(None::<String>),
			SqlValue::TypedNull(SqlType::Bool) => query.bind(None::<bool>),
			SqlValue::TypedNull(SqlType::Int) => query.bind(None::<i32>),
			SqlValue::TypedNull(SqlType::BigInt) => query.bind(None::<i64>),
			SqlValue::TypedNull(SqlType::Double) => query.bind(None::<f64>),
			SqlValue::TypedNull(SqlType::Bytes) => query.bind(None::<Vec<u8>>),
			SqlValue::TypedNull(SqlType::Json) => query.bind(None::<serde_json::Value>),
			SqlValue::Bool(v) => query.bind(v),
			SqlValue::Int(v) => query.bind(v),
			SqlValue::BigInt(v) => query.bind(v),
			SqlValue::Double(v) => query.bind(v),
			SqlValue::Text(v) => query.bind(v),
			SqlValue::Bytes(v) => query.bind(v),
			SqlValue::Json(v) => query.bind(v),
		}
	}
}

impl From<bool> for SqlValue {
	fn from(v: bool) -> Self {
		SqlValue::Bool(v)
	}
}

impl From<i32> for SqlValue {
	fn from(v: i32) -> Self {
		SqlValue::Int(v)
	}
}

impl From<i64> for SqlValue {
	fn from(v: i64) -> Self {
		SqlValue::BigInt(v)
	}
}

impl From<f64> for SqlValue {
	fn from(v: f64) -> Self {
		SqlValue::Double(v)
	}
}

impl From<&str> for SqlValue {
	fn from(v: &str) -> Self {
		SqlValue::Text(v.to_string())
	}
}

impl From<String> for SqlValue {
	fn from(v: String) -> Self {
		SqlValue::Text(v)
	}
}

impl From<Vec<u8>> for SqlValue {
	fn from(v: Vec<u8>) -> Self {
		SqlValue::Bytes(v)
	}
}

impl From<serde_json::Value> for SqlValue {
	fn from(v: serde_json::Value) -> Self {
		SqlValue::Json(v)
	}
}

/// Rust types with a fixed SQL parameter type
pub trait SqlTyped {
	const SQL_TYPE: SqlType;
}

macro_rules! sql_typed {
	($($ty:ty => $sql:ident),+ $(,)?) => {
		$(impl SqlTyped for $ty {
			const SQL_TYPE: SqlType = SqlType::$sql;
		})+
	};
}

sql_typed! {
	bool => Bool,
	i32 => Int,
	i64 => BigInt,
	f64 => Double,
	&str => Text,
	String => Text,
	Vec<u8> => Bytes,
	serde_json::Value => Json,
}

impl<T: Into<SqlValue> + SqlTyped> From<Option<T>> for SqlValue {
	fn from(v: Option<T>) -> Self {
		v.map_or(SqlValue::TypedNull(T::SQL_TYPE), Into::into)
	}
}

/// Build a `Vec<SqlValue>` from heterogeneous expressions.
///
/// ```
/// use poolkeeper_db::{SqlType, SqlValue, sql_args};
///
/// let args = sql_args![42, "alice", None::<i64>];
/// assert_eq!(
///     args,
///     vec![SqlValue::Int(42), SqlValue::Text("alice".into()), SqlValue::TypedNull(SqlType::BigInt)]
/// );
/// ```
#[macro_export]
macro_rules! sql_args {
	() => {
		::std::vec::Vec::<$crate::SqlValue>::new()
	};
	($($value:expr),+ $(,)?) => {
		::std::vec![$($crate::SqlValue::from($value)),+]
	};
}
