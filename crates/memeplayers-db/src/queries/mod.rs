pub(crate) mod analytics;
pub(crate) mod badges;
pub(crate) mod coins;
pub(crate) mod communities;
pub(crate) mod notes;
pub(crate) mod notifications;
pub(crate) mod posts;
pub(crate) mod ratings;
pub(crate) mod users;
pub(crate) mod votes;

pub use coins::{CoinFilter, CoinOrdering};
pub use posts::PostOrdering;

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};

use crate::Result;

/// A LIMIT/OFFSET slice of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u64,
}

impl Window {
    pub const ALL: Window = Window {
        limit: u32::MAX,
        offset: 0,
    };
}

/// One window of rows plus the size of the unwindowed result.
#[derive(Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Count rows of `from_where` (a `FROM ... WHERE ...` tail) with the given args.
fn count_rows(conn: &Connection, from_where: &str, args: &[Value]) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) {}", from_where);
    let n: i64 = conn.query_row(&sql, params_from_iter(args.iter()), |r| r.get(0))?;
    Ok(n as u64)
}

/// Push LIMIT/OFFSET arguments and return the matching SQL suffix.
fn window_clause(window: Window, args: &mut Vec<Value>) -> String {
    args.push(Value::Integer(window.limit as i64));
    args.push(Value::Integer(window.offset as i64));
    format!(" LIMIT ?{} OFFSET ?{}", args.len() - 1, args.len())
}
