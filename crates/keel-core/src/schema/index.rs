//! Index definitions and deterministic index naming.

use serde::{Deserialize, Serialize};

/// Longest identifier accepted by every supported dialect (PostgreSQL: 63 bytes).
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A named index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Covered columns, in order.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    pub unique: bool,
}

impl Index {
    /// Creates an index named by [`index_name`].
    #[must_use]
    pub fn new(table: &str, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: index_name(table, &columns),
            columns,
            unique,
        }
    }

    /// Whether this index covers the given column.
    #[must_use]
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Derives an index name from the table and its ordered columns.
///
/// The result is a pure function of its inputs. Names that would exceed
/// [`MAX_IDENTIFIER_LEN`] are cut and suffixed with a hash of the full name.
#[must_use]
pub fn index_name<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let mut name = format!("idx_{table}");
    for column in columns {
        name.push('_');
        name.push_str(column.as_ref());
    }
    if name.len() <= MAX_IDENTIFIER_LEN {
        return name;
    }

    let suffix = format!("_{:016x}", fnv1a(name.as_bytes()));
    let mut cut = MAX_IDENTIFIER_LEN - suffix.len();
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    name.truncate(cut);
    name.push_str(&suffix);
    name
}

// 64-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}
