use std::fmt::{self, Display, Formatter};

/// A `(major, minor, patch)` migration target version (spec.md §4.L,
/// §6: `("current_version",) -> tuple(i64,i64,i64)`). Distinct from
/// [`rl_schema::Schema::version`], which is a single monotonically
/// increasing sequence number for the schema registry itself -- the two
/// version spaces are independent, the way a database's on-disk format
/// version is independent from an individual table's DDL revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const ZERO: Version = Version { major: 0, minor: 0, patch: 0 };

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    pub(crate) fn to_tuple(self) -> [i64; 3] {
        [self.major as i64, self.minor as i64, self.patch as i64]
    }

    pub(crate) fn from_tuple(tuple: [i64; 3]) -> Self {
        Self { major: tuple[0] as u64, minor: tuple[1] as u64, patch: tuple[2] as u64 }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_lexicographically_by_major_then_minor_then_patch() {
        assert!(Version::new(1, 0, 0) < Version::new(1, 0, 1));
        assert!(Version::new(1, 9, 9) < Version::new(2, 0, 0));
        assert!(Version::ZERO < Version::new(0, 0, 1));
    }

    #[test]
    fn tuple_round_trips() {
        let v = Version::new(1, 2, 3);
        assert_eq!(Version::from_tuple(v.to_tuple()), v);
    }
}
