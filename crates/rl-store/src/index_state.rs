use crate::error::{Error, Result};
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;
use std::collections::HashMap;

/// An index's build/maintenance state (spec.md §4.F). `Building` is not part
/// of the enable/make_readable/disable transition diagram itself; it is a
/// side-transition the online indexer (`rl-indexer`) uses to mark an index
/// as actively undergoing a build pass, write-gated identically to
/// `WriteOnly` (spec.md §4.G) -- see DESIGN.md's Open Question resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexState {
    Disabled,
    WriteOnly,
    Building,
    Readable,
}

impl IndexState {
    fn code(self) -> i64 {
        match self {
            IndexState::Disabled => 0,
            IndexState::WriteOnly => 1,
            IndexState::Building => 2,
            IndexState::Readable => 3,
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(IndexState::Disabled),
            1 => Some(IndexState::WriteOnly),
            2 => Some(IndexState::Building),
            3 => Some(IndexState::Readable),
            _ => None,
        }
    }

    /// Write-time gating (spec.md §4.G): whether a maintainer should
    /// process a write while the index is in this state.
    pub fn should_maintain(self) -> bool {
        !matches!(self, IndexState::Disabled)
    }
}

/// Persists [`IndexState`] per index at keyspace `5` of a record store's
/// subspace (spec.md §4.F). State reads go through the caller's
/// [`TransactionContext`] so they see that transaction's snapshot, never a
/// different transaction's read-your-writes.
#[derive(Clone, Debug)]
pub struct IndexStateManager {
    subspace: Subspace,
}

impl IndexStateManager {
    pub fn new(subspace: Subspace) -> Self {
        Self { subspace }
    }

    fn key(&self, index_name: &str) -> Vec<u8> {
        self.subspace.pack(&[TupleValue::Str(index_name.to_string())])
    }

    /// Default state for an index with no persisted entry: `Disabled`.
    pub fn get(&self, ctx: &mut TransactionContext, index_name: &str) -> Result<IndexState> {
        let key = self.key(index_name);
        match ctx.get(&key)? {
            None => Ok(IndexState::Disabled),
            Some(bytes) => {
                let decoded = rl_tuple::decode(&bytes)?;
                let code = match decoded.first() {
                    Some(TupleValue::I64(c)) => *c,
                    _ => return Ok(IndexState::Disabled),
                };
                Ok(IndexState::from_code(code).unwrap_or(IndexState::Disabled))
            }
        }
    }

    /// One batched read of every name in `names` (spec.md §4.F `states`).
    pub fn states(&self, ctx: &mut TransactionContext, names: &[String]) -> Result<HashMap<String, IndexState>> {
        let mut out = HashMap::with_capacity(names.len());
        for name in names {
            out.insert(name.clone(), self.get(ctx, name)?);
        }
        Ok(out)
    }

    fn set(&self, ctx: &mut TransactionContext, index_name: &str, state: IndexState) -> Result<()> {
        let key = self.key(index_name);
        let value = rl_tuple::encode(&[TupleValue::I64(state.code())]);
        ctx.set(&key, &value)?;
        Ok(())
    }

    /// `DISABLED -> WRITEONLY`. Fails with [`Error::InvalidTransition`] from
    /// any other state (spec.md §4.F's diagram only draws this edge from
    /// `DISABLED`).
    pub fn enable(&self, ctx: &mut TransactionContext, index_name: &str) -> Result<()> {
        let current = self.get(ctx, index_name)?;
        if current != IndexState::Disabled {
            return Err(Error::InvalidTransition {
                index: index_name.to_string(),
                from: current,
                to: IndexState::WriteOnly,
            });
        }
        self.set(ctx, index_name, IndexState::WriteOnly)
    }

    /// `WRITEONLY|BUILDING -> READABLE`. Fails with
    /// [`Error::InvalidTransition`] from `DISABLED` (spec.md §4.F:
    /// "`make_readable` from DISABLED fails with `InvalidTransition`").
    pub fn make_readable(&self, ctx: &mut TransactionContext, index_name: &str) -> Result<()> {
        let current = self.get(ctx, index_name)?;
        if current == IndexState::Disabled {
            return Err(Error::InvalidTransition {
                index: index_name.to_string(),
                from: current,
                to: IndexState::Readable,
            });
        }
        self.set(ctx, index_name, IndexState::Readable)
    }

    /// `WRITEONLY -> BUILDING`, used by the online indexer to mark an active
    /// build pass. Any other source state is left unchanged and returns
    /// `Ok` as a no-op, since only the indexer drives this transition and it
    /// always calls it immediately after `enable`.
    pub fn mark_building(&self, ctx: &mut TransactionContext, index_name: &str) -> Result<()> {
        let current = self.get(ctx, index_name)?;
        if current == IndexState::WriteOnly {
            self.set(ctx, index_name, IndexState::Building)?;
        }
        Ok(())
    }

    /// Any state `-> DISABLED`. Always allowed (spec.md §4.F: "Any
    /// transition to DISABLED is allowed").
    pub fn disable(&self, ctx: &mut TransactionContext, index_name: &str) -> Result<()> {
        self.set(ctx, index_name, IndexState::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_kv::{Kv, MemoryKv};

    fn ctx(kv: &MemoryKv) -> TransactionContext {
        TransactionContext::new(kv.begin())
    }

    #[test]
    fn default_state_is_disabled() {
        let kv = MemoryKv::new();
        let mgr = IndexStateManager::new(Subspace::from_prefix(vec![0x05]));
        let mut c = ctx(&kv);
        assert_eq!(mgr.get(&mut c, "by_email").unwrap(), IndexState::Disabled);
    }

    #[test]
    fn full_lifecycle_transitions() {
        let kv = MemoryKv::new();
        let mgr = IndexStateManager::new(Subspace::from_prefix(vec![0x05]));

        let mut c = ctx(&kv);
        mgr.enable(&mut c, "by_email").unwrap();
        c.commit().unwrap();

        let mut c = ctx(&kv);
        assert_eq!(mgr.get(&mut c, "by_email").unwrap(), IndexState::WriteOnly);
        mgr.make_readable(&mut c, "by_email").unwrap();
        c.commit().unwrap();

        let mut c = ctx(&kv);
        assert_eq!(mgr.get(&mut c, "by_email").unwrap(), IndexState::Readable);
        mgr.disable(&mut c, "by_email").unwrap();
        c.commit().unwrap();

        let mut c = ctx(&kv);
        assert_eq!(mgr.get(&mut c, "by_email").unwrap(), IndexState::Disabled);
    }

    #[test]
    fn make_readable_from_disabled_fails() {
        let kv = MemoryKv::new();
        let mgr = IndexStateManager::new(Subspace::from_prefix(vec![0x05]));
        let mut c = ctx(&kv);
        assert!(matches!(mgr.make_readable(&mut c, "by_email"), Err(Error::InvalidTransition { .. })));
    }

    #[test]
    fn disable_is_always_allowed() {
        let kv = MemoryKv::new();
        let mgr = IndexStateManager::new(Subspace::from_prefix(vec![0x05]));
        let mut c = ctx(&kv);
        mgr.disable(&mut c, "by_email").unwrap();
        assert_eq!(mgr.get(&mut c, "by_email").unwrap(), IndexState::Disabled);
    }

    #[test]
    fn states_batches_several_lookups() {
        let kv = MemoryKv::new();
        let mgr = IndexStateManager::new(Subspace::from_prefix(vec![0x05]));
        let mut c = ctx(&kv);
        mgr.enable(&mut c, "a").unwrap();
        let result = mgr.states(&mut c, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(result.get("a"), Some(&IndexState::WriteOnly));
        assert_eq!(result.get("b"), Some(&IndexState::Disabled));
    }
}
