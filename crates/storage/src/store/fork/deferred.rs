#![forbid(unsafe_code)]

use super::row::update_field;
use super::{DeferredStats, ForkRun};
use crate::store::StoreError;

impl ForkRun<'_> {
    /// Resolves forward references once every id map is complete.
    ///
    /// A target that was not cloned (filtered out by the cutoff) leaves the
    /// field NULL; on a NOT NULL column that is an unresolved reference.
    pub(super) fn deferred_pass(&mut self) -> Result<DeferredStats, StoreError> {
        let mut stats = DeferredStats::default();
        for pending in std::mem::take(&mut self.deferred) {
            self.check_deadline(&pending.table)?;
            let new_id = self.id_maps.resolve(&pending.target, pending.old_value);
            if new_id.is_none() && pending.not_null {
                return Err(StoreError::ReferentialResolution {
                    table: pending.table,
                    row_id: pending.source_id,
                    field: pending.field,
                    target: pending.target,
                    old_value: pending.old_value,
                });
            }

            update_field(self.conn, &pending.table, &pending.field, pending.new_id, new_id)?;
            match new_id {
                Some(_) => stats.resolved += 1,
                None => {
                    tracing::debug!(
                        table = %pending.table,
                        row_id = pending.new_id,
                        field = %pending.field,
                        target = %pending.target,
                        old_id = pending.old_value,
                        "forward reference outside the fork; cleared"
                    );
                    stats.nulled += 1;
                }
            }
        }
        Ok(stats)
    }
}
