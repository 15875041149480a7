//! Allocation chain walking
//!
//! A stream's sectors form a singly linked list threaded through an
//! allocation table: `table[n]` holds the sector following `n`, or
//! [`ENDOFCHAIN`] after the last one. The walkers below follow such a list
//! under a step budget, so a cyclic chain always terminates.

use super::consts::*;
use log::trace;
use thiserror::Error;

/// Why an allocation chain could not be followed to its end.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    /// More than `max_steps` sectors were visited without reaching ENDOFCHAIN
    #[error("chain starting at {start} exceeds {max_steps} sectors")]
    TooLong { start: u32, max_steps: usize },

    /// A chain link points past the end of the table
    #[error("sector {sector} is outside a table of {table_len} entries")]
    SectorOutOfTable { sector: u32, table_len: usize },
}

/// Follow a chain through `table` starting at `start`.
///
/// Returns the visited sectors in chain order. A `start` of [`ENDOFCHAIN`]
/// yields an empty list.
fn walk_chain(table: &[u32], start: u32, max_steps: usize) -> Result<Vec<u32>, ChainError> {
    let mut chain = Vec::new();
    let mut current = start;

    while current != ENDOFCHAIN {
        if chain.len() >= max_steps {
            return Err(ChainError::TooLong { start, max_steps });
        }

        let next = table
            .get(current as usize)
            .copied()
            .ok_or(ChainError::SectorOutOfTable {
                sector: current,
                table_len: table.len(),
            })?;

        chain.push(current);
        current = next;
    }

    trace!("chain from {} has {} sectors", start, chain.len());
    Ok(chain)
}

/// Walk a chain of regular sectors through the FAT.
pub fn walk_fat_chain(fat: &[u32], start: u32, max_steps: usize) -> Result<Vec<u32>, ChainError> {
    walk_chain(fat, start, max_steps)
}

/// Walk a chain of mini sectors through the MiniFAT.
pub fn walk_mini_fat_chain(
    mini_fat: &[u32],
    start: u32,
    max_steps: usize,
) -> Result<Vec<u32>, ChainError> {
    walk_chain(mini_fat, start, max_steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_simple_chain() {
        let mut fat = vec![FREESECT; 8];
        fat[3] = 7;
        fat[7] = ENDOFCHAIN;

        assert_eq!(walk_fat_chain(&fat, 3, 8).unwrap(), vec![3, 7]);
        assert_eq!(walk_fat_chain(&fat, 7, 8).unwrap(), vec![7]);
    }

    #[test]
    fn test_walk_empty_chain() {
        let fat = vec![ENDOFCHAIN; 4];
        assert!(walk_fat_chain(&fat, ENDOFCHAIN, 0).unwrap().is_empty());
        assert!(walk_mini_fat_chain(&[], ENDOFCHAIN, 10).unwrap().is_empty());
    }

    #[test]
    fn test_walk_cycle_hits_budget() {
        // 0 -> 1 -> 2 -> 0
        let fat = vec![1, 2, 0];
        assert_eq!(
            walk_fat_chain(&fat, 0, 10),
            Err(ChainError::TooLong {
                start: 0,
                max_steps: 10
            })
        );
    }

    #[test]
    fn test_budget_is_exact() {
        let fat = vec![1, 2, ENDOFCHAIN];
        assert_eq!(walk_fat_chain(&fat, 0, 3).unwrap(), vec![0, 1, 2]);
        assert!(matches!(
            walk_fat_chain(&fat, 0, 2),
            Err(ChainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_walk_out_of_table() {
        let fat = vec![1, FREESECT];
        assert_eq!(
            walk_fat_chain(&fat, 0, 10),
            Err(ChainError::SectorOutOfTable {
                sector: FREESECT,
                table_len: 2
            })
        );
        assert!(matches!(
            walk_mini_fat_chain(&fat, 9, 10),
            Err(ChainError::SectorOutOfTable { sector: 9, .. })
        ));
    }
}
