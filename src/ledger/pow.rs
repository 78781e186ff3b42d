use super::block::Block;

/// Default number of leading zero hex digits required of a block hash
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Checks whether a hash satisfies the difficulty predicate
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.as_bytes()[..difficulty].iter().all(|&b| b == b'0')
}

/// Seals a block by brute-force nonce search
///
/// Resets the nonce to zero and increments it until the block's hash has
/// at least `difficulty` leading zero hex characters. The search is
/// sequential and unbounded; it returns only on success.
///
/// # Returns
///
/// The block with its final nonce and hash assigned
pub fn seal(mut block: Block, difficulty: usize) -> Block {
    block.nonce = 0;

    loop {
        let hash = block.calculate_hash();

        if meets_difficulty(&hash, difficulty) {
            block.hash = hash;
            return block;
        }

        block.nonce += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::Transaction;

    #[test]
    fn test_seal_meets_difficulty() {
        let block = Block::new(1, vec![Transaction::genesis()], "0".to_string());

        let sealed = seal(block, 2);

        assert!(sealed.hash.starts_with("00"));
        assert_eq!(sealed.hash, sealed.calculate_hash());
    }

    #[test]
    fn test_seal_restarts_nonce_search() {
        let mut block = Block::new(1, vec![Transaction::genesis()], "0".to_string());
        block.nonce = 12345;

        let sealed = seal(block, 1);

        assert!(meets_difficulty(&sealed.hash, 1));
        assert_eq!(sealed.hash, sealed.calculate_hash());
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("00ab", 2));
        assert!(!meets_difficulty("0a0b", 2));
        assert!(meets_difficulty("anything", 0));
        assert!(!meets_difficulty("00", 3));
    }
}
