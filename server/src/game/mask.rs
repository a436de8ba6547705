use std::fmt;

/// 隱藏位置的顯示字元
pub const HIDDEN: char = '_';

/// 單字的揭示遮罩，每個字母位置一格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    slots: Vec<Option<char>>,
}

impl Mask {
    /// 全部隱藏
    pub fn hidden(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// 揭示 `word` 中所有等於 `letter` 的位置，回傳符合的位置數
    pub fn reveal(&mut self, word: &[char], letter: char) -> usize {
        let mut matched = 0;
        for (slot, &c) in self.slots.iter_mut().zip(word) {
            if c == letter {
                *slot = Some(c);
                matched += 1;
            }
        }
        matched
    }

    #[cfg(test)]
    pub fn is_revealed(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// 全部揭示
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            write!(f, "{}", slot.unwrap_or(HIDDEN))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_reveal_all_occurrences() {
        let word = chars("BANANA");
        let mut mask = Mask::hidden(word.len());

        assert_eq!(mask.reveal(&word, 'A'), 3);
        assert_eq!(mask.to_string(), "_A_A_A");
        assert_eq!(mask.reveal(&word, 'X'), 0);
        assert_eq!(mask.to_string(), "_A_A_A");
        assert!(!mask.is_complete());

        mask.reveal(&word, 'B');
        mask.reveal(&word, 'N');
        assert!(mask.is_complete());
        assert_eq!(mask.to_string(), "BANANA");
    }

    #[test]
    fn test_word_containing_placeholder_char() {
        // 單字本身含 '_' 時仍以「是否已揭示」判斷完成
        let word = chars("A_B");
        let mut mask = Mask::hidden(word.len());
        mask.reveal(&word, 'A');
        mask.reveal(&word, 'B');
        assert!(!mask.is_complete());
        assert!(!mask.is_revealed(1));
    }
}
