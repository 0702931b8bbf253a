//! 顯示歷史緩衝區
//!
//! 固定容量的環形緩衝區，保存流出管線、未被抑制的訊息，
//! 由 UI 協作者取用。滿了之後最舊的訊息被移除。

use std::collections::VecDeque;

use crate::message::Message;

/// 顯示歷史
#[derive(Debug, Clone, Default)]
pub struct OutputHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl OutputHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: Message) {
        if self.capacity > 0 && self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 最後 n 條訊息
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &Message> {
        self.messages.iter().skip(self.messages.len().saturating_sub(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_overflow_drops_oldest() {
        let mut history = OutputHistory::new(3);
        for i in 1..=4 {
            history.push(Message::echo(i.to_string()));
        }
        assert_eq!(history.len(), 3);
        let first = history.iter().next().unwrap();
        assert_eq!(first.display_text().unwrap(), "2");
    }

    #[test]
    fn test_last_n() {
        let mut history = OutputHistory::new(10);
        for i in 1..=5 {
            history.push(Message::echo(i.to_string()));
        }
        let last: Vec<_> = history
            .last_n(2)
            .map(|m| m.display_text().unwrap())
            .collect();
        assert_eq!(last, vec!["4", "5"]);
    }
}
