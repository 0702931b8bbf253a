//! 變數解析模組
//!
//! 設定檔範圍的名/值儲存：查詢時才要求名稱唯一（更新取第一個匹配、
//! 找不到則附加），值為 `$name` 形式時視為變數鏈並偵測循環引用。
//! 另提供 `DATE`、`TIME` 與名單索引（`MonsterN` / `GroupMateN`）等計算變數。

use std::collections::HashSet;

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::braces::depth_chars;

/// 嵌入展開的回合上限，超過視為值層級的循環
const MAX_EXPANSION_ROUNDS: usize = 64;

/// 變數解析錯誤
///
/// 未知名稱不是錯誤（解析為空字串）；只有循環引用是致命的，
/// 因為繼續解析會無窮迴圈。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariableError {
    #[error("變數循環引用: ${0}")]
    Cycle(String),
}

/// 變數：名/值皆為字串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// 即時名單：怪物與隊友
///
/// 供 `MonsterN` / `GroupMateN` 計算變數取用。
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub monsters: Vec<String>,
    pub group_mates: Vec<String>,
    /// 目前選取的怪物（0 起算索引）
    pub selected_monster: Option<usize>,
    /// 目前選取的隊友（0 起算索引）
    pub selected_group_mate: Option<usize>,
}

impl Roster {
    /// 取得名單第 `index` 項的短名
    ///
    /// 短名取名稱的第一個詞；同名者依名單順序編號，
    /// 第 k 個（k > 1）加上 `"k."` 前綴以消歧。
    fn short_name(list: &[String], index: usize) -> String {
        let Some(name) = list.get(index) else {
            return String::new();
        };
        let word = name.split_whitespace().next().unwrap_or("");
        let ordinal = list[..index].iter().filter(|n| *n == name).count() + 1;
        if ordinal > 1 {
            format!("{}.{}", ordinal, word)
        } else {
            word.to_string()
        }
    }
}

/// 設定檔範圍的變數儲存
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VariableStore {
    variables: Vec<Variable>,
    /// 即時名單不持久化，連線期間由協作者填入
    #[serde(skip)]
    pub roster: Roster,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定變數：第一個同名者更新，否則附加
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.value = value,
            None => self.variables.push(Variable { name, value }),
        }
    }

    /// 刪除變數，回傳是否有刪到
    pub fn unset(&mut self, name: &str) -> bool {
        let before = self.variables.len();
        self.variables.retain(|v| v.name != name);
        self.variables.len() != before
    }

    /// 未經鏈解析的原始值（第一個匹配）
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    pub fn list(&self) -> &[Variable] {
        &self.variables
    }

    /// 解析變數名稱
    ///
    /// 未知名稱解析為空字串。值為 `$name` 形式時沿鏈追蹤並回傳
    /// 鏈上「最後」一個值；途中重訪任何名稱即為循環引用錯誤。
    pub fn resolve(&self, name: &str) -> Result<String, VariableError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = name.to_string();
        loop {
            if let Some(value) = self.computed(&current) {
                return Ok(value);
            }
            if !visited.insert(current.clone()) {
                return Err(VariableError::Cycle(current));
            }
            let Some(value) = self.raw(&current) else {
                return Ok(String::new());
            };
            match alias_target(value) {
                Some(next) => current = next.to_string(),
                None => return Ok(value.to_string()),
            }
        }
    }

    /// 展開文字中所有深度 0 的 `$name`，反覆替換直到定點
    ///
    /// 回傳展開結果，以及是否每次替換都找到非空值
    /// （決定含變數的正則是否可以安全快取）。
    pub fn expand(&self, text: &str) -> Result<(String, bool), VariableError> {
        self.expand_inner(text, false)
    }

    /// 同 [`expand`](Self::expand)，但每個變數值先經過正則轉義
    pub fn expand_escaped(&self, text: &str) -> Result<(String, bool), VariableError> {
        self.expand_inner(text, true)
    }

    fn expand_inner(&self, text: &str, escape: bool) -> Result<(String, bool), VariableError> {
        let mut current = text.to_string();
        let mut all_found = true;
        for _ in 0..MAX_EXPANSION_ROUNDS {
            let (next, replaced, found) = self.expand_once(&current, escape)?;
            if !found {
                all_found = false;
            }
            if !replaced {
                return Ok((next, all_found));
            }
            current = next;
        }
        Err(VariableError::Cycle(text.to_string()))
    }

    /// 單趟展開；回傳 (結果, 是否替換過, 是否全部非空)
    fn expand_once(
        &self,
        text: &str,
        escape: bool,
    ) -> Result<(String, bool, bool), VariableError> {
        let mut out = String::with_capacity(text.len());
        let mut replaced = false;
        let mut all_found = true;
        let mut iter = depth_chars(text).peekable();

        while let Some((_, c, depth)) = iter.next() {
            if c != '$' || depth > 0 {
                out.push(c);
                continue;
            }
            if !iter
                .peek()
                .is_some_and(|&(_, n, _)| n.is_ascii_alphabetic() || n == '_')
            {
                out.push('$');
                continue;
            }
            let mut name = String::new();
            while let Some(&(_, n, _)) = iter.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    name.push(n);
                    iter.next();
                } else {
                    break;
                }
            }
            let value = self.resolve(&name)?;
            if value.is_empty() {
                all_found = false;
            }
            if escape {
                out.push_str(&regex::escape(&value));
            } else {
                out.push_str(&value);
            }
            replaced = true;
        }
        Ok((out, replaced, all_found))
    }

    /// 計算變數：`DATE`、`TIME`、`MonsterN`、`GroupMateN`
    fn computed(&self, name: &str) -> Option<String> {
        lazy_static! {
            static ref ROSTER_NAME: Regex =
                Regex::new(r"^(Monster|GroupMate)(\d*)$").expect("名單變數正則必然有效");
        }

        match name {
            "DATE" => return Some(Local::now().format("%Y-%m-%d").to_string()),
            "TIME" => return Some(Local::now().format("%H:%M:%S").to_string()),
            _ => {}
        }

        let caps = ROSTER_NAME.captures(name)?;
        let (list, selected) = if &caps[1] == "Monster" {
            (&self.roster.monsters, self.roster.selected_monster)
        } else {
            (&self.roster.group_mates, self.roster.selected_group_mate)
        };
        let index = if caps[2].is_empty() {
            selected?
        } else {
            // 名單索引以 1 起算
            caps[2].parse::<usize>().ok()?.checked_sub(1)?
        };
        Some(Roster::short_name(list, index))
    }
}

/// 值為 `$name` 的精確形式時回傳鏈的下一個名稱
fn alias_target(value: &str) -> Option<&str> {
    let rest = value.strip_prefix('$')?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(rest)
    } else {
        None
    }
}
