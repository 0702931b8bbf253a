//! 規則群組模組
//!
//! 群組是可啟用/停用的規則容器；規則以包含方式恰好屬於一個群組。
//! [`RuleStore`] 持有全部群組與一個版本計數器：任何變動遞增版本，
//! 「啟用觸發器的優先級排序投影」以版本比對快取，下次查詢時才重建。

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::alias::CommandAlias;
use crate::highlight::Highlight;
use crate::hotkey::Hotkey;
use crate::pattern::PatternError;
use crate::substitution::Substitution;
use crate::trigger::Trigger;

/// 內建群組名稱
pub const DEFAULT_GROUP: &str = "default";

/// 規則群組
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub enabled: bool,
    /// 內建群組不可刪除、不可停用
    pub built_in: bool,
    pub triggers: Vec<Trigger>,
    pub aliases: Vec<CommandAlias>,
    pub substitutions: Vec<Substitution>,
    pub highlights: Vec<Highlight>,
    pub hotkeys: Vec<Hotkey>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            built_in: false,
            triggers: Vec::new(),
            aliases: Vec::new(),
            substitutions: Vec::new(),
            highlights: Vec::new(),
            hotkeys: Vec::new(),
        }
    }

    fn built_in(name: impl Into<String>) -> Self {
        Self {
            built_in: true,
            ..Self::new(name)
        }
    }
}

#[derive(Debug)]
struct TriggerCache {
    version: u64,
    triggers: Rc<Vec<Trigger>>,
}

/// 全部群組與啟用觸發器投影的持有者
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleStore {
    groups: Vec<Group>,
    #[serde(skip)]
    version: u64,
    #[serde(skip)]
    cache: Option<TriggerCache>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            groups: vec![Group::built_in(DEFAULT_GROUP)],
            version: 0,
            cache: None,
        }
    }

    /// 目前版本（每次變動遞增）
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// 啟用中的群組，依加入順序
    pub fn enabled_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.enabled)
    }

    /// 新增群組；已存在時回傳 false
    pub fn add_group(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.group(&name).is_some() {
            return false;
        }
        self.groups.push(Group::new(name));
        self.touch();
        true
    }

    /// 刪除群組；內建群組或不存在時回傳 false
    pub fn remove_group(&mut self, name: &str) -> bool {
        let Some(index) = self.groups.iter().position(|g| g.name == name) else {
            return false;
        };
        if self.groups[index].built_in {
            return false;
        }
        self.groups.remove(index);
        self.touch();
        true
    }

    /// 啟用/停用群組；內建群組不可停用
    pub fn set_group_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(group) = self.groups.iter_mut().find(|g| g.name == name) else {
            return false;
        };
        if group.built_in && !enabled {
            return false;
        }
        if group.enabled != enabled {
            group.enabled = enabled;
            self.touch();
        }
        true
    }

    /// 找到或建立群組
    fn ensure_group(&mut self, name: &str) -> &mut Group {
        if let Some(index) = self.groups.iter().position(|g| g.name == name) {
            return &mut self.groups[index];
        }
        self.groups.push(Group::new(name));
        self.groups.last_mut().expect("剛附加的群組必然存在")
    }

    pub fn add_trigger(&mut self, group: &str, trigger: Trigger) {
        self.ensure_group(group).triggers.push(trigger);
        self.touch();
    }

    pub fn add_alias(&mut self, group: &str, alias: CommandAlias) {
        self.ensure_group(group).aliases.push(alias);
        self.touch();
    }

    pub fn add_substitution(&mut self, group: &str, substitution: Substitution) {
        self.ensure_group(group).substitutions.push(substitution);
        self.touch();
    }

    pub fn add_highlight(&mut self, group: &str, highlight: Highlight) {
        self.ensure_group(group).highlights.push(highlight);
        self.touch();
    }

    pub fn add_hotkey(&mut self, group: &str, hotkey: Hotkey) {
        self.ensure_group(group).hotkeys.push(hotkey);
        self.touch();
    }

    /// 依樣式字串移除觸發器，回傳移除數量
    pub fn remove_trigger(&mut self, pattern: &str, group: Option<&str>) -> usize {
        self.remove_rules(group, |g| {
            let before = g.triggers.len();
            g.triggers.retain(|t| t.pattern() != pattern);
            before - g.triggers.len()
        })
    }

    /// 依別名詞移除別名，回傳移除數量
    pub fn remove_alias(&mut self, command: &str, group: Option<&str>) -> usize {
        self.remove_rules(group, |g| {
            let before = g.aliases.len();
            g.aliases.retain(|a| a.command != command);
            before - g.aliases.len()
        })
    }

    /// 依樣式字串移除替換規則，回傳移除數量
    pub fn remove_substitution(&mut self, pattern: &str, group: Option<&str>) -> usize {
        self.remove_rules(group, |g| {
            let before = g.substitutions.len();
            g.substitutions.retain(|s| s.pattern() != pattern);
            before - g.substitutions.len()
        })
    }

    fn remove_rules(
        &mut self,
        group: Option<&str>,
        mut remove: impl FnMut(&mut Group) -> usize,
    ) -> usize {
        let mut removed = 0;
        for g in &mut self.groups {
            if group.is_some_and(|name| name != g.name) {
                continue;
            }
            removed += remove(g);
        }
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// 啟用觸發器的優先級升冪投影（快取快照）
    ///
    /// 穩定排序保留同優先級下的群組/加入順序。快照與規則狀態脫鉤：
    /// 調度中途的規則變動只影響下一次查詢。
    pub fn enabled_triggers(&mut self) -> Rc<Vec<Trigger>> {
        if let Some(cache) = &self.cache {
            if cache.version == self.version {
                return Rc::clone(&cache.triggers);
            }
        }
        let mut list: Vec<Trigger> = self
            .enabled_groups()
            .flat_map(|g| g.triggers.iter().cloned())
            .collect();
        list.sort_by_key(|t| t.priority);
        let triggers = Rc::new(list);
        self.cache = Some(TriggerCache {
            version: self.version,
            triggers: Rc::clone(&triggers),
        });
        triggers
    }

    /// 反序列化後重建所有規則的編譯結果
    pub fn recompile_all(&mut self) -> Result<(), PatternError> {
        for group in &mut self.groups {
            for trigger in &mut group.triggers {
                trigger.recompile()?;
            }
            for substitution in &mut group.substitutions {
                substitution.recompile()?;
            }
            for highlight in &mut group.highlights {
                highlight.recompile()?;
            }
        }
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_is_built_in() {
        let store = RuleStore::new();
        assert!(store.group(DEFAULT_GROUP).unwrap().built_in);
    }

    #[test]
    fn test_built_in_group_cannot_be_removed_or_disabled() {
        let mut store = RuleStore::new();
        assert!(!store.remove_group(DEFAULT_GROUP));
        assert!(!store.set_group_enabled(DEFAULT_GROUP, false));
        assert!(store.group(DEFAULT_GROUP).unwrap().enabled);
    }

    #[test]
    fn test_priority_projection_sorted_across_groups() {
        let mut store = RuleStore::new();
        store.add_trigger(
            "combat",
            Trigger::new("a").unwrap().with_priority(5),
        );
        store.add_trigger(
            "misc",
            Trigger::new("b").unwrap().with_priority(1),
        );
        let triggers = store.enabled_triggers();
        assert_eq!(triggers[0].pattern(), "b");
        assert_eq!(triggers[1].pattern(), "a");
    }

    #[test]
    fn test_projection_cached_until_version_moves() {
        let mut store = RuleStore::new();
        store.add_trigger(DEFAULT_GROUP, Trigger::new("x").unwrap());
        let first = store.enabled_triggers();
        let second = store.enabled_triggers();
        assert!(Rc::ptr_eq(&first, &second));

        store.add_trigger(DEFAULT_GROUP, Trigger::new("y").unwrap());
        let third = store.enabled_triggers();
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn test_disable_group_updates_next_lookup() {
        let mut store = RuleStore::new();
        store.add_trigger("combat", Trigger::new("x").unwrap());
        store.add_trigger(DEFAULT_GROUP, Trigger::new("y").unwrap());
        assert_eq!(store.enabled_triggers().len(), 2);

        assert!(store.set_group_enabled("combat", false));
        let triggers = store.enabled_triggers();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].pattern(), "y");
    }

    #[test]
    fn test_remove_trigger_by_pattern() {
        let mut store = RuleStore::new();
        store.add_trigger("a", Trigger::new("x").unwrap());
        store.add_trigger("b", Trigger::new("x").unwrap());
        assert_eq!(store.remove_trigger("x", Some("a")), 1);
        assert_eq!(store.remove_trigger("x", None), 1);
        assert_eq!(store.remove_trigger("x", None), 0);
    }

    #[test]
    fn test_group_serde_preserves_identity() {
        let mut store = RuleStore::new();
        store.add_trigger(
            "combat",
            Trigger::new("^You see %1").unwrap().with_priority(2),
        );
        let json = serde_json::to_string(&store).unwrap();
        let mut back: RuleStore = serde_json::from_str(&json).unwrap();
        back.recompile_all().unwrap();

        let group = back.group("combat").unwrap();
        assert_eq!(group.triggers[0].pattern(), "^You see %1");
        assert_eq!(group.triggers[0].priority, 2);
    }
}
