//! 規則命令單元
//!
//! 以命令前綴字元開頭的輸入在此解讀為規則定義命令，例如
//! `#action {^You see} {look} {5} {Combat}`。動詞接受最短無歧義
//! 前綴（`#ac` 等於 `#action`）；引數文法見
//! [`tokenizer`](crate::tokenizer)。

use crate::action::Action;
use crate::alias::CommandAlias;
use crate::conveyor::{Outbox, Unit};
use crate::group::DEFAULT_GROUP;
use crate::highlight::Highlight;
use crate::hotkey::Hotkey;
use crate::message::{command_tags, Command, CommandKind, TextColor};
use crate::model::Model;
use crate::substitution::Substitution;
use crate::tokenizer::tokenize;
use crate::trigger::Trigger;

/// 可辨識的動詞，依字典序
const VERBS: &[&str] = &[
    "action",
    "alias",
    "connect",
    "disconnect",
    "echo",
    "group",
    "highlight",
    "hotkey",
    "log",
    "substitution",
    "unaction",
    "unalias",
    "unsubstitution",
    "unvariable",
    "variable",
];

enum VerbMatch<'a> {
    Found(&'a str),
    Unknown,
    Ambiguous(Vec<&'a str>),
}

/// 以最短無歧義前綴解析動詞，完整動詞永遠優先
fn resolve_verb(input: &str) -> VerbMatch<'_> {
    if let Some(&verb) = VERBS.iter().find(|&&v| v == input) {
        return VerbMatch::Found(verb);
    }
    let matches: Vec<&str> = VERBS
        .iter()
        .copied()
        .filter(|v| v.starts_with(input))
        .collect();
    match matches.len() {
        0 => VerbMatch::Unknown,
        1 => VerbMatch::Found(matches[0]),
        _ => VerbMatch::Ambiguous(matches),
    }
}

pub struct UserCommandUnit;

impl Unit for UserCommandUnit {
    fn name(&self) -> &'static str {
        "user_command"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::TEXT]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        let CommandKind::Text(text_command) = &command.kind else {
            return;
        };
        let text = text_command.text.trim();
        let Some(body) = text.strip_prefix(model.settings.command_char) else {
            return;
        };
        // 數字開頭屬於倍增單元
        if body.starts_with(|c: char| c.is_ascii_digit()) {
            return;
        }

        command.handled = true;
        let (word, args) = match body.find(' ') {
            Some(cut) => (&body[..cut], &body[cut + 1..]),
            None => (body, ""),
        };
        if word.is_empty() {
            out.error("缺少命令動詞");
            return;
        }

        let verb = match resolve_verb(word) {
            VerbMatch::Found(verb) => verb,
            VerbMatch::Unknown => {
                out.error(format!("未知的命令: {}{}", model.settings.command_char, word));
                return;
            }
            VerbMatch::Ambiguous(candidates) => {
                out.error(format!("命令有歧義: {} 可能是 {}", word, candidates.join("、")));
                return;
            }
        };

        let args = tokenize(args, model.settings.separator);
        match verb {
            "action" => add_action(&args, model, out),
            "unaction" => remove_action(&args, model, out),
            "alias" => add_alias(&args, model, out),
            "unalias" => remove_alias(&args, model, out),
            "substitution" => add_substitution(&args, model, out),
            "unsubstitution" => remove_substitution(&args, model, out),
            "highlight" => add_highlight(&args, model, out),
            "hotkey" => add_hotkey(&args, model, out),
            "variable" => set_variable(&args, model, out),
            "unvariable" => unset_variable(&args, model, out),
            "group" => group_command(&args, model, out),
            "echo" => out.echo(args.join(" ")),
            "connect" => connect_command(&args, out),
            "disconnect" => out.push_command(Command::disconnect()),
            "log" => log_command(&args, out),
            _ => unreachable!(),
        }
    }
}

fn arg<'a>(args: &'a [String], index: usize) -> &'a str {
    args.get(index).map(String::as_str).unwrap_or("")
}

fn group_or_default<'a>(args: &'a [String], index: usize) -> &'a str {
    match args.get(index) {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_GROUP,
    }
}

/// `#action {樣式} {命令} {優先級} {群組}`
fn add_action(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.len() < 2 {
        out.error("用法: action {樣式} {命令} {優先級} {群組}");
        return;
    }
    let mut trigger = match Trigger::new(arg(args, 0)) {
        Ok(trigger) => trigger.with_action(Action::send_text(arg(args, 1))),
        Err(err) => {
            out.error(format!("樣式無效: {}", err));
            return;
        }
    };
    if let Some(priority) = args.get(2).filter(|p| !p.is_empty()) {
        match priority.parse::<i32>() {
            Ok(priority) => trigger.priority = priority,
            Err(_) => {
                out.error(format!("優先級無效: {}", priority));
                return;
            }
        }
    }
    let group = group_or_default(args, 3);
    model.rules.add_trigger(group, trigger);
    out.echo(format!("已新增觸發器 [{}]: {}", group, arg(args, 0)));
}

/// `#unaction {樣式} {群組}`
fn remove_action(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.is_empty() {
        out.error("用法: unaction {樣式} {群組}");
        return;
    }
    let group = args.get(1).filter(|g| !g.is_empty()).map(String::as_str);
    let removed = model.rules.remove_trigger(arg(args, 0), group);
    if removed == 0 {
        out.error(format!("找不到觸發器: {}", arg(args, 0)));
    } else {
        out.echo(format!("已移除 {} 個觸發器", removed));
    }
}

/// `#alias {別名詞} {命令} {群組}`
fn add_alias(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.len() < 2 {
        out.error("用法: alias {別名詞} {命令} {群組}");
        return;
    }
    let alias = CommandAlias::new(arg(args, 0)).with_action(Action::send_text(arg(args, 1)));
    let group = group_or_default(args, 2);
    model.rules.add_alias(group, alias);
    out.echo(format!("已新增別名 [{}]: {}", group, arg(args, 0)));
}

/// `#unalias {別名詞} {群組}`
fn remove_alias(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.is_empty() {
        out.error("用法: unalias {別名詞} {群組}");
        return;
    }
    let group = args.get(1).filter(|g| !g.is_empty()).map(String::as_str);
    let removed = model.rules.remove_alias(arg(args, 0), group);
    if removed == 0 {
        out.error(format!("找不到別名: {}", arg(args, 0)));
    } else {
        out.echo(format!("已移除 {} 個別名", removed));
    }
}

/// `#substitution {樣式} {替換文字} {群組}`
fn add_substitution(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.len() < 2 {
        out.error("用法: substitution {樣式} {替換文字} {群組}");
        return;
    }
    let substitution = match Substitution::new(arg(args, 0), arg(args, 1)) {
        Ok(substitution) => substitution,
        Err(err) => {
            out.error(format!("樣式無效: {}", err));
            return;
        }
    };
    let group = group_or_default(args, 2);
    model.rules.add_substitution(group, substitution);
    out.echo(format!("已新增替換規則 [{}]: {}", group, arg(args, 0)));
}

/// `#unsubstitution {樣式} {群組}`
fn remove_substitution(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.is_empty() {
        out.error("用法: unsubstitution {樣式} {群組}");
        return;
    }
    let group = args.get(1).filter(|g| !g.is_empty()).map(String::as_str);
    let removed = model.rules.remove_substitution(arg(args, 0), group);
    if removed == 0 {
        out.error(format!("找不到替換規則: {}", arg(args, 0)));
    } else {
        out.echo(format!("已移除 {} 個替換規則", removed));
    }
}

/// `#highlight {樣式} {顏色} {群組}`
fn add_highlight(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.len() < 2 {
        out.error("用法: highlight {樣式} {顏色} {群組}");
        return;
    }
    let Some(color) = TextColor::parse(arg(args, 1)) else {
        out.error(format!("顏色無效: {}", arg(args, 1)));
        return;
    };
    let highlight = match Highlight::new(arg(args, 0), Some(color)) {
        Ok(highlight) => highlight,
        Err(err) => {
            out.error(format!("樣式無效: {}", err));
            return;
        }
    };
    let group = group_or_default(args, 2);
    model.rules.add_highlight(group, highlight);
    out.echo(format!("已新增高亮規則 [{}]: {}", group, arg(args, 0)));
}

/// `#hotkey {按鍵} {命令} {群組}`
fn add_hotkey(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.len() < 2 {
        out.error("用法: hotkey {按鍵} {命令} {群組}");
        return;
    }
    let hotkey = Hotkey::new(arg(args, 0)).with_action(Action::send_text(arg(args, 1)));
    let group = group_or_default(args, 2);
    model.rules.add_hotkey(group, hotkey);
    out.echo(format!("已新增快捷鍵 [{}]: {}", group, arg(args, 0)));
}

/// `#variable {名稱} {值}`；無引數時列出全部變數
fn set_variable(args: &[String], model: &mut Model, out: &mut Outbox) {
    match args.len() {
        0 => {
            let listing: Vec<String> = model
                .variables
                .list()
                .iter()
                .map(|v| format!("${} = {}", v.name, v.value))
                .collect();
            if listing.is_empty() {
                out.echo("（沒有變數）");
            } else {
                for line in listing {
                    out.echo(line);
                }
            }
        }
        1 => {
            let value = model.variables.raw(arg(args, 0)).unwrap_or("").to_string();
            out.echo(format!("${} = {}", arg(args, 0), value));
        }
        _ => {
            model.variables.set(arg(args, 0), arg(args, 1));
            out.echo(format!("${} = {}", arg(args, 0), arg(args, 1)));
        }
    }
}

/// `#unvariable {名稱}`
fn unset_variable(args: &[String], model: &mut Model, out: &mut Outbox) {
    if args.is_empty() {
        out.error("用法: unvariable {名稱}");
        return;
    }
    if model.variables.unset(arg(args, 0)) {
        out.echo(format!("已刪除變數 ${}", arg(args, 0)));
    } else {
        out.error(format!("找不到變數: {}", arg(args, 0)));
    }
}

/// `#group`：列出群組；`#group {名稱}`：建立；
/// `#group {名稱} {on|off}`：啟用/停用
fn group_command(args: &[String], model: &mut Model, out: &mut Outbox) {
    match args.len() {
        0 => {
            for group in model.rules.groups() {
                let state = if group.enabled { "啟用" } else { "停用" };
                out.echo(format!("{} [{}]", group.name, state));
            }
        }
        1 => {
            if model.rules.add_group(arg(args, 0)) {
                out.echo(format!("已建立群組: {}", arg(args, 0)));
            } else {
                out.error(format!("群組已存在: {}", arg(args, 0)));
            }
        }
        _ => {
            let enabled = match arg(args, 1) {
                "on" => true,
                "off" => false,
                other => {
                    out.error(format!("狀態無效: {}（應為 on 或 off）", other));
                    return;
                }
            };
            if model.rules.set_group_enabled(arg(args, 0), enabled) {
                let state = if enabled { "啟用" } else { "停用" };
                out.echo(format!("群組 {} 已{}", arg(args, 0), state));
            } else {
                out.error(format!("無法變更群組: {}", arg(args, 0)));
            }
        }
    }
}

/// `#connect {主機} {連接埠}`
fn connect_command(args: &[String], out: &mut Outbox) {
    if args.len() < 2 {
        out.error("用法: connect {主機} {連接埠}");
        return;
    }
    let Ok(port) = arg(args, 1).parse::<u16>() else {
        out.error(format!("連接埠無效: {}", arg(args, 1)));
        return;
    };
    out.push_command(Command::connect(arg(args, 0), port));
}

/// `#log {檔案路徑}` 開始記錄；`#log` 停止記錄
fn log_command(args: &[String], out: &mut Outbox) {
    if args.is_empty() {
        out.push_command(Command::new(CommandKind::StopLog));
    } else {
        out.push_command(Command::new(CommandKind::StartLog(arg(args, 0).to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conveyor::Conveyor;
    use crate::message::MessageKind;

    fn conveyor() -> Conveyor {
        Conveyor::new(Model::new(), vec![Box::new(UserCommandUnit)])
    }

    fn errors(conveyor: &Conveyor) -> Vec<String> {
        conveyor
            .output()
            .iter()
            .filter_map(|m| match &m.kind {
                MessageKind::Error(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_verb_prefix_resolution() {
        assert!(matches!(resolve_verb("ac"), VerbMatch::Found("action")));
        assert!(matches!(resolve_verb("sub"), VerbMatch::Found("substitution")));
        assert!(matches!(resolve_verb("a"), VerbMatch::Ambiguous(_)));
        assert!(matches!(resolve_verb("zzz"), VerbMatch::Unknown));
        // 完整動詞即使是其他動詞的前綴也直接命中
        assert!(matches!(resolve_verb("alias"), VerbMatch::Found("alias")));
    }

    #[test]
    fn test_action_command_adds_trigger() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#action {^You see} {look} {5} {Combat}"));

        let model = conveyor.model_mut();
        let group = model.rules.group("Combat").expect("群組應已建立");
        assert_eq!(group.triggers.len(), 1);
        assert_eq!(group.triggers[0].pattern(), "^You see");
        assert_eq!(group.triggers[0].priority, 5);
    }

    #[test]
    fn test_action_defaults_to_default_group() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#action {%1 arrives} {look %1}"));
        let group = conveyor.model().rules.group(DEFAULT_GROUP).unwrap();
        assert_eq!(group.triggers.len(), 1);
        assert_eq!(group.triggers[0].priority, Trigger::DEFAULT_PRIORITY);
    }

    #[test]
    fn test_invalid_pattern_reports_error() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#action {/([bad/} {look}"));
        assert!(!errors(&conveyor).is_empty());
        assert!(conveyor.model().rules.group(DEFAULT_GROUP).unwrap().triggers.is_empty());
    }

    #[test]
    fn test_alias_and_unalias() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#alias {kk} {kill kobold}"));
        assert_eq!(
            conveyor.model().rules.group(DEFAULT_GROUP).unwrap().aliases.len(),
            1
        );
        conveyor.process_command(Command::text("#unalias {kk}"));
        assert!(conveyor.model().rules.group(DEFAULT_GROUP).unwrap().aliases.is_empty());
    }

    #[test]
    fn test_variable_set_and_unset() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#variable target orc"));
        assert_eq!(conveyor.model().variables.raw("target"), Some("orc"));
        conveyor.process_command(Command::text("#unvariable target"));
        assert_eq!(conveyor.model().variables.raw("target"), None);
    }

    #[test]
    fn test_group_enable_disable() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#group Combat"));
        conveyor.process_command(Command::text("#group Combat off"));
        assert!(!conveyor.model().rules.group("Combat").unwrap().enabled);
        conveyor.process_command(Command::text("#group Combat on"));
        assert!(conveyor.model().rules.group("Combat").unwrap().enabled);
    }

    #[test]
    fn test_unknown_verb_reports_error() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#frobnicate now"));
        assert!(errors(&conveyor)[0].contains("#frobnicate"));
        assert!(conveyor.take_outbound().is_empty());
    }

    #[test]
    fn test_ambiguous_prefix_reports_candidates() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#un x"));
        assert!(errors(&conveyor)[0].contains("unaction"));
    }

    #[test]
    fn test_connect_emits_connect_command() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#connect mud.example.com 4000"));
        let outbound = conveyor.take_outbound();
        assert_eq!(outbound.len(), 1);
        assert_eq!(
            outbound[0].kind,
            CommandKind::Connect {
                host: "mud.example.com".to_string(),
                port: 4000
            }
        );
    }

    #[test]
    fn test_log_start_and_stop() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("#log {logs/session.txt}"));
        conveyor.process_command(Command::text("#log"));
        let outbound = conveyor.take_outbound();
        assert_eq!(
            outbound[0].kind,
            CommandKind::StartLog("logs/session.txt".to_string())
        );
        assert_eq!(outbound[1].kind, CommandKind::StopLog);
    }

    #[test]
    fn test_plain_text_not_consumed() {
        let mut conveyor = conveyor();
        conveyor.process_command(Command::text("say hello"));
        assert_eq!(conveyor.take_outbound().len(), 1);
    }
}
