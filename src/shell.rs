//! Командный интерпретатор для сценариев и REPL.
//!
//! Каждая строка разбирается как отдельная команда:
//!
//! ```text
//! on <pattern> <handler>...
//! off [pattern]... [-- handler...]
//! trigger <pattern>... [--every] [--order current|begin|end] [--propagate top,current,deep]
//! topics
//! reset
//! ```
//!
//! Обработчики именованные и возвращают своё имя, поэтому `trigger` печатает
//! порядок вызова. `#` в начале строки или после пробела начинает
//! комментарий; внутри имени это обычный символ.

use std::collections::HashMap;

use clap::{error::ErrorKind, Parser, Subcommand};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::DispatcherConfig,
    dispatch::{make_options, Args, CallOrder, Dispatcher, HandlerRef, Propagate, UniqueCall},
    error::{bail, EventreeResult, ResultExt, StatusCode},
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Подписать обработчики на шаблон
    On {
        pattern: String,
        #[arg(required = true)]
        handlers: Vec<String>,
    },
    /// Отписать топики и/или обработчики
    Off {
        patterns: Vec<String>,
        #[arg(last = true)]
        handlers: Vec<String>,
    },
    /// Опубликовать событие и напечатать порядок вызова
    Trigger {
        #[arg(required = true)]
        patterns: Vec<String>,
        #[arg(long)]
        every: bool,
        #[arg(long, value_parser = parse_order)]
        order: Option<CallOrder>,
        #[arg(long, value_parser = parse_propagate)]
        propagate: Option<Propagate>,
    },
    /// Список топиков и их обработчиков
    Topics,
    /// Удалить все топики
    Reset,
}

fn parse_order(s: &str) -> Result<CallOrder, String> {
    s.parse()
        .map_err(|bad| format!("unknown call order '{bad}'"))
}

fn parse_propagate(s: &str) -> Result<Propagate, String> {
    s.parse()
        .map_err(|bad| format!("unknown propagate flag '{bad}'"))
}

/// Отрезает комментарий, начатый `#` в начале строки или после пробела.
fn strip_comment(line: &str) -> &str {
    let mut after_blank = true;
    for (i, ch) in line.char_indices() {
        if ch == '#' && after_blank {
            return &line[..i];
        }
        after_blank = ch.is_whitespace();
    }
    line
}

/// Интерпретатор: диспетчер и реестр именованных обработчиков.
pub struct Shell {
    events: Dispatcher,
    handlers: HashMap<String, HandlerRef>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Shell {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            events: Dispatcher::with_config(config),
            handlers: HashMap::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.events
    }

    /// Обработчик с данным именем; создаётся при первом упоминании.
    fn handler(
        &mut self,
        name: &str,
    ) -> HandlerRef {
        self.handlers
            .entry(name.to_string())
            .or_insert_with(|| {
                let tag = Value::String(name.to_string());
                HandlerRef::named(name, move |_: &Args| Ok(tag.clone()))
            })
            .clone()
    }

    /// Выполняет одну строку. Возвращает текст для вывода, если он есть.
    pub fn execute(
        &mut self,
        line: &str,
    ) -> EventreeResult<Option<String>> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(None);
        }

        let parsed = match Line::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                return Ok(Some(e.to_string().trim_end().to_string()))
            }
            Err(e) => bail!(StatusCode::InvalidArgs, "{}", e.to_string().trim_end()),
        };
        debug!(command = ?parsed.command, "executing");

        match parsed.command {
            Command::On { pattern, handlers } => {
                let handlers: Vec<HandlerRef> =
                    handlers.iter().map(|name| self.handler(name)).collect();
                self.events.subscribe(pattern.as_str(), handlers)?;
                Ok(None)
            }
            Command::Off { patterns, handlers } => {
                let patterns = (!patterns.is_empty()).then_some(patterns);
                let handlers = (!handlers.is_empty()).then(|| {
                    handlers
                        .iter()
                        .filter_map(|name| self.handlers.get(name).cloned())
                        .collect::<Vec<_>>()
                });
                self.events.unsubscribe(patterns, handlers)?;
                Ok(None)
            }
            Command::Trigger {
                patterns,
                every,
                order,
                propagate,
            } => {
                let unique = every.then_some(UniqueCall::Every);
                let options = make_options(unique, order, propagate);
                let called = self.events.publish(patterns, &Args::new(), &options)?;
                let names: Vec<String> = called
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect();
                if names.is_empty() {
                    Ok(Some("(none)".to_string()))
                } else {
                    Ok(Some(names.join(" ")))
                }
            }
            Command::Topics => {
                let lines: Vec<String> = self
                    .events
                    .topics()
                    .iter()
                    .map(|topic| {
                        let names: Vec<String> = self
                            .events
                            .handlers(topic.as_str())
                            .iter()
                            .map(|h| h.name().map(str::to_string).unwrap_or_else(|| h.label()))
                            .collect();
                        format!("{topic}: {}", names.join(" "))
                    })
                    .collect();
                if lines.is_empty() {
                    Ok(Some("(empty)".to_string()))
                } else {
                    Ok(Some(lines.join("\n")))
                }
            }
            Command::Reset => {
                self.events.reset();
                Ok(None)
            }
        }
    }

    /// Выполняет сценарий построчно и собирает вывод. Ошибка прерывает
    /// выполнение и получает номер строки в контексте.
    pub fn run_script(
        &mut self,
        source: &str,
    ) -> EventreeResult<Vec<String>> {
        let mut output = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let out = self
                .execute(line)
                .with_context(|| format!("line {}", index + 1))?;
            output.extend(out);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> Vec<String> {
        Shell::default().run_script(script).unwrap()
    }

    #[test]
    fn test_trigger_prints_call_order() {
        let out = run("
            on r root
            on r:a a
            on r:a:aa aa   # лист
            trigger r:a:aa
            trigger r:a:aa --order begin
            trigger r --propagate current,deep
        ");
        assert_eq!(out, ["aa a root", "root a aa", "root a aa"]);
    }

    #[test]
    fn test_off_forms() {
        let mut shell = Shell::default();
        shell.run_script("on x h\non y h\non y g").unwrap();

        shell.execute("off -- h").unwrap();
        assert_eq!(shell.dispatcher().handler_count("x"), Some(0));
        assert_eq!(shell.dispatcher().handler_count("y"), Some(1));

        shell.execute("off y").unwrap();
        assert!(!shell.dispatcher().contains("y"));

        shell.execute("off").unwrap();
        assert!(shell.dispatcher().is_empty());
    }

    #[test]
    fn test_every_and_topics() {
        let out = run("
            on r shared
            on r:a shared
            trigger r:a
            trigger r:a --every
            topics
        ");
        assert_eq!(out, ["shared", "shared shared", "r: shared\nr:a: shared"]);
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(run("trigger nothing\ntopics"), ["(none)", "(empty)"]);
    }

    /// Проверяет, что ошибка разбора прерывает сценарий и несёт номер
    /// строки.
    #[test]
    fn test_errors_carry_line_number() {
        let mut shell = Shell::default();
        let err = shell
            .run_script("on a h\ntrigger a --order sideways")
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
        assert!(err.to_string().starts_with("line 2"));
        assert!(shell.execute("launch a").is_err());
    }

    #[test]
    fn test_hash_inside_names_is_kept() {
        let mut shell = Shell::default();
        let out = shell
            .run_script("on a#b h#1 # подписка
# только комментарий
trigger a#b")
            .unwrap();
        assert_eq!(out, ["h#1"]);
        assert_eq!(shell.dispatcher().handler_count("a#b"), Some(1));
        assert!(!shell.dispatcher().contains("a"));
    }

    #[test]
    fn test_help_is_output() {
        let out = Shell::default().execute("help").unwrap().unwrap();
        assert!(out.contains("trigger"));
    }
}
